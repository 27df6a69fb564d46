use crate::middleware::error_handler::HttpError;
use crate::state::AppState;
use arbor::errors::AppError;
use arbor::users::User;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use base64::{engine::general_purpose::STANDARD, Engine};

const REALM: &str = "Basic realm=\"Arbor\"";

/// Extract Basic Auth credentials from Authorization header
fn extract_basic_auth(auth_header: &str) -> Option<(String, String)> {
    // Authorization: Basic <base64>
    let parts: Vec<&str> = auth_header.split_whitespace().collect();

    if parts.len() != 2 || parts[0] != "Basic" {
        return None;
    }

    // Decode base64
    let decoded = STANDARD.decode(parts[1]).ok()?;
    let decoded_str = String::from_utf8(decoded).ok()?;

    // Split email:password
    let mut parts = decoded_str.splitn(2, ':');
    let email = parts.next()?.to_string();
    let password = parts.next()?.to_string();

    Some((email, password))
}

fn unauthorized(message: &str) -> Response {
    challenge(AppError::unauthorized(message))
}

/// Error response that asks the client for Basic credentials
fn challenge(err: AppError) -> Response {
    let mut response = HttpError(err).into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
    response
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized("You are not authorized!"))?;

    let (email, password) = extract_basic_auth(auth_header)
        .ok_or_else(|| unauthorized("Invalid Authorization header format"))?;

    let user = state
        .user_service
        .authenticate(&email, &password)
        .await
        .map_err(challenge)?;

    // Attach user to request extensions
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// The user attached by `auth_middleware`.
///
/// Using this on a route without the middleware is a wiring bug and is
/// reported as a reference error.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Extension::<User>::from_request_parts(parts, state)
            .await
            .map(|Extension(user)| CurrentUser(user))
            .map_err(|rejection| HttpError(AppError::reference(rejection.body_text())))
    }
}
