use crate::api::ErrorEnvelope;
use crate::state::AppState;
use arbor::errors::{classify, AppError, ClassifiedError};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use std::any::Any;
use tracing::{debug, error};

/// Handler-facing error: anything convertible into `AppError` becomes a
/// classified JSON response.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

fn status_for(classified: &ClassifiedError) -> StatusCode {
    if (100..=599).contains(&classified.status_code) {
        StatusCode::from_u16(classified.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Production rendering. The full classification, stack included, rides
/// along in the response extensions for `normalize_errors`.
impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let classified = classify(&self.0, true);
        let status = status_for(&classified);

        if status.is_server_error() {
            error!("{} {}: {}", status.as_u16(), classified.message, self.0);
        } else {
            debug!("{} {}: {}", status.as_u16(), classified.message, self.0);
        }

        let public = ClassifiedError {
            stack: None,
            ..classified.clone()
        };
        let mut response = (status, Json(ErrorEnvelope::new(&public))).into_response();
        response.extensions_mut().insert(classified);
        response
    }
}

/// Response for a panic caught by `CatchPanicLayer`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    HttpError(AppError::from_panic(payload)).into_response()
}

/// Re-render error bodies with their stack trace when running in development mode.
pub async fn normalize_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(classified) = response.extensions_mut().remove::<ClassifiedError>() else {
        return response;
    };
    if !state.debug_mode || classified.stack.is_none() {
        return response;
    }

    let body = match serde_json::to_vec(&ErrorEnvelope::new(&classified)) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to render error body: {}", e);
            return response;
        }
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_production_body_has_no_stack() {
        let err = AppError::not_found("User not found").with_stack("at get_user");
        let response = HttpError(err).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let stashed = response.extensions().get::<ClassifiedError>().cloned();
        assert_eq!(stashed.and_then(|c| c.stack), Some("at get_user".to_string()));

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User not found");
        assert_eq!(body["errorSources"][0]["type"], "ApiError");
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_status_renders_as_500() {
        let response = HttpError(AppError::api(42, "odd")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = HttpError(AppError::api(700, "odder")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_panic_payload_is_unknown_error() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Something went wrong!");
        assert_eq!(body["errorSources"][0]["type"], "UnknownError");
    }
}
