use crate::middleware::error_handler::HttpError;
use arbor::errors::{AppError, ValidationErrors};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email regex")
});

/// Field-level checks run after a body deserializes.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_valid_url(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://"))
        && url.split("://").nth(1).is_some_and(|rest| !rest.is_empty() && !rest.contains(char::is_whitespace))
}

/// JSON body extractor that rejects through the error classifier.
///
/// Malformed JSON and missing content type become syntax errors, shape
/// mismatches become type errors, and failed field checks become
/// validation errors.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection_to_error)?;

        value.validate()?;
        Ok(Self(value))
    }
}

fn json_rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => AppError::type_mismatch(e.body_text()),
        JsonRejection::JsonSyntaxError(e) => AppError::syntax(e.body_text()),
        JsonRejection::MissingJsonContentType(e) => AppError::syntax(e.body_text()),
        other => AppError::unknown(Some(other.body_text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_url_format() {
        assert!(is_valid_url("https://cdn.example.com/a.png"));
        assert!(is_valid_url("http://localhost/x"));
        assert!(!is_valid_url("ftp://example.com/a.png"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("not a url"));
    }
}
