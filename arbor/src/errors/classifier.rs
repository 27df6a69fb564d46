use super::kind::{AppError, ErrorKind};
use super::orm_validation::parse_orm_validation;
use super::validation::format_validation_errors;
use serde::Serialize;
use serde_json::Value;

pub const GENERIC_MESSAGE: &str = "Something went wrong!";

/// One entry of the `errorSources` array in an error response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorSource {
    fn bare(source_type: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            details: None,
        }
    }

    fn with_details(source_type: &str, details: impl Serialize) -> Self {
        Self {
            source_type: source_type.to_string(),
            details: serde_json::to_value(details).ok(),
        }
    }
}

/// Normalized view of a failure: status, client-safe message, sources and
/// (in debug mode only) the stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    #[serde(skip)]
    pub status_code: u16,
    pub message: String,
    pub error_sources: Vec<ErrorSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Map an error to its response shape. Total and side-effect free.
pub fn classify(err: &AppError, debug_mode: bool) -> ClassifiedError {
    let (status_code, message, source) = match err.kind() {
        ErrorKind::Validation(errors) => {
            let simplified = format_validation_errors(errors);
            (
                simplified.status_code,
                simplified.message,
                ErrorSource::with_details("ValidationError", simplified.error_details),
            )
        }
        ErrorKind::Api { status, message } => (
            *status,
            message.clone(),
            ErrorSource::with_details("ApiError", message),
        ),
        ErrorKind::OrmValidation(raw) => {
            let report = parse_orm_validation(raw);
            (
                400,
                report.message.to_string(),
                ErrorSource::with_details("ORMValidationError", report.errors),
            )
        }
        // Raw engine text stays server-side for the ORM failure kinds below.
        ErrorKind::OrmInitialization(_) => (
            500,
            "Failed to initialize database connection. Please try again later.".to_string(),
            ErrorSource::bare("ORMInitializationError"),
        ),
        ErrorKind::OrmEngineCritical(_) => (
            500,
            "Critical database engine error occurred.".to_string(),
            ErrorSource::bare("ORMEngineCriticalError"),
        ),
        ErrorKind::OrmUnknown(_) => (
            500,
            "Unknown database error occurred.".to_string(),
            ErrorSource::bare("ORMUnknownError"),
        ),
        ErrorKind::Syntax(_) => (
            400,
            "Invalid request syntax.".to_string(),
            ErrorSource::bare("SyntaxError"),
        ),
        ErrorKind::Type(_) => (
            400,
            "Invalid data type provided.".to_string(),
            ErrorSource::bare("TypeError"),
        ),
        ErrorKind::Reference(_) => (
            400,
            "Reference error occurred.".to_string(),
            ErrorSource::bare("ReferenceError"),
        ),
        ErrorKind::Unknown(message) => (
            500,
            GENERIC_MESSAGE.to_string(),
            match message {
                Some(message) => ErrorSource::with_details("UnknownError", message),
                None => ErrorSource::bare("UnknownError"),
            },
        ),
    };

    ClassifiedError {
        status_code,
        message,
        error_sources: vec![source],
        stack: if debug_mode {
            err.stack().map(str::to_string)
        } else {
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::validation::ValidationErrors;
    use crate::ports::RepositoryError;
    use serde_json::json;

    fn source_type(classified: &ClassifiedError) -> &str {
        &classified.error_sources[0].source_type
    }

    #[test]
    fn test_every_category_has_documented_status_and_type() {
        let cases: Vec<(AppError, u16, &str)> = vec![
            (
                ValidationErrors::new().add("email", "Invalid email").into(),
                400,
                "ValidationError",
            ),
            (AppError::api(409, "Email already in use"), 409, "ApiError"),
            (
                RepositoryError::Validation("Argument `email` is missing.".into()).into(),
                400,
                "ORMValidationError",
            ),
            (
                RepositoryError::Initialization("lock held".into()).into(),
                500,
                "ORMInitializationError",
            ),
            (
                RepositoryError::EngineCritical("corrupted page".into()).into(),
                500,
                "ORMEngineCriticalError",
            ),
            (
                RepositoryError::Unknown("io".into()).into(),
                500,
                "ORMUnknownError",
            ),
            (AppError::syntax("unexpected EOF"), 400, "SyntaxError"),
            (AppError::type_mismatch("expected string"), 400, "TypeError"),
            (AppError::reference("missing extension"), 400, "ReferenceError"),
            (AppError::unknown(Some("boom".into())), 500, "UnknownError"),
        ];

        for (err, status, kind) in cases {
            let classified = classify(&err, false);
            assert_eq!(classified.status_code, status, "status for {}", kind);
            assert_eq!(source_type(&classified), kind);
            assert_eq!(classified.error_sources.len(), 1);
        }
    }

    #[test]
    fn test_validation_details_are_per_field() {
        let err: AppError = ValidationErrors::new()
            .add("body.email", "Invalid email")
            .add("password", "Too short")
            .into();
        let classified = classify(&err, false);

        assert_eq!(classified.message, "Validation Error");
        assert_eq!(
            classified.error_sources[0].details,
            Some(json!([
                {"path": "email", "message": "Invalid email"},
                {"path": "password", "message": "Too short"}
            ]))
        );
    }

    #[test]
    fn test_api_error_is_verbatim() {
        let classified = classify(&AppError::not_found("User not found"), false);
        assert_eq!(classified.status_code, 404);
        assert_eq!(classified.message, "User not found");
        assert_eq!(classified.error_sources[0].details, Some(json!("User not found")));
    }

    #[test]
    fn test_orm_validation_details_are_parsed_field_errors() {
        let err: AppError = RepositoryError::Validation(
            "Argument `age`: Invalid value provided. Expected Int, provided String.".into(),
        )
        .into();
        let classified = classify(&err, false);

        assert_eq!(classified.message, "ORM validation failed");
        assert_eq!(
            classified.error_sources[0].details,
            Some(json!([{
                "field": "age",
                "type": "invalid",
                "message": "Expected Int, but received String"
            }]))
        );
    }

    #[test]
    fn test_orm_failures_do_not_leak_raw_text() {
        let err: AppError =
            RepositoryError::Initialization("could not open /var/lib/secret.db".into()).into();
        let classified = classify(&err, false);
        let body = serde_json::to_string(&classified).unwrap();

        assert_eq!(
            classified.message,
            "Failed to initialize database connection. Please try again later."
        );
        assert!(classified.error_sources[0].details.is_none());
        assert!(!body.contains("secret.db"));
    }

    #[test]
    fn test_unknown_without_message_has_no_details() {
        let classified = classify(&AppError::from_panic(Box::new(())), false);
        assert_eq!(classified.status_code, 500);
        assert_eq!(classified.message, GENERIC_MESSAGE);
        assert_eq!(source_type(&classified), "UnknownError");
        assert!(classified.error_sources[0].details.is_none());
    }

    #[test]
    fn test_stack_present_only_in_debug_mode_with_stack() {
        let with_stack = AppError::bad_request("bad").with_stack("frame 0");
        let without_stack = AppError::bad_request("bad").without_stack();

        assert_eq!(classify(&with_stack, true).stack.as_deref(), Some("frame 0"));
        assert_eq!(classify(&with_stack, false).stack, None);
        assert_eq!(classify(&without_stack, true).stack, None);
    }

    #[test]
    fn test_stack_is_absent_not_null_when_serialized() {
        let err = AppError::bad_request("bad").with_stack("frame 0");

        let production = serde_json::to_value(classify(&err, false)).unwrap();
        assert!(production.get("stack").is_none());
        assert!(production.get("statusCode").is_none());
        assert_eq!(production["errorSources"][0]["type"], "ApiError");

        let development = serde_json::to_value(classify(&err, true)).unwrap();
        assert_eq!(development["stack"], "frame 0");
    }
}
