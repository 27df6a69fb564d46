use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const ORM_VALIDATION_MESSAGE: &str = "ORM validation failed";

static MISSING_ARGUMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Argument `(.+?)` is missing\.").expect("Failed to compile missing argument regex")
});

static INVALID_VALUE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Argument `(.+?)`: Invalid value provided. Expected (.+), provided (.+)\.")
        .expect("Failed to compile invalid value regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldErrorKind {
    Missing,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: FieldErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrmValidationReport {
    pub message: &'static str,
    pub errors: Vec<FieldError>,
}

/// Extract per-field errors from a persistence-layer validation diagnostic.
///
/// All "missing argument" matches come first in document order, followed by
/// all "invalid value" matches. Text in any other phrasing yields an empty
/// list rather than an error. Matching is linear in the input length.
pub fn parse_orm_validation(raw_message: &str) -> OrmValidationReport {
    let mut errors = Vec::new();

    for caps in MISSING_ARGUMENT_PATTERN.captures_iter(raw_message) {
        let field = caps[1].to_string();
        errors.push(FieldError {
            message: format!("{} is required", field),
            field,
            kind: FieldErrorKind::Missing,
        });
    }

    for caps in INVALID_VALUE_PATTERN.captures_iter(raw_message) {
        errors.push(FieldError {
            field: caps[1].to_string(),
            kind: FieldErrorKind::Invalid,
            message: format!("Expected {}, but received {}", &caps[2], &caps[3]),
        });
    }

    OrmValidationReport {
        message: ORM_VALIDATION_MESSAGE,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_argument() {
        let report = parse_orm_validation("Argument `email` is missing.");
        assert_eq!(report.message, ORM_VALIDATION_MESSAGE);
        assert_eq!(
            report.errors,
            vec![FieldError {
                field: "email".to_string(),
                kind: FieldErrorKind::Missing,
                message: "email is required".to_string(),
            }]
        );
    }

    #[test]
    fn test_invalid_value() {
        let report = parse_orm_validation(
            "Argument `age`: Invalid value provided. Expected Int, provided String.",
        );
        assert_eq!(
            report.errors,
            vec![FieldError {
                field: "age".to_string(),
                kind: FieldErrorKind::Invalid,
                message: "Expected Int, but received String".to_string(),
            }]
        );
    }

    #[test]
    fn test_unknown_phrasing_yields_no_errors() {
        let report = parse_orm_validation("no known pattern here");
        assert!(report.errors.is_empty());
        assert_eq!(report.message, ORM_VALIDATION_MESSAGE);

        assert!(parse_orm_validation("").errors.is_empty());
    }

    #[test]
    fn test_missing_matches_precede_invalid_matches() {
        let raw = "Invalid `user.create()` invocation:\n\
                   Argument `role`: Invalid value provided. Expected Role, provided Int.\n\
                   Argument `name` is missing.\n\
                   Argument `email` is missing.";

        let report = parse_orm_validation(raw);
        let fields: Vec<(&str, FieldErrorKind)> = report
            .errors
            .iter()
            .map(|e| (e.field.as_str(), e.kind))
            .collect();

        assert_eq!(
            fields,
            vec![
                ("name", FieldErrorKind::Missing),
                ("email", FieldErrorKind::Missing),
                ("role", FieldErrorKind::Invalid),
            ]
        );
        assert_eq!(report.errors[2].message, "Expected Role, but received Int");
    }

    #[test]
    fn test_pathological_input_terminates() {
        let raw = "Argument `".repeat(20_000) + &"` is missing".repeat(5_000);
        let report = parse_orm_validation(&raw);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_serializes_kind_as_type() {
        let report = parse_orm_validation("Argument `email` is missing.");
        let json = serde_json::to_value(&report.errors[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "field": "email",
                "type": "missing",
                "message": "email is required"
            })
        );
    }
}
