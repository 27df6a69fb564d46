use serde::Serialize;
use std::fmt;

/// A single schema violation: where it happened and what was wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: Vec<String>,
    pub message: String,
}

/// Structured output of request-schema validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation at a dotted path (`"address.city"`) or a single field name.
    pub fn add(mut self, path: &str, message: impl Into<String>) -> Self {
        self.push(path, message);
        self
    }

    pub fn push(&mut self, path: &str, message: impl Into<String>) {
        let path = path
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        self.issues.push(ValidationIssue {
            path,
            message: message.into(),
        });
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .issues
            .iter()
            .map(|issue| format!("{}: {}", issue.path.join("."), issue.message))
            .collect();
        write!(f, "validation failed: {}", rendered.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrorDetail {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifiedValidationError {
    pub status_code: u16,
    pub message: String,
    pub error_details: Vec<ValidationErrorDetail>,
}

/// Flatten validation output into a 400 with one detail per violated field.
/// Each detail keeps only the innermost path segment.
pub fn format_validation_errors(errors: &ValidationErrors) -> SimplifiedValidationError {
    let error_details = errors
        .issues()
        .iter()
        .map(|issue| ValidationErrorDetail {
            path: issue.path.last().cloned().unwrap_or_default(),
            message: issue.message.clone(),
        })
        .collect();

    SimplifiedValidationError {
        status_code: 400,
        message: "Validation Error".to_string(),
        error_details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_keeps_last_path_segment() {
        let errors = ValidationErrors::new()
            .add("body.email", "Invalid email address")
            .add("password", "Password must be at least 8 characters");

        let simplified = format_validation_errors(&errors);

        assert_eq!(simplified.status_code, 400);
        assert_eq!(simplified.message, "Validation Error");
        assert_eq!(
            simplified.error_details,
            vec![
                ValidationErrorDetail {
                    path: "email".to_string(),
                    message: "Invalid email address".to_string(),
                },
                ValidationErrorDetail {
                    path: "password".to_string(),
                    message: "Password must be at least 8 characters".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_empty_path_renders_as_empty_string() {
        let errors = ValidationErrors::new().add("", "Body must be an object");
        let simplified = format_validation_errors(&errors);
        assert_eq!(simplified.error_details[0].path, "");
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let err = ValidationErrors::new()
            .add("name", "Required")
            .into_result()
            .unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.to_string(), "validation failed: name: Required");
    }
}
