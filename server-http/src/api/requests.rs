use crate::validation::{is_valid_email, is_valid_url, Validate};
use arbor::errors::ValidationErrors;
use arbor::users::password::password_strength_issue;
use serde::Deserialize;

// Missing string fields deserialize as empty so they surface as field
// validation errors rather than shape errors.

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.push("body.name", "Name is required");
        }
        if self.email.trim().is_empty() {
            errors.push("body.email", "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.push("body.email", "Invalid email address");
        }
        if let Some(issue) = password_strength_issue(&self.password) {
            errors.push("body.password", issue);
        }

        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.old_password.is_empty() {
            errors.push("body.oldPassword", "Old password is required");
        }
        if let Some(issue) = password_strength_issue(&self.new_password) {
            errors.push("body.newPassword", issue);
        } else if self.new_password == self.old_password {
            errors.push(
                "body.newPassword",
                "New password must be different from the old password",
            );
        }

        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub profile_image: Option<String>,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            errors.push("body.name", "Name cannot be empty");
        }
        if self.profile_image.as_deref().is_some_and(|url| !is_valid_url(url)) {
            errors.push("body.profileImage", "Profile image must be a valid URL");
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(errors: &ValidationErrors) -> Vec<String> {
        errors
            .issues()
            .iter()
            .map(|issue| issue.path.join("."))
            .collect()
    }

    #[test]
    fn test_create_user_reports_every_field() {
        let request = CreateUserRequest {
            name: " ".to_string(),
            email: "nope".to_string(),
            password: "short".to_string(),
        };

        let errors = request.validate().unwrap_err();
        assert_eq!(
            paths(&errors),
            vec!["body.name", "body.email", "body.password"]
        );
    }

    #[test]
    fn test_change_password_must_differ() {
        let request = ChangePasswordRequest {
            old_password: "samepass123".to_string(),
            new_password: "samepass123".to_string(),
        };

        let errors = request.validate().unwrap_err();
        assert_eq!(errors.issues()[0].message, "New password must be different from the old password");
    }

    #[test]
    fn test_empty_profile_update_is_valid() {
        assert!(UpdateProfileRequest::default().validate().is_ok());

        let request = UpdateProfileRequest {
            name: None,
            profile_image: Some("avatar.png".to_string()),
        };
        assert_eq!(paths(&request.validate().unwrap_err()), vec!["body.profileImage"]);
    }
}
