// Public API
pub mod classifier;
pub mod kind;
pub mod orm_validation;
pub mod validation;

// Re-export commonly used types
pub use classifier::{classify, ClassifiedError, ErrorSource};
pub use kind::{force_stack_capture, AppError, ErrorKind};
pub use orm_validation::{parse_orm_validation, FieldError, FieldErrorKind, OrmValidationReport};
pub use validation::{
    format_validation_errors, SimplifiedValidationError, ValidationErrorDetail, ValidationErrors,
    ValidationIssue,
};

pub type AppResult<T> = std::result::Result<T, AppError>;
