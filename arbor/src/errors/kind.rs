use super::validation::ValidationErrors;
use crate::ports::RepositoryError;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

static FORCE_STACK_CAPTURE: AtomicBool = AtomicBool::new(false);

/// Capture a stack for every new error regardless of `RUST_BACKTRACE`.
///
/// Turned on by the server in development mode, where error bodies carry
/// the stack.
pub fn force_stack_capture(enabled: bool) {
    FORCE_STACK_CAPTURE.store(enabled, Ordering::Relaxed);
}

/// Every failure category the HTTP layer knows how to render.
///
/// Variants are listed in classification priority order. The kind is fixed
/// where the failure is detected, so nothing downstream inspects types.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("ORM validation error: {0}")]
    OrmValidation(String),

    #[error("ORM initialization error: {0}")]
    OrmInitialization(String),

    #[error("ORM engine critical error: {0}")]
    OrmEngineCritical(String),

    #[error("ORM unknown request error: {0}")]
    OrmUnknown(String),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("reference error: {0}")]
    Reference(String),

    #[error("{}", .0.as_deref().unwrap_or("unknown error"))]
    Unknown(Option<String>),
}

/// An error on its way to becoming an HTTP response.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct AppError {
    kind: ErrorKind,
    stack: Option<String>,
}

impl AppError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            stack: capture_stack(),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api {
            status,
            message: message.into(),
        })
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::api(400, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::api(401, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::api(403, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::api(404, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::api(409, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax(message.into()))
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type(message.into()))
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference(message.into()))
    }

    pub fn unknown(message: Option<String>) -> Self {
        Self::new(ErrorKind::Unknown(message))
    }

    /// Replace the captured stack with an explicit one.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn without_stack(mut self) -> Self {
        self.stack = None;
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Classify an arbitrary error by inspecting its concrete type.
    ///
    /// This is the only place where runtime type inspection happens; anything
    /// unrecognised becomes `Unknown` carrying the error's display text.
    pub fn from_dyn_error(err: Box<dyn std::error::Error + Send + Sync + 'static>) -> Self {
        let err = match err.downcast::<AppError>() {
            Ok(app) => return *app,
            Err(other) => other,
        };
        let err = match err.downcast::<ValidationErrors>() {
            Ok(validation) => return AppError::from(*validation),
            Err(other) => other,
        };
        let err = match err.downcast::<RepositoryError>() {
            Ok(repo) => return AppError::from(*repo),
            Err(other) => other,
        };
        match err.downcast::<serde_json::Error>() {
            Ok(json) => AppError::from(*json),
            Err(other) => AppError::unknown(Some(other.to_string())),
        }
    }

    /// Turn a panic payload (not necessarily an error value) into `Unknown`.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            Some((*s).to_string())
        } else {
            payload.downcast_ref::<String>().cloned()
        };
        AppError::unknown(message)
    }
}

impl From<ErrorKind> for AppError {
    fn from(kind: ErrorKind) -> Self {
        AppError::new(kind)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::new(ErrorKind::Validation(errors))
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        let kind = match err {
            RepositoryError::UniqueViolation(field) => {
                return AppError::conflict(format!("A user with this {} already exists", field));
            }
            RepositoryError::Validation(raw) => ErrorKind::OrmValidation(raw),
            RepositoryError::Initialization(raw) => ErrorKind::OrmInitialization(raw),
            RepositoryError::EngineCritical(raw) => ErrorKind::OrmEngineCritical(raw),
            RepositoryError::Unknown(raw) => ErrorKind::OrmUnknown(raw),
        };
        AppError::new(kind)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Syntax | Category::Eof => AppError::syntax(err.to_string()),
            Category::Data => AppError::type_mismatch(err.to_string()),
            Category::Io => AppError::unknown(Some(err.to_string())),
        }
    }
}

fn capture_stack() -> Option<String> {
    let backtrace = if FORCE_STACK_CAPTURE.load(Ordering::Relaxed) {
        Backtrace::force_capture()
    } else {
        Backtrace::capture()
    };
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}
