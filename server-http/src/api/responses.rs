use arbor::errors::ClassifiedError;
use serde::Serialize;

/// Envelope for every successful response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

impl ApiResponse<()> {
    /// Success with `data: null`
    pub fn message_only(message: impl Into<String>) -> Self {
        Self::new(message, ())
    }
}

/// Envelope for every error response
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub success: bool,
    #[serde(flatten)]
    pub error: &'a ClassifiedError,
}

impl<'a> ErrorEnvelope<'a> {
    pub fn new(error: &'a ClassifiedError) -> Self {
        Self {
            success: false,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: &'static str,
}
