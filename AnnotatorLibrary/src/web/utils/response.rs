use serde::Serialize;

/// Machine-checkable error body shared by every api endpoint.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new<T: Into<String>, U: Into<String>>(error: T, message: U) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
