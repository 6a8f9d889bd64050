//! Backend call errors

/// Error from a backend request
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection, TLS, timeout or body read failure
    Transport { endpoint: String, message: String },
    /// Non-success status; `message` is the backend's `error` field when present
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// Response body did not have the expected shape
    Malformed { endpoint: String, message: String },
}

impl ApiError {
    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Transport { endpoint, .. }
            | ApiError::Status { endpoint, .. }
            | ApiError::Malformed { endpoint, .. } => endpoint,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport { endpoint, message } => {
                write!(f, "Could not reach backend ({}): {}", endpoint, message)
            }
            ApiError::Status {
                endpoint,
                status,
                message,
            } => {
                write!(f, "Backend returned {} for {}: {}", status, endpoint, message)
            }
            ApiError::Malformed { endpoint, message } => {
                write!(f, "Unexpected response from {}: {}", endpoint, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}
