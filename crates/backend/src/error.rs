use thiserror::Error;

/// Errors returned by backend calls.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-success status.
    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// The backend answered 404.
    #[error("Not found: {}", .message.as_deref().unwrap_or("no details"))]
    NotFound { message: Option<String> },

    /// The backend answered 401.
    #[error("Authentication failed. Please log in again.")]
    Unauthorized,

    /// The backend answered 403.
    #[error("Forbidden: {}", .message.as_deref().unwrap_or("no details"))]
    Forbidden { message: Option<String> },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A success response lacked a required value.
    #[error("Backend response is missing {0}")]
    MissingField(&'static str),
}

impl BackendError {
    /// Builds the error for a non-success status code.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 => BackendError::Unauthorized,
            403 => BackendError::Forbidden { message },
            404 => BackendError::NotFound { message },
            _ => BackendError::Status { status, message },
        }
    }

    /// HTTP status, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            BackendError::NotFound { .. } => Some(404),
            BackendError::Unauthorized => Some(401),
            BackendError::Forbidden { .. } => Some(403),
            BackendError::Network(e) => e.status().map(|s| s.as_u16()),
            BackendError::Decode(_) | BackendError::MissingField(_) => None,
        }
    }

    /// The message the backend put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            BackendError::Status { message, .. }
            | BackendError::NotFound { message }
            | BackendError::Forbidden { message } => message.as_deref(),
            _ => None,
        }
    }

    /// Returns true if no response was received.
    pub fn is_network(&self) -> bool {
        matches!(self, BackendError::Network(_))
    }
}

/// Convenience type alias for backend results.
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classifies() {
        assert!(matches!(
            BackendError::from_status(401, None),
            BackendError::Unauthorized
        ));
        assert!(matches!(
            BackendError::from_status(403, Some("no".into())),
            BackendError::Forbidden { .. }
        ));
        assert!(matches!(
            BackendError::from_status(404, None),
            BackendError::NotFound { .. }
        ));
        assert_eq!(BackendError::from_status(500, None).status(), Some(500));
    }

    #[test]
    fn test_server_message() {
        let err = BackendError::from_status(400, Some("Coupon expired".into()));
        assert_eq!(err.server_message(), Some("Coupon expired"));
        assert_eq!(
            err.to_string(),
            "Request failed with status 400: Coupon expired"
        );
        assert_eq!(BackendError::Unauthorized.server_message(), None);
    }
}
