//! Application error types.

use authoring::AuthoringError;
use backend::BackendError;
use checkout::CheckoutError;
use domain::DomainError;
use thiserror::Error;

/// Errors surfaced by the application layer and the CLI.
///
/// The `Display` text is the message shown to the user.
#[derive(Debug, Error)]
pub enum AppError {
    /// The operation needs a signed-in user.
    #[error("{0}")]
    NotAuthenticated(&'static str),

    /// The signed-in user lacks the admin role.
    #[error("Admin role required")]
    NotAdmin,

    /// Credentials were rejected at sign-in.
    #[error("Login failed. Please check your email and password.")]
    LoginFailed,

    /// A backend request failed; the message is user-facing.
    #[error("{0}")]
    Request(String),

    /// A form failed local validation.
    #[error("{0}")]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Authoring(#[from] AuthoringError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The token store could not be read or written.
    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Invalid command-line input.
    #[error("{0}")]
    Usage(String),
}

/// Convenience type alias for application results.
pub type Result<T> = std::result::Result<T, AppError>;

/// User-facing text for a failed request: the server's message when it
/// sent one, otherwise `fallback` with the status code.
pub(crate) fn request_message(e: &BackendError, fallback: &str) -> String {
    match e.server_message() {
        Some(message) => common::preview(message).to_string(),
        None => match e.status() {
            Some(status) => format!("{fallback}: {status}"),
            None => fallback.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_message_prefers_server_text() {
        let err = BackendError::Status {
            status: 400,
            message: Some("Course already in cart".into()),
        };
        assert_eq!(request_message(&err, "Failed"), "Course already in cart");

        let err = BackendError::Status {
            status: 502,
            message: None,
        };
        assert_eq!(request_message(&err, "Failed to fetch cart"), "Failed to fetch cart: 502");
    }
}
