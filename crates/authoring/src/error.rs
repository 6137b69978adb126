//! Authoring error types.

use backend::BackendError;
use common::CourseId;
use domain::DomainError;
use thiserror::Error;

/// Errors that can end an authoring operation.
///
/// The `Display` text of each variant is the message shown to the operator.
#[derive(Debug, Error)]
pub enum AuthoringError {
    /// A form failed local validation; no request was made.
    #[error("{0}")]
    Validation(#[from] DomainError),

    /// The course could not be fetched.
    #[error("Failed to fetch course details for ID: {course_id}")]
    Load { course_id: CourseId },

    /// The backend refused a create or delete.
    #[error("Error {action}: {detail}")]
    Mutation { action: &'static str, detail: String },

    /// No session token is available.
    #[error("Authentication token missing. Please log in.")]
    NotAuthenticated,

    /// The requester lacks an enrollment for the content.
    #[error("You are not authorized to view this video (Enrollment required).")]
    NotAuthorized,

    /// The operator declined a confirmation prompt.
    #[error("Cancelled by operator")]
    NotConfirmed,

    /// The topic has no playable video.
    #[error("{0}")]
    VideoUnavailable(String),

    /// The content tree has not been loaded yet.
    #[error("Course content is not loaded")]
    NotLoaded,

    /// Backend error outside the flows above.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Convenience type alias for authoring results.
pub type Result<T> = std::result::Result<T, AuthoringError>;
