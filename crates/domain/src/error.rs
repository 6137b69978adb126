//! Domain error types.

use thiserror::Error;

/// Errors raised by local validation, before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A required field was left empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// A numeric field must be a positive integer.
    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    /// No section was selected for a new topic.
    #[error("Please select a section to add the topic to.")]
    SectionNotSelected,

    /// No video file was attached to a new topic.
    #[error("Please select a video file for the topic.")]
    VideoMissing,

    /// No image file was attached to a new course.
    #[error("Please select an image")]
    ImageMissing,

    /// No category was selected for a course.
    #[error("Please select a category.")]
    CategoryNotSelected,

    /// The discounted price is not lower than the list price.
    #[error("Discounted price {discounted} must be lower than price {price}")]
    DiscountNotLower { price: String, discounted: String },

    /// A role assignment needs both a user and a role.
    #[error("Please select both a User and a Role.")]
    AssignmentIncomplete,

    /// The amount cannot be expressed in minor currency units.
    #[error("Amount {0} is out of range for minor-unit conversion")]
    AmountOutOfRange(String),
}
