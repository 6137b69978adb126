//! Shared types used across the e-learning client crates.

pub mod text;
pub mod types;

pub use text::{PREVIEW_LEN, preview};
pub use types::{CartItemId, CategoryId, CourseId, FlowId, RoleId, SectionId, TopicId, UserId};
