//! Domain layer for the e-learning client.
//!
//! Every entity here is owned by the backend; the client only holds
//! transient copies scoped to a single view. This crate provides:
//! - Cart, checkout summary and course content entities
//! - `Amount`, a decimal money value with minor-unit conversion
//! - Catalog filter and pagination state
//! - Form drafts that validate locally before any network call
//! - User-visible notices

pub mod cart;
pub mod catalog;
pub mod course;
pub mod error;
pub mod forms;
pub mod money;
pub mod notice;
pub mod user;

pub use cart::{Cart, CartItem, CartLookup, CartUser, CheckoutSummary};
pub use catalog::{CatalogQuery, DEFAULT_PAGE_SIZE, DurationFilter, Pagination};
pub use course::{Category, Course, Page, Section, Topic};
pub use error::DomainError;
pub use forms::{
    CourseDraft, FileUpload, ImageFile, RoleAssignment, RoleDraft, SectionDraft, TopicDraft,
    TopicUpload, VideoFile,
};
pub use money::Amount;
pub use notice::{Notice, NoticeLevel};
pub use user::{Enrollment, Enrollments, Role, User, UserRole, UserSummary};
