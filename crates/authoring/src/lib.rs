//! Course content authoring.
//!
//! An operator builds a course's content tree (sections holding ordered
//! topics with an attached video). Every successful mutation is followed by
//! a full refetch of the course, so the displayed tree is always the
//! backend's and never a locally spliced copy.

pub mod error;
pub mod forms;
pub mod tree;
pub mod video;
pub mod workflow;

pub use error::{AuthoringError, Result};
pub use forms::{SectionForm, TopicForm};
pub use tree::{ActiveForm, ContentTreeView};
pub use video::{VideoState, VideoViewer};
pub use workflow::{AuthoringWorkflow, Confirm};
