//! Form drafts and their local validation.
//!
//! Every draft is validated before a request is issued; a draft that fails
//! validation never reaches the network.

use common::{CategoryId, RoleId, SectionId, UserId};
use serde::Serialize;

use crate::error::DomainError;
use crate::money::Amount;

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A lecture video attached to a topic.
pub type VideoFile = FileUpload;

/// A course cover image.
pub type ImageFile = FileUpload;

fn require(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Required { field });
    }
    Ok(())
}

fn require_positive(field: &'static str, value: u32) -> Result<(), DomainError> {
    if value == 0 {
        return Err(DomainError::NotPositive {
            field,
            value: i64::from(value),
        });
    }
    Ok(())
}

/// A new section, serialized as the section-creation request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDraft {
    pub title: String,
    pub section_order: u32,
    pub description: String,
}

impl SectionDraft {
    pub fn new(title: impl Into<String>, section_order: u32, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            section_order,
            description: description.into(),
        }
    }

    /// Title must be non-empty and the order a positive integer.
    pub fn validate(&self) -> Result<(), DomainError> {
        require("title", &self.title)?;
        require_positive("sectionOrder", self.section_order)
    }
}

/// A new topic as entered in the topic form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDraft {
    pub section_id: Option<SectionId>,
    pub title: String,
    pub description: String,
    pub duration_minutes: u32,
    pub topic_order: u32,
    pub video: Option<VideoFile>,
}

/// A validated topic ready for multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicUpload {
    pub title: String,
    pub description: String,
    pub topic_order: u32,
    pub duration_minutes: u32,
    pub video: VideoFile,
}

impl TopicDraft {
    /// Checks the draft and produces the upload for the selected section.
    ///
    /// Section selection is checked first, then the video attachment.
    pub fn to_upload(&self) -> Result<(SectionId, TopicUpload), DomainError> {
        let section_id = self
            .section_id
            .filter(|id| id.get() > 0)
            .ok_or(DomainError::SectionNotSelected)?;
        let video = self.video.as_ref().ok_or(DomainError::VideoMissing)?;
        require("title", &self.title)?;
        require_positive("durationMinutes", self.duration_minutes)?;
        require_positive("topicOrder", self.topic_order)?;

        Ok((
            section_id,
            TopicUpload {
                title: self.title.clone(),
                description: self.description.clone(),
                topic_order: self.topic_order,
                duration_minutes: self.duration_minutes,
                video: video.clone(),
            },
        ))
    }
}

/// A course as entered in the add/edit course forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub instructor_name: String,
    pub price: Amount,
    pub discounted_price: Option<Amount>,
    pub duration: u32,
    pub category_id: Option<CategoryId>,
    pub image: Option<ImageFile>,
}

impl CourseDraft {
    fn validate_common(&self) -> Result<CategoryId, DomainError> {
        require("title", &self.title)?;
        if let Some(discounted) = self.discounted_price
            && discounted >= self.price
        {
            return Err(DomainError::DiscountNotLower {
                price: self.price.to_string(),
                discounted: discounted.to_string(),
            });
        }
        self.category_id.ok_or(DomainError::CategoryNotSelected)
    }

    /// Validation for a new course: image and category are required.
    pub fn validate_for_create(&self) -> Result<CategoryId, DomainError> {
        if self.image.is_none() {
            return Err(DomainError::ImageMissing);
        }
        self.validate_common()
    }

    /// Validation for an edit: the image may be omitted to keep the current one.
    pub fn validate_for_edit(&self) -> Result<CategoryId, DomainError> {
        self.validate_common()
    }
}

/// A new role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDraft {
    pub name: String,
    pub description: String,
    pub level: i32,
}

impl RoleDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        require("name", &self.name)
    }
}

/// Selection state of the role-assignment form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleAssignment {
    pub user_id: Option<UserId>,
    pub role_id: Option<RoleId>,
}

impl RoleAssignment {
    /// Both a user and a role must be selected.
    pub fn validate(&self) -> Result<(UserId, RoleId), DomainError> {
        match (self.user_id, self.role_id) {
            (Some(user_id), Some(role_id)) => Ok((user_id, role_id)),
            _ => Err(DomainError::AssignmentIncomplete),
        }
    }
}
