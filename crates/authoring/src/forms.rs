//! Section and topic form state.

use common::SectionId;
use domain::{SectionDraft, TopicDraft, VideoFile};

const DEFAULT_TOPIC_MINUTES: u32 = 10;

/// Inputs of the "add section" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionForm {
    pub title: String,
    pub section_order: u32,
    pub description: String,
}

impl Default for SectionForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            section_order: 1,
            description: String::new(),
        }
    }
}

impl SectionForm {
    pub fn draft(&self) -> SectionDraft {
        SectionDraft::new(
            self.title.clone(),
            self.section_order,
            self.description.clone(),
        )
    }

    /// Prepares the form for the next section: order + 1, other fields cleared.
    pub fn advance(&mut self) {
        *self = Self {
            section_order: self.section_order.saturating_add(1),
            ..Self::default()
        };
    }
}

/// Inputs of the "add topic" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicForm {
    pub section_id: Option<SectionId>,
    pub title: String,
    pub description: String,
    pub duration_minutes: u32,
    pub topic_order: u32,
    pub video: Option<VideoFile>,
}

impl Default for TopicForm {
    fn default() -> Self {
        Self {
            section_id: None,
            title: String::new(),
            description: String::new(),
            duration_minutes: DEFAULT_TOPIC_MINUTES,
            topic_order: 1,
            video: None,
        }
    }
}

impl TopicForm {
    pub fn select_section(&mut self, section_id: Option<SectionId>) {
        self.section_id = section_id;
    }

    pub fn attach_video(&mut self, video: VideoFile) {
        self.video = Some(video);
    }

    pub fn draft(&self) -> TopicDraft {
        TopicDraft {
            section_id: self.section_id,
            title: self.title.clone(),
            description: self.description.clone(),
            duration_minutes: self.duration_minutes,
            topic_order: self.topic_order,
            video: self.video.clone(),
        }
    }

    /// Prepares the form for the next topic in the same section.
    pub fn advance(&mut self) {
        *self = Self {
            section_id: self.section_id,
            topic_order: self.topic_order.saturating_add(1),
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_form_advances() {
        let mut form = SectionForm {
            title: "Intro".into(),
            section_order: 3,
            description: "Basics".into(),
        };
        form.advance();
        assert_eq!(form.section_order, 4);
        assert!(form.title.is_empty());
        assert!(form.description.is_empty());
    }

    #[test]
    fn test_topic_form_keeps_section() {
        let mut form = TopicForm {
            section_id: Some(SectionId::new(7)),
            title: "Borrowing".into(),
            description: "Refs".into(),
            duration_minutes: 25,
            topic_order: 2,
            video: Some(VideoFile::new("b.mp4", "video/mp4", vec![0; 4])),
        };
        form.advance();
        assert_eq!(form.section_id, Some(SectionId::new(7)));
        assert_eq!(form.topic_order, 3);
        assert_eq!(form.duration_minutes, 10);
        assert!(form.video.is_none());
        assert!(form.title.is_empty());
    }

    #[test]
    fn test_advance_stops_at_max_order() {
        let mut section = SectionForm {
            section_order: u32::MAX,
            ..SectionForm::default()
        };
        section.advance();
        assert_eq!(section.section_order, u32::MAX);

        let mut topic = TopicForm {
            topic_order: u32::MAX,
            ..TopicForm::default()
        };
        topic.advance();
        assert_eq!(topic.topic_order, u32::MAX);
    }

    #[test]
    fn test_topic_draft_without_video_fails() {
        let mut form = TopicForm::default();
        form.select_section(Some(SectionId::new(1)));
        form.title = "Lifetimes".into();
        let err = form.draft().to_upload().unwrap_err();
        assert_eq!(err.to_string(), "Please select a video file for the topic.");
    }
}
