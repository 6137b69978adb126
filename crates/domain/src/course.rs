//! Courses and their two-level content tree.

use common::{CategoryId, CourseId, SectionId, TopicId};
use serde::{Deserialize, Serialize};

use crate::money::Amount;

/// Flat classification applied to courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A unit of content within a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub topic_order: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// `None` means the topic is locked or has no playable content yet.
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub section_id: Option<SectionId>,
}

impl Topic {
    /// Returns true if the topic has no playable content for this viewer.
    pub fn is_locked(&self) -> bool {
        self.video_url.is_none()
    }
}

/// An ordered group of topics within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub section_order: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

impl Section {
    /// Returns the topics sorted by `topic_order`.
    pub fn ordered_topics(&self) -> Vec<&Topic> {
        let mut topics: Vec<&Topic> = self.topics.iter().collect();
        topics.sort_by_key(|t| t.topic_order);
        topics
    }
}

/// A course with its content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructor_name: String,
    #[serde(default)]
    pub price: Amount,
    #[serde(default)]
    pub discounted_price: Option<Amount>,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Course {
    /// Returns the sections sorted by `section_order`.
    pub fn ordered_sections(&self) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.section_order);
        sections
    }

    /// Finds a section by ID.
    pub fn section(&self, section_id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    /// Finds a topic anywhere in the content tree.
    pub fn topic(&self, topic_id: TopicId) -> Option<(&Section, &Topic)> {
        self.sections.iter().find_map(|section| {
            section
                .topics
                .iter()
                .find(|t| t.id == topic_id)
                .map(|topic| (section, topic))
        })
    }

    /// Returns the price a buyer pays: the discounted price when present.
    pub fn effective_price(&self) -> Amount {
        self.discounted_price.unwrap_or(self.price)
    }
}

/// One page of a paged backend listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    /// Page index as reported by the server.
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Page<T> {
    /// An empty page, as shown when the server returns no content.
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            total_pages: 1,
            total_elements: 0,
            number: 0,
            size: 0,
        }
    }

    /// Total pages, never less than one.
    pub fn page_count(&self) -> u32 {
        self.total_pages.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_json() -> serde_json::Value {
        serde_json::json!({
            "id": 1,
            "title": "Rust Basics",
            "description": "Learn Rust",
            "instructorName": "Ferris",
            "price": 1000,
            "discountedPrice": 799.5,
            "duration": 12,
            "imageUrl": "https://cdn.example/rust.png",
            "category": { "id": 2, "name": "Programming" },
            "sections": [
                {
                    "id": 11, "sectionOrder": 2, "title": "Ownership", "description": null,
                    "topics": [
                        { "id": 101, "topicOrder": 2, "title": "Borrowing", "description": "b", "videoUrl": null },
                        { "id": 100, "topicOrder": 1, "title": "Moves", "description": "m", "videoUrl": "v.mp4" }
                    ]
                },
                { "id": 10, "sectionOrder": 1, "title": "Intro", "description": "hello", "topics": [] }
            ]
        })
    }

    #[test]
    fn test_course_deserializes_content_tree() {
        let course: Course = serde_json::from_value(course_json()).unwrap();
        assert_eq!(course.id, CourseId::new(1));
        assert_eq!(course.sections.len(), 2);
        assert_eq!(course.effective_price(), Amount::from_parts(7995, 1));
    }

    #[test]
    fn test_sections_and_topics_are_ordered() {
        let course: Course = serde_json::from_value(course_json()).unwrap();
        let titles: Vec<&str> = course
            .ordered_sections()
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Intro", "Ownership"]);

        let section = course.section(SectionId::new(11)).unwrap();
        let topics: Vec<&str> = section
            .ordered_topics()
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(topics, vec!["Moves", "Borrowing"]);
    }

    #[test]
    fn test_null_video_url_is_locked() {
        let course: Course = serde_json::from_value(course_json()).unwrap();
        let (_, borrowing) = course.topic(TopicId::new(101)).unwrap();
        assert!(borrowing.is_locked());
        let (section, moves) = course.topic(TopicId::new(100)).unwrap();
        assert!(!moves.is_locked());
        assert_eq!(section.id, SectionId::new(11));
    }

    #[test]
    fn test_empty_page_has_one_page() {
        let page: Page<Course> = Page::empty();
        assert_eq!(page.page_count(), 1);
        let zero: Page<Course> = serde_json::from_str("{}").unwrap();
        assert_eq!(zero.page_count(), 1);
    }
}
