//! Content tree view state.

use common::{SectionId, TopicId};
use domain::{Course, Section, Topic};

/// The form currently open next to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveForm {
    Section,
    Topic,
}

impl ActiveForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveForm::Section => "section",
            ActiveForm::Topic => "topic",
        }
    }
}

/// State of one content tree view.
///
/// ```text
/// Loading ──► Loaded(tree) ◄──► Loaded(tree, form)
///    └──────► Failed
/// ```
///
/// A refetch replaces the tree but keeps the open form.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ContentTreeView {
    #[default]
    Loading,

    Loaded {
        course: Box<Course>,
        form: Option<ActiveForm>,
    },

    /// The initial fetch failed; the message is shown instead of the tree.
    Failed(String),
}

impl ContentTreeView {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ContentTreeView::Loaded { .. })
    }

    /// The loaded course, if any.
    pub fn course(&self) -> Option<&Course> {
        match self {
            ContentTreeView::Loaded { course, .. } => Some(&**course),
            _ => None,
        }
    }

    pub fn active_form(&self) -> Option<ActiveForm> {
        match self {
            ContentTreeView::Loaded { form, .. } => *form,
            _ => None,
        }
    }

    /// Sections in display order.
    pub fn sections(&self) -> Vec<&Section> {
        self.course()
            .map(Course::ordered_sections)
            .unwrap_or_default()
    }

    /// Looks a topic up in the loaded tree.
    pub fn topic(&self, topic_id: TopicId) -> Option<(&Section, &Topic)> {
        self.course().and_then(|c| c.topic(topic_id))
    }

    pub fn has_section(&self, section_id: SectionId) -> bool {
        self.course()
            .is_some_and(|c| c.section(section_id).is_some())
    }

    /// Installs a freshly fetched course, keeping any open form.
    pub(crate) fn replace_course(&mut self, course: Course) {
        let form = self.active_form();
        *self = ContentTreeView::Loaded {
            course: Box::new(course),
            form,
        };
    }

    /// Opens or closes a form. Returns false if nothing is loaded.
    pub(crate) fn set_form(&mut self, form: Option<ActiveForm>) -> bool {
        match self {
            ContentTreeView::Loaded { form: current, .. } => {
                *current = form;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::Amount;

    use super::*;

    fn course() -> Course {
        serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Rust",
            "price": 100,
            "sections": [
                { "id": 20, "sectionOrder": 2, "title": "Ownership", "topics": [
                    { "id": 200, "topicOrder": 1, "title": "Moves", "videoUrl": "v/200.mp4" }
                ]},
                { "id": 10, "sectionOrder": 1, "title": "Intro", "topics": [] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_loading_has_no_course() {
        let view = ContentTreeView::default();
        assert!(!view.is_loaded());
        assert!(view.course().is_none());
        assert!(view.sections().is_empty());
        assert_eq!(view.active_form(), None);
    }

    #[test]
    fn test_sections_are_ordered() {
        let mut view = ContentTreeView::Loading;
        view.replace_course(course());
        let titles: Vec<_> = view.sections().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro", "Ownership"]);
        assert!(view.has_section(SectionId::new(20)));
        assert_eq!(
            view.topic(TopicId::new(200)).map(|(s, _)| s.id),
            Some(SectionId::new(20))
        );
    }

    #[test]
    fn test_refetch_keeps_open_form() {
        let mut view = ContentTreeView::Loading;
        assert!(!view.set_form(Some(ActiveForm::Topic)));

        view.replace_course(course());
        assert!(view.set_form(Some(ActiveForm::Topic)));

        let mut updated = course();
        updated.price = Amount::from_parts(200, 0);
        view.replace_course(updated);
        assert_eq!(view.active_form(), Some(ActiveForm::Topic));
        assert_eq!(view.course().unwrap().price, Amount::from_parts(200, 0));
    }
}
