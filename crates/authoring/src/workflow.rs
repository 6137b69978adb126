//! Authoring workflow over one course's content tree.

use std::collections::BTreeSet;

use backend::{AuthToken, BackendError, ContentApi, TokenSource};
use common::{CourseId, FlowId, SectionId, TopicId, preview};
use domain::Notice;

use crate::error::{AuthoringError, Result};
use crate::forms::{SectionForm, TopicForm};
use crate::tree::{ActiveForm, ContentTreeView};
use crate::video::VideoViewer;

const SECTION_ADDED: &str = "Section added successfully!";
const TOPIC_ADDED: &str = "Topic added successfully!";
const SECTION_DELETED: &str = "Section deleted successfully!";
const TOPIC_DELETED: &str = "Topic deleted successfully!";
const TOPIC_NETWORK_ERROR: &str = "A network error occurred. Please ensure the server is running.";

/// Interactive yes/no prompt guarding destructive operations.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Orchestrates the content authoring of a single course.
///
/// The displayed tree is only ever replaced by a fresh fetch of the course.
/// A failed mutation leaves it untouched.
pub struct AuthoringWorkflow<B: ContentApi> {
    backend: B,
    tokens: TokenSource,
    course_id: CourseId,
    flow_id: FlowId,
    view: ContentTreeView,
    section_form: SectionForm,
    topic_form: TopicForm,
    expanded: BTreeSet<SectionId>,
    video: Option<VideoViewer>,
    uploading: bool,
    notices: Vec<Notice>,
}

impl<B: ContentApi> AuthoringWorkflow<B> {
    /// The token is read from `tokens` on every mutation and video fetch.
    pub fn new(backend: B, tokens: impl Into<TokenSource>, course_id: CourseId) -> Self {
        Self {
            backend,
            tokens: tokens.into(),
            course_id,
            flow_id: FlowId::new(),
            view: ContentTreeView::Loading,
            section_form: SectionForm::default(),
            topic_form: TopicForm::default(),
            expanded: BTreeSet::new(),
            video: None,
            uploading: false,
            notices: Vec::new(),
        }
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn flow_id(&self) -> FlowId {
        self.flow_id
    }

    pub fn view(&self) -> &ContentTreeView {
        &self.view
    }

    pub fn section_form(&self) -> &SectionForm {
        &self.section_form
    }

    pub fn section_form_mut(&mut self) -> &mut SectionForm {
        &mut self.section_form
    }

    pub fn topic_form(&self) -> &TopicForm {
        &self.topic_form
    }

    pub fn topic_form_mut(&mut self) -> &mut TopicForm {
        &mut self.topic_form
    }

    /// True while a topic upload is in progress.
    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn video(&self) -> Option<&VideoViewer> {
        self.video.as_ref()
    }

    /// Pins the session token, replacing the current source.
    pub fn set_token(&mut self, token: Option<AuthToken>) {
        self.tokens = TokenSource::fixed(token);
    }

    /// Drains the queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn is_expanded(&self, section_id: SectionId) -> bool {
        self.expanded.contains(&section_id)
    }

    /// Expands or collapses a section. Independent of any open form.
    pub fn toggle_section(&mut self, section_id: SectionId) -> bool {
        if !self.expanded.remove(&section_id) {
            self.expanded.insert(section_id);
            return true;
        }
        false
    }

    /// Opens a form next to the tree.
    pub fn open_form(&mut self, form: ActiveForm) -> Result<()> {
        if !self.view.set_form(Some(form)) {
            return Err(AuthoringError::NotLoaded);
        }
        Ok(())
    }

    pub fn close_form(&mut self) {
        self.view.set_form(None);
    }

    /// Fetches the course and replaces the displayed tree.
    ///
    /// A failure on the first load puts the view into `Failed`; a failed
    /// refetch keeps the current tree and queues an error notice.
    #[tracing::instrument(skip(self), fields(flow_id = %self.flow_id, course_id = %self.course_id))]
    pub async fn load(&mut self) -> Result<()> {
        metrics::counter!("authoring_refetch_total").increment(1);
        match self.backend.course_detail(self.course_id).await {
            Ok(course) => {
                tracing::debug!(sections = course.sections.len(), "course content loaded");
                let live: BTreeSet<SectionId> = course.sections.iter().map(|s| s.id).collect();
                self.expanded.retain(|id| live.contains(id));
                self.view.replace_course(course);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching course details");
                let err = AuthoringError::Load {
                    course_id: self.course_id,
                };
                if self.view.is_loaded() {
                    self.notices.push(Notice::error(err.to_string()));
                } else {
                    self.view = ContentTreeView::Failed(err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Submits the section form.
    #[tracing::instrument(skip(self), fields(flow_id = %self.flow_id, course_id = %self.course_id))]
    pub async fn create_section(&mut self) -> Result<()> {
        let draft = self.section_form.draft();
        draft.validate()?;
        let token = self.tokens.current().ok_or(AuthoringError::NotAuthenticated)?;

        match self.backend.add_section(&token, self.course_id, &draft).await {
            Ok(()) => {
                tracing::info!(title = %draft.title, order = draft.section_order, "section added");
                record_mutation("add_section", "ok");
                self.notices.push(Notice::success(SECTION_ADDED));
                self.section_form.advance();
                self.refetch().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "error adding section");
                record_mutation("add_section", "error");
                let detail = if e.is_network() {
                    "Network error while adding section.".to_string()
                } else {
                    status_detail(&e)
                };
                Err(self.mutation_failed("adding section", detail))
            }
        }
    }

    /// Submits the topic form as a multipart upload.
    ///
    /// Nothing is sent unless a section is selected and a video is attached.
    #[tracing::instrument(skip(self), fields(flow_id = %self.flow_id, course_id = %self.course_id))]
    pub async fn create_topic(&mut self) -> Result<()> {
        let (section_id, upload) = self.topic_form.draft().to_upload()?;
        if self.view.is_loaded() && !self.view.has_section(section_id) {
            tracing::warn!(%section_id, "topic form points at a section not in the tree");
        }
        let token = self.tokens.current().ok_or(AuthoringError::NotAuthenticated)?;

        tracing::info!(
            %section_id,
            file = %upload.video.file_name,
            bytes = upload.video.len(),
            "uploading topic video"
        );
        self.uploading = true;
        let result = self
            .backend
            .add_topic(&token, self.course_id, section_id, &upload)
            .await;
        self.uploading = false;

        match result {
            Ok(message) => {
                record_mutation("add_topic", "ok");
                let message = if message.trim().is_empty() {
                    TOPIC_ADDED.to_string()
                } else {
                    message
                };
                self.notices.push(Notice::success(message));
                self.topic_form.advance();
                self.refetch().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "error adding topic");
                record_mutation("add_topic", "error");
                let detail = if e.is_network() {
                    TOPIC_NETWORK_ERROR.to_string()
                } else {
                    match e.server_message() {
                        Some(message) => preview(message).to_string(),
                        None => format!(
                            "Failed to add topic (Status: {})",
                            status_text(&e)
                        ),
                    }
                };
                Err(self.mutation_failed("adding topic", detail))
            }
        }
    }

    /// Deletes a section after the operator confirms.
    #[tracing::instrument(skip(self, confirm), fields(flow_id = %self.flow_id, course_id = %self.course_id))]
    pub async fn delete_section<C>(&mut self, section_id: SectionId, confirm: &C) -> Result<()>
    where
        C: Confirm + ?Sized,
    {
        let prompt = format!("Are you sure you want to DELETE this section with ID {section_id}?");
        if !confirm.confirm(&prompt) {
            return Err(AuthoringError::NotConfirmed);
        }
        let token = self.tokens.current().ok_or(AuthoringError::NotAuthenticated)?;

        match self
            .backend
            .delete_section(&token, self.course_id, section_id)
            .await
        {
            Ok(()) => {
                tracing::info!(%section_id, "section deleted");
                record_mutation("delete_section", "ok");
                self.notices.push(Notice::success(SECTION_DELETED));
                self.expanded.remove(&section_id);
                self.refetch().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(%section_id, error = %e, "error deleting section");
                record_mutation("delete_section", "error");
                let detail = if e.is_network() {
                    "Network error during section deletion.".to_string()
                } else {
                    status_detail(&e)
                };
                Err(self.mutation_failed("deleting section", detail))
            }
        }
    }

    /// Deletes a topic after the operator confirms.
    #[tracing::instrument(skip(self, confirm), fields(flow_id = %self.flow_id, course_id = %self.course_id))]
    pub async fn delete_topic<C>(
        &mut self,
        section_id: SectionId,
        topic_id: TopicId,
        confirm: &C,
    ) -> Result<()>
    where
        C: Confirm + ?Sized,
    {
        let prompt = format!("Are you sure you want to DELETE this topic with ID {topic_id}?");
        if !confirm.confirm(&prompt) {
            return Err(AuthoringError::NotConfirmed);
        }
        let token = self.tokens.current().ok_or(AuthoringError::NotAuthenticated)?;

        match self
            .backend
            .delete_topic(&token, self.course_id, section_id, topic_id)
            .await
        {
            Ok(()) => {
                tracing::info!(%section_id, %topic_id, "topic deleted");
                record_mutation("delete_topic", "ok");
                self.notices.push(Notice::success(TOPIC_DELETED));
                self.refetch().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(%topic_id, error = %e, "error deleting topic");
                record_mutation("delete_topic", "error");
                let detail = if e.is_network() {
                    "Network error during topic deletion.".to_string()
                } else {
                    status_detail(&e)
                };
                Err(self.mutation_failed("deleting topic", detail))
            }
        }
    }

    /// Opens the video viewer for one topic, resolving its secure URL.
    ///
    /// A topic without a video is locked and never reaches the backend.
    pub async fn open_video(&mut self, topic_id: TopicId) -> Result<&VideoViewer> {
        if let Some((_, topic)) = self.view.topic(topic_id)
            && topic.is_locked()
        {
            return Err(AuthoringError::VideoUnavailable(
                "This topic has no video yet.".to_string(),
            ));
        }
        tracing::debug!(flow_id = %self.flow_id, %topic_id, "opening video viewer");
        let viewer = VideoViewer::open(&self.backend, self.tokens.current().as_ref(), topic_id).await;
        Ok(&*self.video.insert(viewer))
    }

    /// Closes the viewer and forgets the URL.
    pub fn close_video(&mut self) {
        self.video = None;
    }

    async fn refetch(&mut self) {
        // the error is already queued as a notice
        let _ = self.load().await;
    }

    fn mutation_failed(&mut self, action: &'static str, detail: String) -> AuthoringError {
        let err = AuthoringError::Mutation { action, detail };
        self.notices.push(Notice::error(err.to_string()));
        err
    }
}

fn record_mutation(action: &'static str, outcome: &'static str) {
    metrics::counter!("authoring_mutations_total", "action" => action, "outcome" => outcome)
        .increment(1);
}

fn status_text(e: &BackendError) -> String {
    e.status()
        .map_or_else(|| "unknown".to_string(), |s| s.to_string())
}

/// "{status} - {server text preview}".
fn status_detail(e: &BackendError) -> String {
    let message = match e.server_message() {
        Some(message) => preview(message).to_string(),
        None => preview(&e.to_string()).to_string(),
    };
    format!("{} - {}", status_text(e), message)
}

#[cfg(test)]
mod tests {
    use backend::{InMemoryBackend, Operation};
    use domain::Amount;

    use super::*;

    async fn workflow() -> (AuthoringWorkflow<InMemoryBackend>, InMemoryBackend) {
        let backend = InMemoryBackend::new();
        let token = backend.seed_admin("Meera", "Nair", "meera@example.com").await;
        let course_id = backend
            .seed_course("Rust in Production", Amount::from_parts(100000, 2))
            .await;
        let workflow = AuthoringWorkflow::new(backend.clone(), Some(token), course_id);
        (workflow, backend)
    }

    #[tokio::test]
    async fn test_withdrawn_token_blocks_mutations() {
        let backend = InMemoryBackend::new();
        let token = backend.seed_admin("Meera", "Nair", "meera@example.com").await;
        let course_id = backend
            .seed_course("Rust in Production", Amount::from_parts(100000, 2))
            .await;
        let (tx, rx) = tokio::sync::watch::channel(Some(token));
        let mut workflow = AuthoringWorkflow::new(
            backend.clone(),
            TokenSource::watch(rx, |token| token.clone()),
            course_id,
        );
        workflow.load().await.unwrap();

        tx.send_replace(None);
        workflow.section_form_mut().title = "Getting started".into();
        let err = workflow.create_section().await.unwrap_err();
        assert!(matches!(err, AuthoringError::NotAuthenticated));
        assert_eq!(backend.call_count(Operation::AddSection).await, 0);
    }

    #[tokio::test]
    async fn test_form_needs_loaded_tree() {
        let (mut workflow, _) = workflow().await;
        assert!(matches!(
            workflow.open_form(ActiveForm::Section),
            Err(AuthoringError::NotLoaded)
        ));

        workflow.load().await.unwrap();
        workflow.open_form(ActiveForm::Topic).unwrap();
        assert_eq!(workflow.view().active_form(), Some(ActiveForm::Topic));
        workflow.close_form();
        assert_eq!(workflow.view().active_form(), None);
    }

    #[tokio::test]
    async fn test_failed_first_load_shows_message() {
        let (mut workflow, backend) = workflow().await;
        backend
            .set_failure(Operation::CourseDetail, 500, None)
            .await;

        let err = workflow.load().await.unwrap_err();
        let expected = format!(
            "Failed to fetch course details for ID: {}",
            workflow.course_id()
        );
        assert_eq!(err.to_string(), expected);
        assert_eq!(workflow.view(), &ContentTreeView::Failed(expected));
        assert!(workflow.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_tree() {
        let (mut workflow, backend) = workflow().await;
        workflow.load().await.unwrap();
        backend
            .set_failure(Operation::CourseDetail, 503, None)
            .await;

        assert!(workflow.load().await.is_err());
        assert!(workflow.view().is_loaded());
        let notices = workflow.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
    }

    #[tokio::test]
    async fn test_invalid_section_makes_no_request() {
        let (mut workflow, backend) = workflow().await;
        workflow.section_form_mut().title = "  ".into();

        let err = workflow.create_section().await.unwrap_err();
        assert!(matches!(err, AuthoringError::Validation(_)));
        assert_eq!(backend.call_count(Operation::AddSection).await, 0);
    }

    #[tokio::test]
    async fn test_declined_delete_makes_no_request() {
        let (mut workflow, backend) = workflow().await;
        let prompts = std::cell::RefCell::new(Vec::new());
        let decline = |prompt: &str| {
            prompts.borrow_mut().push(prompt.to_string());
            false
        };

        let err = workflow
            .delete_section(SectionId::new(4), &decline)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthoringError::NotConfirmed));
        assert_eq!(
            prompts.borrow().as_slice(),
            ["Are you sure you want to DELETE this section with ID 4?"]
        );
        assert_eq!(backend.call_count(Operation::DeleteSection).await, 0);
    }

    #[tokio::test]
    async fn test_toggle_section() {
        let (mut workflow, _) = workflow().await;
        let id = SectionId::new(9);
        assert!(workflow.toggle_section(id));
        assert!(workflow.is_expanded(id));
        assert!(!workflow.toggle_section(id));
        assert!(!workflow.is_expanded(id));
    }

    #[test]
    fn test_status_detail_previews_server_text() {
        let err = BackendError::Status {
            status: 409,
            message: Some("x".repeat(250)),
        };
        assert_eq!(status_detail(&err), format!("409 - {}", "x".repeat(100)));
    }
}
