//! Presentation seam: what the engine asks of whatever draws the board.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use noticeboard_types::models::Notice;

/// How long a transient message stays visible.
pub const FEEDBACK_TTL: Duration = Duration::from_secs(30);

/// Lifecycle of a notice as shown in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStatus {
    /// Posted locally, server has not confirmed yet.
    Pending,
    /// Stored on the server.
    Confirmed,
}

/// Everything a renderer needs to draw one notice.
#[derive(Debug, Clone, Copy)]
pub struct NoticeView<'a> {
    pub notice: &'a Notice,
    pub color: &'static str,
    /// Written under the current author name.
    pub own: bool,
    pub status: NoticeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackLevel {
    Info,
    Warning,
    Error,
}

/// A transient, auto-dismissing message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub text: String,
    pub level: FeedbackLevel,
    pub ttl: Duration,
}

impl Feedback {
    fn new(level: FeedbackLevel, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level,
            ttl: FEEDBACK_TTL,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(FeedbackLevel::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(FeedbackLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(FeedbackLevel::Error, text)
    }
}

/// Rendering capability the sync engine drives.
///
/// Calls arrive in feed order and are never made while a network request
/// is outstanding on the same notice.
pub trait Renderer: Send + Sync {
    /// Append a notice to the bottom of the feed.
    fn add_notice(&self, view: NoticeView<'_>);

    /// A pending notice was stored by the server.
    fn mark_confirmed(&self, id: &str);

    /// Take a retracted notice out of the feed.
    fn remove_notice(&self, id: &str);

    /// Replace the content of the compose field.
    fn set_input(&self, content: &str);

    fn show_message(&self, feedback: &Feedback);
}

impl<R: Renderer + ?Sized> Renderer for Arc<R> {
    fn add_notice(&self, view: NoticeView<'_>) {
        (**self).add_notice(view)
    }

    fn mark_confirmed(&self, id: &str) {
        (**self).mark_confirmed(id)
    }

    fn remove_notice(&self, id: &str) {
        (**self).remove_notice(id)
    }

    fn set_input(&self, content: &str) {
        (**self).set_input(content)
    }

    fn show_message(&self, feedback: &Feedback) {
        (**self).show_message(feedback)
    }
}

/// One line of a [`FeedView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub notice: Notice,
    pub color: &'static str,
    pub own: bool,
    pub status: NoticeStatus,
}

/// Headless renderer that keeps the visible feed in memory.
#[derive(Debug, Default)]
pub struct FeedView {
    entries: Mutex<Vec<FeedEntry>>,
    input: Mutex<String>,
    messages: Mutex<Vec<Feedback>>,
}

impl FeedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<FeedEntry> {
        self.entries.lock().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.notice.id.clone())
            .collect()
    }

    pub fn status_of(&self, id: &str) -> Option<NoticeStatus> {
        self.entries
            .lock()
            .iter()
            .find(|e| e.notice.id == id)
            .map(|e| e.status)
    }

    pub fn input(&self) -> String {
        self.input.lock().clone()
    }

    pub fn messages(&self) -> Vec<Feedback> {
        self.messages.lock().clone()
    }

    pub fn last_message(&self) -> Option<Feedback> {
        self.messages.lock().last().cloned()
    }
}

impl Renderer for FeedView {
    fn add_notice(&self, view: NoticeView<'_>) {
        self.entries.lock().push(FeedEntry {
            notice: view.notice.clone(),
            color: view.color,
            own: view.own,
            status: view.status,
        });
    }

    fn mark_confirmed(&self, id: &str) {
        if let Some(entry) = self
            .entries
            .lock()
            .iter_mut()
            .find(|e| e.notice.id == id)
        {
            entry.status = NoticeStatus::Confirmed;
        }
    }

    fn remove_notice(&self, id: &str) {
        self.entries.lock().retain(|e| e.notice.id != id);
    }

    fn set_input(&self, content: &str) {
        *self.input.lock() = content.to_string();
    }

    fn show_message(&self, feedback: &Feedback) {
        self.messages.lock().push(feedback.clone());
    }
}
