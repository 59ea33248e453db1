//! Client sync engine: the local feed reconciled against the server.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use noticeboard_types::api::ListNoticesResponse;
use noticeboard_types::models::{Cursor, Notice};
use noticeboard_types::{MAX_CONTENT_CHARS, content_within_limit};

use crate::error::{SyncError, SyncResult};
use crate::palette::AuthorPalette;
use crate::profile::default_author_name;
use crate::render::{Feedback, NoticeStatus, NoticeView, Renderer};
use crate::store::{KEY_AUTHOR_NAME, PersistedState, StateStore, feed_entries};
use crate::transport::NoticeTransport;

pub const MSG_NOTHING_NEW: &str = "No new notices available.";
pub const MSG_LOAD_FAILED: &str = "Failed to load notices. Please try again later.";
pub const MSG_POST_FAILED: &str = "Failed to post notice. Please try again later.";
pub const MSG_NAME_REQUIRED: &str = "Please enter your name.";
pub const MSG_CONTENT_REQUIRED: &str = "Please enter a notice.";

fn too_long_message() -> String {
    format!(
        "Notice content exceeds {} characters. Please split it into multiple posts.",
        MAX_CONTENT_CHARS
    )
}

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The server had nothing after our cursor.
    Empty { cursor: Cursor },
    /// Rows arrived; `duplicates` were already in the feed.
    Merged {
        added: usize,
        duplicates: usize,
        cursor: Cursor,
    },
    /// Another poll was still in flight.
    Skipped,
}

struct FeedState {
    /// Local cache, in feed order.
    notices: Vec<Notice>,
    /// Dedup index: ids already materialized in the feed.
    seen: HashSet<String>,
    /// Optimistic posts awaiting the server.
    pending: HashSet<String>,
    cursor: Cursor,
    author_name: String,
    palette: AuthorPalette,
    restored: bool,
}

fn view_of<'a>(
    notice: &'a Notice,
    palette: &mut AuthorPalette,
    author_name: &str,
    status: NoticeStatus,
) -> NoticeView<'a> {
    NoticeView {
        notice,
        color: palette.color_for(&notice.author),
        own: notice.author == author_name,
        status,
    }
}

/// Resets the in-flight flag when a poll finishes or is dropped.
struct PollFlight<'a>(&'a AtomicBool);

impl<'a> PollFlight<'a> {
    fn start(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PollFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the local view of the board and keeps it in step with the server.
///
/// All feed state sits behind one lock that is never held across a network
/// call, so every check-then-update of the dedup index is a single step no
/// matter how poll and post completions interleave.
pub struct SyncEngine<T, R, S> {
    transport: T,
    renderer: R,
    store: S,
    state: Mutex<FeedState>,
    polling: AtomicBool,
}

impl<T: NoticeTransport, R: Renderer, S: StateStore> SyncEngine<T, R, S> {
    /// Load saved state from `store`. Nothing is rendered until
    /// [`SyncEngine::restore`].
    pub fn new(transport: T, renderer: R, store: S) -> Self {
        let saved = PersistedState::load(&store);

        let author_name = match saved.author_name {
            Some(name) => name,
            None => {
                let name = default_author_name();
                if let Err(e) = store.put(KEY_AUTHOR_NAME, Value::from(name.clone())) {
                    warn!("Failed to save author name: {}", e);
                }
                name
            }
        };

        info!(
            "Loaded {} cached notices at cursor {} for {}",
            saved.notices.len(),
            saved.cursor,
            author_name
        );

        let seen = saved.notices.iter().map(|n| n.id.clone()).collect();
        Self {
            transport,
            renderer,
            store,
            state: Mutex::new(FeedState {
                notices: saved.notices,
                seen,
                pending: HashSet::new(),
                cursor: saved.cursor,
                author_name,
                palette: AuthorPalette::default(),
                restored: false,
            }),
            polling: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cursor(&self) -> Cursor {
        self.state.lock().cursor
    }

    /// Snapshot of the local cache.
    pub fn notices(&self) -> Vec<Notice> {
        self.state.lock().notices.clone()
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.state.lock().seen.contains(id)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.state.lock().pending.contains(id)
    }

    pub fn author_name(&self) -> String {
        self.state.lock().author_name.clone()
    }

    pub fn set_author_name(&self, name: &str) -> SyncResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.reject_locally(MSG_NAME_REQUIRED.to_string()));
        }
        let mut state = self.state.lock();
        state.author_name = name.to_string();
        self.store.put(KEY_AUTHOR_NAME, Value::from(name))
    }

    /// Render the cached feed. Only the first call draws anything.
    ///
    /// A poll or post made first draws the cache itself, so cached notices
    /// always come before anything newer.
    pub fn restore(&self) -> usize {
        let mut state = self.state.lock();
        self.ensure_restored(&mut state)
    }

    fn ensure_restored(&self, state: &mut FeedState) -> usize {
        if state.restored {
            return 0;
        }
        state.restored = true;

        let FeedState {
            notices,
            author_name,
            palette,
            ..
        } = state;
        for notice in notices.iter() {
            self.renderer
                .add_notice(view_of(notice, palette, author_name, NoticeStatus::Confirmed));
        }
        notices.len()
    }

    /// Fetch everything after the current cursor and merge it into the feed.
    ///
    /// At most one poll is in flight at a time; a call made meanwhile
    /// returns [`PollOutcome::Skipped`] without touching the network. A
    /// failed request leaves the feed and cursor exactly as they were.
    pub async fn poll(&self) -> SyncResult<PollOutcome> {
        let Some(_flight) = PollFlight::start(&self.polling) else {
            debug!("Poll already in flight; skipping");
            return Ok(PollOutcome::Skipped);
        };

        let cursor = self.cursor();
        let response = match self.transport.list(cursor).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Poll from cursor {} failed: {}", cursor, e);
                self.renderer
                    .show_message(&Feedback::error(MSG_LOAD_FAILED));
                return Err(e);
            }
        };

        Ok(self.apply_batch(response))
    }

    /// Merge one `list` response. Applying the same response twice is a
    /// no-op the second time.
    pub fn apply_batch(&self, response: ListNoticesResponse) -> PollOutcome {
        let was_empty = response.rows.is_empty();
        let mut state = self.state.lock();
        self.ensure_restored(&mut state);
        let FeedState {
            notices,
            seen,
            pending,
            cursor,
            author_name,
            palette,
            ..
        } = &mut *state;

        let mut added = 0;
        let mut duplicates = 0;
        for row in response.rows {
            let notice = Notice::from(row);

            // Own echo arriving before the append call returned: the server
            // has it, so it is confirmed already.
            if pending.remove(&notice.id) {
                self.renderer.mark_confirmed(&notice.id);
                duplicates += 1;
                continue;
            }

            if !seen.insert(notice.id.clone()) {
                duplicates += 1;
                continue;
            }

            self.renderer
                .add_notice(view_of(&notice, palette, author_name, NoticeStatus::Confirmed));
            notices.push(notice);
            added += 1;
        }

        let previous = *cursor;
        if response.last_row_number >= previous {
            *cursor = response.last_row_number;
        } else {
            debug!(
                "Ignoring cursor {} behind {}",
                response.last_row_number, previous
            );
        }

        if added > 0 || *cursor != previous {
            self.persist_feed(notices, *cursor);
        }
        let cursor = *cursor;
        drop(state);

        if was_empty {
            self.renderer.show_message(&Feedback::info(MSG_NOTHING_NEW));
            return PollOutcome::Empty { cursor };
        }

        debug!(
            "Merged {} new notices ({} already shown), cursor {}",
            added, duplicates, cursor
        );
        PollOutcome::Merged {
            added,
            duplicates,
            cursor,
        }
    }

    /// Post a notice optimistically.
    ///
    /// The notice shows up as pending right away and the compose field is
    /// cleared. If the server refuses it or the request fails, it is taken
    /// back out of the feed and `content` is put back in the compose field.
    /// There is no automatic retry.
    pub async fn post_notice(&self, author: &str, content: &str) -> SyncResult<Notice> {
        let trimmed_author = author.trim();
        let trimmed_content = content.trim();

        if trimmed_author.is_empty() {
            return Err(self.reject_locally(MSG_NAME_REQUIRED.to_string()));
        }
        if trimmed_content.is_empty() {
            return Err(self.reject_locally(MSG_CONTENT_REQUIRED.to_string()));
        }
        if !content_within_limit(trimmed_content) {
            return Err(self.reject_locally(too_long_message()));
        }

        let notice = Notice::compose(trimmed_author, trimmed_content);
        {
            let mut state = self.state.lock();
            self.ensure_restored(&mut state);
            let FeedState {
                notices,
                seen,
                pending,
                author_name,
                palette,
                ..
            } = &mut *state;

            if author_name.as_str() != trimmed_author {
                *author_name = trimmed_author.to_string();
            }
            seen.insert(notice.id.clone());
            pending.insert(notice.id.clone());
            self.renderer
                .add_notice(view_of(&notice, palette, author_name, NoticeStatus::Pending));
            notices.push(notice.clone());
            self.renderer.set_input("");
            self.persist_all(&state);
        }

        debug!("Posting notice {}", notice.id);
        let result = self.transport.append(&notice).await;

        let mut state = self.state.lock();
        let still_pending = state.pending.remove(&notice.id);

        match result {
            Ok(()) => {
                if still_pending {
                    self.renderer.mark_confirmed(&notice.id);
                }
                info!("Notice {} confirmed", notice.id);
                self.persist_feed(&state.notices, state.cursor);
                Ok(notice)
            }
            Err(e) if !still_pending => {
                // A poll already returned it, so the server has it.
                info!(
                    "Notice {} already echoed by the server; ignoring: {}",
                    notice.id, e
                );
                Ok(notice)
            }
            Err(e) => {
                state.seen.remove(&notice.id);
                state.notices.retain(|n| n.id != notice.id);
                self.renderer.remove_notice(&notice.id);
                self.renderer.set_input(content);

                let text = match &e {
                    SyncError::Rejected(msg) => msg.clone(),
                    _ => MSG_POST_FAILED.to_string(),
                };
                self.renderer.show_message(&Feedback::error(text));
                warn!("Notice {} retracted: {}", notice.id, e);

                self.persist_feed(&state.notices, state.cursor);
                Err(e)
            }
        }
    }

    fn reject_locally(&self, text: String) -> SyncError {
        self.renderer.show_message(&Feedback::warning(text.clone()));
        SyncError::Validation(text)
    }

    fn persist_feed(&self, notices: &[Notice], cursor: Cursor) {
        let result = feed_entries(notices, cursor)
            .and_then(|entries| self.store.put_many(entries));
        if let Err(e) = result {
            warn!("Failed to save local state: {}", e);
        }
    }

    fn persist_all(&self, state: &FeedState) {
        let result = feed_entries(&state.notices, state.cursor).and_then(|mut entries| {
            entries.push((KEY_AUTHOR_NAME, Value::from(state.author_name.clone())));
            self.store.put_many(entries)
        });
        if let Err(e) = result {
            warn!("Failed to save local state: {}", e);
        }
    }
}

/// Poll once immediately, then every `every`. Ticks missed while a poll
/// was slow are skipped rather than bunched up.
pub async fn run_poll_loop<T, R, S>(engine: Arc<SyncEngine<T, R, S>>, every: Duration)
where
    T: NoticeTransport,
    R: Renderer,
    S: StateStore,
{
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        match engine.poll().await {
            Ok(outcome) => debug!("Poll: {:?}", outcome),
            Err(e) if e.is_transient() => debug!("Poll failed, will retry next tick: {}", e),
            Err(e) => warn!("Poll error: {}", e),
        }
    }
}
