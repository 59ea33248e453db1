//! Client for a shared noticeboard.
//!
//! A [`SyncEngine`] keeps a local copy of the board in step with the server:
//!
//! - polls fetch only what is newer than the last seen row number
//! - posts appear immediately as pending and are retracted if the server
//!   refuses them
//! - every notice is shown at most once, however responses interleave
//! - the cache, cursor and author name survive restarts through a
//!   [`StateStore`]
//!
//! The network and presentation sit behind the [`NoticeTransport`] and
//! [`Renderer`] traits; [`HttpTransport`] and [`FeedView`] are the stock
//! implementations.

mod config;
mod engine;
mod error;
mod http;
mod palette;
mod profile;
mod render;
mod store;
mod transport;

pub use config::{ClientConfig, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT};
pub use engine::{
    MSG_CONTENT_REQUIRED, MSG_LOAD_FAILED, MSG_NAME_REQUIRED, MSG_NOTHING_NEW, MSG_POST_FAILED,
    PollOutcome, SyncEngine, run_poll_loop,
};
pub use error::{SyncError, SyncResult};
pub use http::{HttpTransport, POST_FAILED_FALLBACK};
pub use palette::{AUTHOR_COLORS, AuthorPalette};
pub use profile::default_author_name;
pub use render::{
    FEEDBACK_TTL, FeedEntry, FeedView, Feedback, FeedbackLevel, NoticeStatus, NoticeView, Renderer,
};
pub use store::{
    FileStore, KEY_AUTHOR_NAME, KEY_LAST_ROW_NUMBER, KEY_NOTICES, MemoryStore, PersistedState,
    StateStore, feed_entries,
};
pub use transport::NoticeTransport;
