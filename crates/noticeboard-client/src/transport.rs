//! Transport layer abstraction for board requests.

use std::future::Future;

use noticeboard_types::api::ListNoticesResponse;
use noticeboard_types::models::{Cursor, Notice};

use crate::error::SyncResult;

/// Carries the two board operations to a server.
///
/// These are the only suspension points of the sync engine. Timeouts are the
/// transport's business: a timed-out call simply resolves to
/// [`SyncError::Transport`](crate::SyncError::Transport).
pub trait NoticeTransport: Send + Sync {
    /// Fetch notices after `cursor` along with the cursor to adopt.
    fn list(&self, cursor: Cursor) -> impl Future<Output = SyncResult<ListNoticesResponse>> + Send;

    /// Append one notice. `Ok(())` means the server stored it; a
    /// `{success: false}` answer becomes [`SyncError::Rejected`](crate::SyncError::Rejected).
    fn append(&self, notice: &Notice) -> impl Future<Output = SyncResult<()>> + Send;
}
