use std::fmt;

use serde::{Deserialize, Serialize};

/// A single notice on the board. Identity is `id`; notices are never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub author: String,
    pub content: String,
    pub timestamp: String,
}

impl Notice {
    /// Build a notice with a fresh id and the current timestamp.
    pub fn compose(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: crate::new_notice_id(),
            author: author.into(),
            content: content.into(),
            timestamp: crate::now_timestamp(),
        }
    }
}

/// High-water mark over the row store: every notice at or before this
/// position has already been seen. `0` means never synced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub u64);

impl Cursor {
    pub const START: Cursor = Cursor(0);

    pub fn is_start(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Cursor {
    fn from(v: u64) -> Self {
        Cursor(v)
    }
}
