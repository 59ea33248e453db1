use noticeboard_types::models::Notice;

/// A stored notice together with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeRecord {
    pub row_number: u64,
    pub notice: Notice,
}

/// Result of an append attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendResult {
    Appended { row_number: u64 },
    /// A row with this id already exists; nothing was written.
    DuplicateId,
}

/// A slice of the log plus the cursor a client should adopt after reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeBatch {
    pub notices: Vec<Notice>,
    pub cursor: u64,
}
