use serde::{Deserialize, Serialize};

use crate::models::{Cursor, Notice};

// -- Actions --

pub const ACTION_GET_NOTICES: &str = "getNotices";
pub const ACTION_POST_NOTICE: &str = "postNotice";

/// Query string carried by every request: `?action=...&lastRowNumber=...`.
///
/// Values stay as raw strings so malformed input can be reported as a
/// validation error in the usual JSON shape instead of an extractor rejection.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionQuery {
    pub action: Option<String>,
    pub last_row_number: Option<String>,
}

// -- List --

/// One notice on the wire: `[id, author, content, timestamp]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRow(pub String, pub String, pub String, pub String);

impl From<Notice> for NoticeRow {
    fn from(n: Notice) -> Self {
        NoticeRow(n.id, n.author, n.content, n.timestamp)
    }
}

impl From<NoticeRow> for Notice {
    fn from(NoticeRow(id, author, content, timestamp): NoticeRow) -> Self {
        Notice {
            id,
            author,
            content,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNoticesResponse {
    pub rows: Vec<NoticeRow>,
    pub last_row_number: Cursor,
}

// -- Post --

/// Form-encoded body of `postNotice`. `id` and `timestamp` are filled in by
/// the server when the caller leaves them out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostNoticeForm {
    pub id: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub timestamp: Option<String>,
}

impl From<&Notice> for PostNoticeForm {
    fn from(n: &Notice) -> Self {
        Self {
            id: Some(n.id.clone()),
            author: Some(n.author.clone()),
            content: Some(n.content.clone()),
            timestamp: Some(n.timestamp.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PostOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}
