//! HTTP transport speaking the board's action protocol.

use std::time::Duration;

use noticeboard_types::api::{
    ACTION_GET_NOTICES, ACTION_POST_NOTICE, ListNoticesResponse, PostNoticeForm, PostOutcome,
};
use noticeboard_types::models::{Cursor, Notice};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::NoticeTransport;

/// Shown when the server refuses a post without saying why.
pub const POST_FAILED_FALLBACK: &str = "Failed to post notice.";

/// `reqwest`-backed [`NoticeTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> SyncResult<Self> {
        Self::new(config.base_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn transport_err(e: reqwest::Error) -> SyncError {
    SyncError::Transport(e.to_string())
}

impl NoticeTransport for HttpTransport {
    async fn list(&self, cursor: Cursor) -> SyncResult<ListNoticesResponse> {
        let last_row_number = cursor.to_string();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("action", ACTION_GET_NOTICES),
                ("lastRowNumber", last_row_number.as_str()),
            ])
            .send()
            .await
            .map_err(transport_err)?
            .error_for_status()
            .map_err(transport_err)?;

        let body: ListNoticesResponse = resp.json().await.map_err(transport_err)?;
        debug!(
            "getNotices({}) -> {} rows, cursor {}",
            cursor,
            body.rows.len(),
            body.last_row_number
        );
        Ok(body)
    }

    async fn append(&self, notice: &Notice) -> SyncResult<()> {
        let resp = self
            .client
            .post(&self.base_url)
            .query(&[("action", ACTION_POST_NOTICE)])
            .form(&PostNoticeForm::from(notice))
            .send()
            .await
            .map_err(transport_err)?;

        let status = resp.status();
        let text = resp.text().await.map_err(transport_err)?;

        // Refusals carry a JSON outcome even on 4xx; only an unreadable body
        // is treated as a transport failure.
        match serde_json::from_str::<PostOutcome>(&text) {
            Ok(outcome) if outcome.success => Ok(()),
            Ok(outcome) => Err(SyncError::Rejected(
                outcome.error.unwrap_or_else(|| POST_FAILED_FALLBACK.to_string()),
            )),
            Err(_) if !status.is_success() => Err(SyncError::Transport(format!(
                "HTTP error! status: {}",
                status
            ))),
            Err(e) => Err(SyncError::Transport(format!("malformed response: {}", e))),
        }
    }
}
