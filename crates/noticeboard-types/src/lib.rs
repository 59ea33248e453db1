pub mod api;
pub mod models;

/// Maximum notice length, counted in characters rather than bytes.
pub const MAX_CONTENT_CHARS: usize = 1000;

/// How many of the most recent notices a never-synced client receives.
pub const FIRST_LOAD_LIMIT: u32 = 100;

/// Timestamp layout shared by client-generated and server-generated notices.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Fresh opaque notice id.
pub fn new_notice_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// True when `content` fits within [`MAX_CONTENT_CHARS`].
pub fn content_within_limit(content: &str) -> bool {
    content.chars().count() <= MAX_CONTENT_CHARS
}
