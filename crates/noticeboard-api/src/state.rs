use std::sync::Arc;

use noticeboard_db::Database;
use noticeboard_types::FIRST_LOAD_LIMIT;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Rows handed to a client that has never synced.
    pub first_load_limit: u32,
}

impl AppStateInner {
    pub fn new(db: Database) -> AppState {
        Arc::new(Self {
            db,
            first_load_limit: FIRST_LOAD_LIMIT,
        })
    }
}
