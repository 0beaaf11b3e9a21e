use granary::SearchEngine;
use std::time::Duration;

pub mod health;
pub mod search;

pub struct AppState {
    pub engine: SearchEngine,
    /// Wall-clock budget for one search, including time queued for a
    /// blocking thread.
    pub query_timeout: Duration,
}

pub use health::health;
pub use search::{not_found, search};
