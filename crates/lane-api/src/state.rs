//! Application state.
//!
//! The storage backend is constructed exactly once at bootstrap and injected
//! here; every handler shares the same `Arc<dyn Storage>` for the process
//! lifetime. The provider carries no per-request state, so concurrent
//! requests cannot interfere.

use lane_core::Config;
use lane_storage::Storage;
use std::sync::Arc;

/// Main application state, passed to handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: Config,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
