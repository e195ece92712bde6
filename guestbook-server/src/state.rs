//! Application state shared across handlers

use std::sync::Arc;

use crate::db::ConnectionManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    manager: ConnectionManager,
}

impl AppState {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            inner: Arc::new(AppStateInner { manager }),
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.inner.manager
    }
}
