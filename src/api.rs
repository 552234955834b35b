//! HTTP API and chat page

mod assets;
mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::TurnRunner;
use crate::session::SessionStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub runner: Arc<TurnRunner>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionStore>, runner: TurnRunner) -> Self {
        Self {
            sessions,
            runner: Arc::new(runner),
        }
    }
}
