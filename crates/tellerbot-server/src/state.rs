use std::sync::Arc;

use tellerbot_core::Orchestrator;

/// Shared application state accessible from all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}
