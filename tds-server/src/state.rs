use std::sync::Arc;

use tds_core::SectionRepository;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn SectionRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn SectionRepository>) -> Self {
        Self { repo }
    }
}
