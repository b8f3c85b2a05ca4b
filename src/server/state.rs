use std::sync::Arc;

use crate::model::VitalsModel;

/// Shared application state for request handlers
///
/// The model is loaded once before the router is built and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<VitalsModel>,
}

impl AppState {
    pub fn new(model: VitalsModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }
}
