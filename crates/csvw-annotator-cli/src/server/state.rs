//! Application state for the web server.

use std::sync::Arc;

use csvw_annotator::{Annotator, AnnotatorConfig, UnitIndex};

use crate::cli::Settings;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Read-only unit vocabulary shared by every request.
    pub units: Arc<UnitIndex>,
    /// Service settings reported by `/info`.
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(units: Arc<UnitIndex>, settings: Settings) -> Self {
        Self {
            units,
            settings: Arc::new(settings),
        }
    }

    /// A fresh annotator for one request.
    pub fn annotator(&self, config: AnnotatorConfig) -> Annotator {
        Annotator::new(self.units.clone()).with_config(config)
    }
}
