//! Service information and health handlers.

use axum::{extract::State, Json};
use csvw_annotator::inference::UnitIndexStats;
use serde::Serialize;

use crate::server::state::AppState;

/// Response for the info endpoint.
#[derive(Serialize)]
pub struct InfoResponse {
    pub app_name: String,
    pub app_version: String,
    pub admin_mail: String,
    pub app_mode: String,
    /// Loaded unit vocabulary.
    pub units: UnitIndexStats,
}

/// Report service settings.
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    let settings = &state.settings;
    Json(InfoResponse {
        app_name: settings.app_name.clone(),
        app_version: settings.app_version.clone(),
        admin_mail: settings.admin_mail.clone(),
        app_mode: settings.app_mode.clone(),
        units: state.units.stats(),
    })
}

pub async fn health() -> &'static str {
    "OK"
}
