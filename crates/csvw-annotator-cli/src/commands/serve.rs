//! Serve command - run the HTTP annotation service.

use std::sync::Arc;

use colored::Colorize;
use csvw_annotator::UnitIndex;

use super::CommandResult;
use crate::cli::Settings;
use crate::server::{app, state::AppState};

pub fn run(units: Arc<UnitIndex>, settings: Settings) -> CommandResult {
    let port = settings.port;

    println!(
        "{} {} {}",
        "Starting".cyan().bold(),
        settings.app_name.white(),
        settings.app_version.dimmed()
    );
    println!("  POST http://localhost:{}/api", port);
    println!("  GET  http://localhost:{}/info", port);
    println!();
    println!("Press {} to stop", "Ctrl+C".yellow());

    let state = AppState::new(units, settings);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run_server(state, port))
}
