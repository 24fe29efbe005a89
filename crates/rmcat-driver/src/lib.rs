//! Loading scenario configurations and running them end to end.

use std::path::{Path, PathBuf};

use rmcat_core::{sim, RunSummary, Scenario, ScenarioConfig, ScenarioError};
use rmcat_export::ScenarioExport;

/// Log targets that `--log` turns up to trace.
pub const LOG_TARGETS: [&str; 5] = [
    "rmcat_core::network",
    "rmcat_core::install",
    "rmcat_core::scenario",
    "rmcat_core::sim",
    "rmcat_export",
];

/// Reads a [`ScenarioConfig`] from a JSON file. Missing fields take their defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<ScenarioConfig, Error> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents)?,
        _ => return Err(Error::UnknownFileType(path.into())),
    };
    Ok(config)
}

/// Builds the scenario described by `config`, simulates it to its end time and, if `dump_dir`
/// is given, writes the scenario and the run summary there.
pub fn run(config: ScenarioConfig, dump_dir: Option<&Path>) -> Result<RunSummary, Error> {
    let scenario = Scenario::build(config)?;
    let export = dump_dir.map(|dir| {
        ScenarioExport::builder()
            .data_dir(dir)
            .scenario(&scenario)
            .build()
    });
    if let Some(export) = &export {
        export.write()?;
    }
    let summary = sim::run(&scenario);
    log::info!(
        "simulation finished at {}: {} events, {} drops",
        summary.end,
        summary.events,
        summary.total_dropped()
    );
    if let Some(export) = &export {
        export.write_summary(&summary)?;
    }
    Ok(summary)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown file type for {0}")]
    UnknownFileType(PathBuf),

    #[error("failed to build scenario")]
    Scenario(#[from] ScenarioError),

    #[error("failed to export scenario")]
    Export(#[from] rmcat_export::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
