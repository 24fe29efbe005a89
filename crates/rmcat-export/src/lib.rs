//! Plain-text dumps of a built scenario and the summary of its run.
//!
//! The formats are line-oriented and whitespace-separated so that they can be loaded by the
//! analysis scripts that post-process rmcat runs.

#![warn(unreachable_pub, missing_debug_implementations, missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use rmcat_core::{
    apps::Application, flows::FlowDesc, network::Link, sim::RunSummary, Network, Scenario,
};

/// A scenario dump.
#[derive(Debug, typed_builder::TypedBuilder)]
pub struct ScenarioExport<'a> {
    /// The directory in which to write the dump.
    #[builder(setter(into))]
    pub data_dir: PathBuf,
    /// The scenario to dump.
    pub scenario: &'a Scenario,
}

impl ScenarioExport<'_> {
    /// Writes `topology.txt`, `flows.txt` and `apps.txt` into the data directory, creating it if
    /// needed.
    pub fn write(&self) -> Result<(), Error> {
        fs::create_dir_all(&self.data_dir)?;

        let topology = translate_topology(self.scenario.network());
        fs::write(self.path("topology.txt"), topology)?;

        let flows = translate_flows(self.scenario.flows());
        fs::write(self.path("flows.txt"), flows)?;

        let apps = translate_apps(self.scenario.apps().iter());
        fs::write(self.path("apps.txt"), apps)?;

        log::info!("scenario written to {}", self.data_dir.display());
        Ok(())
    }

    /// Writes `summary` as `summary.json` into the data directory.
    pub fn write_summary(&self, summary: &RunSummary) -> Result<(), Error> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.path("summary.json");
        let s = serde_json::to_string_pretty(summary)?;
        fs::write(&path, s)?;
        log::info!("run summary written to {}", path.display());
        Ok(())
    }

    fn path(&self, file: impl AsRef<Path>) -> PathBuf {
        self.data_dir.join(file)
    }
}

/// The error type for [`ScenarioExport`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error serializing the run summary.
    #[error("failed to serialize run summary")]
    Json(#[from] serde_json::Error),
}

fn translate_topology(network: &Network) -> String {
    // First line: node #, link #
    // a0 b0 rate delay queue addr_a addr_b
    // a1 b1 rate delay queue addr_a addr_b
    // ...
    let header = format!("{} {}", network.nr_nodes(), network.nr_links());
    let lines = std::iter::once(header)
        .chain(network.links().map(translate_link))
        .collect::<Vec<_>>();
    lines.join("\n")
}

fn translate_link(link: &Link) -> String {
    let (addr_a, addr_b) = match link.block {
        Some(block) => (block.host(1).to_string(), block.host(2).to_string()),
        None => ("-".to_owned(), "-".to_owned()),
    };
    format!(
        "{} {} {} {} {} {} {}",
        link.a, link.b, link.bandwidth, link.delay, link.queue.max_bytes, addr_a, addr_b
    )
}

fn translate_flows(flows: &[FlowDesc]) -> String {
    // First line: # of flows
    // id0 kind0 src0 dst0 ports0 start0 stop0
    // ...
    let lines = std::iter::once(flows.len().to_string())
        .chain(flows.iter().map(|f| {
            format!(
                "{} {} {} {} {} {} {}",
                f.id, f.kind, f.src, f.dst, f.ports, f.start, f.stop
            )
        }))
        .collect::<Vec<_>>();
    lines.join("\n")
}

fn translate_apps<'a>(apps: impl Iterator<Item = &'a Application>) -> String {
    // id node flow kind local_port dest start stop
    apps.map(|app| {
        let port = app
            .kind
            .local_port()
            .map_or_else(|| "-".to_owned(), |p| p.to_string());
        let dest = app
            .kind
            .dest()
            .map_or_else(|| "-".to_owned(), |d| d.to_string());
        format!(
            "{} {} {} {} {} {} {} {}",
            app.id,
            app.node,
            app.flow,
            app.kind.name(),
            port,
            dest,
            app.start,
            app.stop
        )
    })
    .collect::<Vec<_>>()
    .join("\n")
}
