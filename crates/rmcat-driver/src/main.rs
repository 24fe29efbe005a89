use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use rmcat_core::{CcMode, ScenarioConfig};
use rmcat_driver::LOG_TARGETS;

/// Runs adaptive, TCP and UDP flows across a four-node chain.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of RMCAT (GCC) flows [default: 2]
    #[arg(long)]
    rmcat: Option<usize>,

    /// Number of TCP flows [default: 0]
    #[arg(long)]
    tcp: Option<usize>,

    /// Number of UDP flows [default: 0]
    #[arg(long)]
    udp: Option<usize>,

    /// Turn on full logging for the scenario components
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    log: bool,

    /// Congestion control mode: nada, gcc or vcc [default: gcc]
    #[arg(long)]
    mode: Option<CcMode>,

    /// JSON scenario configuration; the options above override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to dump the scenario and run summary into
    #[arg(long)]
    dump_dir: Option<PathBuf>,
}

impl Args {
    fn scenario_config(&self) -> anyhow::Result<ScenarioConfig> {
        let mut config = match &self.config {
            Some(path) => rmcat_driver::load_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => ScenarioConfig::default(),
        };
        if let Some(rmcat) = self.rmcat {
            config.flows.rmcat = rmcat;
        }
        if let Some(tcp) = self.tcp {
            config.flows.tcp = tcp;
        }
        if let Some(udp) = self.udp {
            config.flows.udp = udp;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        Ok(config)
    }
}

/// Warnings everywhere, and everything from the scenario components if `verbose`.
fn log_builder(verbose: bool) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    if verbose {
        for target in LOG_TARGETS {
            builder.filter_module(target, LevelFilter::Trace);
        }
    }
    builder
}

fn init_logging(verbose: bool) {
    log_builder(verbose).parse_default_env().init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log);
    let config = args.scenario_config()?;

    println!("Running Simulation...");
    rmcat_driver::run(config, args.dump_dir.as_deref()).context("simulation failed")?;
    println!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use log::{Level, Log, Metadata};
    use rmcat_core::FlowCounts;

    use super::*;

    #[test]
    fn args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() -> anyhow::Result<()> {
        let args = Args::try_parse_from(["simple-example"])?;
        assert!(args.log);
        assert_eq!(args.scenario_config()?, ScenarioConfig::default());
        Ok(())
    }

    #[test]
    fn overrides() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "simple-example",
            "--rmcat",
            "1",
            "--tcp=2",
            "--udp",
            "3",
            "--log",
            "false",
            "--mode",
            "vcc",
        ])?;
        assert!(!args.log);
        let config = args.scenario_config()?;
        assert_eq!(
            config.flows,
            FlowCounts {
                rmcat: 1,
                tcp: 2,
                udp: 3
            }
        );
        assert_eq!(config.mode, CcMode::Vcc);
        Ok(())
    }

    #[test]
    fn cli_overrides_config_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, r#"{ "flows": { "rmcat": 5, "tcp": 1 }, "mode": "nada" }"#)?;
        let path = path.to_string_lossy().into_owned();
        let argv = ["simple-example", "--config", path.as_str(), "--rmcat", "0"];
        let args = Args::try_parse_from(argv)?;
        let config = args.scenario_config()?;
        assert_eq!(config.flows.rmcat, 0);
        assert_eq!(config.flows.tcp, 1);
        assert_eq!(config.mode, CcMode::Nada);
        Ok(())
    }

    fn enabled(logger: &env_logger::Logger, target: &str, level: Level) -> bool {
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn log_flag_enables_engine_traces() {
        let logger = log_builder(true).build();
        for target in LOG_TARGETS {
            assert!(enabled(&logger, target, Level::Trace), "{target}");
        }
        assert!(!enabled(&logger, "petgraph", Level::Info));
        assert!(enabled(&logger, "petgraph", Level::Warn));
    }

    #[test]
    fn quiet_logging_keeps_warnings() {
        let logger = log_builder(false).build();
        assert!(!enabled(&logger, "rmcat_core::sim", Level::Trace));
        assert!(!enabled(&logger, "rmcat_core::scenario", Level::Info));
        assert!(enabled(&logger, "rmcat_core::scenario", Level::Warn));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Args::try_parse_from(["simple-example", "--mode", "bbr"]).is_err());
    }
}
