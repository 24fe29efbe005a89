#![warn(unreachable_pub, missing_debug_implementations)]

//! The core RMCAT scenario library. This crate builds [a linear topology](Network::linear),
//! [schedules](flows::schedule) adaptive, TCP and UDP flows across it, installs their
//! applications into a [`Scenario`] and [simulates](sim::run) the result.

#[macro_use]
mod ident;

pub mod apps;
pub mod config;
pub mod constants;
pub mod flows;
pub mod install;
pub mod network;
pub mod scenario;
pub mod sim;
pub mod units;

#[doc(hidden)]
pub mod testing;

pub use apps::{AppId, AppKind, Application, Applications};
pub use config::{CcMode, FlowCounts, ScenarioConfig, TopologyOpts};
pub use flows::{FlowDesc, FlowId, FlowKind, FlowPorts};
pub use network::{Link, LinkId, Network, Node, NodeId, TopologyError};
pub use scenario::{Scenario, ScenarioError};
pub use sim::{RunSummary, Simulator};
