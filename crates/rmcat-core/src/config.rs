//! This module defines the [`ScenarioConfig`], the immutable description of one simulation run.
//!
//! Every knob the scenario needs, including the TCP defaults that would otherwise be global
//! simulator state, travels in this struct. It is built once at start-up and never mutated.

use std::str::FromStr;

use derivative::Derivative;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::constants::*;
use crate::units::{BitsPerSec, Bytes, Millisecs, Secs};

/// Scenario configuration.
#[derive(Debug, Clone, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Shape and parameters of the linear topology.
    #[builder(default)]
    pub topology: TopologyOpts,
    /// TCP stack defaults applied to every TCP flow.
    #[builder(default)]
    pub tcp: TcpDefaults,
    /// GCC rate bounds.
    #[builder(default)]
    pub gcc: GccRates,
    /// How many flows of each kind to install.
    #[builder(default)]
    pub flows: FlowCounts,
    /// The congestion control variant for adaptive flows.
    #[builder(default)]
    pub mode: CcMode,
    /// Constant bitrate of every UDP flow.
    #[builder(default = BitsPerSec::new(GCC_DEFAULT_RMAX.into_u64() / 4), setter(into))]
    pub udp_bitrate: BitsPerSec,
    /// Payload size of UDP packets, TCP sends and packetized media. Link queues always hold at
    /// least one such packet with its headers.
    #[builder(default = DEFAULT_PACKET_SIZE, setter(into))]
    pub packet_size: Bytes,
    /// Simulation stop time.
    #[builder(default = DEFAULT_END_TIME, setter(into))]
    pub end_time: Secs,
    /// First port handed out to flows.
    #[builder(default = BASE_PORT)]
    pub base_port: u16,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Linear topology options.
#[derive(Debug, Clone, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyOpts {
    /// Number of nodes in the chain. There is one link fewer.
    #[builder(default = TOPO_DEFAULT_NODES)]
    pub nr_nodes: usize,
    /// Link rate.
    #[builder(default = TOPO_DEFAULT_BW, setter(into))]
    pub bandwidth: BitsPerSec,
    /// One-way propagation delay of each link.
    #[builder(default = TOPO_DEFAULT_PDELAY, setter(into))]
    pub delay: Millisecs,
    /// Queueing delay each link buffer should hold at `bandwidth`.
    #[builder(default = TOPO_DEFAULT_QDELAY, setter(into))]
    pub queue_delay: Millisecs,
}

impl Default for TopologyOpts {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// TCP socket defaults, applied to every TCP flow of the scenario.
#[derive(Debug, Clone, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpDefaults {
    /// Segments received before an ACK is sent. Zero ACKs every segment.
    #[builder(default = 0)]
    pub del_ack_count: u32,
    /// Congestion control algorithm of the TCP stack.
    #[builder(default)]
    pub variant: TcpVariant,
    /// Maximum segment size.
    #[builder(default = DEFAULT_PACKET_SIZE, setter(into))]
    pub segment_size: Bytes,
}

impl Default for TcpDefaults {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// TCP congestion control algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
pub enum TcpVariant {
    /// NewReno.
    #[derivative(Default)]
    NewReno,
    /// CUBIC.
    Cubic,
}

/// Rate bounds of the GCC controller.
#[derive(Debug, Clone, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[serde(default)]
pub struct GccRates {
    /// Lowest rate the controller may pick.
    #[builder(default = GCC_DEFAULT_RMIN, setter(into))]
    pub min: BitsPerSec,
    /// Highest rate the controller may pick.
    #[builder(default = GCC_DEFAULT_RMAX, setter(into))]
    pub max: BitsPerSec,
    /// Starting rate.
    #[builder(default = GCC_DEFAULT_RINIT, setter(into))]
    pub init: BitsPerSec,
}

impl Default for GccRates {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Flow counts per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowCounts {
    /// Adaptive (GCC) flows.
    #[builder(default = 2)]
    pub rmcat: usize,
    /// Bulk TCP flows.
    #[builder(default = 0)]
    pub tcp: usize,
    /// Constant-rate UDP flows.
    #[builder(default = 0)]
    pub udp: usize,
}

impl Default for FlowCounts {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Congestion control variant for adaptive flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "lowercase")]
pub enum CcMode {
    /// NADA.
    Nada,
    /// Google Congestion Control.
    #[derivative(Default)]
    Gcc,
    /// VCC.
    Vcc,
}

impl CcMode {
    /// The name accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            CcMode::Nada => "nada",
            CcMode::Gcc => "gcc",
            CcMode::Vcc => "vcc",
        }
    }
}

impl std::fmt::Display for CcMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CcMode {
    type Err = ParseCcModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nada" => Ok(CcMode::Nada),
            "gcc" => Ok(CcMode::Gcc),
            "vcc" => Ok(CcMode::Vcc),
            _ => Err(ParseCcModeError(s.to_owned())),
        }
    }
}

/// Error parsing a [`CcMode`].
#[derive(Debug, thiserror::Error)]
#[error("unknown congestion control mode `{0}` (expected nada, gcc or vcc)")]
pub struct ParseCcModeError(String);
