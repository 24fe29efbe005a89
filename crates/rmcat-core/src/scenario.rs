//! This module defines the [`Scenario`], the arena that owns the network, the flow schedule and
//! every installed application of one run.

use crate::apps::{AppId, AppKind, Applications};
use crate::config::{CcMode, ScenarioConfig};
use crate::constants::IPV4_UDP_OVERHEAD;
use crate::flows::{self, FlowDesc, FlowId, FlowKind, PortAllocator, PortsExhausted};
use crate::install;
use crate::network::{Network, NodeId, TopologyError};
use crate::units::Secs;

/// A fully wired scenario, ready to be [simulated](crate::sim::Simulator).
#[derive(Debug, Clone)]
pub struct Scenario {
    config: ScenarioConfig,
    network: Network,
    flows: Vec<FlowDesc>,
    apps: Applications,
}

impl Scenario {
    /// Builds the topology described by `config` and installs every configured flow.
    ///
    /// Flows run from the first node of the chain to the last. Adaptive flows are installed
    /// first, then TCP, then UDP; ports are handed out sequentially from `config.base_port` in
    /// that order.
    pub fn build(config: ScenarioConfig) -> Result<Self, ScenarioError> {
        let mut scenario = Self::empty(config)?;
        let src = NodeId::ZERO;
        let dst = NodeId::new(scenario.network.nr_nodes() - 1);
        let mut ports = PortAllocator::new(scenario.config.base_port);
        let flows = flows::schedule(
            &scenario.config.flows,
            src,
            dst,
            scenario.config.end_time,
            &mut ports,
        )?;
        for flow in &flows {
            scenario.install(flow)?;
        }
        scenario.flows = flows;
        log::info!(
            "scenario ready: {} flows, {} applications, {} routes",
            scenario.flows.len(),
            scenario.apps.len(),
            scenario.network.nr_routes()
        );
        Ok(scenario)
    }

    /// Builds the topology described by `config` without installing any flows.
    pub fn empty(config: ScenarioConfig) -> Result<Self, ScenarioError> {
        let max_packet = config.packet_size + IPV4_UDP_OVERHEAD;
        let network = Network::linear(&config.topology, max_packet)?;
        Ok(Self {
            config,
            network,
            flows: Vec::new(),
            apps: Applications::default(),
        })
    }

    fn install(&mut self, flow: &FlowDesc) -> Result<(), ScenarioError> {
        match flow.kind {
            FlowKind::Adaptive => match self.config.mode {
                CcMode::Gcc => {
                    install::install_gcc(self, flow)?;
                }
                mode => {
                    // The ports stay allocated so later flows keep their numbers.
                    log::warn!(
                        "flow {}: mode `{}` has no adaptive application, skipping",
                        flow.id,
                        mode
                    );
                }
            },
            FlowKind::Tcp => {
                install::install_tcp(self, flow)?;
            }
            FlowKind::Udp => {
                let (bitrate, packet_size) = (self.config.udp_bitrate, self.config.packet_size);
                install::install_udp(self, flow, bitrate, packet_size)?;
            }
        }
        Ok(())
    }

    pub(crate) fn add_app(&mut self, node: NodeId, flow: &FlowDesc, kind: AppKind) -> AppId {
        self.apps.push(node, flow.id, kind, flow.start, flow.stop)
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn flows(&self) -> &[FlowDesc] {
        &self.flows
    }

    pub fn apps(&self) -> &Applications {
        &self.apps
    }

    pub fn end_time(&self) -> Secs {
        self.config.end_time
    }
}

/// Error building a [`Scenario`].
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The topology is invalid.
    #[error("invalid topology")]
    InvalidTopology(#[from] TopologyError),

    /// A flow references a node that does not exist.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    /// A flow endpoint has no address to target.
    #[error("node {0} has no address")]
    NoAddress(NodeId),

    /// A flow's ports do not fit its kind.
    #[error("flow {0} has the wrong number of ports for its kind")]
    PortMismatch(FlowId),

    /// The port allocator ran past the top of the port range.
    #[error(transparent)]
    PortsExhausted(#[from] PortsExhausted),
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::net::{Ipv4Addr, SocketAddrV4};

    use super::*;
    use crate::apps::GccApp;
    use crate::config::TopologyOpts;
    use crate::testing;

    #[test]
    fn two_adaptive_flows_make_two_peer_pairs() -> anyhow::Result<()> {
        let scenario = Scenario::build(testing::config_with_flows(2, 0, 0))?;
        assert_eq!(scenario.apps().len(), 4);
        let gcc = scenario
            .apps()
            .iter()
            .map(|app| match &app.kind {
                AppKind::Gcc(gcc) => Ok((app.node, gcc.clone())),
                other => Err(anyhow::anyhow!("unexpected application {other:?}")),
            })
            .collect::<anyhow::Result<Vec<(NodeId, GccApp)>>>()?;
        let ports = gcc.iter().map(|(_, app)| app.port).collect::<Vec<_>>();
        assert_eq!(ports, vec![8000, 8001, 8002, 8003]);

        let n0 = Ipv4Addr::new(10, 1, 1, 1);
        let n3 = Ipv4Addr::new(10, 1, 3, 2);
        for pair in gcc.chunks(2) {
            let (node_a, a) = &pair[0];
            let (node_b, b) = &pair[1];
            assert_eq!((*node_a, *node_b), (NodeId::new(0), NodeId::new(3)));
            assert_eq!(a.dest, SocketAddrV4::new(n3, b.port));
            assert_eq!(b.dest, SocketAddrV4::new(n0, a.port));
        }
        let windows = scenario
            .apps()
            .iter()
            .map(|app| (app.start, app.stop))
            .collect::<Vec<_>>();
        assert_eq!(
            windows,
            vec![
                (Secs::new(0), Secs::new(500)),
                (Secs::new(0), Secs::new(500)),
                (Secs::new(10), Secs::new(490)),
                (Secs::new(10), Secs::new(490)),
            ]
        );
        Ok(())
    }

    #[test]
    fn ports_are_unique_across_kinds() -> anyhow::Result<()> {
        let scenario = Scenario::build(testing::config_with_flows(3, 4, 5))?;
        let ports = scenario
            .apps()
            .iter()
            .filter_map(|app| app.kind.local_port())
            .collect::<Vec<_>>();
        // Each flow binds exactly one port per receiving application.
        assert_eq!(ports.len(), 3 * 2 + 4 + 5);
        assert_eq!(ports.iter().collect::<HashSet<_>>().len(), ports.len());
        assert_eq!(scenario.apps().len(), (3 + 4 + 5) * 2);
        Ok(())
    }

    #[test]
    fn mixed_flows_are_staggered_per_kind() -> anyhow::Result<()> {
        let scenario = Scenario::build(testing::config_with_flows(1, 2, 2))?;
        let starts = scenario
            .flows()
            .iter()
            .map(|f| (f.kind, f.start))
            .collect::<Vec<_>>();
        assert_eq!(
            starts,
            vec![
                (FlowKind::Adaptive, Secs::new(0)),
                (FlowKind::Tcp, Secs::new(17)),
                (FlowKind::Tcp, Secs::new(34)),
                (FlowKind::Udp, Secs::new(23)),
                (FlowKind::Udp, Secs::new(46)),
            ]
        );
        Ok(())
    }

    #[test]
    fn other_modes_skip_adaptive_flows_but_keep_their_ports() -> anyhow::Result<()> {
        let config = ScenarioConfig::builder()
            .mode(CcMode::Nada)
            .flows(crate::config::FlowCounts {
                rmcat: 2,
                tcp: 1,
                udp: 0,
            })
            .build();
        let scenario = Scenario::build(config)?;
        assert_eq!(scenario.flows().len(), 3);
        assert_eq!(scenario.apps().len(), 2);
        let sink = scenario
            .apps()
            .iter()
            .find_map(|app| app.kind.local_port())
            .ok_or_else(|| anyhow::anyhow!("no sink installed"))?;
        assert_eq!(sink, 8004);
        Ok(())
    }

    #[test]
    fn flows_follow_the_chain_length() -> anyhow::Result<()> {
        let config = ScenarioConfig::builder()
            .topology(TopologyOpts::builder().nr_nodes(6).build())
            .flows(crate::config::FlowCounts {
                rmcat: 0,
                tcp: 1,
                udp: 0,
            })
            .build();
        let scenario = Scenario::build(config)?;
        let sink = scenario.apps().on_node(NodeId::new(5)).count();
        assert_eq!(sink, 1);
        assert_eq!(
            scenario.apps().get(AppId::ZERO).and_then(|a| a.kind.dest()),
            Some(SocketAddrV4::new(Ipv4Addr::new(10, 1, 5, 2), 8000))
        );
        Ok(())
    }

    #[test]
    fn invalid_topology_is_reported() {
        let config = ScenarioConfig::builder()
            .topology(TopologyOpts::builder().nr_nodes(0).build())
            .build();
        assert!(matches!(
            Scenario::build(config),
            Err(ScenarioError::InvalidTopology(TopologyError::TooFewNodes(0)))
        ));
    }
}
