//! Fixtures shared by the unit tests of this crate and its dependents.

use crate::config::{FlowCounts, ScenarioConfig};
use crate::network::types::{DropTailQueue, Link, LinkId, Node, NodeId};
use crate::units::{BitsPerSec, Bytes, Millisecs};

/// `n` nodes joined in a line by 1 Mbps, 1 ms links with a one-packet queue.
pub fn chain_config(n: usize) -> (Vec<Node>, Vec<Link>) {
    let nodes = (0..n).map(|i| Node::new(NodeId::new(i))).collect::<Vec<_>>();
    let links = (1..n)
        .map(|i| {
            Link::new(
                LinkId::new(i - 1),
                nodes[i - 1].id,
                nodes[i].id,
                BitsPerSec::new(1_000_000),
                Millisecs::new(1),
                DropTailQueue::bytes(Bytes::new(1_000)),
            )
        })
        .collect::<Vec<_>>();
    (nodes, links)
}

/// The default scenario with the given flow counts.
pub fn config_with_flows(rmcat: usize, tcp: usize, udp: usize) -> ScenarioConfig {
    ScenarioConfig::builder()
        .flows(FlowCounts { rmcat, tcp, udp })
        .build()
}
