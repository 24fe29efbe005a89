//! The point-to-point topology the scenario runs on.
//!
//! [`Network::linear`] builds a chain of nodes joined by identical links, assigns each link its
//! own address block, and computes global routes once. The resulting [`Network`] is immutable.

mod routing;
pub(crate) mod topology;
pub mod types;

use std::net::Ipv4Addr;

use itertools::Itertools;

pub use petgraph::graph::EdgeIndex;
pub use topology::Error as TopologyError;
pub use types::*;

use crate::config::TopologyOpts;
use crate::units::{BitsPerSec, Bytes, Millisecs};

use self::{routing::Routes, topology::Topology};

/// First address block handed out by [`assign_addresses`]. Link `k` gets `10.1.(k + 1).0/24`.
const ADDRESS_BASE: Ipv4Addr = Ipv4Addr::new(10, 1, 0, 0);
const ADDRESS_PREFIX_LEN: u8 = 24;

/// Returns the byte budget of a tail-drop queue that holds `queue_delay` worth of traffic at
/// `bandwidth`, but never less than one `packet_size`.
pub fn queue_budget(bandwidth: BitsPerSec, queue_delay: Millisecs, packet_size: Bytes) -> Bytes {
    std::cmp::max(packet_size, bandwidth.bytes_in(queue_delay))
}

#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<Node>,
    links: Vec<Link>,
    topology: Topology,
    routes: Routes,
}

impl Network {
    /// Builds and validates a network from arbitrary nodes and links, then assigns addresses and
    /// computes routes.
    ///
    /// PRECONDITION: node and link IDs are dense and match their positions in the slices.
    pub fn new(nodes: &[Node], links: &[Link]) -> Result<Self, TopologyError> {
        let topology = Topology::new(nodes, links)?;
        let mut nodes = nodes.to_vec();
        let mut links = links.to_vec();
        assign_addresses(&mut nodes, &mut links);
        let routes = Routes::new(&topology);
        Ok(Self {
            nodes,
            links,
            topology,
            routes,
        })
    }

    /// Builds a chain of `opts.nr_nodes` nodes. Every link gets the configured rate and delay,
    /// and a byte-mode tail-drop queue sized by [`queue_budget`] that fits at least one
    /// `max_packet` (on-wire size, headers included).
    pub fn linear(opts: &TopologyOpts, max_packet: Bytes) -> Result<Self, TopologyError> {
        if opts.nr_nodes < 2 {
            return Err(TopologyError::TooFewNodes(opts.nr_nodes));
        }
        let budget = queue_budget(opts.bandwidth, opts.queue_delay, max_packet);
        let nodes = (0..opts.nr_nodes)
            .map(|i| Node::new(NodeId::new(i)))
            .collect::<Vec<_>>();
        let links = nodes
            .iter()
            .tuple_windows()
            .enumerate()
            .map(|(i, (a, b))| {
                Link::new(
                    LinkId::new(i),
                    a.id,
                    b.id,
                    opts.bandwidth,
                    opts.delay,
                    DropTailQueue::bytes(budget),
                )
            })
            .collect::<Vec<_>>();
        log::debug!(
            "building linear topology: {} nodes, {} links at {} / {}, queue {}",
            nodes.len(),
            links.len(),
            opts.bandwidth,
            opts.delay,
            budget
        );
        Self::new(&nodes, &links)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.index())
    }

    /// Finds the node that owns `addr` on one of its interfaces.
    pub fn node_by_address(&self, addr: Ipv4Addr) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.owns(addr)).map(|n| n.id)
    }

    /// Returns the channels a packet crosses from `src` to `dst`, or `None` if `dst` is
    /// unreachable. The path from a node to itself is empty.
    pub fn path(&self, src: NodeId, dst: NodeId) -> Option<Vec<EdgeIndex>> {
        let mut acc = Vec::new();
        let mut cur = src;
        while cur != dst {
            let next = self.routes.next_hop(cur, dst)?;
            acc.push(self.topology.find_channel(cur, next)?);
            cur = next;
        }
        Some(acc)
    }

    /// The next hop from `from` toward `to`.
    pub fn next_hop(&self, from: NodeId, to: NodeId) -> Option<(NodeId, EdgeIndex)> {
        let next = self.routes.next_hop(from, to)?;
        let edge = self.topology.find_channel(from, next)?;
        Some((next, edge))
    }

    pub fn channel(&self, edge: EdgeIndex) -> Option<&Channel> {
        self.topology.graph.edge_weight(edge)
    }

    pub fn nr_channels(&self) -> usize {
        self.topology.nr_channels()
    }

    pub fn nr_routes(&self) -> usize {
        self.routes.len()
    }

    delegate::delegate! {
        to self.nodes {
            #[call(iter)]
            pub fn nodes(&self) -> impl Iterator<Item = &Node>;

            #[call(len)]
            pub fn nr_nodes(&self) -> usize;
        }

        to self.links {
            #[call(iter)]
            pub fn links(&self) -> impl Iterator<Item = &Link>;

            #[call(len)]
            pub fn nr_links(&self) -> usize;
        }
    }
}

/// Gives every link a disjoint `/24` and its endpoints the `.1` and `.2` host addresses. The
/// interfaces are appended to the nodes in link order, after the loopback.
fn assign_addresses(nodes: &mut [Node], links: &mut [Link]) {
    for (k, link) in links.iter_mut().enumerate() {
        let offset = (k as u32 + 1) << (32 - ADDRESS_PREFIX_LEN);
        let block = AddressBlock {
            network: Ipv4Addr::from(u32::from(ADDRESS_BASE) + offset),
            prefix_len: ADDRESS_PREFIX_LEN,
        };
        for (host, end) in [(1, link.a), (2, link.b)] {
            // Endpoints were validated by `Topology::new`.
            if let Some(node) = nodes.get_mut(end.index()) {
                node.interfaces.push(Interface {
                    addr: block.host(host),
                    prefix_len: ADDRESS_PREFIX_LEN,
                    link: Some(link.id),
                });
            }
        }
        log::debug!("link {} ({} <-> {}) assigned {}", link.id, link.a, link.b, block);
        link.block = Some(block);
    }
}
