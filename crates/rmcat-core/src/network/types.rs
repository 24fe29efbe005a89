use std::net::Ipv4Addr;

use crate::units::{BitsPerSec, Bytes, Millisecs};

identifier!(NodeId, usize);
identifier!(LinkId, usize);

/// A simulated host. Every node forwards packets, so there is no host/switch split.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Interface 0 is always the loopback. Point-to-point interfaces follow in link order.
    pub interfaces: Vec<Interface>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            interfaces: vec![Interface::loopback()],
        }
    }

    /// The address peers use to reach this node: the first non-loopback interface.
    pub fn primary_address(&self) -> Option<Ipv4Addr> {
        self.interfaces.get(1).map(|iface| iface.addr)
    }

    /// Returns true if any interface of this node owns `addr`.
    pub fn owns(&self, addr: Ipv4Addr) -> bool {
        self.interfaces.iter().any(|iface| iface.addr == addr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Interface {
    pub addr: Ipv4Addr,
    pub prefix_len: u8,
    /// `None` for the loopback.
    pub link: Option<LinkId>,
}

impl Interface {
    pub fn loopback() -> Self {
        Self {
            addr: Ipv4Addr::LOCALHOST,
            prefix_len: 8,
            link: None,
        }
    }
}

/// A bidirectional point-to-point link.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub a: NodeId,
    pub b: NodeId,
    pub bandwidth: BitsPerSec,
    pub delay: Millisecs,
    /// The device queue, shared by both directions' configuration but instantiated per direction.
    pub queue: DropTailQueue,
    pub traffic_control: TrafficControl,
    /// Filled in by address assignment.
    pub block: Option<AddressBlock>,
}

impl Link {
    pub fn new(
        id: LinkId,
        a: NodeId,
        b: NodeId,
        bandwidth: impl Into<BitsPerSec>,
        delay: impl Into<Millisecs>,
        queue: DropTailQueue,
    ) -> Self {
        Self {
            id,
            a,
            b,
            bandwidth: bandwidth.into(),
            delay: delay.into(),
            queue,
            traffic_control: TrafficControl::Disabled,
            block: None,
        }
    }
}

/// A byte-mode tail-drop queue: arrivals that do not fit are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DropTailQueue {
    pub max_bytes: Bytes,
}

impl DropTailQueue {
    pub fn bytes(max_bytes: Bytes) -> Self {
        Self { max_bytes }
    }
}

/// Queueing-discipline layer above the device queue.
///
/// Always disabled: the ns-3 traffic control layer adds spurious delay on top of the device
/// queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TrafficControl {
    Disabled,
}

/// An IPv4 network block assigned to a single link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AddressBlock {
    pub network: Ipv4Addr,
    pub prefix_len: u8,
}

impl AddressBlock {
    fn mask(&self) -> u32 {
        match self.prefix_len {
            0 => 0,
            n => u32::MAX << (32 - n as u32),
        }
    }

    /// The `n`-th host address of the block (1-based).
    pub fn host(&self, n: u32) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) + n)
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask() == u32::from(self.network) & self.mask()
    }

    pub fn overlaps(&self, other: &AddressBlock) -> bool {
        self.contains(other.network) || other.contains(self.network)
    }
}

impl std::fmt::Display for AddressBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// One direction of a link. Each link becomes two channels in the topology graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new, serde::Serialize)]
pub struct Channel {
    pub link: LinkId,
    pub src: NodeId,
    pub dst: NodeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_membership() {
        let block = AddressBlock {
            network: Ipv4Addr::new(10, 1, 2, 0),
            prefix_len: 24,
        };
        assert_eq!(block.host(1), Ipv4Addr::new(10, 1, 2, 1));
        assert!(block.contains(Ipv4Addr::new(10, 1, 2, 254)));
        assert!(!block.contains(Ipv4Addr::new(10, 1, 3, 1)));
        assert_eq!(block.to_string(), "10.1.2.0/24");
    }

    #[test]
    fn fresh_node_has_only_loopback() {
        let node = Node::new(NodeId::new(7));
        assert_eq!(node.interfaces.len(), 1);
        assert!(node.primary_address().is_none());
        assert!(node.owns(Ipv4Addr::LOCALHOST));
    }
}
