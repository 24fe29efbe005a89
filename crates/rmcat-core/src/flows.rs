//! Flow descriptors and the schedule that staggers them.
//!
//! Flows of each kind start on their own period (10 s for adaptive flows, 17 s for TCP, 23 s for
//! UDP) so that the onsets of different kinds rarely coincide.

use crate::config::FlowCounts;
use crate::network::NodeId;
use crate::units::Secs;

identifier!(FlowId, usize);

/// What kind of traffic a flow carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    /// A pair of GCC peers exchanging media in both directions.
    Adaptive,
    /// Bulk TCP transfer.
    Tcp,
    /// Constant-bitrate UDP.
    Udp,
}

impl FlowKind {
    /// Start-time period for the `i`-th flow of this kind.
    fn period(&self) -> Secs {
        match self {
            FlowKind::Adaptive => Secs::new(10),
            FlowKind::Tcp => Secs::new(17),
            FlowKind::Udp => Secs::new(23),
        }
    }

    /// Offset of the first flow of this kind.
    fn offset(&self) -> Secs {
        match self {
            FlowKind::Adaptive => Secs::ZERO,
            FlowKind::Tcp | FlowKind::Udp => self.period(),
        }
    }

    /// Ports an installation of this kind consumes.
    fn nr_ports(&self) -> usize {
        match self {
            FlowKind::Adaptive => 2,
            FlowKind::Tcp | FlowKind::Udp => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Adaptive => "adaptive",
            FlowKind::Tcp => "tcp",
            FlowKind::Udp => "udp",
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start time of the `i`-th flow of `kind`.
pub fn start_time(kind: FlowKind, i: usize) -> Secs {
    kind.offset() + Secs::new(kind.period().into_u64() * i as u64)
}

/// Stop time of a flow starting at `start` in a run ending at `end`. A flow is always active for
/// at least one second, even past the end of the run.
pub fn stop_time(start: Secs, end: Secs) -> Secs {
    std::cmp::max(start + Secs::ONE, end.saturating_sub(start))
}

/// Ports of a flow. Adaptive flows bind one port on each endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FlowPorts {
    Pair(u16, u16),
    Single(u16),
}

impl FlowPorts {
    pub fn iter(&self) -> impl Iterator<Item = u16> {
        let (a, b) = match *self {
            FlowPorts::Pair(a, b) => (a, Some(b)),
            FlowPorts::Single(a) => (a, None),
        };
        std::iter::once(a).chain(b)
    }
}

impl std::fmt::Display for FlowPorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowPorts::Pair(a, b) => write!(f, "{a},{b}"),
            FlowPorts::Single(a) => write!(f, "{a}"),
        }
    }
}

/// A flow to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FlowDesc {
    pub id: FlowId,
    pub kind: FlowKind,
    pub src: NodeId,
    pub dst: NodeId,
    pub ports: FlowPorts,
    pub start: Secs,
    pub stop: Secs,
}

/// Hands out sequential ports. A port is never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAllocator {
    next: Option<u16>,
}

impl PortAllocator {
    pub fn new(base: u16) -> Self {
        Self { next: Some(base) }
    }

    pub fn allocate(&mut self) -> Result<u16, PortsExhausted> {
        let port = self.next.ok_or(PortsExhausted)?;
        self.next = port.checked_add(1);
        Ok(port)
    }

    /// The port the next call to [`PortAllocator::allocate`] returns, if any.
    pub fn peek(&self) -> Option<u16> {
        self.next
    }
}

#[derive(Debug, thiserror::Error)]
#[error("no ports left to allocate")]
pub struct PortsExhausted;

/// Builds the full, ordered flow schedule: all adaptive flows, then TCP, then UDP. Every flow
/// runs from `src` to `dst`.
pub fn schedule(
    counts: &FlowCounts,
    src: NodeId,
    dst: NodeId,
    end: Secs,
    ports: &mut PortAllocator,
) -> Result<Vec<FlowDesc>, PortsExhausted> {
    let kinds = [
        (FlowKind::Adaptive, counts.rmcat),
        (FlowKind::Tcp, counts.tcp),
        (FlowKind::Udp, counts.udp),
    ];
    let mut flows = Vec::with_capacity(counts.rmcat + counts.tcp + counts.udp);
    for (kind, count) in kinds {
        for i in 0..count {
            let start = start_time(kind, i);
            let stop = stop_time(start, end);
            let ports = match kind.nr_ports() {
                2 => FlowPorts::Pair(ports.allocate()?, ports.allocate()?),
                _ => FlowPorts::Single(ports.allocate()?),
            };
            let flow = FlowDesc {
                id: FlowId::new(flows.len()),
                kind,
                src,
                dst,
                ports,
                start,
                stop,
            };
            log::debug!(
                "flow {}: {} {} -> {} ports {} [{}, {}]",
                flow.id,
                kind,
                src,
                dst,
                ports,
                start,
                stop
            );
            flows.push(flow);
        }
    }
    Ok(flows)
}
