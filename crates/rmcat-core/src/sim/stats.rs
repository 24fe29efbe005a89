use crate::apps::AppId;
use crate::network::{LinkId, NodeId};
use crate::units::{Bytes, Nanosecs};

/// What happened during a run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RunSummary {
    /// Simulated time the run stopped at.
    pub end: Nanosecs,
    /// Number of events processed.
    pub events: u64,
    pub apps: Vec<AppStats>,
    pub channels: Vec<ChannelStats>,
    /// Packets that reached their destination node with no running receiver on the port.
    pub unclaimed: u64,
    /// Packets whose destination could not be routed to.
    pub unroutable: u64,
}

impl RunSummary {
    pub fn app(&self, id: AppId) -> Option<&AppStats> {
        self.apps.iter().find(|s| s.id == id)
    }

    pub fn total_dropped(&self) -> u64 {
        self.channels.iter().map(|c| c.dropped).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AppStats {
    pub id: AppId,
    pub kind: &'static str,
    pub started_at: Option<Nanosecs>,
    pub stopped_at: Option<Nanosecs>,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_received: Bytes,
}

impl AppStats {
    pub(super) fn new(id: AppId, kind: &'static str) -> Self {
        Self {
            id,
            kind,
            started_at: None,
            stopped_at: None,
            packets_sent: 0,
            packets_received: 0,
            bytes_received: Bytes::ZERO,
        }
    }
}

/// Per-direction link counters.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChannelStats {
    pub link: LinkId,
    pub src: NodeId,
    pub dst: NodeId,
    pub forwarded: u64,
    pub dropped: u64,
    /// Peak queue occupancy.
    pub max_queued: Bytes,
}
