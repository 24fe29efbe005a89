//! Application records and the arena that owns them.
//!
//! Applications are plain data: what is bound where, who it talks to, and when it is active. The
//! [simulator](crate::sim::Simulator) gives them behaviour.

use std::net::SocketAddrV4;

use crate::config::{GccRates, TcpDefaults};
use crate::flows::FlowId;
use crate::network::NodeId;
use crate::units::{BitsPerSec, Bytes, Nanosecs, Secs};

identifier!(AppId, usize);

/// An application installed on a node.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Application {
    pub id: AppId,
    pub node: NodeId,
    /// The flow this application was installed for.
    pub flow: FlowId,
    pub kind: AppKind,
    pub start: Secs,
    pub stop: Secs,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum AppKind {
    Gcc(GccApp),
    BulkSend(BulkSend),
    PacketSink(PacketSink),
    UdpClient(UdpClient),
    UdpServer(UdpServer),
}

impl AppKind {
    /// The local port the application is bound to. Clients use an ephemeral port.
    pub fn local_port(&self) -> Option<u16> {
        match self {
            AppKind::Gcc(app) => Some(app.port),
            AppKind::PacketSink(app) => Some(app.port),
            AppKind::UdpServer(app) => Some(app.port),
            AppKind::BulkSend(_) | AppKind::UdpClient(_) => None,
        }
    }

    /// The remote endpoint the application sends to, if it sends at all.
    pub fn dest(&self) -> Option<SocketAddrV4> {
        match self {
            AppKind::Gcc(app) => Some(app.dest),
            AppKind::BulkSend(app) => Some(app.dest),
            AppKind::UdpClient(app) => Some(app.dest),
            AppKind::PacketSink(_) | AppKind::UdpServer(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppKind::Gcc(_) => "gcc",
            AppKind::BulkSend(_) => "bulk-send",
            AppKind::PacketSink(_) => "packet-sink",
            AppKind::UdpClient(_) => "udp-client",
            AppKind::UdpServer(_) => "udp-server",
        }
    }
}

/// One GCC endpoint. It both sends media to and receives media from its peer at `dest`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GccApp {
    pub port: u16,
    pub dest: SocketAddrV4,
    /// Upper bound on the sending rate. `None` leaves the endpoint unbounded at start-up.
    pub max_rate: Option<BitsPerSec>,
    pub rates: GccRates,
    pub codec: Codec,
}

/// A synthetic media source.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Codec {
    /// Frame sizes drawn from statistics of real encoders.
    Statistics { fps: f64 },
    /// Slices the frames of `inner` into packets of at most `packet_size`, paced over the frame
    /// interval.
    ShapedPacketizer { inner: Box<Codec>, packet_size: Bytes },
}

impl Codec {
    pub fn fps(&self) -> f64 {
        match self {
            Codec::Statistics { fps } => *fps,
            Codec::ShapedPacketizer { inner, .. } => inner.fps(),
        }
    }
}

/// A TCP source that sends as fast as the stack allows.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BulkSend {
    pub dest: SocketAddrV4,
    /// Total bytes to send. Zero is unlimited.
    pub max_bytes: Bytes,
    /// Bytes handed to the socket per send call.
    pub send_size: Bytes,
    pub tcp: TcpDefaults,
}

/// A TCP sink accepting on any local address.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PacketSink {
    pub port: u16,
}

/// An open-loop UDP generator.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UdpClient {
    pub dest: SocketAddrV4,
    /// Time between packets. [`Nanosecs::MAX`] never sends.
    pub interval: Nanosecs,
    pub max_packets: u32,
    /// Payload bytes per packet.
    pub packet_size: Bytes,
}

/// A UDP sink.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UdpServer {
    pub port: u16,
}

/// Owns every application of a scenario. [`AppId`]s index into it.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Applications {
    inner: Vec<Application>,
}

impl Applications {
    pub(crate) fn push(
        &mut self,
        node: NodeId,
        flow: FlowId,
        kind: AppKind,
        start: Secs,
        stop: Secs,
    ) -> AppId {
        let id = AppId::new(self.inner.len());
        self.inner.push(Application {
            id,
            node,
            flow,
            kind,
            start,
            stop,
        });
        id
    }

    pub fn get(&self, id: AppId) -> Option<&Application> {
        self.inner.get(id.index())
    }

    /// Applications installed on `node`, in installation order.
    pub fn on_node(&self, node: NodeId) -> impl Iterator<Item = &Application> + '_ {
        self.inner.iter().filter(move |app| app.node == node)
    }

    delegate::delegate! {
        to self.inner {
            pub fn iter(&self) -> std::slice::Iter<'_, Application>;

            pub fn len(&self) -> usize;

            pub fn is_empty(&self) -> bool;
        }
    }
}
