//! Scenario constants. These are set to match the rmcat ns-3 module's default behavior.

use crate::units::{BitsPerSec, Bytes, Millisecs, Secs};

/// The maximum media packet size, also used as the TCP send size and UDP payload size.
pub const DEFAULT_PACKET_SIZE: Bytes = Bytes::new(1000);

/// IPv4 (20 B) plus UDP (8 B) header bytes added to every UDP payload.
pub const IPV4_UDP_OVERHEAD: Bytes = Bytes::new(28);

/// GCC minimum rate.
pub const GCC_DEFAULT_RMIN: BitsPerSec = BitsPerSec::new(150_000);

/// GCC maximum rate.
pub const GCC_DEFAULT_RMAX: BitsPerSec = BitsPerSec::new(1_500_000);

/// GCC initial rate.
pub const GCC_DEFAULT_RINIT: BitsPerSec = BitsPerSec::new(150_000);

/// Upper sending-rate bound given to the sending GCC endpoint.
pub const GCC_SENDER_MAX_RATE: BitsPerSec = BitsPerSec::new(1_000_000);

/// Frame rate of the synthetic video source.
pub const CODEC_FPS: f64 = 30.0;

pub const TOPO_DEFAULT_BW: BitsPerSec = BitsPerSec::new(1_000_000);
pub const TOPO_DEFAULT_PDELAY: Millisecs = Millisecs::new(50);
pub const TOPO_DEFAULT_QDELAY: Millisecs = Millisecs::new(300);

/// Number of nodes in the linear topology.
pub const TOPO_DEFAULT_NODES: usize = 4;

/// The simulation stops here.
pub const DEFAULT_END_TIME: Secs = Secs::new(500);

/// First port handed out by the port allocator.
pub const BASE_PORT: u16 = 8000;

/// Packet cap for UDP clients, large enough to never be reached.
pub const UDP_MAX_PACKETS: u32 = u32::MAX;
