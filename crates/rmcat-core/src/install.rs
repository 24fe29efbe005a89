//! Installation routines for the three flow kinds.
//!
//! Each routine resolves the peers' addresses, creates the application records on both
//! endpoints, and gives them the flow's active window. None of them own any protocol logic.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::apps::{AppId, AppKind, BulkSend, Codec, GccApp, PacketSink, UdpClient, UdpServer};
use crate::constants::{CODEC_FPS, GCC_SENDER_MAX_RATE, IPV4_UDP_OVERHEAD, UDP_MAX_PACKETS};
use crate::flows::{FlowDesc, FlowPorts};
use crate::network::NodeId;
use crate::scenario::{Scenario, ScenarioError};
use crate::units::{BitsPerSec, Bytes, Nanosecs};

/// Time between UDP packets that keeps `bitrate` busy with `packet_size` payloads, counting the
/// IPv4 and UDP headers. A zero bitrate gives [`Nanosecs::MAX`], which never sends.
pub fn udp_interval(bitrate: BitsPerSec, packet_size: Bytes) -> Nanosecs {
    if bitrate == BitsPerSec::ZERO {
        return Nanosecs::MAX;
    }
    let secs = (packet_size + IPV4_UDP_OVERHEAD).into_f64() / (bitrate.into_f64() / 8.0);
    Nanosecs::from_secs_f64(secs)
}

/// Installs a pair of GCC peers for `flow`: one on `flow.src` bound to the first port, one on
/// `flow.dst` bound to the second, each targeting the other.
pub fn install_gcc(
    scenario: &mut Scenario,
    flow: &FlowDesc,
) -> Result<[AppId; 2], ScenarioError> {
    let FlowPorts::Pair(port_1, port_2) = flow.ports else {
        return Err(ScenarioError::PortMismatch(flow.id));
    };
    let addr_1 = primary_address(scenario, flow.src)?;
    let addr_2 = primary_address(scenario, flow.dst)?;
    let rates = scenario.config().gcc.clone();
    let packet_size = scenario.config().packet_size;
    let codec = || Codec::ShapedPacketizer {
        inner: Box::new(Codec::Statistics { fps: CODEC_FPS }),
        packet_size,
    };
    let app_1 = GccApp {
        port: port_1,
        dest: SocketAddrV4::new(addr_2, port_2),
        max_rate: Some(GCC_SENDER_MAX_RATE),
        rates: rates.clone(),
        codec: codec(),
    };
    let app_2 = GccApp {
        port: port_2,
        dest: SocketAddrV4::new(addr_1, port_1),
        max_rate: None,
        rates,
        codec: codec(),
    };
    let id_1 = scenario.add_app(flow.src, flow, AppKind::Gcc(app_1));
    let id_2 = scenario.add_app(flow.dst, flow, AppKind::Gcc(app_2));
    log::debug!(
        "flow {}: gcc {}:{} <-> {}:{}",
        flow.id,
        addr_1,
        port_1,
        addr_2,
        port_2
    );
    Ok([id_1, id_2])
}

/// Installs an unlimited bulk TCP sender on `flow.src` and a sink on `flow.dst`.
pub fn install_tcp(
    scenario: &mut Scenario,
    flow: &FlowDesc,
) -> Result<[AppId; 2], ScenarioError> {
    let FlowPorts::Single(port) = flow.ports else {
        return Err(ScenarioError::PortMismatch(flow.id));
    };
    let server = primary_address(scenario, flow.dst)?;
    let source = BulkSend {
        dest: SocketAddrV4::new(server, port),
        max_bytes: Bytes::ZERO,
        send_size: scenario.config().packet_size,
        tcp: scenario.config().tcp.clone(),
    };
    let client = scenario.add_app(flow.src, flow, AppKind::BulkSend(source));
    let sink = scenario.add_app(flow.dst, flow, AppKind::PacketSink(PacketSink { port }));
    log::debug!("flow {}: tcp -> {}:{}", flow.id, server, port);
    Ok([client, sink])
}

/// Installs a constant-bitrate UDP client on `flow.src` and a server on `flow.dst`.
pub fn install_udp(
    scenario: &mut Scenario,
    flow: &FlowDesc,
    bitrate: BitsPerSec,
    packet_size: Bytes,
) -> Result<[AppId; 2], ScenarioError> {
    let FlowPorts::Single(port) = flow.ports else {
        return Err(ScenarioError::PortMismatch(flow.id));
    };
    let server = primary_address(scenario, flow.dst)?;
    let interval = udp_interval(bitrate, packet_size);
    let source = UdpClient {
        dest: SocketAddrV4::new(server, port),
        interval,
        max_packets: UDP_MAX_PACKETS,
        packet_size,
    };
    let client = scenario.add_app(flow.src, flow, AppKind::UdpClient(source));
    let sink = scenario.add_app(flow.dst, flow, AppKind::UdpServer(UdpServer { port }));
    log::debug!(
        "flow {}: udp -> {}:{} at {} (every {})",
        flow.id,
        server,
        port,
        bitrate,
        interval
    );
    Ok([client, sink])
}

fn primary_address(scenario: &Scenario, node: NodeId) -> Result<Ipv4Addr, ScenarioError> {
    scenario
        .network()
        .node(node)
        .ok_or(ScenarioError::UnknownNode(node))?
        .primary_address()
        .ok_or(ScenarioError::NoAddress(node))
}
