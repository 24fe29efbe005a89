//! A single-threaded discrete-event engine for [`Scenario`]s.
//!
//! The engine owns the simulated clock and a time-ordered event queue. It starts and stops
//! every application at the edges of its window and runs the open-loop UDP generators, whose
//! packets cross the topology hop by hop through each link's tail-drop queue. GCC and TCP
//! applications only go through their lifecycle here; their protocol machinery lives elsewhere.

mod event;
mod stats;

use std::collections::VecDeque;

pub use stats::{AppStats, ChannelStats, RunSummary};

use crate::apps::{AppId, AppKind, UdpClient};
use crate::constants::IPV4_UDP_OVERHEAD;
use crate::network::{Channel, EdgeIndex, NodeId};
use crate::scenario::Scenario;
use crate::units::{BitsPerSec, Bytes, Nanosecs};

use self::event::{Event, EventQueue, Packet};

/// Builds a simulator for `scenario`, runs it to the scenario's end time and tears it down.
pub fn run(scenario: &Scenario) -> RunSummary {
    let mut sim = Simulator::new(scenario);
    sim.run_until(scenario.end_time().into());
    sim.destroy()
}

/// The engine state of one run over a borrowed [`Scenario`].
#[derive(Debug)]
pub struct Simulator<'a> {
    scenario: &'a Scenario,
    now: Nanosecs,
    queue: EventQueue,
    events: u64,
    apps: Vec<AppState>,
    channels: Vec<ChannelState>,
    unclaimed: u64,
    unroutable: u64,
}

#[derive(Debug)]
struct AppState {
    running: bool,
    stats: AppStats,
}

#[derive(Debug)]
struct ChannelState {
    bandwidth: BitsPerSec,
    delay: Nanosecs,
    max_bytes: Bytes,
    /// `(departure time, size)` of every packet not yet fully serialized, oldest first.
    backlog: VecDeque<(Nanosecs, Bytes)>,
    queued: Bytes,
    stats: ChannelStats,
}

impl ChannelState {
    fn new(chan: &Channel, scenario: &Scenario) -> Self {
        let link = scenario.network().link(chan.link);
        Self {
            bandwidth: link.map(|l| l.bandwidth).unwrap_or_default(),
            delay: link.map(|l| l.delay.into()).unwrap_or_default(),
            max_bytes: link.map(|l| l.queue.max_bytes).unwrap_or_default(),
            backlog: VecDeque::new(),
            queued: Bytes::ZERO,
            stats: ChannelStats {
                link: chan.link,
                src: chan.src,
                dst: chan.dst,
                forwarded: 0,
                dropped: 0,
                max_queued: Bytes::ZERO,
            },
        }
    }

    /// Offers a packet of `size` at `now`. Returns the time its last bit leaves the sender, or
    /// `None` if the queue had no room.
    fn enqueue(&mut self, now: Nanosecs, size: Bytes) -> Option<Nanosecs> {
        while let Some(&(departure, sz)) = self.backlog.front() {
            if departure > now {
                break;
            }
            self.backlog.pop_front();
            self.queued -= sz;
        }
        if self.queued + size > self.max_bytes {
            self.stats.dropped += 1;
            return None;
        }
        let tx_start = self.backlog.back().map_or(now, |&(d, _)| std::cmp::max(now, d));
        let departure = tx_start.saturating_add(self.bandwidth.length(size));
        self.backlog.push_back((departure, size));
        self.queued += size;
        self.stats.max_queued = std::cmp::max(self.stats.max_queued, self.queued);
        self.stats.forwarded += 1;
        Some(departure)
    }
}

impl<'a> Simulator<'a> {
    /// Prepares a run of `scenario`: every application gets a start event and a stop event.
    pub fn new(scenario: &'a Scenario) -> Self {
        let mut queue = EventQueue::default();
        let apps = scenario
            .apps()
            .iter()
            .map(|app| {
                queue.push(app.start.into(), Event::Start(app.id));
                queue.push(app.stop.into(), Event::Stop(app.id));
                AppState {
                    running: false,
                    stats: AppStats::new(app.id, app.kind.name()),
                }
            })
            .collect();
        let network = scenario.network();
        let channels = (0..network.nr_channels())
            .filter_map(|i| network.channel(EdgeIndex::new(i)))
            .map(|chan| ChannelState::new(chan, scenario))
            .collect();
        Self {
            scenario,
            now: Nanosecs::ZERO,
            queue,
            events: 0,
            apps,
            channels,
            unclaimed: 0,
            unroutable: 0,
        }
    }

    pub fn now(&self) -> Nanosecs {
        self.now
    }

    /// Processes every event due at or before `stop`, then parks the clock at `stop`.
    pub fn run_until(&mut self, stop: Nanosecs) {
        log::debug!("running until {} ({} events pending)", stop, self.queue.len());
        while let Some((time, event)) = self.queue.pop_until(stop) {
            self.now = time;
            self.events += 1;
            self.handle(event);
        }
        self.now = std::cmp::max(self.now, stop);
    }

    /// Tears the simulator down, discarding pending events.
    pub fn destroy(self) -> RunSummary {
        log::debug!(
            "simulator destroyed at {} after {} events, {} left pending",
            self.now,
            self.events,
            self.queue.len()
        );
        RunSummary {
            end: self.now,
            events: self.events,
            apps: self.apps.into_iter().map(|a| a.stats).collect(),
            channels: self.channels.into_iter().map(|c| c.stats).collect(),
            unclaimed: self.unclaimed,
            unroutable: self.unroutable,
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(id) => self.start(id),
            Event::Stop(id) => {
                if let Some(state) = self.apps.get_mut(id.index()) {
                    state.running = false;
                    state.stats.stopped_at = Some(self.now);
                    log::trace!("{} app {} stopped", self.now, id);
                }
            }
            Event::UdpSend(id) => self.udp_send(id),
            Event::Arrive { packet, node } => {
                if node == packet.dst_node {
                    self.deliver(packet);
                } else {
                    self.forward(packet, node);
                }
            }
        }
    }

    fn start(&mut self, id: AppId) {
        let Some(state) = self.apps.get_mut(id.index()) else {
            return;
        };
        state.running = true;
        state.stats.started_at = Some(self.now);
        log::trace!("{} app {} started", self.now, id);
        if let Some(client) = self.udp_client(id) {
            if client.interval != Nanosecs::MAX {
                self.queue.push(self.now, Event::UdpSend(id));
            }
        }
    }

    fn udp_client(&self, id: AppId) -> Option<&'a UdpClient> {
        let scenario = self.scenario;
        match &scenario.apps().get(id)?.kind {
            AppKind::UdpClient(client) => Some(client),
            _ => None,
        }
    }

    fn udp_send(&mut self, id: AppId) {
        let scenario = self.scenario;
        let Some(app) = scenario.apps().get(id) else {
            return;
        };
        let AppKind::UdpClient(client) = &app.kind else {
            return;
        };
        let Some(state) = self.apps.get_mut(id.index()) else {
            return;
        };
        if !state.running || state.stats.packets_sent >= u64::from(client.max_packets) {
            return;
        }
        state.stats.packets_sent += 1;
        let next = self.now.saturating_add(client.interval);
        if next != Nanosecs::MAX {
            self.queue.push(next, Event::UdpSend(id));
        }
        let Some(dst_node) = scenario.network().node_by_address(*client.dest.ip()) else {
            self.unroutable += 1;
            return;
        };
        let packet = Packet {
            from: id,
            dest: client.dest,
            dst_node,
            payload: client.packet_size,
            size: client.packet_size + IPV4_UDP_OVERHEAD,
        };
        if app.node == dst_node {
            self.deliver(packet);
        } else {
            self.forward(packet, app.node);
        }
    }

    fn forward(&mut self, packet: Packet, at: NodeId) {
        let scenario = self.scenario;
        let Some((next, edge)) = scenario.network().next_hop(at, packet.dst_node) else {
            self.unroutable += 1;
            return;
        };
        let Some(chan) = self.channels.get_mut(edge.index()) else {
            self.unroutable += 1;
            return;
        };
        match chan.enqueue(self.now, packet.size) {
            Some(departure) => {
                let arrival = departure.saturating_add(chan.delay);
                self.queue.push(arrival, Event::Arrive { packet, node: next });
            }
            None => {
                log::trace!(
                    "{} drop on link {} ({} -> {}) from app {}",
                    self.now,
                    chan.stats.link,
                    at,
                    next,
                    packet.from
                );
            }
        }
    }

    fn deliver(&mut self, packet: Packet) {
        let port = packet.dest.port();
        let scenario = self.scenario;
        let receiver = scenario
            .apps()
            .on_node(packet.dst_node)
            .filter(|app| matches!(app.kind, AppKind::UdpServer(ref s) if s.port == port))
            .map(|app| app.id)
            .find(|id| self.apps.get(id.index()).is_some_and(|s| s.running));
        match receiver.and_then(|id| self.apps.get_mut(id.index())) {
            Some(state) => {
                state.stats.packets_received += 1;
                state.stats.bytes_received += packet.payload;
            }
            None => self.unclaimed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FlowCounts, ScenarioConfig, TopologyOpts};
    use crate::testing;
    use crate::units::{Millisecs, Secs};

    fn udp_config(bitrate: u64) -> ScenarioConfig {
        ScenarioConfig::builder()
            .flows(FlowCounts {
                rmcat: 0,
                tcp: 0,
                udp: 1,
            })
            .udp_bitrate(BitsPerSec::new(bitrate))
            .build()
    }

    #[test]
    fn lifecycle_follows_windows() -> anyhow::Result<()> {
        let scenario = Scenario::build(testing::config_with_flows(2, 1, 0))?;
        let summary = run(&scenario);
        assert_eq!(summary.end, Nanosecs::from(Secs::new(500)));
        for app in scenario.apps().iter() {
            let stats = summary.app(app.id).unwrap();
            assert_eq!(stats.started_at, Some(app.start.into()));
            assert_eq!(stats.stopped_at, Some(app.stop.into()));
            assert_eq!(stats.packets_sent, 0);
        }
        assert_eq!(summary.events, 2 * scenario.apps().len() as u64);
        Ok(())
    }

    #[test]
    fn events_past_the_stop_time_are_not_run() -> anyhow::Result<()> {
        let scenario = Scenario::build(testing::config_with_flows(2, 0, 0))?;
        let mut sim = Simulator::new(&scenario);
        sim.run_until(Secs::new(5).into());
        assert_eq!(sim.now(), Nanosecs::from(Secs::new(5)));
        let summary = sim.destroy();
        let first = summary.app(AppId::new(0)).unwrap();
        assert_eq!(first.started_at, Some(Nanosecs::ZERO));
        assert_eq!(first.stopped_at, None);
        // The second pair starts at 10 s.
        assert_eq!(summary.app(AppId::new(2)).unwrap().started_at, None);
        Ok(())
    }

    #[test]
    fn udp_flow_delivers_at_constant_rate() -> anyhow::Result<()> {
        let scenario = Scenario::build(udp_config(375_000))?;
        let summary = run(&scenario);
        let client = summary.app(AppId::new(0)).unwrap();
        let server = summary.app(AppId::new(1)).unwrap();
        // One packet every 21.930667 ms over [23 s, 477 s).
        assert_eq!(client.packets_sent, 20_702);
        assert_eq!(summary.total_dropped(), 0);
        assert_eq!(summary.unroutable, 0);
        // Packets still on the wire when the server stops are not claimed.
        assert_eq!(
            server.packets_received + summary.unclaimed,
            client.packets_sent
        );
        assert!(summary.unclaimed < 20, "unclaimed = {}", summary.unclaimed);
        assert_eq!(
            server.bytes_received,
            Bytes::new(server.packets_received * 1000)
        );
        // Every forward channel carried every packet; the reverse channels carried none.
        for chan in &summary.channels {
            let expected = if chan.src < chan.dst {
                client.packets_sent
            } else {
                0
            };
            assert_eq!(chan.forwarded, expected);
        }
        Ok(())
    }

    #[test]
    fn zero_bitrate_udp_never_sends() -> anyhow::Result<()> {
        let scenario = Scenario::build(udp_config(0))?;
        let summary = run(&scenario);
        assert_eq!(summary.app(AppId::new(0)).unwrap().packets_sent, 0);
        assert_eq!(summary.app(AppId::new(1)).unwrap().packets_received, 0);
        Ok(())
    }

    #[test]
    fn large_packets_fit_a_short_queue() -> anyhow::Result<()> {
        let config = ScenarioConfig::builder()
            .topology(TopologyOpts::builder().queue_delay(Millisecs::new(1)).build())
            .flows(FlowCounts {
                rmcat: 0,
                tcp: 1,
                udp: 1,
            })
            .packet_size(Bytes::new(1200))
            .build();
        let scenario = Scenario::build(config)?;
        for link in scenario.network().links() {
            assert_eq!(link.queue.max_bytes, Bytes::new(1200 + 28));
        }
        let summary = run(&scenario);
        assert_eq!(summary.total_dropped(), 0);
        let server = scenario
            .apps()
            .iter()
            .find(|app| matches!(app.kind, AppKind::UdpServer(_)))
            .and_then(|app| summary.app(app.id))
            .unwrap();
        assert!(server.packets_received > 0);
        assert_eq!(
            server.bytes_received,
            Bytes::new(server.packets_received * 1200)
        );
        Ok(())
    }

    #[test]
    fn overload_fills_the_tail_drop_queue() -> anyhow::Result<()> {
        let scenario = Scenario::build(udp_config(2_000_000))?;
        let budget = scenario
            .network()
            .links()
            .next()
            .map(|l| l.queue.max_bytes)
            .unwrap();
        let summary = run(&scenario);
        assert!(summary.total_dropped() > 0);
        for chan in &summary.channels {
            assert!(chan.max_queued <= budget);
        }
        let client = summary.app(AppId::new(0)).unwrap();
        let server = summary.app(AppId::new(1)).unwrap();
        assert_eq!(
            server.packets_received + summary.unclaimed + summary.total_dropped(),
            client.packets_sent
        );
        // Only the first hop is overloaded; downstream links run at the bottleneck rate.
        let downstream_drops = summary
            .channels
            .iter()
            .filter(|c| c.src != NodeId::ZERO)
            .map(|c| c.dropped)
            .sum::<u64>();
        assert_eq!(downstream_drops, 0);
        Ok(())
    }
}
