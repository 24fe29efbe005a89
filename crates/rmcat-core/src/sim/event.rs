use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::net::SocketAddrV4;

use crate::apps::AppId;
use crate::network::NodeId;
use crate::units::{Bytes, Nanosecs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Event {
    Start(AppId),
    Stop(AppId),
    UdpSend(AppId),
    Arrive { packet: Packet, node: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Packet {
    pub(super) from: AppId,
    pub(super) dest: SocketAddrV4,
    pub(super) dst_node: NodeId,
    /// Application payload.
    pub(super) payload: Bytes,
    /// Bytes on the wire, headers included.
    pub(super) size: Bytes,
}

/// Events ordered by due time, then by the order they were scheduled in.
#[derive(Debug, Default)]
pub(super) struct EventQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    seq: u64,
}

#[derive(Debug)]
struct Scheduled {
    time: Nanosecs,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        (self.time, self.seq) == (other.time, other.seq)
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time, self.seq).cmp(&(other.time, other.seq))
    }
}

impl EventQueue {
    pub(super) fn push(&mut self, time: Nanosecs, event: Event) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(Scheduled { time, seq, event }));
    }

    /// Pops the next event if it is due at or before `until`.
    pub(super) fn pop_until(&mut self, until: Nanosecs) -> Option<(Nanosecs, Event)> {
        if self.heap.peek()?.0.time > until {
            return None;
        }
        self.heap.pop().map(|Reverse(s)| (s.time, s.event))
    }

    pub(super) fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let mut q = EventQueue::default();
        assert_eq!(q.len(), 0);
        assert!(q.pop_until(Nanosecs::MAX).is_none());
    }

    #[test]
    fn ordered_by_time_then_insertion() {
        let mut q = EventQueue::default();
        q.push(Nanosecs::new(20), Event::Stop(AppId::new(0)));
        q.push(Nanosecs::new(10), Event::Start(AppId::new(1)));
        q.push(Nanosecs::new(10), Event::Start(AppId::new(0)));
        assert_eq!(
            q.pop_until(Nanosecs::MAX),
            Some((Nanosecs::new(10), Event::Start(AppId::new(1))))
        );
        assert_eq!(
            q.pop_until(Nanosecs::MAX),
            Some((Nanosecs::new(10), Event::Start(AppId::new(0))))
        );
        // Not yet due.
        assert!(q.pop_until(Nanosecs::new(19)).is_none());
        assert_eq!(q.len(), 1);
        assert_eq!(
            q.pop_until(Nanosecs::new(20)),
            Some((Nanosecs::new(20), Event::Stop(AppId::new(0))))
        );
    }
}
