use std::collections::VecDeque;

use petgraph::visit::{VisitMap, Visitable};
use rustc_hash::FxHashMap;

use crate::network::{topology::Topology, types::NodeId};

/// `next_hop[(from, to)]` is the neighbour of `from` on a shortest path to `to`.
type HopMap = FxHashMap<(NodeId, NodeId), NodeId>;

/// Global shortest-path routes, computed once over the whole topology.
#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct Routes {
    #[serde(skip)]
    inner: HopMap,
}

impl Routes {
    /// Builds a routing table from a topology using BFS.
    ///
    /// Each node is the root of one BFS. Because every link yields a channel in both directions,
    /// discovering `succ` from `n` means `succ` forwards to `n` on its way to the root. Ties are
    /// broken by discovery order, so routes are deterministic.
    pub(crate) fn new(topology: &Topology) -> Self {
        let g = &topology.graph;
        let mut hops = HopMap::default();
        for root in g.node_indices() {
            let mut discovered = g.visit_map();
            discovered.visit(root);
            let mut queue = VecDeque::new();
            queue.push_back(root);
            while let Some(n) = queue.pop_front() {
                for succ in g.neighbors(n) {
                    if discovered.visit(succ) {
                        hops.insert((g[succ], g[root]), g[n]);
                        queue.push_back(succ);
                    }
                }
            }
        }
        log::debug!("computed {} routing entries", hops.len());
        Self { inner: hops }
    }

    pub(crate) fn next_hop(&self, from: NodeId, to: NodeId) -> Option<NodeId> {
        self.inner.get(&(from, to)).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn chain(n: usize) -> Topology {
        let (nodes, links) = testing::chain_config(n);
        Topology::new(&nodes, &links).unwrap()
    }

    #[test]
    fn chain_routes_walk_the_line() {
        let routes = Routes::new(&chain(4));
        // Every ordered pair of distinct nodes has an entry.
        assert_eq!(routes.len(), 4 * 3);
        assert_eq!(routes.next_hop(NodeId::new(0), NodeId::new(3)), Some(NodeId::new(1)));
        assert_eq!(routes.next_hop(NodeId::new(1), NodeId::new(3)), Some(NodeId::new(2)));
        assert_eq!(routes.next_hop(NodeId::new(3), NodeId::new(0)), Some(NodeId::new(2)));
        assert_eq!(routes.next_hop(NodeId::new(2), NodeId::new(2)), None);
    }
}
