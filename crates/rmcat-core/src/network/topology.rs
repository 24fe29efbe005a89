use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

use crate::network::types::{Channel, Link, Node, NodeId};

#[derive(Debug, Clone)]
pub(crate) struct Topology {
    pub(crate) graph: DiGraph<NodeId, Channel>,
    id2idx: HashMap<NodeId, NodeIndex>,
}

impl Topology {
    /// Creates a network topology from a list of nodes and links. This function returns an error if
    /// the given nodes and links fail to produce a valid topology. The checks are not exhaustive.
    ///
    /// Correctness properties:
    ///
    /// - Every node must have a unique ID.
    /// - Every link must have distinct endpoints in `nodes`.
    /// - Every node must be referenced by some link.
    /// - For any two nodes, there must be at most one link between them.
    pub(crate) fn new(nodes: &[Node], links: &[Link]) -> Result<Self, Error> {
        let mut g = DiGraph::new();
        let mut id2idx = HashMap::new();
        for &Node { id, .. } in nodes {
            let idx = g.add_node(id);
            if id2idx.insert(id, idx).is_some() {
                // CORRECTNESS: Every node must have a unique ID.
                return Err(Error::DuplicateNodeId(id));
            }
        }
        let mut referenced_nodes = HashSet::new();
        for &Link { id, a, b, .. } in links {
            // CORRECTNESS: Every link must have distinct endpoints in `nodes`.
            if a == b {
                return Err(Error::NodeAdjacentSelf(a));
            }
            let (ia, ib) = match (id2idx.get(&a), id2idx.get(&b)) {
                (Some(&ia), Some(&ib)) => (ia, ib),
                (None, _) => return Err(Error::UndeclaredNode(a)),
                (_, None) => return Err(Error::UndeclaredNode(b)),
            };
            // CORRECTNESS: For any two nodes, there must be at most one link between them.
            if g.find_edge(ia, ib).is_some() {
                return Err(Error::DuplicateLink { n1: a, n2: b });
            }
            referenced_nodes.insert(a);
            referenced_nodes.insert(b);
            // Channels are unidirectional
            g.add_edge(ia, ib, Channel::new(id, a, b));
            g.add_edge(ib, ia, Channel::new(id, b, a));
        }
        // CORRECTNESS: Every node must be referenced by some link.
        for &Node { id, .. } in nodes {
            if !referenced_nodes.contains(&id) {
                return Err(Error::IsolatedNode(id));
            }
        }
        Ok(Self { graph: g, id2idx })
    }

    pub(crate) fn idx_of(&self, id: &NodeId) -> Option<&NodeIndex> {
        self.id2idx.get(id)
    }

    pub(crate) fn find_channel(&self, src: NodeId, dst: NodeId) -> Option<EdgeIndex> {
        let a = *self.idx_of(&src)?;
        let b = *self.idx_of(&dst)?;
        self.graph.find_edge(a, b)
    }

    pub(crate) fn nr_channels(&self) -> usize {
        self.graph.edge_count()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Duplicate node ID {0}")]
    DuplicateNodeId(NodeId),

    #[error("Node {0} is connected to itself")]
    NodeAdjacentSelf(NodeId),

    #[error("Node {0} is not declared")]
    UndeclaredNode(NodeId),

    #[error("Duplicate links between {n1} and {n2}")]
    DuplicateLink { n1: NodeId, n2: NodeId },

    #[error("Node {0} is not connected to any other node")]
    IsolatedNode(NodeId),

    #[error("A linear topology needs at least two nodes (got {0})")]
    TooFewNodes(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::types::{DropTailQueue, LinkId};
    use crate::units::{BitsPerSec, Bytes, Millisecs};

    fn link(id: usize, a: usize, b: usize) -> Link {
        Link::new(
            LinkId::new(id),
            NodeId::new(a),
            NodeId::new(b),
            BitsPerSec::new(1_000_000),
            Millisecs::new(50),
            DropTailQueue::bytes(Bytes::new(37_500)),
        )
    }

    fn nodes(n: usize) -> Vec<Node> {
        (0..n).map(|i| Node::new(NodeId::new(i))).collect()
    }

    #[test]
    fn empty_topology_succeeds() {
        assert!(
            Topology::new(&[], &[]).is_ok(),
            "failed to create empty topology"
        );
    }

    #[test]
    fn chain_topology_has_two_channels_per_link() {
        let links = vec![link(0, 0, 1), link(1, 1, 2), link(2, 2, 3)];
        let topo = Topology::new(&nodes(4), &links).unwrap();
        assert_eq!(topo.nr_channels(), 6);
        let fwd = topo.find_channel(NodeId::new(1), NodeId::new(2)).unwrap();
        let rev = topo.find_channel(NodeId::new(2), NodeId::new(1)).unwrap();
        assert_eq!(topo.graph[fwd].link, LinkId::new(1));
        assert_eq!(topo.graph[rev].src, NodeId::new(2));
        assert!(topo.find_channel(NodeId::new(0), NodeId::new(3)).is_none());
    }

    #[test]
    fn duplicate_node_fails() {
        let mut ns = nodes(2);
        ns.push(Node::new(NodeId::new(0))); // error
        let res = Topology::new(&ns, &[link(0, 0, 1)]);
        assert!(matches!(res, Err(Error::DuplicateNodeId(..))));
    }

    #[test]
    fn node_adjacent_self_fails() {
        let links = vec![link(0, 0, 1), link(1, 1, 1)]; // error
        let res = Topology::new(&nodes(2), &links);
        assert!(matches!(res, Err(Error::NodeAdjacentSelf(..))));
    }

    #[test]
    fn undeclared_node_fails() {
        let links = vec![link(0, 0, 1), link(1, 1, 5)]; // error
        let res = Topology::new(&nodes(2), &links);
        assert!(matches!(res, Err(Error::UndeclaredNode(..))));
    }

    #[test]
    fn duplicate_links_fails() {
        let links = vec![link(0, 0, 1), link(1, 1, 0)]; // error
        let res = Topology::new(&nodes(2), &links);
        assert!(matches!(res, Err(Error::DuplicateLink { .. })));
    }

    #[test]
    fn isolated_node_fails() {
        let res = Topology::new(&nodes(3), &[link(0, 0, 1)]);
        assert!(matches!(res, Err(Error::IsolatedNode(..))));
    }
}
