//! Directed graph over every node of a topology: elements, junctions and
//! junction legs.
use std::collections::{HashMap, HashSet};

use fixedbitset::FixedBitSet;
use petgraph::{
    stable_graph::{NodeIndex, StableDiGraph},
    visit::NodeIndexable,
    Direction,
};
use quicksfc_dsl::sfc::NodeId;

use crate::topology::Topology;

pub(crate) struct LinkGraph {
    graph: StableDiGraph<NodeId, (), u32>,
    nodes: HashMap<NodeId, NodeIndex>,
}

impl LinkGraph {
    /// Builds the graph from the links plus the membership of legs in their
    /// junction (junction to leg for a divergence, leg to junction for a
    /// convergence). Links alone do not connect a junction to its legs.
    pub fn new(topology: &Topology) -> Self {
        let mut graph = Self {
            graph: StableDiGraph::new(),
            nodes: HashMap::new(),
        };

        for (from, to) in topology.links() {
            graph.add_edge(*from, *to);
        }
        for junction in topology.junctions() {
            for leg in &junction.legs {
                if junction.is_diverge() {
                    graph.add_edge(junction.id, leg.id);
                } else {
                    graph.add_edge(leg.id, junction.id);
                }
            }
        }

        graph
    }

    fn node(&mut self, id: NodeId) -> NodeIndex {
        match self.nodes.get(&id) {
            Some(node) => *node,
            None => {
                let node = self.graph.add_node(id);
                self.nodes.insert(id, node);
                node
            }
        }
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let from = self.node(from);
        let to = self.node(to);
        self.graph.add_edge(from, to, ());
    }

    /// For each element, the elements reachable by passing only through
    /// junction and leg nodes.
    pub fn collapsed_edges(&self, elements: &[NodeId]) -> Vec<(NodeId, NodeId)> {
        let is_element: HashSet<NodeId> = elements.iter().copied().collect();
        let mut edges = vec![];

        for element in elements {
            let start = match self.nodes.get(element) {
                Some(node) => *node,
                None => continue,
            };

            let mut visited = FixedBitSet::with_capacity(self.graph.node_bound());
            let mut stack: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(start, Direction::Outgoing)
                .collect();

            while let Some(node) = stack.pop() {
                let id = self.graph[node];
                if is_element.contains(&id) {
                    edges.push((*element, id));
                    continue;
                }
                if visited.put(node.index()) {
                    continue;
                }
                stack.extend(self.graph.neighbors_directed(node, Direction::Outgoing));
            }
        }

        edges.sort();
        edges.dedup();
        edges
    }

    /// Elements reachable from the element along links, including itself.
    #[cfg(test)]
    pub fn reachable(&self, from: NodeId) -> Vec<NodeId> {
        use petgraph::visit::{Dfs, Walker};

        let start = match self.nodes.get(&from) {
            Some(node) => *node,
            None => return vec![],
        };
        let mut reached: Vec<NodeId> = Dfs::new(&self.graph, start)
            .iter(&self.graph)
            .map(|node| self.graph[node])
            .collect();
        reached.sort();
        reached
    }
}

#[cfg(test)]
mod tests {
    use quicksfc_dsl::sfc::NodeId;

    use super::LinkGraph;
    use crate::test_helpers::synthesize_resource;

    #[test]
    fn reachable_when_loop_then_all_elements_reached() {
        let (sfc, topology) = synthesize_resource("selection.qsfc");
        let graph = LinkGraph::new(&topology);

        let reached = graph.reachable(NodeId(0));

        for element in sfc.elements() {
            assert!(reached.contains(&sfc.id_of(*element)));
        }
    }

    #[test]
    fn collapsed_edges_when_parallel_then_junctions_skipped() {
        let (sfc, topology) = synthesize_resource("parallel.qsfc");
        let graph = LinkGraph::new(&topology);
        let elements: Vec<NodeId> = sfc.elements().iter().map(|e| sfc.id_of(*e)).collect();

        let edges = graph.collapsed_edges(&elements);

        assert!(!edges.is_empty());
        for (from, to) in &edges {
            assert!(elements.contains(from));
            assert!(elements.contains(to));
        }
    }
}
