//! Positions of the exported nodes.
//!
//! Elements flow top-down from the initial step. Links that return to an
//! earlier element (the back edges of a depth first walk) do not take part
//! in placement, so loops do not push elements further down.
use std::collections::HashMap;

use log::debug;
use petgraph::{
    algo::toposort,
    stable_graph::{NodeIndex, StableDiGraph},
    visit::{depth_first_search, DfsEvent},
    Direction,
};
use quicksfc_analyzer::Topology;
use quicksfc_dsl::{
    graph::Sfc,
    sfc::{ElementRef, NodeId},
};

pub const INITIAL_X: i32 = 200;
pub const INITIAL_Y: i32 = 100;
pub const STEP_HEIGHT: i32 = 160;
pub const TRANSITION_HEIGHT: i32 = 80;
pub const BRANCH_OFFSET_X: i32 = 160;
pub const LEG_SPACING: i32 = 140;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Default)]
pub struct Layout {
    elements: HashMap<NodeId, Point>,
    junctions: HashMap<NodeId, i32>,
}

impl Layout {
    pub fn compute(sfc: &Sfc, topology: &Topology) -> Self {
        let mut layout = Layout::default();
        let mut graph = StableDiGraph::<ElementRef, ()>::new();
        let mut nodes = HashMap::new();

        for element in sfc.elements() {
            nodes.insert(*element, graph.add_node(*element));
        }
        for element in sfc.elements() {
            for successor in sfc.successors(*element) {
                if let (Some(from), Some(to)) = (nodes.get(element), nodes.get(&successor)) {
                    graph.add_edge(*from, *to, ());
                }
            }
        }

        let start = sfc
            .initial_step_ref()
            .and_then(|step| nodes.get(&ElementRef::Step(step)).copied());
        let mut reached = vec![];
        let mut back_edges = vec![];
        depth_first_search(&graph, start, |event| match event {
            DfsEvent::Discover(node, _) => reached.push(node),
            DfsEvent::BackEdge(from, to) => back_edges.push((from, to)),
            _ => {}
        });

        let forward = Self::forward_graph(&graph, &reached, &back_edges);
        let order = toposort(&forward, None).unwrap_or_else(|_| {
            let mut order = reached.clone();
            order.sort_by_key(|node| sfc.id_of(graph[*node]));
            order
        });
        for node in order {
            let point = layout.place(sfc, &forward, node);
            layout.elements.insert(sfc.id_of(forward[node]), point);
        }

        layout.place_unreached(sfc);
        layout.junctions = topology.place_junctions(|id| layout.elements.get(&id).map(|p| p.y));
        layout
    }

    /// The graph without back edges and without elements the walk did not
    /// reach.
    fn forward_graph(
        graph: &StableDiGraph<ElementRef, ()>,
        reached: &[NodeIndex],
        back_edges: &[(NodeIndex, NodeIndex)],
    ) -> StableDiGraph<ElementRef, ()> {
        let mut forward = graph.clone();
        for (from, to) in back_edges {
            if let Some(edge) = forward.find_edge(*from, *to) {
                forward.remove_edge(edge);
            }
        }
        let unreached: Vec<NodeIndex> = graph
            .node_indices()
            .filter(|node| !reached.contains(node))
            .collect();
        for node in unreached {
            forward.remove_node(node);
        }
        forward
    }

    fn place(
        &self,
        sfc: &Sfc,
        forward: &StableDiGraph<ElementRef, ()>,
        node: NodeIndex,
    ) -> Point {
        let mut predecessors: Vec<NodeIndex> = forward
            .neighbors_directed(node, Direction::Incoming)
            .collect();
        predecessors.sort_by_key(|p| sfc.id_of(forward[*p]));

        let placed: Vec<(NodeIndex, Point)> = predecessors
            .iter()
            .filter_map(|p| {
                self.elements
                    .get(&sfc.id_of(forward[*p]))
                    .map(|point| (*p, *point))
            })
            .collect();
        if placed.is_empty() {
            return Point {
                x: INITIAL_X,
                y: INITIAL_Y,
            };
        }

        let y = placed
            .iter()
            .map(|(p, point)| point.y + height(forward[*p]))
            .max()
            .unwrap_or(INITIAL_Y);

        let x = if let [(parent, point)] = placed.as_slice() {
            let mut siblings: Vec<NodeIndex> = forward
                .neighbors_directed(*parent, Direction::Outgoing)
                .collect();
            siblings.sort_by_key(|s| sfc.id_of(forward[*s]));
            let count = siblings.len() as i32;
            match siblings.iter().position(|s| *s == node) {
                Some(index) if count > 1 => {
                    point.x - (count - 1) * LEG_SPACING / 2 + index as i32 * LEG_SPACING
                }
                _ => point.x,
            }
        } else {
            placed.iter().map(|(_, point)| point.x).sum::<i32>() / placed.len() as i32
        };

        Point { x, y }
    }

    /// Stacks the elements that are not reachable from the initial step in a
    /// column to the right of everything else.
    fn place_unreached(&mut self, sfc: &Sfc) {
        let x = self
            .elements
            .values()
            .map(|p| p.x)
            .max()
            .unwrap_or(INITIAL_X)
            + BRANCH_OFFSET_X;
        let mut y = INITIAL_Y;

        for element in sfc.elements() {
            let id = sfc.id_of(*element);
            if self.elements.contains_key(&id) {
                continue;
            }
            debug!(
                "Element @{} is unreachable, placed at ({}, {})",
                sfc.name_of(*element),
                x,
                y
            );
            self.elements.insert(id, Point { x, y });
            y += height(*element);
        }
    }

    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.elements.get(&id).copied()
    }

    pub fn junction_y(&self, id: NodeId) -> i32 {
        self.junctions
            .get(&id)
            .copied()
            .unwrap_or(INITIAL_Y + STEP_HEIGHT)
    }
}

fn height(element: ElementRef) -> i32 {
    match element {
        ElementRef::Step(_) => STEP_HEIGHT,
        ElementRef::Transition(_) => TRANSITION_HEIGHT,
    }
}
