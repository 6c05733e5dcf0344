//! The synthesized junctions of a chart and the directed links between
//! its nodes.
use std::collections::HashMap;

use quicksfc_dsl::sfc::{BranchKind, FlowType, NodeId};

use crate::link_graph::LinkGraph;

/// Vertical distance of a junction from its anchor when no member lies on
/// the expected side of the anchor.
pub const JUNCTION_GAP: i32 = 40;

/// One path through a junction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JunctionLeg {
    pub id: NodeId,
    /// The step or transition at the far end of the leg: the successor of a
    /// divergence or the predecessor of a convergence.
    pub member: NodeId,
}

/// A fan-out or fan-in point derived from connectivity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Junction {
    pub id: NodeId,
    pub kind: BranchKind,
    pub flow: FlowType,
    /// The element the junction belongs to: the source of a divergence or
    /// the target of a convergence.
    pub anchor: NodeId,
    /// Legs ordered by member identity.
    pub legs: Vec<JunctionLeg>,
}

impl Junction {
    pub fn leg_for(&self, member: NodeId) -> Option<&JunctionLeg> {
        self.legs.iter().find(|leg| leg.member == member)
    }

    pub fn is_diverge(&self) -> bool {
        self.kind == BranchKind::Diverge
    }
}

/// Result of synthesizing the junctions of a chart.
#[derive(Clone, Debug, Default)]
pub struct Topology {
    pub(crate) junctions: Vec<Junction>,
    pub(crate) links: Vec<(NodeId, NodeId)>,
    pub(crate) elements: Vec<NodeId>,
    pub(crate) next_id: u32,
}

impl Topology {
    /// Junctions in the order they were created.
    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    /// Directed links without duplicates, in emission order.
    pub fn links(&self) -> &[(NodeId, NodeId)] {
        &self.links
    }

    pub fn links_from(&self, id: NodeId) -> Vec<NodeId> {
        self.links
            .iter()
            .filter(|(from, _)| *from == id)
            .map(|(_, to)| *to)
            .collect()
    }

    pub fn links_to(&self, id: NodeId) -> Vec<NodeId> {
        self.links
            .iter()
            .filter(|(_, to)| *to == id)
            .map(|(from, _)| *from)
            .collect()
    }

    pub fn junction(&self, id: NodeId) -> Option<&Junction> {
        self.junctions.iter().find(|j| j.id == id)
    }

    /// The junction of the kind anchored at the element.
    pub fn junction_at(&self, anchor: NodeId, kind: BranchKind) -> Option<&Junction> {
        self.junctions
            .iter()
            .find(|j| j.anchor == anchor && j.kind == kind)
    }

    /// The identity the next synthesized node would receive.
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Computes the vertical position of every junction.
    ///
    /// A divergence sits halfway between its anchor and the highest member
    /// below the anchor. A convergence sits halfway between the lowest
    /// member above the anchor and the anchor. Junctions whose anchor has
    /// no position are left out.
    pub fn place_junctions<F>(&self, y_of: F) -> HashMap<NodeId, i32>
    where
        F: Fn(NodeId) -> Option<i32>,
    {
        let mut positions = HashMap::new();

        for junction in &self.junctions {
            let anchor = match y_of(junction.anchor) {
                Some(y) => y,
                None => continue,
            };
            let members = junction.legs.iter().filter_map(|leg| y_of(leg.member));

            let y = match junction.kind {
                BranchKind::Diverge => members
                    .filter(|y| *y > anchor)
                    .min()
                    .map(|below| (anchor + below) / 2)
                    .unwrap_or(anchor + JUNCTION_GAP),
                BranchKind::Converge => members
                    .filter(|y| *y < anchor)
                    .max()
                    .map(|above| (above + anchor) / 2)
                    .unwrap_or(anchor - JUNCTION_GAP),
            };
            positions.insert(junction.id, y);
        }

        positions
    }

    /// Element to element adjacency recovered from the links by walking
    /// through junctions and their legs. Sorted and without duplicates.
    pub fn collapsed_edges(&self) -> Vec<(NodeId, NodeId)> {
        LinkGraph::new(self).collapsed_edges(&self.elements)
    }
}
