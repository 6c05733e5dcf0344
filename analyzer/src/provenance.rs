//! Traces links back to the written branch that created them.
use std::collections::HashMap;

use quicksfc_dsl::{
    graph::Sfc,
    sfc::{BranchKind, ElementRef, FlowType, NodeId},
};

/// Maps the links that attach branch legs to their root onto the written
/// branch that made them.
pub(crate) struct Provenance {
    origins: HashMap<(NodeId, NodeId), usize>,
    flows: Vec<FlowType>,
}

impl Provenance {
    pub fn new(sfc: &Sfc) -> Self {
        let mut origins = HashMap::new();

        for (index, branch) in sfc.branches().iter().enumerate() {
            let root = match branch.root {
                Some(root) => root,
                None => continue,
            };

            for leg in &branch.legs {
                let elements = leg.elements(sfc);
                let edge = match branch.kind {
                    BranchKind::Diverge => elements
                        .first()
                        .filter(|first| Self::links(sfc, root, **first))
                        .map(|first| (sfc.id_of(root), sfc.id_of(*first))),
                    BranchKind::Converge => Self::tail(sfc, &elements, root)
                        .map(|last| (sfc.id_of(last), sfc.id_of(root))),
                };
                if let Some(edge) = edge {
                    origins.entry(edge).or_insert(index);
                }
            }
        }

        Self {
            origins,
            flows: sfc.branches().iter().map(|b| b.flow).collect(),
        }
    }

    /// The last element of a leg that links to the convergence root.
    fn tail(sfc: &Sfc, elements: &[ElementRef], root: ElementRef) -> Option<ElementRef> {
        elements
            .iter()
            .rev()
            .find(|element| Self::links(sfc, **element, root))
            .copied()
    }

    fn links(sfc: &Sfc, from: ElementRef, to: ElementRef) -> bool {
        sfc.successors(from).contains(&to)
    }

    /// The flow of a junction whose links are the edges. The junction is
    /// parallel only when every edge came from the same parallel branch.
    pub fn flow_of(&self, edges: &[(NodeId, NodeId)]) -> FlowType {
        let mut origins = edges.iter().map(|edge| self.origins.get(edge));
        let first = match origins.next() {
            Some(Some(first)) => *first,
            _ => return FlowType::Or,
        };
        if !origins.all(|origin| origin == Some(&first)) {
            return FlowType::Or;
        }
        self.flows.get(first).copied().unwrap_or(FlowType::Or)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::parse_resource;

    #[test]
    fn flow_of_when_parallel_branch_edges_then_and() {
        let sfc = parse_resource("parallel.qsfc");
        let provenance = Provenance::new(&sfc);
        let id = |name: &str| sfc.step_by_name(name).unwrap().id;
        let start = sfc.transition_by_name("start").unwrap().id;

        let flow = provenance.flow_of(&[(start, id("mix")), (start, id("heat"))]);

        assert_eq!(FlowType::And, flow);
    }

    #[test]
    fn flow_of_when_edge_unknown_then_or() {
        let sfc = parse_resource("parallel.qsfc");
        let provenance = Provenance::new(&sfc);
        let start = sfc.transition_by_name("start").unwrap().id;
        let mix = sfc.step_by_name("mix").unwrap().id;
        let finish = sfc.step_by_name("finish").unwrap().id;

        let flow = provenance.flow_of(&[(start, mix), (start, finish)]);

        assert_eq!(FlowType::Or, flow);
    }

    #[test]
    fn flow_of_when_selection_then_or() {
        let sfc = parse_resource("selection.qsfc");
        let provenance = Provenance::new(&sfc);
        let idle = sfc.step_by_name("idle").unwrap().id;
        let fill = sfc.transition_by_name("fill").unwrap().id;
        let drain = sfc.transition_by_name("drain").unwrap().id;

        assert_eq!(FlowType::Or, provenance.flow_of(&[(idle, fill), (idle, drain)]));
    }
}
