//! Derives junctions from the fan-in and fan-out of every element.
//!
//! An element with more than one predecessor gets a convergence and an
//! element with more than one successor gets a divergence. Each junction
//! has one leg per predecessor or successor. Links that end at a member of
//! a junction are routed through that member's leg.
use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use quicksfc_dsl::{
    diagnostic::Diagnostic,
    graph::Sfc,
    sfc::{BranchKind, ElementRef, NodeId},
};

use crate::{
    provenance::Provenance,
    topology::{Junction, JunctionLeg, Topology},
};

/// Synthesizes the junctions and directed links of the chart.
///
/// The chart is not changed. Fails only when the chart breaks the
/// invariants that parsing guarantees.
pub fn synthesize(sfc: &Sfc) -> Result<Topology, Diagnostic> {
    let mut synthesizer = Synthesizer::new(sfc);
    synthesizer.create_junctions()?;
    let links = synthesizer.emit_links()?;

    debug!(
        "Synthesized {} junctions and {} links",
        synthesizer.junctions.len(),
        links.len()
    );

    Ok(Topology {
        junctions: synthesizer.junctions,
        links,
        elements: sfc.elements().iter().map(|e| sfc.id_of(*e)).collect(),
        next_id: synthesizer.next_id,
    })
}

struct Synthesizer<'a> {
    sfc: &'a Sfc,
    provenance: Provenance,
    next_id: u32,
    junctions: Vec<Junction>,
    /// Index into `junctions` of the divergence anchored at an element.
    diverges: HashMap<NodeId, usize>,
    /// Index into `junctions` of the convergence anchored at an element.
    converges: HashMap<NodeId, usize>,
}

impl<'a> Synthesizer<'a> {
    fn new(sfc: &'a Sfc) -> Self {
        Self {
            sfc,
            provenance: Provenance::new(sfc),
            next_id: sfc.next_id(),
            junctions: vec![],
            diverges: HashMap::new(),
            converges: HashMap::new(),
        }
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn ids(&self, elements: Vec<ElementRef>) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = elements.into_iter().map(|e| self.sfc.id_of(e)).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    fn create_junctions(&mut self) -> Result<(), Diagnostic> {
        let sfc = self.sfc;
        for element in sfc.elements() {
            let anchor = sfc.id_of(*element);

            let predecessors = self.ids(sfc.predecessors(*element));
            if predecessors.len() > 1 {
                let index = self.add_junction(anchor, BranchKind::Converge, &predecessors)?;
                self.converges.insert(anchor, index);
            }

            let successors = self.ids(sfc.successors(*element));
            if successors.len() > 1 {
                let index = self.add_junction(anchor, BranchKind::Diverge, &successors)?;
                self.diverges.insert(anchor, index);
            }
        }
        Ok(())
    }

    fn add_junction(
        &mut self,
        anchor: NodeId,
        kind: BranchKind,
        members: &[NodeId],
    ) -> Result<usize, Diagnostic> {
        if members.len() < 2 {
            return Err(Diagnostic::internal_error(format!(
                "{} junction at node {} has fewer than two legs",
                kind, anchor
            )));
        }

        let edges: Vec<(NodeId, NodeId)> = members
            .iter()
            .map(|member| match kind {
                BranchKind::Diverge => (anchor, *member),
                BranchKind::Converge => (*member, anchor),
            })
            .collect();
        let flow = self.provenance.flow_of(&edges);

        let id = self.allocate_id();
        let legs = members
            .iter()
            .map(|member| JunctionLeg {
                id: self.allocate_id(),
                member: *member,
            })
            .collect();

        trace!(
            "{} {} junction {} at node {} with {} legs",
            flow,
            kind,
            id,
            anchor,
            members.len()
        );

        self.junctions.push(Junction {
            id,
            kind,
            flow,
            anchor,
            legs,
        });
        Ok(self.junctions.len() - 1)
    }

    fn emit_links(&self) -> Result<Vec<(NodeId, NodeId)>, Diagnostic> {
        let mut links = vec![];

        for element in self.sfc.elements() {
            let source = self.sfc.id_of(*element);
            for successor in self.sfc.successors(*element) {
                let target = self.sfc.id_of(successor);
                let from = match self.diverges.get(&source) {
                    Some(index) => self.leg_id(*index, target)?,
                    None => source,
                };
                let to = match self.converges.get(&target) {
                    Some(index) => self.leg_id(*index, source)?,
                    None => target,
                };
                links.push((from, to));
            }
        }

        for junction in &self.junctions {
            match junction.kind {
                BranchKind::Diverge => links.push((junction.anchor, junction.id)),
                BranchKind::Converge => links.push((junction.id, junction.anchor)),
            }
        }

        let mut seen = HashSet::new();
        links.retain(|link| seen.insert(*link));
        Ok(links)
    }

    fn leg_id(&self, index: usize, member: NodeId) -> Result<NodeId, Diagnostic> {
        let junction = &self.junctions[index];
        junction
            .leg_for(member)
            .map(|leg| leg.id)
            .ok_or_else(|| {
                Diagnostic::internal_error(format!(
                    "Node {} is not a leg of junction {}",
                    member, junction.id
                ))
            })
    }
}
