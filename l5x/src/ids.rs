//! Identities and operands of exported nodes.
use quicksfc_analyzer::Topology;
use quicksfc_dsl::{
    graph::Sfc,
    sfc::{NodeId, Step, Transition},
};

pub fn step_operand(step: &Step) -> String {
    format!("Step_{:03}", step.operand)
}

pub fn transition_operand(transition: &Transition) -> String {
    format!("Tran_{:03}", transition.operand)
}

/// The action attached to a step in the export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionId {
    pub id: NodeId,
    /// Display index, dense among actions.
    pub index: usize,
}

impl ActionId {
    pub fn operand(&self) -> String {
        format!("Action_{:03}", self.index)
    }
}

/// Action identities indexed by step operand. Actions are numbered after
/// every element and junction in step order.
pub struct ActionIds {
    by_step: Vec<Option<ActionId>>,
}

impl ActionIds {
    pub fn allocate(sfc: &Sfc, topology: &Topology) -> Self {
        let mut next = topology.next_id();
        let mut index = 0;
        let by_step = sfc
            .steps()
            .iter()
            .map(|step| {
                if !step.has_action() {
                    return None;
                }
                let action = ActionId {
                    id: NodeId(next),
                    index,
                };
                next += 1;
                index += 1;
                Some(action)
            })
            .collect();
        Self { by_step }
    }

    pub fn for_step(&self, step: &Step) -> Option<&ActionId> {
        self.by_step.get(step.operand).and_then(|a| a.as_ref())
    }

    /// Actions in step order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionId> {
        self.by_step.iter().flatten()
    }
}
