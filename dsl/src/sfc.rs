//! Elements of a sequential function chart: steps, transitions and
//! the branches that split and join the flow between them.
//!
//! Elements refer to each other by handle rather than by reference. The
//! handles index into the arena held by [`crate::graph::Sfc`].
use std::fmt;

use serde::Serialize;

use crate::{core::SourceLoc, graph::Sfc};

/// Stable identity of a node in the chart.
///
/// Steps and transitions draw identities from one counter in declaration
/// order. Junctions and legs synthesized from the topology continue the
/// same sequence so that every node of the exported chart is distinct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a step. The handle is the step's display index (operand).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepRef(pub(crate) usize);

impl StepRef {
    pub fn operand(&self) -> usize {
        self.0
    }
}

/// Handle to a transition. The handle is the transition's display index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionRef(pub(crate) usize);

impl TransitionRef {
    pub fn operand(&self) -> usize {
        self.0
    }
}

/// Handle to a parse-time branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchRef(pub(crate) usize);

impl BranchRef {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Either a step or a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementRef {
    Step(StepRef),
    Transition(TransitionRef),
}

impl ElementRef {
    pub fn as_step(&self) -> Option<StepRef> {
        match self {
            ElementRef::Step(step) => Some(*step),
            ElementRef::Transition(_) => None,
        }
    }

    pub fn as_transition(&self) -> Option<TransitionRef> {
        match self {
            ElementRef::Step(_) => None,
            ElementRef::Transition(transition) => Some(*transition),
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self, ElementRef::Step(_))
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, ElementRef::Transition(_))
    }
}

impl From<StepRef> for ElementRef {
    fn from(value: StepRef) -> Self {
        ElementRef::Step(value)
    }
}

impl From<TransitionRef> for ElementRef {
    fn from(value: TransitionRef) -> Self {
        ElementRef::Transition(value)
    }
}

/// A process state.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub name: String,
    pub id: NodeId,
    /// Display index, dense among steps.
    pub operand: usize,
    /// Structured text executed while the step is active. May be empty.
    pub action: String,
    /// Timer preset in milliseconds.
    pub preset: u32,
    pub initial: bool,
    pub loc: SourceLoc,
    pub comments: Vec<String>,
    pub(crate) incoming: Vec<TransitionRef>,
    pub(crate) outgoing: Vec<TransitionRef>,
}

impl Step {
    pub fn line(&self) -> usize {
        self.loc.line
    }

    /// Transitions that activate this step, in the order they were linked.
    pub fn incoming(&self) -> &[TransitionRef] {
        &self.incoming
    }

    /// Transitions that deactivate this step, in the order they were linked.
    pub fn outgoing(&self) -> &[TransitionRef] {
        &self.outgoing
    }

    /// True if the action has content that should be exported.
    pub fn has_action(&self) -> bool {
        let action = self.action.trim();
        !action.is_empty() && action != "None"
    }
}

/// A guard condition between steps.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub name: String,
    pub id: NodeId,
    /// Display index, dense among transitions.
    pub operand: usize,
    pub condition: String,
    /// Name of the step given with `>> @name`.
    pub target: Option<String>,
    pub loc: SourceLoc,
    pub comment: Option<String>,
    pub(crate) incoming: Vec<StepRef>,
    pub(crate) outgoing: Vec<StepRef>,
}

impl Transition {
    pub fn line(&self) -> usize {
        self.loc.line
    }

    pub fn incoming(&self) -> &[StepRef] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[StepRef] {
        &self.outgoing
    }

    pub fn has_jump(&self) -> bool {
        self.target.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BranchKind {
    Diverge,
    Converge,
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchKind::Diverge => write!(f, "DIVERGE"),
            BranchKind::Converge => write!(f, "CONVERGE"),
        }
    }
}

/// How many legs of a branch are active at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlowType {
    /// All legs are active simultaneously.
    And,
    /// Exactly one leg is taken.
    Or,
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowType::And => write!(f, "AND"),
            FlowType::Or => write!(f, "OR"),
        }
    }
}

/// One path of a branch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Leg {
    steps: Vec<StepRef>,
    transitions: Vec<TransitionRef>,
    members: Vec<ElementRef>,
}

impl Leg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: impl Into<ElementRef>) {
        let element = element.into();
        if self.members.contains(&element) {
            return;
        }
        match element {
            ElementRef::Step(step) => self.steps.push(step),
            ElementRef::Transition(transition) => self.transitions.push(transition),
        }
        self.members.push(element);
    }

    pub fn steps(&self) -> &[StepRef] {
        &self.steps
    }

    pub fn transitions(&self) -> &[TransitionRef] {
        &self.transitions
    }

    /// Members in the order they were added.
    pub fn members(&self) -> &[ElementRef] {
        &self.members
    }

    /// Members ordered by source line, then identity.
    pub fn elements(&self, sfc: &Sfc) -> Vec<ElementRef> {
        sfc.leg_elements(self)
    }

    pub fn contains(&self, element: ElementRef) -> bool {
        self.members.contains(&element)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

/// A divergence or convergence as written in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Branch {
    pub kind: BranchKind,
    pub flow: FlowType,
    pub legs: Vec<Leg>,
    /// The element the branch attaches to: the source of a divergence or
    /// the target of a convergence.
    pub root: Option<ElementRef>,
    pub line: usize,
}

impl Branch {
    pub fn new(kind: BranchKind, flow: FlowType, line: usize) -> Self {
        Self {
            kind,
            flow,
            legs: vec![],
            root: None,
            line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_when_same_element_twice_then_kept_once() {
        let mut leg = Leg::new();
        leg.push(StepRef(0));
        leg.push(TransitionRef(0));
        leg.push(StepRef(0));

        assert_eq!(2, leg.len());
        assert_eq!(&[StepRef(0)], leg.steps());
        assert_eq!(&[TransitionRef(0)], leg.transitions());
    }

    #[test]
    fn element_ref_when_step_then_not_transition() {
        let element: ElementRef = StepRef(3).into();
        assert_eq!(Some(StepRef(3)), element.as_step());
        assert_eq!(None, element.as_transition());
    }
}
