//! The chart: an arena of steps, transitions and parse-time branches
//! together with the indices used to look them up.
use std::{collections::HashMap, fmt::Write};

use thiserror::Error;

use crate::{
    core::SourceLoc,
    sfc::{
        Branch, BranchRef, ElementRef, Leg, NodeId, Step, StepRef, Transition, TransitionRef,
    },
};

/// Reasons the arena refuses a new element.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("step name '{0}' is already used")]
    StepNameInUse(String),
    #[error("transition name '{0}' is already used")]
    TransitionNameInUse(String),
    #[error("step '{0}' cannot be initial because '{1}' is already initial")]
    InitialStepExists(String, String),
}

/// The declaration of a step.
#[derive(Clone, Debug, Default)]
pub struct StepDecl {
    pub name: String,
    pub action: String,
    pub preset: u32,
    pub initial: bool,
    pub loc: SourceLoc,
    pub comments: Vec<String>,
}

/// The declaration of a transition.
#[derive(Clone, Debug, Default)]
pub struct TransitionDecl {
    pub name: String,
    pub condition: String,
    pub target: Option<String>,
    pub loc: SourceLoc,
    pub comment: Option<String>,
}

/// A sequential function chart.
///
/// Steps and transitions refer to each other through handles so the
/// adjacency is bidirectional without shared ownership. Adjacency lists keep
/// the order in which links were made and never hold duplicates.
#[derive(Clone, Debug, Default)]
pub struct Sfc {
    steps: Vec<Step>,
    transitions: Vec<Transition>,
    branches: Vec<Branch>,
    /// Every step and transition in identity order.
    elements: Vec<ElementRef>,
    step_names: HashMap<String, StepRef>,
    transition_names: HashMap<String, TransitionRef>,
    ids: HashMap<NodeId, ElementRef>,
    initial_step: Option<StepRef>,
    next_id: u32,
}

impl Sfc {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Adds a step, assigning the next identity and display index.
    pub fn add_step(&mut self, decl: StepDecl) -> Result<StepRef, GraphError> {
        if self.step_names.contains_key(&decl.name) {
            return Err(GraphError::StepNameInUse(decl.name));
        }
        if decl.initial {
            if let Some(existing) = self.initial_step {
                return Err(GraphError::InitialStepExists(
                    decl.name,
                    self.step(existing).name.clone(),
                ));
            }
        }

        let handle = StepRef(self.steps.len());
        let id = self.allocate_id();
        if decl.initial {
            self.initial_step = Some(handle);
        }
        self.step_names.insert(decl.name.clone(), handle);
        self.ids.insert(id, ElementRef::Step(handle));
        self.elements.push(ElementRef::Step(handle));
        self.steps.push(Step {
            name: decl.name,
            id,
            operand: handle.0,
            action: decl.action,
            preset: decl.preset,
            initial: decl.initial,
            loc: decl.loc,
            comments: decl.comments,
            incoming: vec![],
            outgoing: vec![],
        });

        Ok(handle)
    }

    /// Adds a transition, assigning the next identity and display index.
    pub fn add_transition(&mut self, decl: TransitionDecl) -> Result<TransitionRef, GraphError> {
        if self.transition_names.contains_key(&decl.name) {
            return Err(GraphError::TransitionNameInUse(decl.name));
        }

        let handle = TransitionRef(self.transitions.len());
        let id = self.allocate_id();
        self.transition_names.insert(decl.name.clone(), handle);
        self.ids.insert(id, ElementRef::Transition(handle));
        self.elements.push(ElementRef::Transition(handle));
        self.transitions.push(Transition {
            name: decl.name,
            id,
            operand: handle.0,
            condition: decl.condition,
            target: decl.target,
            loc: decl.loc,
            comment: decl.comment,
            incoming: vec![],
            outgoing: vec![],
        });

        Ok(handle)
    }

    pub fn add_branch(&mut self, branch: Branch) -> BranchRef {
        self.branches.push(branch);
        BranchRef(self.branches.len() - 1)
    }

    /// Makes the transition an outgoing transition of the step (and the step
    /// an incoming step of the transition). Returns false if already linked.
    pub fn link_step_to_transition(&mut self, step: StepRef, transition: TransitionRef) -> bool {
        let step_entry = &mut self.steps[step.0].outgoing;
        if step_entry.contains(&transition) {
            return false;
        }
        step_entry.push(transition);
        let transition_entry = &mut self.transitions[transition.0].incoming;
        if !transition_entry.contains(&step) {
            transition_entry.push(step);
        }
        true
    }

    /// Makes the step an outgoing step of the transition (and the transition
    /// an incoming transition of the step). Returns false if already linked.
    pub fn link_transition_to_step(&mut self, transition: TransitionRef, step: StepRef) -> bool {
        let transition_entry = &mut self.transitions[transition.0].outgoing;
        if transition_entry.contains(&step) {
            return false;
        }
        transition_entry.push(step);
        let step_entry = &mut self.steps[step.0].incoming;
        if !step_entry.contains(&transition) {
            step_entry.push(transition);
        }
        true
    }

    /// Links two elements in flow direction. Elements of the same kind are
    /// never linked directly and return false.
    pub fn connect(&mut self, from: ElementRef, to: ElementRef) -> bool {
        match (from, to) {
            (ElementRef::Step(step), ElementRef::Transition(transition)) => {
                self.link_step_to_transition(step, transition)
            }
            (ElementRef::Transition(transition), ElementRef::Step(step)) => {
                self.link_transition_to_step(transition, step)
            }
            _ => false,
        }
    }

    /// Sets the jump target of a transition, returning the previous target.
    pub fn set_jump_target(
        &mut self,
        transition: TransitionRef,
        target: impl Into<String>,
    ) -> Option<String> {
        self.transitions[transition.0].target.replace(target.into())
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, branch: BranchRef) -> &Branch {
        &self.branches[branch.0]
    }

    /// Handles of every step and transition in identity order.
    pub fn elements(&self) -> &[ElementRef] {
        &self.elements
    }

    pub fn step_refs(&self) -> impl Iterator<Item = StepRef> {
        (0..self.steps.len()).map(StepRef)
    }

    pub fn transition_refs(&self) -> impl Iterator<Item = TransitionRef> {
        (0..self.transitions.len()).map(TransitionRef)
    }

    pub fn step(&self, step: StepRef) -> &Step {
        &self.steps[step.0]
    }

    pub fn transition(&self, transition: TransitionRef) -> &Transition {
        &self.transitions[transition.0]
    }

    pub fn find_step(&self, name: &str) -> Option<StepRef> {
        self.step_names.get(name).copied()
    }

    pub fn find_transition(&self, name: &str) -> Option<TransitionRef> {
        self.transition_names.get(name).copied()
    }

    pub fn step_by_name(&self, name: &str) -> Option<&Step> {
        self.find_step(name).map(|step| self.step(step))
    }

    pub fn transition_by_name(&self, name: &str) -> Option<&Transition> {
        self.find_transition(name).map(|t| self.transition(t))
    }

    /// The step or transition that has the identity.
    pub fn element(&self, id: NodeId) -> Option<ElementRef> {
        self.ids.get(&id).copied()
    }

    pub fn step_by_id(&self, id: NodeId) -> Option<&Step> {
        self.element(id)
            .and_then(|e| e.as_step())
            .map(|step| self.step(step))
    }

    pub fn transition_by_id(&self, id: NodeId) -> Option<&Transition> {
        self.element(id)
            .and_then(|e| e.as_transition())
            .map(|t| self.transition(t))
    }

    pub fn step_by_operand(&self, operand: usize) -> Option<&Step> {
        self.steps.get(operand)
    }

    pub fn transition_by_operand(&self, operand: usize) -> Option<&Transition> {
        self.transitions.get(operand)
    }

    /// The step declared on the 1-indexed line.
    pub fn step_by_line(&self, line: usize) -> Option<&Step> {
        self.steps.iter().find(|step| step.line() == line)
    }

    pub fn initial_step(&self) -> Option<&Step> {
        self.initial_step.map(|step| self.step(step))
    }

    pub fn initial_step_ref(&self) -> Option<StepRef> {
        self.initial_step
    }

    /// The identity the next node of the chart would receive. Nodes
    /// synthesized after parsing start numbering here.
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn id_of(&self, element: ElementRef) -> NodeId {
        match element {
            ElementRef::Step(step) => self.step(step).id,
            ElementRef::Transition(transition) => self.transition(transition).id,
        }
    }

    pub fn name_of(&self, element: ElementRef) -> &str {
        match element {
            ElementRef::Step(step) => &self.step(step).name,
            ElementRef::Transition(transition) => &self.transition(transition).name,
        }
    }

    pub fn loc_of(&self, element: ElementRef) -> &SourceLoc {
        match element {
            ElementRef::Step(step) => &self.step(step).loc,
            ElementRef::Transition(transition) => &self.transition(transition).loc,
        }
    }

    pub fn line_of(&self, element: ElementRef) -> usize {
        self.loc_of(element).line
    }

    /// Elements the element flows into.
    pub fn successors(&self, element: ElementRef) -> Vec<ElementRef> {
        match element {
            ElementRef::Step(step) => self
                .step(step)
                .outgoing()
                .iter()
                .map(|t| ElementRef::Transition(*t))
                .collect(),
            ElementRef::Transition(transition) => self
                .transition(transition)
                .outgoing()
                .iter()
                .map(|s| ElementRef::Step(*s))
                .collect(),
        }
    }

    /// Elements that flow into the element.
    pub fn predecessors(&self, element: ElementRef) -> Vec<ElementRef> {
        match element {
            ElementRef::Step(step) => self
                .step(step)
                .incoming()
                .iter()
                .map(|t| ElementRef::Transition(*t))
                .collect(),
            ElementRef::Transition(transition) => self
                .transition(transition)
                .incoming()
                .iter()
                .map(|s| ElementRef::Step(*s))
                .collect(),
        }
    }

    /// Members of the leg ordered by source line. Elements on the same line
    /// keep declaration order.
    pub fn leg_elements(&self, leg: &Leg) -> Vec<ElementRef> {
        let mut elements = leg.members().to_vec();
        elements.sort_by_key(|e| (self.line_of(*e), self.id_of(*e)));
        elements
    }

    /// A human readable description of the chart.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_summary(&mut out);
        out
    }

    fn write_summary(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "SFC Summary")?;
        writeln!(out, "  Steps: {}", self.steps.len())?;
        writeln!(out, "  Transitions: {}", self.transitions.len())?;
        writeln!(out, "  Branches: {}", self.branches.len())?;
        match self.initial_step() {
            Some(step) => writeln!(out, "  Initial step: @{}", step.name)?,
            None => writeln!(out, "  Initial step: none")?,
        }

        writeln!(out, "Steps:")?;
        for step in &self.steps {
            let marker = if step.initial { "SI" } else { "S" };
            write!(out, "  {}@{} (line {})", marker, step.name, step.line())?;
            if !step.action.is_empty() {
                write!(out, " action: {}", step.action)?;
            }
            if step.preset > 0 {
                write!(out, " preset: {}", step.preset)?;
            }
            writeln!(out)?;
            for transition in step.outgoing() {
                writeln!(out, "    -> T@{}", self.transition(*transition).name)?;
            }
        }

        writeln!(out, "Transitions:")?;
        for transition in &self.transitions {
            write!(
                out,
                "  T@{} (line {}) condition: {}",
                transition.name,
                transition.line(),
                transition.condition
            )?;
            if let Some(target) = &transition.target {
                write!(out, " jump: @{}", target)?;
            }
            writeln!(out)?;
            for step in transition.outgoing() {
                writeln!(out, "    -> S@{}", self.step(*step).name)?;
            }
        }

        if !self.branches.is_empty() {
            writeln!(out, "Branches:")?;
            for branch in &self.branches {
                write!(out, "  {} {} (line {})", branch.flow, branch.kind, branch.line)?;
                if let Some(root) = branch.root {
                    write!(out, " root: @{}", self.name_of(root))?;
                }
                writeln!(out)?;
                for (idx, leg) in branch.legs.iter().enumerate() {
                    let names: Vec<String> = self
                        .leg_elements(leg)
                        .into_iter()
                        .map(|e| format!("@{}", self.name_of(e)))
                        .collect();
                    writeln!(out, "    leg {}: {}", idx + 1, names.join(" "))?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(name: &str, line: usize) -> StepDecl {
        StepDecl {
            name: name.to_string(),
            loc: SourceLoc::line(line),
            ..Default::default()
        }
    }

    fn transition(name: &str, line: usize) -> TransitionDecl {
        TransitionDecl {
            name: name.to_string(),
            condition: "x".to_string(),
            loc: SourceLoc::line(line),
            ..Default::default()
        }
    }

    #[test]
    fn step_by_line_when_declared_then_found() {
        let mut sfc = Sfc::new();
        sfc.add_step(step("a", 1)).unwrap();
        sfc.add_transition(transition("t", 2)).unwrap();
        sfc.add_step(step("b", 3)).unwrap();

        assert_eq!("b", sfc.step_by_line(3).unwrap().name);
        assert!(sfc.step_by_line(2).is_none());
    }

    #[test]
    fn add_when_steps_and_transitions_then_ids_shared_and_operands_per_kind() {
        let mut sfc = Sfc::new();
        let s0 = sfc.add_step(step("a", 1)).unwrap();
        let t0 = sfc.add_transition(transition("t", 2)).unwrap();
        let s1 = sfc.add_step(step("b", 3)).unwrap();

        assert_eq!(NodeId(0), sfc.step(s0).id);
        assert_eq!(NodeId(1), sfc.transition(t0).id);
        assert_eq!(NodeId(2), sfc.step(s1).id);
        assert_eq!(1, sfc.step(s1).operand);
        assert_eq!(0, sfc.transition(t0).operand);
        assert_eq!(3, sfc.next_id());
    }

    #[test]
    fn add_step_when_name_used_then_err() {
        let mut sfc = Sfc::new();
        sfc.add_step(step("a", 1)).unwrap();
        assert_eq!(
            Err(GraphError::StepNameInUse("a".to_string())),
            sfc.add_step(step("a", 2))
        );
    }

    #[test]
    fn add_step_when_second_initial_then_err() {
        let mut sfc = Sfc::new();
        sfc.add_step(StepDecl {
            initial: true,
            ..step("a", 1)
        })
        .unwrap();
        let result = sfc.add_step(StepDecl {
            initial: true,
            ..step("b", 2)
        });
        assert!(matches!(result, Err(GraphError::InitialStepExists(_, _))));
    }

    #[test]
    fn connect_when_linked_twice_then_no_duplicates() {
        let mut sfc = Sfc::new();
        let s = sfc.add_step(step("a", 1)).unwrap();
        let t = sfc.add_transition(transition("t", 2)).unwrap();

        assert!(sfc.connect(s.into(), t.into()));
        assert!(!sfc.connect(s.into(), t.into()));

        assert_eq!(&[t], sfc.step(s).outgoing());
        assert_eq!(&[s], sfc.transition(t).incoming());
    }

    #[test]
    fn connect_when_same_kind_then_false() {
        let mut sfc = Sfc::new();
        let a = sfc.add_step(step("a", 1)).unwrap();
        let b = sfc.add_step(step("b", 2)).unwrap();
        assert!(!sfc.connect(a.into(), b.into()));
    }

    #[test]
    fn lookups_when_element_added_then_found_by_name_id_and_operand() {
        let mut sfc = Sfc::new();
        sfc.add_step(step("a", 1)).unwrap();
        let t = sfc.add_transition(transition("t", 2)).unwrap();

        assert_eq!("t", sfc.transition_by_id(NodeId(1)).unwrap().name);
        assert_eq!("a", sfc.step_by_operand(0).unwrap().name);
        assert_eq!(Some(t), sfc.find_transition("t"));
        assert!(sfc.step_by_id(NodeId(1)).is_none());
    }

    #[test]
    fn leg_elements_when_same_line_then_declaration_order() {
        let mut sfc = Sfc::new();
        let s = sfc.add_step(step("late", 5)).unwrap();
        let t = sfc.add_transition(transition("t", 3)).unwrap();
        let s2 = sfc.add_step(step("same", 3)).unwrap();

        let mut leg = Leg::new();
        leg.push(s);
        leg.push(s2);
        leg.push(t);

        assert_eq!(
            vec![
                ElementRef::Transition(t),
                ElementRef::Step(s2),
                ElementRef::Step(s)
            ],
            sfc.leg_elements(&leg)
        );
    }

    #[test]
    fn summary_when_chart_then_lists_elements() {
        let mut sfc = Sfc::new();
        let s = sfc
            .add_step(StepDecl {
                initial: true,
                ..step("init", 1)
            })
            .unwrap();
        let t = sfc.add_transition(transition("go", 2)).unwrap();
        sfc.connect(s.into(), t.into());

        let summary = sfc.summary();
        assert!(summary.contains("Initial step: @init"));
        assert!(summary.contains("-> T@go"));
    }
}
