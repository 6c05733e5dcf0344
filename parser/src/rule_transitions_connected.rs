//! Rule that every transition has a step before it and a step after it,
//! however the links were formed. Detached transitions are skipped: the
//! parser has already reported why they are not linked.
use std::collections::HashSet;

use quicksfc_dsl::{
    core::FileId,
    diagnostic::{Diagnostic, Label},
    graph::Sfc,
    sfc::NodeId,
};
use quicksfc_problems::Problem;

pub fn apply(
    sfc: &Sfc,
    file_id: &FileId,
    detached: &HashSet<NodeId>,
) -> Result<(), Vec<Diagnostic>> {
    let mut diagnostics = vec![];

    for transition in sfc.transitions() {
        if detached.contains(&transition.id) {
            continue;
        }
        if transition.incoming().is_empty() {
            diagnostics.push(Diagnostic::problem(
                Problem::TransitionWithoutIncoming,
                Label::source_loc(
                    file_id,
                    &transition.loc,
                    format!("Transition '@{}' has no incoming step", transition.name),
                ),
            ));
        }
        if transition.outgoing().is_empty() {
            diagnostics.push(Diagnostic::problem(
                Problem::TransitionWithoutOutgoing,
                Label::source_loc(
                    file_id,
                    &transition.loc,
                    format!(
                        "Transition '@{}' has no outgoing step (no >> @target and no following step)",
                        transition.name
                    ),
                ),
            ));
        }
    }

    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }
    Ok(())
}
