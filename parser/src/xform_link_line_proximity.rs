//! Transform that gives a transition without any next step the nearest
//! step declared after it.
//!
//! Only runs with [`JumpFallback::LineProximity`]. In strict mode the
//! transition stays unlinked and connectivity checking reports it.
use log::debug;
use quicksfc_dsl::{core::FileId, diagnostic::Diagnostic, graph::Sfc, sfc::ElementRef};

use crate::options::{JumpFallback, ParseOptions};

pub fn apply(
    sfc: &mut Sfc,
    _file_id: &FileId,
    options: &ParseOptions,
) -> Result<(), Vec<Diagnostic>> {
    if options.jump_fallback != JumpFallback::LineProximity {
        return Ok(());
    }

    let unlinked: Vec<_> = sfc
        .transition_refs()
        .filter(|t| {
            let transition = sfc.transition(*t);
            !transition.has_jump() && transition.outgoing().is_empty()
        })
        .collect();

    for transition in unlinked {
        let position = {
            let element = ElementRef::Transition(transition);
            (sfc.line_of(element), sfc.id_of(element))
        };

        let nearest = sfc
            .step_refs()
            .map(|s| {
                let element = ElementRef::Step(s);
                (sfc.line_of(element), sfc.id_of(element), s)
            })
            .filter(|(line, id, _)| (*line, *id) > position)
            .min_by_key(|(line, id, _)| (*line, *id))
            .map(|(_, _, s)| s);

        if let Some(step) = nearest {
            debug!(
                "Linking transition '@{}' to nearest following step '@{}'",
                sfc.transition(transition).name,
                sfc.step(step).name
            );
            sfc.link_transition_to_step(transition, step);
        }
    }

    Ok(())
}
