//! Transform that links each transition with a `>> @name` jump to the
//! named step.
//!
//! ## Passes
//!
//! SI@init()
//! T@go(start) >> @init
//! END
//!
//! ## Fails
//!
//! SI@init()
//! T@go(start) >> @missing
//! END
use quicksfc_dsl::{
    core::FileId,
    diagnostic::{Diagnostic, Label},
    graph::Sfc,
};
use quicksfc_problems::Problem;

use crate::options::ParseOptions;

pub fn apply(
    sfc: &mut Sfc,
    file_id: &FileId,
    _options: &ParseOptions,
) -> Result<(), Vec<Diagnostic>> {
    let mut diagnostics = vec![];

    let jumps: Vec<_> = sfc
        .transition_refs()
        .filter_map(|t| sfc.transition(t).target.clone().map(|target| (t, target)))
        .collect();

    for (transition, target) in jumps {
        match sfc.find_step(&target) {
            Some(step) => {
                sfc.link_transition_to_step(transition, step);
            }
            None => {
                let transition = sfc.transition(transition);
                diagnostics.push(
                    Diagnostic::problem(
                        Problem::JumpTargetNotFound,
                        Label::source_loc(
                            file_id,
                            &transition.loc,
                            format!("Invalid step reference: step '@{}' not found", target),
                        ),
                    )
                    .with_context("transition", &transition.name),
                );
            }
        }
    }

    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::Parser, tokenize_program};

    fn parse_only(source: &str) -> Sfc {
        let file_id = FileId::new();
        let stream = tokenize_program(source, &file_id).unwrap();
        let sfc = Parser::new(stream, &file_id).parse().sfc;
        sfc
    }

    #[test]
    fn apply_when_target_exists_then_links_transition_to_step() {
        let mut sfc = parse_only("SI@init()\nT@go(start) >> @init\nEND\n");

        apply(&mut sfc, &FileId::new(), &ParseOptions::default()).unwrap();

        let go = sfc.transition_by_name("go").unwrap();
        assert_eq!(1, go.outgoing().len());
        assert_eq!("init", sfc.step(go.outgoing()[0]).name);
    }

    #[test]
    fn apply_when_target_missing_then_error() {
        let mut sfc = parse_only("SI@init()\nT@go(start) >> @missing\nEND\n");

        let result = apply(&mut sfc, &FileId::new(), &ParseOptions::default());

        let diagnostics = result.unwrap_err();
        assert_eq!(1, diagnostics.len());
        assert_eq!(Problem::JumpTargetNotFound.code(), diagnostics[0].code);
        assert!(diagnostics[0].message().contains("'@missing' not found"));
    }
}
