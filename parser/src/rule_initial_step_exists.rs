//! Rule that the chart has an initial step.
//!
//! ## Passes
//!
//! SI@init()
//! END
//!
//! ## Fails
//!
//! S@first()
//! END
use quicksfc_dsl::{
    core::FileId,
    diagnostic::{Diagnostic, Label},
    graph::Sfc,
};
use quicksfc_problems::Problem;

pub fn apply(sfc: &Sfc, file_id: &FileId) -> Result<(), Vec<Diagnostic>> {
    if sfc.initial_step().is_some() {
        return Ok(());
    }
    Err(vec![Diagnostic::problem(
        Problem::InitialStepMissing,
        Label::file(file_id, "No initial step (SI) found"),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use quicksfc_dsl::{core::SourceLoc, graph::StepDecl};

    fn step(initial: bool) -> StepDecl {
        StepDecl {
            name: "first".into(),
            initial,
            loc: SourceLoc::line(1),
            ..Default::default()
        }
    }

    #[test]
    fn apply_when_initial_step_then_ok() {
        let mut sfc = Sfc::new();
        sfc.add_step(step(true)).unwrap();

        assert!(apply(&sfc, &FileId::new()).is_ok());
    }

    #[test]
    fn apply_when_no_initial_step_then_error_without_line() {
        let mut sfc = Sfc::new();
        sfc.add_step(step(false)).unwrap();

        let diagnostics = apply(&sfc, &FileId::new()).unwrap_err();

        assert_eq!(Problem::InitialStepMissing.code(), diagnostics[0].code);
        assert_eq!(None, diagnostics[0].line());
    }
}
