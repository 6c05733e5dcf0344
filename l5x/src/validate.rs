//! Checks that a chart can be exported.
//!
//! Parsing already rejects most broken charts. These checks repeat the
//! structural ones for charts built by other means and add the limits of
//! the target format on names.
use lazy_static::lazy_static;
use quicksfc_dsl::{
    core::{FileId, SourceLoc},
    diagnostic::{Diagnostic, Label},
    error::ValidationError,
    graph::Sfc,
    sfc::BranchKind,
};
use quicksfc_problems::Problem;
use regex::Regex;

pub const MAX_NAME_LENGTH: usize = 40;

lazy_static! {
    static ref VALID_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

type Check = fn(&Sfc, &FileId) -> Result<(), Vec<Diagnostic>>;

/// Runs every check and returns all problems together.
pub fn validate(sfc: &Sfc, file_id: &FileId) -> Result<(), ValidationError> {
    let checks: Vec<Check> = vec![
        check_initial_step,
        check_step_connectivity,
        check_transition_connectivity,
        check_jump_targets,
        check_branch_structure,
        check_names,
    ];

    let mut errors = vec![];
    for check in checks {
        if let Err(mut diagnostics) = check(sfc, file_id) {
            errors.append(&mut diagnostics);
        }
    }

    if !errors.is_empty() {
        return Err(ValidationError::new(errors));
    }
    Ok(())
}

fn into_result(diagnostics: Vec<Diagnostic>) -> Result<(), Vec<Diagnostic>> {
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

fn check_initial_step(sfc: &Sfc, file_id: &FileId) -> Result<(), Vec<Diagnostic>> {
    if sfc.initial_step().is_some() {
        return Ok(());
    }
    Err(vec![Diagnostic::problem(
        Problem::InitialStepMissing,
        Label::file(file_id, "No initial step (SI) found in SFC"),
    )])
}

/// Steps other than the initial step must be reachable from somewhere.
fn check_step_connectivity(sfc: &Sfc, file_id: &FileId) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = sfc
        .steps()
        .iter()
        .filter(|step| !step.initial && step.incoming().is_empty())
        .map(|step| {
            Diagnostic::problem(
                Problem::StepWithoutIncoming,
                Label::source_loc(
                    file_id,
                    &step.loc,
                    format!("Step '@{}' has no incoming transitions", step.name),
                ),
            )
        })
        .collect();
    into_result(diagnostics)
}

fn check_transition_connectivity(sfc: &Sfc, file_id: &FileId) -> Result<(), Vec<Diagnostic>> {
    let mut diagnostics = vec![];
    for transition in sfc.transitions() {
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
                    format!("Transition '@{}' has no outgoing step", transition.name),
                ),
            ));
        }
    }
    into_result(diagnostics)
}

fn check_jump_targets(sfc: &Sfc, file_id: &FileId) -> Result<(), Vec<Diagnostic>> {
    let mut diagnostics = vec![];
    for transition in sfc.transitions() {
        if let Some(target) = &transition.target {
            if sfc.find_step(target).is_none() {
                diagnostics.push(Diagnostic::problem(
                    Problem::JumpTargetNotFound,
                    Label::source_loc(
                        file_id,
                        &transition.loc,
                        format!(
                            "Transition '@{}' jumps to unknown step '@{}'",
                            transition.name, target
                        ),
                    ),
                ));
            }
        }
    }
    into_result(diagnostics)
}

fn check_branch_structure(sfc: &Sfc, file_id: &FileId) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = sfc
        .branches()
        .iter()
        .filter(|branch| branch.kind == BranchKind::Diverge && branch.legs.len() < 2)
        .map(|branch| {
            Diagnostic::problem(
                Problem::DivergenceTooFewLegs,
                Label::source_loc(
                    file_id,
                    &SourceLoc::line(branch.line),
                    format!(
                        "{} divergence on line {} has fewer than 2 legs",
                        branch.flow, branch.line
                    ),
                ),
            )
        })
        .collect();
    into_result(diagnostics)
}

/// Names become part of tag descriptions and must be valid tag names.
fn check_names(sfc: &Sfc, file_id: &FileId) -> Result<(), Vec<Diagnostic>> {
    let names = sfc
        .steps()
        .iter()
        .map(|s| (s.name.as_str(), &s.loc))
        .chain(sfc.transitions().iter().map(|t| (t.name.as_str(), &t.loc)));

    let mut diagnostics = vec![];
    for (name, loc) in names {
        if !VALID_NAME.is_match(name) {
            diagnostics.push(Diagnostic::problem(
                Problem::InvalidElementName,
                Label::source_loc(
                    file_id,
                    loc,
                    format!("Name '@{}' is not a valid tag name", name),
                ),
            ));
        } else if name.len() > MAX_NAME_LENGTH {
            diagnostics.push(Diagnostic::problem(
                Problem::ElementNameTooLong,
                Label::source_loc(
                    file_id,
                    loc,
                    format!(
                        "Name '@{}' is longer than {} characters",
                        name, MAX_NAME_LENGTH
                    ),
                ),
            ));
        }
    }
    into_result(diagnostics)
}

#[cfg(test)]
mod tests {
    use quicksfc_dsl::{
        graph::{StepDecl, TransitionDecl},
        sfc::{Branch, FlowType, Leg},
    };
    use rstest::rstest;

    use super::*;
    use crate::test_helpers::parse_resource;

    fn step(sfc: &mut Sfc, name: &str, initial: bool, line: usize) {
        sfc.add_step(StepDecl {
            name: name.into(),
            initial,
            loc: SourceLoc::line(line),
            ..Default::default()
        })
        .unwrap();
    }

    #[test]
    fn validate_when_parsed_resource_then_ok() {
        let sfc = parse_resource("selection.qsfc");

        assert!(validate(&sfc, &FileId::new()).is_ok());
    }

    #[test]
    fn validate_when_no_initial_step_then_error() {
        let mut sfc = Sfc::new();
        step(&mut sfc, "lonely", false, 1);

        let err = validate(&sfc, &FileId::new()).unwrap_err();

        assert!(err.mentions("No initial step (SI) found in SFC"));
        assert!(err.mentions("Step '@lonely' has no incoming transitions"));
    }

    #[test]
    fn validate_when_unknown_jump_target_then_error() {
        let mut sfc = Sfc::new();
        step(&mut sfc, "init", true, 1);
        let init = sfc.find_step("init").unwrap();
        let go = sfc
            .add_transition(TransitionDecl {
                name: "go".into(),
                condition: "x".into(),
                target: Some("gone".into()),
                loc: SourceLoc::line(2),
                ..Default::default()
            })
            .unwrap();
        sfc.link_step_to_transition(init, go);
        sfc.link_transition_to_step(go, init);

        let err = validate(&sfc, &FileId::new()).unwrap_err();

        assert_eq!(1, err.diagnostics().len());
        assert!(err.mentions("Transition '@go' jumps to unknown step '@gone'"));
    }

    #[test]
    fn validate_when_unlinked_transition_then_both_directions_reported() {
        let mut sfc = Sfc::new();
        step(&mut sfc, "init", true, 1);
        sfc.add_transition(TransitionDecl {
            name: "go".into(),
            loc: SourceLoc::line(2),
            ..Default::default()
        })
        .unwrap();

        let err = validate(&sfc, &FileId::new()).unwrap_err();

        assert!(err.mentions("Transition '@go' has no incoming step"));
        assert!(err.mentions("Transition '@go' has no outgoing step"));
    }

    #[test]
    fn validate_when_divergence_has_one_leg_then_error() {
        let mut sfc = Sfc::new();
        step(&mut sfc, "init", true, 1);
        let mut branch = Branch::new(BranchKind::Diverge, FlowType::Or, 2);
        branch.legs.push(Leg::new());
        sfc.add_branch(branch);

        let err = validate(&sfc, &FileId::new()).unwrap_err();

        assert!(err.mentions("OR divergence on line 2 has fewer than 2 legs"));
    }

    #[test]
    fn validate_when_name_too_long_then_error() {
        let mut sfc = Sfc::new();
        let name = "a".repeat(MAX_NAME_LENGTH + 1);
        step(&mut sfc, &name, true, 1);

        let err = validate(&sfc, &FileId::new()).unwrap_err();

        assert!(err.mentions("is longer than 40 characters"));
    }

    #[test]
    fn validate_when_name_not_identifier_then_error() {
        let mut sfc = Sfc::new();
        step(&mut sfc, "has space", true, 1);

        let err = validate(&sfc, &FileId::new()).unwrap_err();

        assert!(err.mentions("Name '@has space' is not a valid tag name"));
    }

    #[rstest]
    #[case("_private", true)]
    #[case("Step1", true)]
    #[case("fill_tank", true)]
    #[case("1step", false)]
    #[case("with-dash", false)]
    #[case("", false)]
    fn valid_name_when_name_then_matches_tag_rules(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(valid, VALID_NAME.is_match(name));
    }
}
