//! Tests of the parser as a whole, from text to linked chart.
#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use quicksfc_dsl::{
        core::FileId,
        error::ParseError,
        graph::Sfc,
        sfc::{BranchKind, FlowType},
    };
    use quicksfc_problems::Problem;
    use quicksfc_test::read_shared_resource;

    use crate::{options::ParseOptions, parse_program};

    fn parse(source: &str) -> Result<Sfc, ParseError> {
        parse_program(source, &FileId::new(), &ParseOptions::default())
    }

    fn parse_resource(name: &'static str) -> Result<Sfc, ParseError> {
        parse(&read_shared_resource(name))
    }

    fn names(sfc: &Sfc, steps: &[quicksfc_dsl::sfc::StepRef]) -> Vec<String> {
        steps.iter().map(|s| sfc.step(*s).name.clone()).collect()
    }

    fn transition_names(sfc: &Sfc, transitions: &[quicksfc_dsl::sfc::TransitionRef]) -> Vec<String> {
        transitions
            .iter()
            .map(|t| sfc.transition(*t).name.clone())
            .collect()
    }

    #[test]
    fn parse_program_when_only_initial_step_then_ok() {
        let sfc = parse("SI@init()\nEND\n").unwrap();

        assert_eq!(1, sfc.steps().len());
        assert!(sfc.steps()[0].initial);
        assert!(sfc.transitions().is_empty());
    }

    #[test]
    fn parse_program_when_step_transition_step_then_linked() {
        let sfc = parse("SI@init(x:=0)\nT@start(button_pressed)\nS@running(x:=x+1,100)\nEND\n")
            .unwrap();

        assert_eq!(2, sfc.steps().len());
        assert_eq!(1, sfc.transitions().len());
        let init = sfc.step_by_name("init").unwrap();
        assert_eq!(vec!["start"], transition_names(&sfc, init.outgoing()));
        let running = sfc.step_by_name("running").unwrap();
        assert_eq!(100, running.preset);
        assert_eq!("x:=x+1", running.action);
        let start = sfc.transition_by_name("start").unwrap();
        assert_eq!("button_pressed", start.condition);
        assert_eq!(vec!["running"], names(&sfc, start.outgoing()));
    }

    #[test]
    fn parse_program_when_simple_resource_then_jump_closes_loop() {
        let sfc = parse_resource("simple.qsfc").unwrap();

        let stop = sfc.transition_by_name("stop").unwrap();
        assert_eq!(Some("init"), stop.target.as_deref());
        assert_eq!(vec!["init"], names(&sfc, stop.outgoing()));
        let init = sfc.step_by_name("init").unwrap();
        assert_eq!(vec!["stop"], transition_names(&sfc, init.incoming()));
    }

    #[test]
    fn parse_program_when_no_initial_step_then_error_mentions_initial_step() {
        let err = parse_resource("missing_initial.qsfc").unwrap_err();

        assert!(err.mentions("initial step"));
        let errors = err.errors();
        assert_eq!(2, errors.len());
        assert_eq!(Some(1), errors[0].1);
        assert_eq!(("No initial step (SI) found", None), errors[1]);
    }

    #[test]
    fn parse_program_when_or_branch_legs_all_jump_then_no_convergence_needed() {
        let sfc = parse_resource("jump_branch.qsfc").unwrap();

        assert_eq!(1, sfc.branches().len());
        let branch = &sfc.branches()[0];
        assert_eq!(BranchKind::Diverge, branch.kind);
        assert_eq!(FlowType::Or, branch.flow);
        assert_eq!(2, branch.legs.len());
        let init = sfc.step_by_name("init").unwrap();
        assert_eq!(vec!["a", "b"], transition_names(&sfc, init.outgoing()));
        assert_eq!(vec!["a", "b"], transition_names(&sfc, init.incoming()));
    }

    #[test]
    fn parse_program_when_and_branch_not_converged_then_error() {
        let err = parse_resource("and_without_converge.qsfc").unwrap_err();

        assert!(err.mentions("to close AND branch"));
        assert_eq!(1, err.errors().len());
    }

    #[test]
    fn parse_program_when_selection_then_legs_link_root_and_convergence() {
        let sfc = parse_resource("selection.qsfc").unwrap();

        let idle = sfc.step_by_name("idle").unwrap();
        assert_eq!(vec!["fill", "drain"], transition_names(&sfc, idle.outgoing()));
        let done = sfc.step_by_name("done").unwrap();
        assert_eq!(vec!["full", "empty"], transition_names(&sfc, done.incoming()));
        let filling = sfc.step_by_name("filling").unwrap();
        assert_eq!(vec!["fill"], transition_names(&sfc, filling.incoming()));
        assert_eq!(vec!["full"], transition_names(&sfc, filling.outgoing()));

        assert_eq!(2, sfc.branches().len());
        let converge = &sfc.branches()[1];
        assert_eq!(BranchKind::Converge, converge.kind);
        assert_eq!(Some("done"), converge.root.map(|r| sfc.name_of(r)));
    }

    #[test]
    fn parse_program_when_parallel_then_legs_link_root_and_convergence() {
        let sfc = parse_resource("parallel.qsfc").unwrap();

        let start = sfc.transition_by_name("start").unwrap();
        assert_eq!(vec!["mix", "heat"], names(&sfc, start.outgoing()));
        let both = sfc.transition_by_name("both").unwrap();
        assert_eq!(vec!["mix_done", "heat"], names(&sfc, both.incoming()));
        assert_eq!(vec!["finish"], names(&sfc, both.outgoing()));

        let heat = sfc.step_by_name("heat").unwrap();
        assert_eq!("heater := TRUE", heat.action);
        assert_eq!(30, heat.preset);

        assert!(sfc.branches().iter().all(|b| b.flow == FlowType::And));
    }

    #[test]
    fn parse_program_when_arrow_to_step_then_step_joins_leg() {
        let source = r"SI@init()
/\
T@a(x) -> S@sa()
T@a2(done_a)
|
T@b(y) -> S@sb()
T@b2(done_b)
\/
S@merge()
T@back(r) >> @init
END
";
        let sfc = parse(source).unwrap();

        let sa = sfc.step_by_name("sa").unwrap();
        assert_eq!(vec!["a"], transition_names(&sfc, sa.incoming()));
        assert_eq!(vec!["a2"], transition_names(&sfc, sa.outgoing()));
        let merge = sfc.step_by_name("merge").unwrap();
        assert_eq!(vec!["a2", "b2"], transition_names(&sfc, merge.incoming()));
        assert_eq!(3, sfc.branches()[0].legs[0].len());
    }

    #[test]
    fn parse_program_when_arrow_and_jump_both_then_duplicate_target_error() {
        let source = r"SI@init()
/\
T@a(x) >> @init -> @init
|
T@b(y) >> @init
END
";
        let err = parse(source).unwrap_err();

        assert!(err.mentions("already jumps to '@init'"));
    }

    #[test]
    fn parse_program_when_syntax_errors_then_all_reported_sorted() {
        let err = parse_resource("syntax_errors.qsfc").unwrap_err();

        let errors = err.errors();
        assert_eq!(3, errors.len());
        assert_eq!(("Duplicate step name '@init'", Some(2)), errors[0]);
        assert_eq!(
            (
                "Invalid step reference: step '@nowhere' not found",
                Some(3)
            ),
            errors[1]
        );
        assert_eq!(Some(3), errors[2].1);
        assert!(errors[2].0.contains("no outgoing step"));
    }

    #[test]
    fn parse_program_when_strict_jumps_then_unlinked_transition_fails() {
        let source = "SI@s()\nT@a(x)\nT@b(y)\nS@q()\nEND\n";

        let err = parse_program(source, &FileId::new(), &ParseOptions::strict()).unwrap_err();

        assert!(err.mentions("Transition '@a' has no outgoing step"));
        assert_eq!(1, err.errors().len());
    }

    #[test]
    fn parse_program_when_line_proximity_then_unlinked_transition_links_forward() {
        let source = "SI@s()\nT@a(x)\nT@b(y)\nS@q()\nEND\n";

        let sfc = parse_program(source, &FileId::new(), &ParseOptions::default()).unwrap();

        let a = sfc.transition_by_name("a").unwrap();
        let b = sfc.transition_by_name("b").unwrap();
        assert_eq!(vec!["q"], names(&sfc, a.outgoing()));
        assert_eq!(vec!["q"], names(&sfc, b.outgoing()));
        let s = sfc.step_by_name("s").unwrap();
        assert_eq!(vec!["a", "b"], transition_names(&sfc, s.outgoing()));
    }

    #[test]
    fn parse_program_when_comments_then_attached_to_elements() {
        let sfc = parse_resource("comments.qsfc").unwrap();

        let init = sfc.step_by_name("init").unwrap();
        assert_eq!(
            vec!["Start of the process", "waits for the operator"],
            init.comments
        );
        let go = sfc.transition_by_name("go").unwrap();
        assert_eq!(Some("operator pressed start"), go.comment.as_deref());
        assert!(sfc.step_by_name("run").unwrap().comments.is_empty());
    }

    #[test]
    fn parse_program_when_unexpected_character_then_single_error() {
        let err = parse_resource("bad_character.qsfc").unwrap_err();

        assert_eq!(vec![("Unexpected character: '$'", Some(2))], err.errors());
    }

    #[test]
    fn parse_program_when_two_initial_steps_then_second_is_plain_step() {
        let err = parse("SI@a()\nT@t(x)\nSI@b()\nT@u(y) >> @a\nEND\n").unwrap_err();

        assert_eq!(1, err.errors().len());
        assert!(err.mentions("Only one SI@name() (initial step) allowed, found '@b'"));
    }

    #[test]
    fn parse_program_when_missing_end_then_error() {
        let err = parse("SI@init()\n").unwrap_err();

        assert!(err.mentions("Missing END marker"));
    }

    #[test]
    fn parse_program_when_stray_token_then_skipped() {
        let err = parse("SI@init()\n)\nEND\n").unwrap_err();

        assert_eq!(
            vec![("Expected S, SI, T, or END, got RPAREN", Some(2))],
            err.errors()
        );
    }

    #[test]
    fn parse_program_when_declaration_unclosed_then_recovers_on_next_line() {
        let err = parse("SI@init()\nT@go(x\nS@next()\nT@back(y) >> @init\nEND\n").unwrap_err();

        assert_eq!(
            vec![("Expected RPAREN, got NEWLINE", Some(2))],
            err.errors()
        );
    }

    #[test]
    fn parse_program_when_transition_first_then_error() {
        let err = parse("T@t(x)\nS@s()\nEND\n").unwrap_err();

        assert!(err.mentions("cannot appear before any step"));
        assert!(err.mentions("First line must be SI@name()"));
    }

    #[test]
    fn parse_program_when_or_leg_starts_with_step_then_error() {
        let err = parse("SI@init()\n/\\\nS@x()\n|\nT@b(y) >> @init\nEND\n").unwrap_err();

        assert!(err.mentions("OR divergence leg 1 must START with transition"));
    }

    #[test]
    fn parse_program_when_and_leg_ends_with_transition_then_error() {
        let source = r"SI@init()
T@go(x)
//\\
S@a()
T@ta(y)
|
S@b()
\\//
T@join(z) >> @init
END
";
        let err = parse(source).unwrap_err();

        assert!(err.mentions("AND divergence leg 1 must END with step, not transition '@ta'"));
    }

    #[test]
    fn parse_program_when_single_leg_then_error() {
        let err = parse("SI@init()\n/\\\nT@a(x) >> @init\nEND\n").unwrap_err();

        assert!(err.mentions("must have at least two legs"));
    }

    #[test]
    fn parse_program_when_nested_divergence_then_error() {
        let err = parse("SI@init()\n/\\\nT@a(x) >> @init\n/\\\n|\nT@b(y) >> @init\nEND\n")
            .unwrap_err();

        assert!(err.mentions("Nested divergence"));
    }

    #[test]
    fn parse_program_when_or_divergence_after_transition_then_error() {
        let err = parse("SI@init()\nT@go(x)\n/\\\nT@a(x) >> @init\n|\nT@b(y) >> @init\nEND\n")
            .unwrap_err();

        assert!(err.mentions("OR divergence must follow a step"));
    }

    fn has_code(err: &ParseError, problem: Problem) -> bool {
        err.diagnostics().iter().any(|d| d.code == problem.code())
    }

    #[test]
    fn parse_program_when_and_leg_starts_with_transition_then_error() {
        let source = r"SI@init()
T@go(x)
//\\
T@a(y)
S@sa()
|
S@b()
\\//
T@join(z) >> @init
END
";
        let err = parse(source).unwrap_err();

        assert!(has_code(&err, Problem::AndLegMustStartWithStep));
        assert!(err.mentions("AND divergence leg 1 must START with step, not transition '@a'"));
    }

    #[test]
    fn parse_program_when_converging_or_leg_ends_with_step_then_error() {
        let source = r"SI@init()
/\
T@a(x)
S@sa()
|
T@b(y)
\/
S@merge()
T@back(z) >> @init
END
";
        let err = parse(source).unwrap_err();

        assert!(has_code(&err, Problem::OrLegMustEndWithTransition));
        assert!(err.mentions("must END with transition to converge, not step '@sa'"));
    }

    #[test]
    fn parse_program_when_empty_leg_then_error() {
        let err = parse("SI@init()\n/\\\nT@a(x) >> @init\n|\n|\nT@b(y) >> @init\nEND\n")
            .unwrap_err();

        assert!(has_code(&err, Problem::EmptyLeg));
        assert!(err.mentions("OR divergence leg 2 is empty"));
    }

    #[test]
    fn parse_program_when_divergence_first_then_no_root_error() {
        let source = r"/\
T@a(x)
|
T@b(y)
\/
SI@s()
END
";
        let err = parse(source).unwrap_err();

        assert!(has_code(&err, Problem::DivergenceWithoutRoot));
        assert!(err.mentions("OR divergence must follow a step or transition"));
    }

    #[test]
    fn parse_program_when_and_divergence_after_step_then_error() {
        let source = r"SI@init()
//\\
S@a()
|
S@b()
\\//
T@join(x) >> @init
END
";
        let err = parse(source).unwrap_err();

        assert!(has_code(&err, Problem::DivergenceRootKind));
        assert!(err.mentions("AND divergence must follow a transition, not step '@init'"));
    }

    #[test]
    fn parse_program_when_convergence_followed_by_wrong_kind_then_single_error() {
        let source = r"SI@init()
/\
T@a(x)
|
T@b(y)
\/
T@c(z)
END
";
        let err = parse(source).unwrap_err();

        assert_eq!(
            vec![("OR convergence must be followed by a step, got T", Some(7))],
            err.errors()
        );
        assert!(has_code(&err, Problem::ConvergenceTargetKind));
    }

    #[test]
    fn parse_program_when_convergence_followed_by_wrong_kind_then_sequence_continues() {
        let source = r"SI@init()
/\
T@a(x)
|
T@b(y)
\/
T@c(z)
S@next()
T@back(w) >> @init
END
";
        let err = parse(source).unwrap_err();

        assert_eq!(1, err.errors().len());
        assert!(has_code(&err, Problem::ConvergenceTargetKind));
    }

    #[test]
    fn parse_program_when_converge_operator_mismatched_then_error() {
        let source = r"SI@init()
/\
T@a(x)
|
T@b(y)
\\//
S@merge()
T@back(z) >> @init
END
";
        let err = parse(source).unwrap_err();

        assert_eq!(
            vec![(
                "Expected OR_CONVERGE to close OR branch, got AND_CONVERGE",
                Some(6)
            )],
            err.errors()
        );
        assert!(has_code(&err, Problem::TokenExpected));
    }

    #[test]
    fn parse_program_when_duplicate_transition_name_then_error() {
        let err = parse("SI@init()\nT@go(x)\nS@run()\nT@go(y) >> @init\nEND\n").unwrap_err();

        assert_eq!(
            vec![("Duplicate transition name '@go'", Some(4))],
            err.errors()
        );
        assert!(has_code(&err, Problem::DuplicateTransitionName));
    }

    #[test]
    fn parse_program_when_duplicate_renamed_then_later_real_name_accepted() {
        let source = "SI@a()\nT@t1(x)\nS@a()\nT@t2(y)\nS@a_2()\nT@t3(z) >> @a\nEND\n";

        let err = parse(source).unwrap_err();

        assert_eq!(vec![("Duplicate step name '@a'", Some(3))], err.errors());
    }

    #[test]
    fn parse_program_when_duplicate_transition_renamed_then_later_real_name_accepted() {
        let source = "SI@a()\nT@go(x)\nS@b()\nT@go(y)\nS@c()\nT@go_2(z) >> @a\nEND\n";

        let err = parse(source).unwrap_err();

        assert_eq!(
            vec![("Duplicate transition name '@go'", Some(4))],
            err.errors()
        );
    }

    #[test]
    fn parse_program_when_preset_missing_then_error() {
        let err = parse("SI@init()\nT@go(x)\nS@run(y := 1, )\nT@back(z) >> @init\nEND\n")
            .unwrap_err();

        assert_eq!(vec![("Expected NUMBER, got RPAREN", Some(3))], err.errors());
        assert!(has_code(&err, Problem::PresetExpected));
    }

    #[test]
    fn parse_program_when_preset_not_numeric_then_error() {
        let err = parse("SI@init()\nT@go(x)\nS@run(y := 1, fast)\nT@back(z) >> @init\nEND\n")
            .unwrap_err();

        assert!(has_code(&err, Problem::PresetExpected));
        assert!(err.mentions("Expected NUMBER, got NAME 'fast'"));
    }

    #[test]
    fn parse_program_when_preset_out_of_range_then_error() {
        let err = parse("SI@init()\nT@go(x)\nS@run(y, 99999999999)\nT@back(z) >> @init\nEND\n")
            .unwrap_err();

        assert_eq!(
            vec![("Preset 99999999999 is out of range", Some(3))],
            err.errors()
        );
        assert!(has_code(&err, Problem::PresetOutOfRange));
    }

    #[test]
    fn parse_program_when_jump_after_step_then_error() {
        let err = parse("SI@init()\nT@go(x)\nS@run() >> @init\nT@back(y) >> @init\nEND\n")
            .unwrap_err();

        assert_eq!(
            vec![(
                "Jump >> is only allowed after a transition, not step '@run'",
                Some(3)
            )],
            err.errors()
        );
        assert!(has_code(&err, Problem::JumpAfterStep));
    }

    #[test]
    fn parse_program_when_arrow_without_target_then_error() {
        let err = parse("SI@init()\n/\\\nT@a(x) ->\n|\nT@b(y) >> @init\nEND\n").unwrap_err();

        assert!(has_code(&err, Problem::ArrowTargetMissing));
        assert!(err.mentions("Expected S@name or @target after ->, got NEWLINE"));
    }

    fn chain(length: usize) -> String {
        let mut source = String::from("SI@s0()\n");
        for idx in 0..length {
            source.push_str(&format!("T@t{}(c{})\nS@s{}(a{})\n", idx, idx, idx + 1, idx));
        }
        source.push_str(&format!("T@t{}(back) >> @s0\nEND\n", length));
        source
    }

    proptest! {
        #[test]
        fn parse_program_when_same_text_then_same_chart(length in 0usize..20) {
            let source = chain(length);
            let first = parse(&source).unwrap();
            let second = parse(&source).unwrap();

            for (a, b) in first.steps().iter().zip(second.steps()) {
                prop_assert_eq!(&a.name, &b.name);
                prop_assert_eq!(a.id, b.id);
                prop_assert_eq!(a.outgoing(), b.outgoing());
                prop_assert_eq!(a.incoming(), b.incoming());
            }
        }

        #[test]
        fn parse_program_when_chain_then_operands_dense_per_kind(length in 0usize..20) {
            let sfc = parse(&chain(length)).unwrap();

            let steps: Vec<usize> = sfc.steps().iter().map(|s| s.operand).collect();
            let transitions: Vec<usize> = sfc.transitions().iter().map(|t| t.operand).collect();
            prop_assert_eq!((0..=length).collect::<Vec<_>>(), steps);
            prop_assert_eq!((0..=length).collect::<Vec<_>>(), transitions);
            let mut ids: Vec<u32> = sfc.elements().iter().map(|e| sfc.id_of(*e).0).collect();
            ids.sort();
            prop_assert_eq!((0..(2 * length as u32 + 2)).collect::<Vec<_>>(), ids);
        }
    }
}
