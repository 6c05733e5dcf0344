//! Recursive descent parser for QuickSFC documents.
//!
//! The parser builds the chart while it reads: each declaration becomes a
//! step or transition as soon as it is consumed and is linked to the
//! element before it. Problems are collected rather than returned so that
//! one pass reports as many independent problems as possible.
//!
//! ```text
//! document    := SI-declaration statement* END
//! statement   := declaration | branch
//! declaration := (SI | S | T) @ NAME ( BODY [, NUMBER] ) [>> @ NAME]
//! branch      := (/\ | //\\) leg (| leg)* [(\/ | \\//) declaration]
//! leg         := (declaration [-> (S-declaration | @ NAME)])*
//! ```
use std::collections::HashSet;

use log::trace;
use quicksfc_dsl::{
    core::{FileId, SourceLoc},
    diagnostic::{Diagnostic, Label},
    graph::{Sfc, StepDecl, TransitionDecl},
    sfc::{Branch, BranchKind, ElementRef, FlowType, Leg, NodeId, StepRef, TransitionRef},
};
use quicksfc_problems::Problem;

use crate::token::{Comment, Token, TokenStream, TokenType};

/// The parts of a step or transition declaration.
struct Declaration {
    keyword: TokenType,
    name: String,
    body: String,
    preset: u32,
    loc: SourceLoc,
}

/// What the parser produces.
pub(crate) struct Parsed {
    pub sfc: Sfc,
    pub diagnostics: Vec<Diagnostic>,
    /// Transitions whose missing links are already explained by a recorded
    /// problem.
    pub detached: HashSet<NodeId>,
}

pub(crate) struct Parser<'a> {
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    file_id: &'a FileId,
    pos: usize,
    sfc: Sfc,
    diagnostics: Vec<Diagnostic>,
    /// The element before the next one in the running sequence.
    previous: Option<ElementRef>,
    /// The step that a transition in the running sequence leaves from.
    /// Consecutive transitions leave from the same step.
    current_step: Option<StepRef>,
    unnamed: usize,
    detached: HashSet<NodeId>,
}

impl<'a> Parser<'a> {
    pub fn new(stream: TokenStream, file_id: &'a FileId) -> Self {
        let mut tokens = stream.tokens;
        if tokens.last().map(|t| t.token_type) != Some(TokenType::Eof) {
            let loc = tokens
                .last()
                .map(|t| SourceLoc::new(t.loc.line, t.loc.end, t.loc.end))
                .unwrap_or_else(|| SourceLoc::line(1));
            tokens.push(Token {
                token_type: TokenType::Eof,
                text: String::new(),
                loc,
            });
        }

        Self {
            tokens,
            comments: stream.comments,
            file_id,
            pos: 0,
            sfc: Sfc::new(),
            diagnostics: vec![],
            previous: None,
            current_step: None,
            unnamed: 0,
            detached: HashSet::new(),
        }
    }

    /// Parses the document. Returns the chart and every problem found.
    pub fn parse(mut self) -> Parsed {
        self.skip_newlines();
        if !self.check(TokenType::InitialStep) {
            let token = self.peek().clone();
            self.error(
                Problem::FirstStatementNotInitialStep,
                &token.loc,
                format!(
                    "First line must be SI@name() (initial step), got {}",
                    token.describe()
                ),
            );
        }

        loop {
            self.skip_newlines();
            let token = self.peek().clone();
            match token.token_type {
                TokenType::Eof => {
                    self.error(
                        Problem::EndMissing,
                        &token.loc,
                        "Missing END marker at end of file",
                    );
                    break;
                }
                TokenType::End => {
                    self.advance();
                    self.ignore_trailing();
                    break;
                }
                TokenType::InitialStep | TokenType::Step => {
                    if let Some(step) = self.parse_step() {
                        self.link_sequential(step.into());
                    }
                }
                TokenType::Transition => {
                    if let Some(transition) = self.parse_transition() {
                        self.link_sequential(transition.into());
                    }
                }
                TokenType::OrDiverge | TokenType::AndDiverge => self.parse_branch(),
                _ => {
                    self.error(
                        Problem::UnexpectedToken,
                        &token.loc,
                        format!("Expected S, SI, T, or END, got {}", token.describe()),
                    );
                    self.advance();
                }
            }
        }

        Parsed {
            sfc: self.sfc,
            diagnostics: self.diagnostics,
            detached: self.detached,
        }
    }

    // Token navigation

    fn peek(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type == token_type
    }

    fn at_end(&self) -> bool {
        self.check(TokenType::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenType::Newline) {
            self.advance();
        }
    }

    /// Skips the remainder of the current line so that a malformed
    /// declaration does not produce a cascade of errors.
    fn skip_line(&mut self) {
        while !self.at_end() && !self.check(TokenType::Newline) {
            self.advance();
        }
    }

    fn ignore_trailing(&mut self) {
        self.skip_newlines();
        if !self.at_end() {
            log::warn!(
                "Ignoring content after END starting on line {}",
                self.peek().line()
            );
        }
    }

    fn error(&mut self, problem: Problem, loc: &SourceLoc, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::problem(
            problem,
            Label::source_loc(self.file_id, loc, message),
        ));
    }

    /// Consumes a token of the type or records that it is missing.
    fn expect(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            return true;
        }
        let token = self.peek().clone();
        self.error(
            Problem::TokenExpected,
            &token.loc,
            format!("Expected {}, got {}", token_type, token.describe()),
        );
        false
    }

    // Declarations

    /// Parses `KEYWORD @ NAME ( BODY [, NUMBER] )`.
    ///
    /// Always returns a declaration so that the element exists even when
    /// the declaration is malformed.
    fn parse_declaration(&mut self) -> Declaration {
        let keyword = self.advance();
        let mut loc = keyword.loc.clone();

        let name = self.parse_name(&keyword);
        let mut declaration = Declaration {
            keyword: keyword.token_type,
            name,
            body: String::new(),
            preset: 0,
            loc: loc.clone(),
        };

        if !self.expect(TokenType::LeftParen) {
            self.skip_line();
            return declaration;
        }

        if self.check(TokenType::Action) || self.check(TokenType::Condition) {
            declaration.body = self.advance().text;
        } else {
            let token = self.peek().clone();
            let expected = if keyword.token_type == TokenType::Transition {
                TokenType::Condition
            } else {
                TokenType::Action
            };
            self.error(
                Problem::BodyExpected,
                &token.loc,
                format!("Expected {}, got {}", expected, token.describe()),
            );
        }

        if keyword.token_type != TokenType::Transition && self.check(TokenType::Comma) {
            self.advance();
            declaration.preset = self.parse_preset();
        }

        let close = self.peek().clone();
        if !self.expect(TokenType::RightParen) {
            self.skip_line();
            return declaration;
        }

        loc = loc.to(&close.loc);
        declaration.loc = loc;
        declaration
    }

    /// Parses `@ NAME`, synthesizing a name when it is missing.
    fn parse_name(&mut self, keyword: &Token) -> String {
        if self.check(TokenType::At) {
            self.advance();
        } else if self.check(TokenType::Name) {
            let token = self.peek().clone();
            self.error(
                Problem::NameMissing,
                &token.loc,
                format!("Expected @ before name '{}'", token.text),
            );
        }

        if self.check(TokenType::Name) {
            return self.advance().text;
        }

        let token = self.peek().clone();
        self.error(
            Problem::NameMissing,
            &token.loc,
            format!("Expected name after @, got {}", token.describe()),
        );
        self.placeholder_name(keyword.token_type)
    }

    fn placeholder_name(&mut self, keyword: TokenType) -> String {
        self.unnamed += 1;
        let prefix = match keyword {
            TokenType::InitialStep => "unnamed_si",
            TokenType::Transition => "unnamed_t",
            _ => "unnamed_s",
        };
        format!("{}_{}", prefix, self.unnamed)
    }

    fn parse_preset(&mut self) -> u32 {
        let token = self.peek().clone();
        if token.token_type != TokenType::Number {
            self.error(
                Problem::PresetExpected,
                &token.loc,
                format!("Expected {}, got {}", TokenType::Number, token.describe()),
            );
            return 0;
        }
        self.advance();

        match token.text.parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                self.error(
                    Problem::PresetOutOfRange,
                    &token.loc,
                    format!("Preset {} is out of range", token.text),
                );
                0
            }
        }
    }

    /// Parses `>> @ NAME` or the `@ NAME` after `->`, returning the name.
    fn parse_target(&mut self, operator: &Token) -> Option<String> {
        if self.check(TokenType::At) {
            self.advance();
        }
        if self.check(TokenType::Name) {
            return Some(self.advance().text);
        }
        let token = self.peek().clone();
        self.error(
            Problem::JumpTargetMissing,
            &token.loc,
            format!(
                "Expected step name after {} @, got {}",
                operator.text,
                token.describe()
            ),
        );
        None
    }

    /// Parses a step declaration and adds the step to the chart.
    fn parse_step(&mut self) -> Option<StepRef> {
        let declaration = self.parse_declaration();

        if self.check(TokenType::Jump) {
            let jump = self.advance();
            self.error(
                Problem::JumpAfterStep,
                &jump.loc,
                format!(
                    "Jump >> is only allowed after a transition, not step '@{}'",
                    declaration.name
                ),
            );
            self.parse_target(&jump);
        }

        self.add_step(declaration)
    }

    /// Parses a transition declaration with its optional jump and adds the
    /// transition to the chart.
    fn parse_transition(&mut self) -> Option<TransitionRef> {
        let declaration = self.parse_declaration();

        let mut target = None;
        if self.check(TokenType::Jump) {
            let jump = self.advance();
            target = self.parse_target(&jump);
        }

        self.add_transition(declaration, target)
    }

    fn add_step(&mut self, declaration: Declaration) -> Option<StepRef> {
        let mut name = declaration.name;
        if self.sfc.find_step(&name).is_some() {
            self.error(
                Problem::DuplicateStepName,
                &declaration.loc,
                format!("Duplicate step name '@{}'", name),
            );
            name = self.unique_step_name(&name);
        }

        let mut initial = declaration.keyword == TokenType::InitialStep;
        if initial && self.sfc.initial_step().is_some() {
            self.error(
                Problem::MultipleInitialSteps,
                &declaration.loc,
                format!("Only one SI@name() (initial step) allowed, found '@{}'", name),
            );
            initial = false;
        }

        let comments = self.comments_for_step(declaration.loc.line);
        let result = self.sfc.add_step(StepDecl {
            name,
            action: declaration.body,
            preset: declaration.preset,
            initial,
            loc: declaration.loc.clone(),
            comments,
        });

        match result {
            Ok(step) => {
                trace!("Step '@{}' declared", self.sfc.step(step).name);
                Some(step)
            }
            Err(err) => {
                self.error(Problem::InternalError, &declaration.loc, err.to_string());
                None
            }
        }
    }

    fn add_transition(
        &mut self,
        declaration: Declaration,
        target: Option<String>,
    ) -> Option<TransitionRef> {
        let mut name = declaration.name;
        if self.sfc.find_transition(&name).is_some() {
            self.error(
                Problem::DuplicateTransitionName,
                &declaration.loc,
                format!("Duplicate transition name '@{}'", name),
            );
            name = self.unique_transition_name(&name);
        }

        let comment = self.trailing_comment(declaration.loc.line);
        let result = self.sfc.add_transition(TransitionDecl {
            name,
            condition: declaration.body,
            target,
            loc: declaration.loc.clone(),
            comment,
        });

        match result {
            Ok(transition) => {
                trace!(
                    "Transition '@{}' declared",
                    self.sfc.transition(transition).name
                );
                Some(transition)
            }
            Err(err) => {
                self.error(Problem::InternalError, &declaration.loc, err.to_string());
                None
            }
        }
    }

    /// Stand-in for a duplicate name. `#` starts a comment, so no written
    /// name can take the stand-in.
    fn unique_step_name(&self, name: &str) -> String {
        (2..)
            .map(|n| format!("{}#{}", name, n))
            .find(|candidate| self.sfc.find_step(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    fn unique_transition_name(&self, name: &str) -> String {
        (2..)
            .map(|n| format!("{}#{}", name, n))
            .find(|candidate| self.sfc.find_transition(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    // Comments

    fn full_line_comment(&self, line: usize) -> Option<&Comment> {
        self.comments
            .iter()
            .find(|c| c.full_line && c.loc.line == line)
    }

    fn trailing_comment(&self, line: usize) -> Option<String> {
        self.comments
            .iter()
            .find(|c| !c.full_line && c.loc.line == line)
            .map(|c| c.text.clone())
    }

    /// The block of full-line comments directly above a step and the
    /// comment at the end of its line.
    fn comments_for_step(&self, line: usize) -> Vec<String> {
        let mut above = vec![];
        let mut current = line;
        while current > 1 {
            current -= 1;
            match self.full_line_comment(current) {
                Some(comment) => above.push(comment.text.clone()),
                None => break,
            }
        }
        above.reverse();
        above.extend(self.trailing_comment(line));
        above
    }

    // Linking

    /// Links an element declared in the running sequence to the element
    /// before it.
    fn link_sequential(&mut self, element: ElementRef) {
        match element {
            ElementRef::Step(step) => {
                if let Some(ElementRef::Transition(previous)) = self.previous {
                    if !self.sfc.transition(previous).has_jump() {
                        self.sfc.link_transition_to_step(previous, step);
                    }
                }
                self.current_step = Some(step);
            }
            ElementRef::Transition(transition) => match self.current_step {
                Some(step) => {
                    self.sfc.link_step_to_transition(step, transition);
                }
                None if self.sfc.steps().is_empty() => {
                    let t = self.sfc.transition(transition);
                    let (loc, message) = (
                        t.loc.clone(),
                        format!(
                            "Transition T@{}() cannot appear before any step (S or SI)",
                            t.name
                        ),
                    );
                    self.error(Problem::TransitionBeforeStep, &loc, message);
                }
                None => {}
            },
        }
        self.previous = Some(element);
    }

    /// Links consecutive members of a leg the way the running sequence
    /// links them.
    fn link_leg(&mut self, leg: &Leg) {
        let elements = self.sfc.leg_elements(leg);
        for pair in elements.windows(2) {
            match (pair[0], pair[1]) {
                (ElementRef::Step(step), ElementRef::Transition(transition)) => {
                    self.sfc.link_step_to_transition(step, transition);
                }
                (ElementRef::Transition(transition), ElementRef::Step(step)) => {
                    if !self.sfc.transition(transition).has_jump() {
                        self.sfc.link_transition_to_step(transition, step);
                    }
                }
                _ => {}
            }
        }
    }

    // Branches

    /// Parses a divergence, its legs and the optional convergence.
    fn parse_branch(&mut self) {
        let open = self.advance();
        let flow = if open.token_type == TokenType::AndDiverge {
            FlowType::And
        } else {
            FlowType::Or
        };

        let root = self.previous;
        self.previous = None;
        self.current_step = None;

        let mut legs = vec![];
        let mut leg = Leg::new();
        let close = loop {
            self.skip_newlines();
            let token = self.peek().clone();
            match token.token_type {
                TokenType::OrConverge | TokenType::AndConverge => break Some(token),
                TokenType::End | TokenType::Eof => break None,
                TokenType::LegSeparator => {
                    self.advance();
                    legs.push(std::mem::take(&mut leg));
                }
                TokenType::InitialStep | TokenType::Step => {
                    if let Some(step) = self.parse_step() {
                        leg.push(step);
                    }
                }
                TokenType::Transition => {
                    if let Some(transition) = self.parse_transition() {
                        leg.push(transition);
                        if flow == FlowType::Or && self.check(TokenType::Arrow) {
                            self.parse_arrow(transition, &mut leg);
                        }
                    }
                }
                TokenType::OrDiverge | TokenType::AndDiverge => {
                    self.error(
                        Problem::NestedBranch,
                        &token.loc,
                        "Nested divergence is not supported",
                    );
                    self.advance();
                }
                _ => {
                    self.error(
                        Problem::UnexpectedTokenInBranch,
                        &token.loc,
                        format!("Unexpected token in branch: {}", token.describe()),
                    );
                    self.advance();
                }
            }
        };
        legs.push(leg);

        self.check_legs(flow, &legs, close.is_some(), &open.loc);
        self.link_divergence(root, flow, &legs, &open.loc);
        for leg in &legs {
            self.link_leg(leg);
        }

        let mut diverge = Branch::new(BranchKind::Diverge, flow, open.line());
        diverge.root = root;
        diverge.legs = legs.clone();

        let converge = match close {
            Some(close) => {
                self.advance();
                Some(self.parse_convergence(flow, &legs, &close))
            }
            None => {
                self.check_missing_convergence(flow, &legs, &open.loc);
                None
            }
        };

        self.sfc.add_branch(diverge);
        if let Some(converge) = converge {
            self.sfc.add_branch(converge);
        }
    }

    /// Parses what follows `->` in an OR leg: either a step that the
    /// transition leads to or `@name` as the transition's jump target.
    fn parse_arrow(&mut self, transition: TransitionRef, leg: &mut Leg) {
        let arrow = self.advance();
        match self.peek().token_type {
            TokenType::Step | TokenType::InitialStep => {
                if let Some(step) = self.parse_step() {
                    leg.push(step);
                }
            }
            TokenType::At => {
                if let Some(target) = self.parse_target(&arrow) {
                    let previous = self.sfc.set_jump_target(transition, target);
                    if let Some(previous) = previous {
                        let loc = self.sfc.transition(transition).loc.clone();
                        let name = self.sfc.transition(transition).name.clone();
                        self.error(
                            Problem::DuplicateJumpTarget,
                            &loc,
                            format!(
                                "Transition '@{}' already jumps to '@{}'",
                                name, previous
                            ),
                        );
                    }
                }
            }
            _ => {
                let token = self.peek().clone();
                self.error(
                    Problem::ArrowTargetMissing,
                    &token.loc,
                    format!(
                        "Expected S@name or @target after ->, got {}",
                        token.describe()
                    ),
                );
            }
        }
    }

    /// Records structural problems with the legs of a divergence.
    fn check_legs(&mut self, flow: FlowType, legs: &[Leg], converges: bool, loc: &SourceLoc) {
        if legs.len() < 2 {
            self.error(
                Problem::DivergenceTooFewLegs,
                loc,
                format!(
                    "{} divergence must have at least two legs, found {}",
                    flow,
                    legs.len()
                ),
            );
        }

        for (idx, leg) in legs.iter().enumerate() {
            let number = idx + 1;
            let elements = self.sfc.leg_elements(leg);
            let (first, last) = match (elements.first(), elements.last()) {
                (Some(first), Some(last)) => (*first, *last),
                _ => {
                    self.error(
                        Problem::EmptyLeg,
                        loc,
                        format!("{} divergence leg {} is empty", flow, number),
                    );
                    continue;
                }
            };

            match flow {
                FlowType::Or => {
                    if let ElementRef::Step(step) = first {
                        let step = self.sfc.step(step);
                        let (loc, message) = (
                            step.loc.clone(),
                            format!(
                                "OR divergence leg {} must START with transition, not step '@{}'",
                                number, step.name
                            ),
                        );
                        self.error(Problem::OrLegMustStartWithTransition, &loc, message);
                    }
                    if let ElementRef::Step(step) = last {
                        if converges && !Self::leg_jumps(&self.sfc, leg) {
                            let step = self.sfc.step(step);
                            let (loc, message) = (
                                step.loc.clone(),
                                format!(
                                    "OR divergence leg {} must END with transition to converge, not step '@{}'",
                                    number, step.name
                                ),
                            );
                            self.error(Problem::OrLegMustEndWithTransition, &loc, message);
                        }
                    }
                }
                FlowType::And => {
                    if let ElementRef::Transition(transition) = first {
                        let transition = self.sfc.transition(transition);
                        let (loc, message) = (
                            transition.loc.clone(),
                            format!(
                                "AND divergence leg {} must START with step, not transition '@{}'",
                                number, transition.name
                            ),
                        );
                        self.error(Problem::AndLegMustStartWithStep, &loc, message);
                    }
                    if let ElementRef::Transition(transition) = last {
                        let transition = self.sfc.transition(transition);
                        let (loc, message) = (
                            transition.loc.clone(),
                            format!(
                                "AND divergence leg {} must END with step, not transition '@{}'",
                                number, transition.name
                            ),
                        );
                        self.error(Problem::AndLegMustEndWithStep, &loc, message);
                    }
                }
            }
        }
    }

    /// True if the last transition of the leg leaves through a jump.
    fn leg_jumps(sfc: &Sfc, leg: &Leg) -> bool {
        Self::last_transition(sfc, leg)
            .map(|t| sfc.transition(t).has_jump())
            .unwrap_or(false)
    }

    fn last_transition(sfc: &Sfc, leg: &Leg) -> Option<TransitionRef> {
        sfc.leg_elements(leg)
            .into_iter()
            .rev()
            .find_map(|e| e.as_transition())
    }

    fn last_step(sfc: &Sfc, leg: &Leg) -> Option<StepRef> {
        sfc.leg_elements(leg)
            .into_iter()
            .rev()
            .find_map(|e| e.as_step())
    }

    /// Links the element before a divergence to the first element of each
    /// leg.
    fn link_divergence(
        &mut self,
        root: Option<ElementRef>,
        flow: FlowType,
        legs: &[Leg],
        loc: &SourceLoc,
    ) {
        let root = match root {
            Some(root) => root,
            None => {
                self.error(
                    Problem::DivergenceWithoutRoot,
                    loc,
                    format!("{} divergence must follow a step or transition", flow),
                );
                return;
            }
        };

        match (flow, root) {
            (FlowType::Or, ElementRef::Step(step)) => {
                for leg in legs {
                    let first = self.sfc.leg_elements(leg).first().copied();
                    if let Some(ElementRef::Transition(transition)) = first {
                        self.sfc.link_step_to_transition(step, transition);
                    }
                }
            }
            (FlowType::And, ElementRef::Transition(transition)) => {
                for leg in legs {
                    let first = self.sfc.leg_elements(leg).first().copied();
                    if let Some(ElementRef::Step(step)) = first {
                        self.sfc.link_transition_to_step(transition, step);
                    }
                }
            }
            (FlowType::Or, ElementRef::Transition(transition)) => {
                let message = format!(
                    "OR divergence must follow a step, not transition '@{}'",
                    self.sfc.transition(transition).name
                );
                self.error(Problem::DivergenceRootKind, loc, message);
            }
            (FlowType::And, ElementRef::Step(step)) => {
                let message = format!(
                    "AND divergence must follow a transition, not step '@{}'",
                    self.sfc.step(step).name
                );
                self.error(Problem::DivergenceRootKind, loc, message);
            }
        }
    }

    /// Parses the element after a convergence operator, links every leg
    /// that falls through to it and returns the convergence branch.
    fn parse_convergence(&mut self, flow: FlowType, legs: &[Leg], close: &Token) -> Branch {
        let expected = match flow {
            FlowType::Or => TokenType::OrConverge,
            FlowType::And => TokenType::AndConverge,
        };
        if close.token_type != expected {
            self.error(
                Problem::TokenExpected,
                &close.loc,
                format!(
                    "Expected {} to close {} branch, got {}",
                    expected, flow, close.token_type
                ),
            );
        }

        self.skip_newlines();
        let token = self.peek().clone();
        let (root, misplaced): (Option<ElementRef>, Option<ElementRef>) =
            match (flow, token.token_type) {
                (FlowType::Or, TokenType::Step | TokenType::InitialStep) => {
                    (self.parse_step().map(Into::into), None)
                }
                (FlowType::And, TokenType::Transition) => {
                    (self.parse_transition().map(Into::into), None)
                }
                (_, TokenType::Step | TokenType::InitialStep | TokenType::Transition) => {
                    self.convergence_target_error(flow, &token);
                    let element = if token.token_type == TokenType::Transition {
                        self.parse_transition().map(Into::into)
                    } else {
                        self.parse_step().map(Into::into)
                    };
                    (None, element)
                }
                _ => {
                    self.convergence_target_error(flow, &token);
                    (None, None)
                }
            };

        let mut converge = Branch::new(BranchKind::Converge, flow, close.line());
        converge.root = root;

        // Without a root the legs cannot be closed. The problem above
        // already covers their missing links.
        if let Some(ElementRef::Transition(transition)) = misplaced {
            self.detached.insert(self.sfc.transition(transition).id);
        }

        for leg in legs {
            match flow {
                FlowType::Or => {
                    if Self::leg_jumps(&self.sfc, leg) {
                        continue;
                    }
                    let last = self.sfc.leg_elements(leg).last().copied();
                    match (last, root) {
                        (Some(ElementRef::Transition(transition)), Some(ElementRef::Step(step))) => {
                            self.sfc.link_transition_to_step(transition, step);
                        }
                        (Some(ElementRef::Transition(transition)), None) => {
                            self.detached.insert(self.sfc.transition(transition).id);
                        }
                        _ => {}
                    }
                }
                FlowType::And => {
                    if let (Some(step), Some(ElementRef::Transition(transition))) =
                        (Self::last_step(&self.sfc, leg), root)
                    {
                        self.sfc.link_step_to_transition(step, transition);
                    }
                }
            }
            converge.legs.push(leg.clone());
        }

        let next = root.or(misplaced);
        self.previous = next;
        self.current_step = next.and_then(|r| r.as_step());

        converge
    }

    fn convergence_target_error(&mut self, flow: FlowType, token: &Token) {
        self.error(
            Problem::ConvergenceTargetKind,
            &token.loc,
            format!(
                "{} convergence must be followed by {}, got {}",
                flow,
                Self::convergence_target(flow),
                token.describe()
            ),
        );
    }

    fn convergence_target(flow: FlowType) -> &'static str {
        match flow {
            FlowType::Or => "a step",
            FlowType::And => "a transition",
        }
    }

    /// Records a missing convergence. OR branches may omit it when every
    /// leg leaves through a jump.
    fn check_missing_convergence(&mut self, flow: FlowType, legs: &[Leg], loc: &SourceLoc) {
        match flow {
            FlowType::And => {
                self.error(
                    Problem::AndConvergenceMissing,
                    loc,
                    "Expected \\\\// to close AND branch",
                );
            }
            FlowType::Or => {
                if !legs.iter().all(|leg| Self::leg_jumps(&self.sfc, leg)) {
                    self.error(
                        Problem::OrConvergenceMissing,
                        loc,
                        "Expected \\/ to close OR branch, or ensure all legs jump (>> @target)",
                    );
                }
            }
        }
    }
}
