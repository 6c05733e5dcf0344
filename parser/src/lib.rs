// Allow large errors because diagnostics carry labels for every problem.
#![allow(clippy::result_large_err)]

//! Parser for QuickSFC documents.
//!
//! Parsing runs in three stages: the lexer turns text into tokens, the
//! recursive descent parser builds the chart while collecting problems,
//! and a list of passes resolves jumps and checks connectivity. Every
//! stage after tokenizing runs to completion so that the caller sees all
//! problems at once.

mod lexer;
pub mod options;
mod parser;
mod rule_initial_step_exists;
mod rule_transitions_connected;
pub mod token;
mod xform_link_line_proximity;
mod xform_resolve_jumps;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use log::debug;
use quicksfc_dsl::{
    core::FileId,
    diagnostic::Diagnostic,
    error::{ParseError, TokenizeError},
    graph::Sfc,
    sfc::NodeId,
};

use crate::options::ParseOptions;
use crate::parser::Parser;
use crate::token::TokenStream;

/// Tokenize a QuickSFC document.
///
/// Stops at the first character that is not part of the language.
pub fn tokenize_program(source: &str, file_id: &FileId) -> Result<TokenStream, TokenizeError> {
    lexer::tokenize(source, file_id)
}

/// Parse tokens into a chart, then resolve jumps and check connectivity.
pub fn parse_tokens(
    stream: TokenStream,
    file_id: &FileId,
    options: &ParseOptions,
) -> Result<Sfc, ParseError> {
    let parsed = Parser::new(stream, file_id).parse();
    let (mut sfc, mut errors) = (parsed.sfc, parsed.diagnostics);

    if let Err(mut diagnostics) = transform(&mut sfc, file_id, options) {
        errors.append(&mut diagnostics);
    }
    if let Err(mut diagnostics) = check(&sfc, file_id, &parsed.detached) {
        errors.append(&mut diagnostics);
    }

    if !errors.is_empty() {
        debug!("Parsing found {} problems", errors.len());
        return Err(ParseError::new(errors));
    }

    Ok(sfc)
}

/// Parse a full QuickSFC document.
pub fn parse_program(
    source: &str,
    file_id: &FileId,
    options: &ParseOptions,
) -> Result<Sfc, ParseError> {
    let stream = tokenize_program(source, file_id)?;
    parse_tokens(stream, file_id, options)
}

#[allow(clippy::type_complexity)]
fn transform(
    sfc: &mut Sfc,
    file_id: &FileId,
    options: &ParseOptions,
) -> Result<(), Vec<Diagnostic>> {
    let xforms: Vec<fn(&mut Sfc, &FileId, &ParseOptions) -> Result<(), Vec<Diagnostic>>> = vec![
        xform_resolve_jumps::apply,
        xform_link_line_proximity::apply,
    ];

    let mut errors = vec![];
    for xform in xforms {
        match xform(sfc, file_id, options) {
            Ok(_) => {}
            Err(mut diagnostics) => errors.append(&mut diagnostics),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(())
}

#[allow(clippy::type_complexity)]
fn check(
    sfc: &Sfc,
    file_id: &FileId,
    detached: &HashSet<NodeId>,
) -> Result<(), Vec<Diagnostic>> {
    let rules: Vec<fn(&Sfc, &FileId) -> Result<(), Vec<Diagnostic>>> =
        vec![rule_initial_step_exists::apply];

    let mut errors = vec![];
    for rule in rules {
        match rule(sfc, file_id) {
            Ok(_) => {}
            Err(mut diagnostics) => errors.append(&mut diagnostics),
        }
    }
    if let Err(mut diagnostics) = rule_transitions_connected::apply(sfc, file_id, detached) {
        errors.append(&mut diagnostics);
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(())
}
