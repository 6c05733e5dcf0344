//! Errors surfaced by the stages of the compiler.
//!
//! Tokenizing stops at the first problem. Parsing and validation collect
//! every problem they find and report them together, ordered by line.
use std::fmt;

use thiserror::Error;

use crate::diagnostic::{sort_by_line, Diagnostic};

/// A lexical problem. Tokenizing stops at the first one.
#[derive(Debug, Error)]
#[error("{diagnostic}")]
pub struct TokenizeError {
    diagnostic: Diagnostic,
}

impl TokenizeError {
    pub fn new(diagnostic: Diagnostic) -> Self {
        Self { diagnostic }
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    pub fn message(&self) -> &str {
        self.diagnostic.message()
    }

    pub fn line(&self) -> Option<usize> {
        self.diagnostic.line()
    }
}

/// Every syntax, semantic and structural problem found while parsing one
/// document.
#[derive(Debug, Error)]
#[error("{}", Numbered("QuickSFC parsing failed with the following errors:", .diagnostics.as_slice()))]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Creates the error. The diagnostics are ordered by line with
    /// diagnostics that have no line last.
    pub fn new(mut diagnostics: Vec<Diagnostic>) -> Self {
        sort_by_line(&mut diagnostics);
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// The errors as (message, line) pairs in report order.
    pub fn errors(&self) -> Vec<(&str, Option<usize>)> {
        self.diagnostics
            .iter()
            .map(|d| (d.message(), d.line()))
            .collect()
    }

    /// True if any error message contains the text.
    pub fn mentions(&self, text: &str) -> bool {
        self.diagnostics.iter().any(|d| d.message().contains(text))
    }
}

impl From<TokenizeError> for ParseError {
    fn from(value: TokenizeError) -> Self {
        ParseError::new(vec![value.diagnostic])
    }
}

/// Problems found when checking that a parsed chart can be exported.
#[derive(Debug, Error)]
#[error("{}", Numbered("SFC validation failed with the following errors:", .diagnostics.as_slice()))]
pub struct ValidationError {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationError {
    pub fn new(mut diagnostics: Vec<Diagnostic>) -> Self {
        sort_by_line(&mut diagnostics);
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn mentions(&self, text: &str) -> bool {
        self.diagnostics.iter().any(|d| d.message().contains(text))
    }
}

/// Renders a header followed by a numbered list of diagnostics.
struct Numbered<'a>(&'a str, &'a [Diagnostic]);

impl fmt::Display for Numbered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        for (idx, diagnostic) in self.1.iter().enumerate() {
            write!(f, "\n  {}. {}", idx + 1, diagnostic)?;
        }
        Ok(())
    }
}
