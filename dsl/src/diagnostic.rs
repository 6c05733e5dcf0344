//! Provides definition for diagnostics, which are the errors reported
//! while compiling a chart.
//!
//! A diagnostic has a problem code that names the category, a primary
//! label that says where and what, and optionally additional labels.
//! The command line maps these onto `codespan-reporting`.

use std::fmt;

use quicksfc_problems::Problem;

use crate::core::{FileId, SourceLoc};

/// Where in a document a label points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// A byte range on a 1-indexed line.
    Span(SourceLoc),
    /// The document as a whole rather than a particular line.
    Document,
}

/// A label that refers to some range in a file and is associated with
/// a message related to that range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    /// The position of label.
    pub location: Location,

    /// Identifier for the file.
    pub file_id: FileId,

    /// A message describing this label.
    pub message: String,
}

impl Label {
    pub fn source_loc(
        file_id: &FileId,
        source_loc: &SourceLoc,
        message: impl Into<String>,
    ) -> Self {
        Self {
            location: Location::Span(source_loc.clone()),
            file_id: file_id.clone(),
            message: message.into(),
        }
    }

    /// A label for the document in its entirety rather than a particular line.
    pub fn file(file_id: &FileId, message: impl Into<String>) -> Self {
        Self {
            location: Location::Document,
            file_id: file_id.clone(),
            message: message.into(),
        }
    }

    /// The 1-indexed line of the label, if the label refers to a line.
    pub fn line(&self) -> Option<usize> {
        match &self.location {
            Location::Span(loc) if loc.line > 0 => Some(loc.line),
            _ => None,
        }
    }
}

/// A diagnostic. Diagnostic have a code that is indicative of the category,
/// a primary location and possibly non-zero set of secondary location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// A normally unique value describing the type of diagnostic.
    pub code: String,

    description: String,

    /// The primary or first diagnostic.
    pub primary: Label,

    /// Additional descriptions to the constant description.
    pub described: Vec<String>,

    /// Additional information about the diagnostic.
    pub secondary: Vec<Label>,
}

impl Diagnostic {
    /// Creates a diagnostic from the problem code and with the specified label.
    pub fn problem(problem: Problem, primary: Label) -> Self {
        Self {
            code: problem.code().to_string(),
            description: problem.message().to_string(),
            primary,
            described: vec![],
            secondary: vec![],
        }
    }

    /// Creates a diagnostic for a broken internal invariant. These are not
    /// problems with the document and are never collected with user errors.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Diagnostic::problem(
            Problem::InternalError,
            Label::file(&FileId::default(), message),
        )
    }

    /// Adds to the problem description additional context about the problem.
    pub fn with_context(mut self, description: &str, item: &str) -> Self {
        self.described.push(format!("{}={}", description, item));
        self
    }

    pub fn with_secondary(mut self, label: Label) -> Self {
        self.secondary.push(label);
        self
    }

    /// Returns the description for the diagnostic. This may add in other
    /// data in addition that is part of the diagnostic.
    pub fn description(&self) -> String {
        if self.described.is_empty() {
            self.description.clone()
        } else {
            format!("{} ({})", self.description, self.described.join(", "))
        }
    }

    /// The message of the primary label.
    pub fn message(&self) -> &str {
        &self.primary.message
    }

    /// The line of the primary label.
    pub fn line(&self) -> Option<usize> {
        self.primary.line()
    }

    /// Every file that this diagnostic refers to.
    pub fn file_ids(&self) -> Vec<&FileId> {
        let mut ids = vec![&self.primary.file_id];
        for label in &self.secondary {
            if !ids.contains(&&label.file_id) {
                ids.push(&label.file_id);
            }
        }
        ids
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line() {
            Some(line) => write!(f, "Line {}: {}", line, self.message()),
            None => write!(f, "{}", self.message()),
        }
    }
}

/// Orders diagnostics by line. Diagnostics without a line sort last and
/// otherwise keep the order in which they were reported.
pub fn sort_by_line(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|d| (d.line().is_none(), d.line()));
}

#[cfg(test)]
mod tests {
    use quicksfc_problems::Problem;

    use super::*;

    fn at_line(line: usize, message: &str) -> Diagnostic {
        Diagnostic::problem(
            Problem::UnexpectedToken,
            Label::source_loc(&FileId::default(), &SourceLoc::line(line), message),
        )
    }

    fn whole_file(message: &str) -> Diagnostic {
        Diagnostic::problem(
            Problem::InitialStepMissing,
            Label::file(&FileId::default(), message),
        )
    }

    #[test]
    fn display_when_line_then_prefixed() {
        assert_eq!("Line 4: oops", format!("{}", at_line(4, "oops")));
    }

    #[test]
    fn display_when_document_then_message_only() {
        assert_eq!("missing", format!("{}", whole_file("missing")));
    }

    #[test]
    fn sort_by_line_when_mixed_then_document_last_and_stable() {
        let mut diagnostics = vec![
            whole_file("a"),
            at_line(7, "b"),
            at_line(2, "c"),
            at_line(7, "d"),
        ];

        sort_by_line(&mut diagnostics);

        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message()).collect();
        assert_eq!(vec!["c", "b", "d", "a"], messages);
    }

    #[test]
    fn description_when_context_then_appended() {
        let diagnostic = at_line(1, "x").with_context("name", "step1");
        assert_eq!("Unexpected token (name=step1)", diagnostic.description());
    }
}
