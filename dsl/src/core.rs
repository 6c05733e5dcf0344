//! Identity of source documents and positions within them.
use std::{fmt, path::Path, sync::Arc};

use serde::Serialize;

/// FileId identifies the origin of source text.
///
/// Diagnostics carry a FileId so that a front end can find the text
/// again when rendering the problem.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct FileId(Arc<str>);

impl FileId {
    /// Creates an empty file identifier.
    pub fn new() -> Self {
        FileId::default()
    }

    /// Creates a file identifier from the path.
    pub fn from_path(path: &Path) -> Self {
        FileId(Arc::from(path.to_string_lossy().as_ref()))
    }

    /// Creates a file identifier from the slice. The slice
    /// is normally the file path.
    pub fn from_string(path: &str) -> Self {
        FileId(Arc::from(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of a language element in a document.
///
/// The line is 1-indexed. The start and end are byte offsets from the
/// start of the document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLoc {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl SourceLoc {
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        Self { line, start, end }
    }

    /// A location that only knows the line.
    pub fn line(line: usize) -> Self {
        Self {
            line,
            start: 0,
            end: 0,
        }
    }

    /// Location covering both this and the other location. The line is
    /// the line of this location.
    pub fn to(&self, other: &SourceLoc) -> SourceLoc {
        SourceLoc {
            line: self.line,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
