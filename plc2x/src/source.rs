//! Reads source documents from disk.
//!
//! Documents are expected to be UTF-8. Documents saved by older editors
//! are often Windows-1252, so that is accepted as well.
use std::path::Path;

use log::{debug, trace};
use quicksfc_dsl::{
    core::FileId,
    diagnostic::{Diagnostic, Label},
};
use quicksfc_problems::Problem;

/// The decoded contents of a source file.
#[derive(Debug)]
pub struct Source {
    file_id: FileId,
    data: String,
}

impl Source {
    pub fn new(data: String, file_id: &FileId) -> Self {
        Self {
            file_id: file_id.clone(),
            data,
        }
    }

    /// Reads and decodes the file at the path.
    pub fn try_from_path(path: &Path) -> Result<Source, Diagnostic> {
        path_to_string(path).map(|data| Source::new(data, &FileId::from_path(path)))
    }

    pub fn as_string(&self) -> &str {
        &self.data
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }
}

fn path_to_string(path: &Path) -> Result<String, Diagnostic> {
    debug!("Reading file {}", path.display());

    let bytes = std::fs::read(path)
        .map_err(|e| diagnostic(Problem::CannotReadFile, path, e.to_string()))?;

    let decoders: [&'static encoding_rs::Encoding; 2] =
        [encoding_rs::UTF_8, encoding_rs::WINDOWS_1252];

    let result = decoders.into_iter().find_map(|d| {
        let (res, encoding_used, had_errors) = d.decode(&bytes);
        if had_errors {
            trace!(
                "Path {} did not match encoding {}",
                path.display(),
                encoding_used.name()
            );
            return None;
        }
        trace!(
            "Path {} matched encoding {}",
            path.display(),
            encoding_used.name()
        );
        Some(res.to_string())
    });

    result.ok_or_else(|| {
        diagnostic(
            Problem::UnsupportedEncoding,
            path,
            String::from("The file is not UTF-8 or Windows-1252"),
        )
    })
}

fn diagnostic(problem: Problem, path: &Path, message: String) -> Diagnostic {
    Diagnostic::problem(problem, Label::file(&FileId::from_path(path), message))
}
