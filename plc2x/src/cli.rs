//! Implements the command line behavior.
//!
//! Each command reads one or more documents, runs the stages it needs and
//! writes the result to stdout or to a file. Problems are rendered to
//! stderr and the command returns an error.
use std::{
    fs::{metadata, read_dir},
    path::{Path, PathBuf},
};

use codespan_reporting::{
    diagnostic::{Diagnostic, Label, LabelStyle, Severity},
    files::SimpleFiles,
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
    },
};
use log::debug;
use quicksfc_analyzer::synthesize;
use quicksfc_dsl::{diagnostic::Location, graph::Sfc, json_export::JsonExporter};
use quicksfc_l5x::{ExportOptions, L5xExporter};
use quicksfc_parser::{options::ParseOptions, parse_program, tokenize_program};

use crate::source::Source;

/// Checks the specified files. Directories are expanded to the files they
/// contain. Nothing is printed when every file is valid.
pub fn check(
    paths: Vec<PathBuf>,
    options: &ParseOptions,
    suppress_output: bool,
) -> Result<(), String> {
    let mut files: Vec<PathBuf> = vec![];
    for path in paths {
        files.append(&mut enumerate_files(&path)?);
    }

    let mut error_count = 0;
    for file in files {
        let source = load(&file, suppress_output)?;
        if let Err(err) = parse_program(source.as_string(), source.file_id(), options) {
            error_count += err.diagnostics().len();
            handle_diagnostics(err.diagnostics(), Some(&source), suppress_output);
        }
    }

    if error_count > 0 {
        return Err(format!("Number of errors: {}", error_count));
    }
    Ok(())
}

/// Prints the tokens of the file, one per line.
pub fn tokenize(path: &Path, suppress_output: bool) -> Result<(), String> {
    let source = load(path, suppress_output)?;
    let stream = tokenize_program(source.as_string(), source.file_id()).map_err(|err| {
        handle_diagnostics(&[err.diagnostic().clone()], Some(&source), suppress_output);
        String::from("Not valid")
    })?;

    if !suppress_output {
        for token in &stream.tokens {
            println!("{}", token);
        }
    }
    Ok(())
}

/// Prints a human readable summary of the chart.
pub fn summary(path: &Path, options: &ParseOptions, suppress_output: bool) -> Result<(), String> {
    let sfc = load_chart(path, options, suppress_output)?;
    if !suppress_output {
        print!("{}", sfc.summary());
    }
    Ok(())
}

/// Prints the chart as JSON, optionally with the synthesized links.
pub fn json(
    path: &Path,
    options: &ParseOptions,
    with_links: bool,
    suppress_output: bool,
) -> Result<(), String> {
    let sfc = load_chart(path, options, suppress_output)?;

    let topology = if with_links {
        let topology = synthesize(&sfc).map_err(|diagnostic| {
            handle_diagnostics(&[diagnostic], None, suppress_output);
            String::from("Unable to synthesize links")
        })?;
        Some(topology)
    } else {
        None
    };
    let links = topology.as_ref().map(|t| t.links());

    let text = JsonExporter::new()
        .export(&sfc, links)
        .map_err(|err| err.to_string())?;
    if !suppress_output {
        println!("{}", text);
    }
    Ok(())
}

/// Compiles the file to L5X. Without an output path, the output is
/// written next to the input with the `L5X` extension.
pub fn compile(
    path: &Path,
    output: Option<PathBuf>,
    parse_options: &ParseOptions,
    export_options: ExportOptions,
    suppress_output: bool,
) -> Result<(), String> {
    let source = load(path, suppress_output)?;
    let sfc = parse(&source, parse_options, suppress_output)?;
    let output = output.unwrap_or_else(|| path.with_extension("L5X"));

    L5xExporter::new(&sfc)
        .with_file_id(source.file_id())
        .with_options(export_options)
        .export(&output)
        .map_err(|err| {
            let diagnostics = err.diagnostics();
            if diagnostics.is_empty() {
                return err.to_string();
            }
            handle_diagnostics(&diagnostics, Some(&source), suppress_output);
            format!("Number of errors: {}", diagnostics.len())
        })
}

fn load(path: &Path, suppress_output: bool) -> Result<Source, String> {
    Source::try_from_path(path).map_err(|diagnostic| {
        let message = diagnostic.to_string();
        handle_diagnostics(&[diagnostic], None, suppress_output);
        message
    })
}

fn parse(source: &Source, options: &ParseOptions, suppress_output: bool) -> Result<Sfc, String> {
    parse_program(source.as_string(), source.file_id(), options).map_err(|err| {
        handle_diagnostics(err.diagnostics(), Some(source), suppress_output);
        format!("Number of errors: {}", err.diagnostics().len())
    })
}

fn load_chart(path: &Path, options: &ParseOptions, suppress_output: bool) -> Result<Sfc, String> {
    let source = load(path, suppress_output)?;
    parse(&source, options, suppress_output)
}

fn enumerate_files(path: &Path) -> Result<Vec<PathBuf>, String> {
    let metadata = metadata(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if metadata.is_dir() {
        let paths = read_dir(path).map_err(|e| e.to_string())?;
        let mut paths: Vec<PathBuf> = paths
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();
        debug!("Directory {} contains {} files", path.display(), paths.len());
        return Ok(paths);
    }
    Ok(vec![path.to_path_buf()])
}

fn handle_diagnostics(
    diagnostics: &[quicksfc_dsl::diagnostic::Diagnostic],
    source: Option<&Source>,
    suppress_output: bool,
) {
    if suppress_output {
        return;
    }

    let writer = StandardStream::stderr(ColorChoice::Always);
    let config = codespan_reporting::term::Config::default();

    let mut files: SimpleFiles<String, &str> = SimpleFiles::new();
    let content = source.map(|s| s.as_string()).unwrap_or("");
    let name = source
        .map(|s| s.file_id().to_string())
        .unwrap_or_default();
    let file = files.add(name, content);

    for diagnostic in diagnostics {
        let diagnostic = map_diagnostic(diagnostic, file, content);
        let _ = term::emit(&mut writer.lock(), &config, &files, &diagnostic).map_err(|err| {
            eprintln!("Failed writing to terminal: {}", err);
        });
    }
}

/// Byte offset of the start of the 1-indexed line.
fn line_offset(content: &str, line: usize) -> usize {
    content
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum()
}

fn map_label(
    label: &quicksfc_dsl::diagnostic::Label,
    style: LabelStyle,
    file: usize,
    content: &str,
) -> Option<Label<usize>> {
    let loc = match &label.location {
        Location::Span(loc) => loc,
        Location::Document => return None,
    };

    // Some locations only know their line.
    let range = if loc.end == 0 {
        let offset = line_offset(content, loc.line);
        offset..offset
    } else {
        let end = loc.end.min(content.len());
        loc.start.min(end)..end
    };
    Some(Label::new(style, file, range).with_message(&label.message))
}

fn map_diagnostic(
    diagnostic: &quicksfc_dsl::diagnostic::Diagnostic,
    file: usize,
    content: &str,
) -> Diagnostic<usize> {
    let mut labels = vec![];
    let mut notes = vec![];

    match map_label(&diagnostic.primary, LabelStyle::Primary, file, content) {
        Some(label) => labels.push(label),
        None => notes.push(diagnostic.primary.message.clone()),
    }
    for secondary in &diagnostic.secondary {
        match map_label(secondary, LabelStyle::Secondary, file, content) {
            Some(label) => labels.push(label),
            None => notes.push(secondary.message.clone()),
        }
    }

    Diagnostic::new(Severity::Error)
        .with_code(&diagnostic.code)
        .with_message(diagnostic.description())
        .with_labels(labels)
        .with_notes(notes)
}
