//! JSON export of a chart.
//!
//! The export names elements rather than exposing arena handles so that
//! external tools can read the result without knowing the arena layout.

use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use crate::{
    core::SourceLoc,
    graph::Sfc,
    sfc::{BranchKind, FlowType, NodeId},
};

/// Errors that can occur during JSON export operations.
#[derive(Debug, Error)]
pub enum JsonExportError {
    #[error("Serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Configuration options for JSON export.
#[derive(Debug, Clone)]
pub struct JsonExportOptions {
    /// Include source location information
    pub include_locations: bool,
    /// Pretty-print the JSON output
    pub pretty_print: bool,
}

impl Default for JsonExportOptions {
    fn default() -> Self {
        Self {
            include_locations: true,
            pretty_print: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct JsonExporter {
    options: JsonExportOptions,
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: JsonExportOptions) -> Self {
        Self { options }
    }

    /// Exports the chart. Links, when given, are the directed links of the
    /// synthesized topology.
    pub fn export(
        &self,
        sfc: &Sfc,
        links: Option<&[(NodeId, NodeId)]>,
    ) -> Result<String, JsonExportError> {
        let document = Document::new(sfc, links, &self.options);
        if self.options.pretty_print {
            Ok(serde_json::to_string_pretty(&document)?)
        } else {
            Ok(serde_json::to_string(&document)?)
        }
    }

    pub fn export_to_writer<W: Write>(
        &self,
        sfc: &Sfc,
        links: Option<&[(NodeId, NodeId)]>,
        writer: W,
    ) -> Result<(), JsonExportError> {
        let document = Document::new(sfc, links, &self.options);
        if self.options.pretty_print {
            serde_json::to_writer_pretty(writer, &document)?;
        } else {
            serde_json::to_writer(writer, &document)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Document<'a> {
    initial_step: Option<&'a str>,
    steps: Vec<StepView<'a>>,
    transitions: Vec<TransitionView<'a>>,
    branches: Vec<BranchView<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<Vec<LinkView>>,
}

#[derive(Serialize)]
struct StepView<'a> {
    id: NodeId,
    operand: usize,
    name: &'a str,
    initial: bool,
    action: &'a str,
    preset: u32,
    #[serde(skip_serializing_if = "no_comments")]
    comments: &'a [String],
    incoming: Vec<&'a str>,
    outgoing: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a SourceLoc>,
}

fn no_comments(comments: &&[String]) -> bool {
    comments.is_empty()
}

#[derive(Serialize)]
struct TransitionView<'a> {
    id: NodeId,
    operand: usize,
    name: &'a str,
    condition: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    incoming: Vec<&'a str>,
    outgoing: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a SourceLoc>,
}

#[derive(Serialize)]
struct BranchView<'a> {
    kind: BranchKind,
    flow: FlowType,
    line: usize,
    root: Option<&'a str>,
    legs: Vec<Vec<&'a str>>,
}

#[derive(Serialize)]
struct LinkView {
    from: NodeId,
    to: NodeId,
}

impl<'a> Document<'a> {
    fn new(
        sfc: &'a Sfc,
        links: Option<&[(NodeId, NodeId)]>,
        options: &JsonExportOptions,
    ) -> Self {
        let location = |loc: &'a SourceLoc| options.include_locations.then_some(loc);

        let steps = sfc
            .steps()
            .iter()
            .map(|step| StepView {
                id: step.id,
                operand: step.operand,
                name: &step.name,
                initial: step.initial,
                action: &step.action,
                preset: step.preset,
                comments: &step.comments,
                incoming: step
                    .incoming()
                    .iter()
                    .map(|t| sfc.transition(*t).name.as_str())
                    .collect(),
                outgoing: step
                    .outgoing()
                    .iter()
                    .map(|t| sfc.transition(*t).name.as_str())
                    .collect(),
                location: location(&step.loc),
            })
            .collect();

        let transitions = sfc
            .transitions()
            .iter()
            .map(|transition| TransitionView {
                id: transition.id,
                operand: transition.operand,
                name: &transition.name,
                condition: &transition.condition,
                target: transition.target.as_deref(),
                comment: transition.comment.as_deref(),
                incoming: transition
                    .incoming()
                    .iter()
                    .map(|s| sfc.step(*s).name.as_str())
                    .collect(),
                outgoing: transition
                    .outgoing()
                    .iter()
                    .map(|s| sfc.step(*s).name.as_str())
                    .collect(),
                location: location(&transition.loc),
            })
            .collect();

        let branches = sfc
            .branches()
            .iter()
            .map(|branch| BranchView {
                kind: branch.kind,
                flow: branch.flow,
                line: branch.line,
                root: branch.root.map(|root| sfc.name_of(root)),
                legs: branch
                    .legs
                    .iter()
                    .map(|leg| {
                        sfc.leg_elements(leg)
                            .into_iter()
                            .map(|e| sfc.name_of(e))
                            .collect()
                    })
                    .collect(),
            })
            .collect();

        Self {
            initial_step: sfc.initial_step().map(|s| s.name.as_str()),
            steps,
            transitions,
            branches,
            links: links.map(|links| {
                links
                    .iter()
                    .map(|(from, to)| LinkView {
                        from: *from,
                        to: *to,
                    })
                    .collect()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{StepDecl, TransitionDecl};

    fn chart() -> Sfc {
        let mut sfc = Sfc::new();
        let init = sfc
            .add_step(StepDecl {
                name: "init".into(),
                initial: true,
                loc: SourceLoc::line(1),
                ..Default::default()
            })
            .unwrap();
        let go = sfc
            .add_transition(TransitionDecl {
                name: "go".into(),
                condition: "start".into(),
                target: Some("init".into()),
                loc: SourceLoc::line(2),
                ..Default::default()
            })
            .unwrap();
        sfc.connect(init.into(), go.into());
        sfc.connect(go.into(), init.into());
        sfc
    }

    #[test]
    fn export_when_chart_then_valid_json_with_names() {
        let json = JsonExporter::new().export(&chart(), None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!("init", value["initial_step"]);
        assert_eq!("go", value["steps"][0]["outgoing"][0]);
        assert_eq!("init", value["transitions"][0]["target"]);
        assert!(value.get("links").is_none());
    }

    #[test]
    fn export_when_no_locations_then_location_omitted() {
        let exporter = JsonExporter::with_options(JsonExportOptions {
            include_locations: false,
            pretty_print: false,
        });
        let json = exporter.export(&chart(), None).unwrap();
        assert!(!json.contains("location"));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn export_when_links_then_included() {
        let links = [(NodeId(0), NodeId(1))];
        let json = JsonExporter::new().export(&chart(), Some(&links)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(1, value["links"][0]["to"]);
    }

    #[test]
    fn export_to_writer_when_buffer_then_written() {
        let mut buffer = vec![];
        JsonExporter::new()
            .export_to_writer(&chart(), None, &mut buffer)
            .unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains("\"go\""));
    }
}
