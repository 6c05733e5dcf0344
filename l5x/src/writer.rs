//! Writes the L5X document.
//!
//! The document holds one program with one SFC routine. Everything other
//! than the routine content and the tags that back it is fixed context
//! that the importing tool expects to find.
use quick_xml::{
    events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event},
    Writer,
};
use quicksfc_analyzer::{Junction, Topology};
use quicksfc_dsl::{
    graph::Sfc,
    sfc::{BranchKind, FlowType, NodeId, Step, Transition},
};
use time::{macros::format_description, OffsetDateTime};

use crate::{
    error::L5xError,
    ids::{step_operand, transition_operand, ActionIds},
    layout::{Layout, Point, INITIAL_X, INITIAL_Y},
    options::ExportOptions,
};

const EXPORT_OPTIONS: &str = "References NoRawData L5KData DecoratedData Context Dependencies ForceProtectedEncoding AllProjDocTrans";
const ACTION_QUALIFIER: &str = "NonStored";

/// Formats a date as `Mon Jan 05 14:03:09 2026`.
pub fn format_export_date(date: OffsetDateTime) -> Result<String, L5xError> {
    let format = format_description!(
        "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [year]"
    );
    Ok(date.format(format)?)
}

/// Splits text into CDATA sections such that no section contains the
/// closing sequence.
fn cdata_sections(text: &str) -> Vec<String> {
    let parts: Vec<&str> = text.split("]]>").collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let mut section = String::new();
            if index > 0 {
                section.push('>');
            }
            section.push_str(part);
            if index < last {
                section.push_str("]]");
            }
            section
        })
        .collect()
}

pub struct L5xWriter<'a> {
    sfc: &'a Sfc,
    topology: &'a Topology,
    layout: &'a Layout,
    actions: &'a ActionIds,
    options: &'a ExportOptions,
    xml: Writer<Vec<u8>>,
}

impl<'a> L5xWriter<'a> {
    pub fn new(
        sfc: &'a Sfc,
        topology: &'a Topology,
        layout: &'a Layout,
        actions: &'a ActionIds,
        options: &'a ExportOptions,
    ) -> Self {
        Self {
            sfc,
            topology,
            layout,
            actions,
            options,
            xml: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    /// Writes the document and returns it as text.
    pub fn write(mut self) -> Result<String, L5xError> {
        self.document()?;
        Ok(String::from_utf8(self.xml.into_inner())?)
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), L5xError> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.xml.write_event(Event::Start(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), L5xError> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), L5xError> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.xml.write_event(Event::Empty(element))?;
        Ok(())
    }

    /// An element whose only content is the text as CDATA.
    fn cdata(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<(), L5xError> {
        self.start(name, attributes)?;
        for section in cdata_sections(text) {
            self.xml
                .write_event(Event::CData(BytesCData::new(section.as_str())))?;
        }
        self.end(name)
    }

    fn document(&mut self) -> Result<(), L5xError> {
        self.xml.write_event(Event::Decl(BytesDecl::new(
            "1.0",
            Some("UTF-8"),
            Some("yes"),
        )))?;

        let date = format_export_date(
            self.options
                .export_date
                .unwrap_or_else(OffsetDateTime::now_utc),
        )?;
        let options = self.options;
        self.start(
            "RSLogix5000Content",
            &[
                ("SchemaRevision", options.schema_revision.as_str()),
                ("SoftwareRevision", options.software_revision.as_str()),
                ("TargetName", options.program_name.as_str()),
                ("TargetType", "Program"),
                ("ContainsContext", "true"),
                ("Owner", "QuickSFC"),
                ("ExportDate", date.as_str()),
                ("ExportOptions", EXPORT_OPTIONS),
            ],
        )?;

        self.start(
            "Controller",
            &[("Use", "Context"), ("Name", options.controller_name.as_str())],
        )?;
        self.empty("DataTypes", &[("Use", "Context")])?;
        self.empty("Modules", &[("Use", "Context")])?;
        self.empty("Tags", &[("Use", "Context")])?;

        self.start("Programs", &[("Use", "Context")])?;
        self.start(
            "Program",
            &[
                ("Use", "Target"),
                ("Name", options.program_name.as_str()),
                ("TestEdits", "false"),
                ("Disabled", "false"),
                ("UseAsFolder", "false"),
            ],
        )?;
        self.tags()?;
        self.routines()?;
        self.end("Program")?;
        self.end("Programs")?;

        self.end("Controller")?;
        self.end("RSLogix5000Content")
    }

    fn tags(&mut self) -> Result<(), L5xError> {
        let sfc = self.sfc;
        let actions = self.actions;
        self.start("Tags", &[])?;
        for step in sfc.steps() {
            self.step_tag(step)?;
        }
        for step in sfc.steps() {
            if let Some(action) = actions.for_step(step) {
                self.action_tag(&action.operand(), step)?;
            }
        }
        for transition in sfc.transitions() {
            self.transition_tag(transition)?;
        }
        self.end("Tags")
    }

    fn tag_start(&mut self, name: &str, data_type: &str) -> Result<(), L5xError> {
        self.start(
            "Tag",
            &[
                ("Name", name),
                ("TagType", "Base"),
                ("DataType", data_type),
                ("Constant", "false"),
                ("ExternalAccess", "Read/Write"),
            ],
        )
    }

    fn member(
        &mut self,
        name: &str,
        data_type: &str,
        radix: Option<&str>,
        value: &str,
    ) -> Result<(), L5xError> {
        match radix {
            Some(radix) => self.empty(
                "DataValueMember",
                &[
                    ("Name", name),
                    ("DataType", data_type),
                    ("Radix", radix),
                    ("Value", value),
                ],
            ),
            None => self.empty(
                "DataValueMember",
                &[("Name", name), ("DataType", data_type), ("Value", value)],
            ),
        }
    }

    fn step_tag(&mut self, step: &Step) -> Result<(), L5xError> {
        self.tag_start(&step_operand(step), "SFC_STEP")?;

        let mut description = format!("@{}", step.name);
        for comment in &step.comments {
            description.push('\n');
            description.push_str(comment);
        }
        self.cdata("Description", &[], &description)?;

        let preset = step.preset.to_string();
        self.cdata(
            "Data",
            &[("Format", "L5K")],
            &format!("[136314881,{},0,0,0,0,0]", preset),
        )?;

        self.start("Data", &[("Format", "Decorated")])?;
        self.start("Structure", &[("DataType", "SFC_STEP")])?;
        self.member("Status", "DINT", Some("Hex"), "16#0820_0001")?;
        for flag in [
            "X",
            "FS",
            "SA",
            "LS",
            "DN",
            "OV",
            "AlarmEn",
            "AlarmLow",
            "AlarmHigh",
            "Reset",
        ] {
            self.member(flag, "BOOL", None, "0")?;
        }
        self.member("PauseTimer", "BOOL", None, "1")?;
        self.member("PRE", "DINT", Some("Decimal"), &preset)?;
        for counter in ["T", "TMax", "Count", "LimitLow", "LimitHigh"] {
            self.member(counter, "DINT", Some("Decimal"), "0")?;
        }
        self.end("Structure")?;
        self.end("Data")?;

        self.end("Tag")
    }

    fn action_tag(&mut self, operand: &str, step: &Step) -> Result<(), L5xError> {
        self.tag_start(operand, "SFC_ACTION")?;
        self.cdata("Description", &[], &format!("@{}", step.name))?;
        self.cdata("Data", &[("Format", "L5K")], "[2097152,0,0,0]")?;

        self.start("Data", &[("Format", "Decorated")])?;
        self.start("Structure", &[("DataType", "SFC_ACTION")])?;
        self.member("Status", "DINT", Some("Hex"), "16#0020_0000")?;
        self.member("A", "BOOL", None, "0")?;
        self.member("Q", "BOOL", None, "0")?;
        self.member("PauseTimer", "BOOL", None, "1")?;
        for counter in ["PRE", "T", "Count"] {
            self.member(counter, "DINT", Some("Decimal"), "0")?;
        }
        self.end("Structure")?;
        self.end("Data")?;

        self.end("Tag")
    }

    fn transition_tag(&mut self, transition: &Transition) -> Result<(), L5xError> {
        self.start(
            "Tag",
            &[
                ("Name", transition_operand(transition).as_str()),
                ("TagType", "Base"),
                ("DataType", "BOOL"),
                ("Radix", "Decimal"),
                ("Constant", "false"),
                ("ExternalAccess", "Read/Write"),
            ],
        )?;
        let mut description = format!("@{}", transition.name);
        if let Some(comment) = &transition.comment {
            description.push('\n');
            description.push_str(comment);
        }
        self.cdata("Description", &[], &description)?;
        self.cdata("Data", &[("Format", "L5K")], "0")?;
        self.start("Data", &[("Format", "Decorated")])?;
        self.empty(
            "DataValue",
            &[("DataType", "BOOL"), ("Radix", "Decimal"), ("Value", "0")],
        )?;
        self.end("Data")?;
        self.end("Tag")
    }

    fn routines(&mut self) -> Result<(), L5xError> {
        let sfc = self.sfc;
        let topology = self.topology;

        self.start("Routines", &[])?;
        self.start("Routine", &[("Name", "SFC"), ("Type", "SFC")])?;
        self.start(
            "SFCContent",
            &[
                ("SheetSize", "Letter - 8.5 x 11 in"),
                ("SheetOrientation", "Landscape"),
                ("StepName", "Step"),
                ("TransitionName", "Tran"),
                ("ActionName", "Action"),
                ("StopName", "Stop"),
            ],
        )?;

        for step in sfc.steps() {
            self.step(step)?;
        }
        for transition in sfc.transitions() {
            self.transition(transition)?;
        }
        for junction in topology.junctions() {
            self.branch(junction)?;
        }
        for (from, to) in topology.links() {
            self.empty(
                "DirectedLink",
                &[
                    ("FromID", from.to_string().as_str()),
                    ("ToID", to.to_string().as_str()),
                    ("Show", "true"),
                ],
            )?;
        }

        self.end("SFCContent")?;
        self.end("Routine")?;
        self.end("Routines")
    }

    fn position(&self, id: NodeId) -> Point {
        self.layout.position(id).unwrap_or(Point {
            x: INITIAL_X,
            y: INITIAL_Y,
        })
    }

    /// A structured text body with one `Line` per line of the text.
    fn st_content(&mut self, text: &str) -> Result<(), L5xError> {
        self.start("STContent", &[])?;
        let lines: Vec<&str> = text.lines().collect();
        if lines.is_empty() {
            self.cdata("Line", &[("Number", "0")], "")?;
        }
        for (number, line) in lines.iter().enumerate() {
            self.cdata("Line", &[("Number", number.to_string().as_str())], line)?;
        }
        self.end("STContent")
    }

    fn step(&mut self, step: &Step) -> Result<(), L5xError> {
        let point = self.position(step.id);
        let id = step.id.to_string();
        let x = point.x.to_string();
        let y = point.y.to_string();
        let desc_x = (point.x + 40).to_string();
        let desc_y = (point.y - 20).to_string();
        let operand = step_operand(step);
        let attributes = [
            ("ID", id.as_str()),
            ("X", x.as_str()),
            ("Y", y.as_str()),
            ("Operand", operand.as_str()),
            ("HideDesc", "false"),
            ("DescX", desc_x.as_str()),
            ("DescY", desc_y.as_str()),
            ("DescWidth", "0"),
            ("InitialStep", if step.initial { "true" } else { "false" }),
            ("PresetUsesExpr", "false"),
            ("LimitHighUsesExpr", "false"),
            ("LimitLowUsesExpr", "false"),
            ("ShowActions", "true"),
        ];

        let actions = self.actions;
        let action = match actions.for_step(step) {
            Some(action) => action,
            None => return self.empty("Step", &attributes),
        };

        self.start("Step", &attributes)?;
        self.start(
            "Action",
            &[
                ("ID", action.id.to_string().as_str()),
                ("Operand", action.operand().as_str()),
                ("Qualifier", ACTION_QUALIFIER),
                ("IsBoolean", "false"),
                ("PresetUsesExpr", "false"),
            ],
        )?;
        self.start("Body", &[])?;
        self.st_content(&step.action)?;
        self.end("Body")?;
        self.end("Action")?;
        self.end("Step")
    }

    fn transition(&mut self, transition: &Transition) -> Result<(), L5xError> {
        let point = self.position(transition.id);
        self.start(
            "Transition",
            &[
                ("ID", transition.id.to_string().as_str()),
                ("X", point.x.to_string().as_str()),
                ("Y", point.y.to_string().as_str()),
                ("Operand", transition_operand(transition).as_str()),
                ("HideDesc", "false"),
                ("DescX", (point.x + 60).to_string().as_str()),
                ("DescY", (point.y - 20).to_string().as_str()),
                ("DescWidth", "0"),
            ],
        )?;
        self.start("Condition", &[])?;
        self.st_content(&transition.condition)?;
        self.end("Condition")?;
        self.end("Transition")
    }

    fn branch(&mut self, junction: &Junction) -> Result<(), L5xError> {
        let id = junction.id.to_string();
        let y = self.layout.junction_y(junction.id).to_string();
        let branch_type = match junction.flow {
            FlowType::Or => "Selection",
            FlowType::And => "Simultaneous",
        };
        let mut attributes = vec![
            ("ID", id.as_str()),
            ("Y", y.as_str()),
            ("BranchType", branch_type),
        ];
        match junction.kind {
            BranchKind::Diverge => {
                attributes.push(("BranchFlow", "Diverge"));
                attributes.push(("Priority", "Default"));
            }
            BranchKind::Converge => attributes.push(("BranchFlow", "Converge")),
        }

        self.start("Branch", &attributes)?;
        for leg in &junction.legs {
            self.empty("Leg", &[("ID", leg.id.to_string().as_str())])?;
        }
        self.end("Branch")
    }
}
