//! Options for the exported document.
use time::OffsetDateTime;

pub const DEFAULT_PROGRAM_NAME: &str = "MainProgram";
pub const DEFAULT_CONTROLLER_NAME: &str = "Controller";
pub const DEFAULT_SOFTWARE_REVISION: &str = "32.01";
pub const DEFAULT_SCHEMA_REVISION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    pub program_name: String,
    pub controller_name: String,
    pub software_revision: String,
    pub schema_revision: String,
    /// Fixed export date. The current time is used when not set.
    pub export_date: Option<OffsetDateTime>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            program_name: DEFAULT_PROGRAM_NAME.to_string(),
            controller_name: DEFAULT_CONTROLLER_NAME.to_string(),
            software_revision: DEFAULT_SOFTWARE_REVISION.to_string(),
            schema_revision: DEFAULT_SCHEMA_REVISION.to_string(),
            export_date: None,
        }
    }
}

impl ExportOptions {
    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = name.into();
        self
    }

    pub fn with_controller_name(mut self, name: impl Into<String>) -> Self {
        self.controller_name = name.into();
        self
    }

    pub fn with_software_revision(mut self, revision: impl Into<String>) -> Self {
        self.software_revision = revision.into();
        self
    }

    pub fn with_export_date(mut self, date: OffsetDateTime) -> Self {
        self.export_date = Some(date);
        self
    }
}
