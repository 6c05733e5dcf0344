//! Runs the stages of an export.
use std::{fs, path::Path};

use log::{debug, info};
use quicksfc_analyzer::synthesize;
use quicksfc_dsl::{core::FileId, graph::Sfc};

use crate::{
    error::L5xError, ids::ActionIds, layout::Layout, options::ExportOptions, validate::validate,
    writer::L5xWriter,
};

/// Exports one chart.
///
/// ```ignore
/// let xml = L5xExporter::new(&sfc)
///     .with_options(ExportOptions::default().with_program_name("Mixer"))
///     .to_xml()?;
/// ```
pub struct L5xExporter<'a> {
    sfc: &'a Sfc,
    file_id: FileId,
    options: ExportOptions,
}

impl<'a> L5xExporter<'a> {
    pub fn new(sfc: &'a Sfc) -> Self {
        Self {
            sfc,
            file_id: FileId::new(),
            options: ExportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// The file that diagnostics from validation refer to.
    pub fn with_file_id(mut self, file_id: &FileId) -> Self {
        self.file_id = file_id.clone();
        self
    }

    pub fn validate(&self) -> Result<(), L5xError> {
        Ok(validate(self.sfc, &self.file_id)?)
    }

    /// Produces the L5X document.
    pub fn to_xml(&self) -> Result<String, L5xError> {
        self.validate()?;

        let topology = synthesize(self.sfc).map_err(L5xError::Internal)?;
        debug!(
            "Synthesized {} junctions and {} links",
            topology.junctions().len(),
            topology.links().len()
        );

        let layout = Layout::compute(self.sfc, &topology);
        let actions = ActionIds::allocate(self.sfc, &topology);

        L5xWriter::new(self.sfc, &topology, &layout, &actions, &self.options).write()
    }

    /// Writes the L5X document to the path.
    pub fn export(&self, path: &Path) -> Result<(), L5xError> {
        let xml = self.to_xml()?;
        fs::write(path, xml)?;
        info!("Wrote L5X to {}", path.display());
        Ok(())
    }
}
