// src/mdm/mod.rs
mod archive;
mod model;
mod scanner;

pub use archive::{load_application_document, write_report, ScanError};
pub use model::{AnalysisReport, FieldType, MdmDependency, OptionsSource, Statistics, EXTERNAL_BINDERS};
pub use scanner::{analyze_document, field_type_tag, scan_form, walk_elements, FormRef};

use std::path::Path;

/// Load an application export and scan every form for master-data fields.
pub fn analyze_archive(path: &Path) -> Result<AnalysisReport, ScanError> {
    let document = load_application_document(path)?;
    Ok(analyze_document(&document))
}
