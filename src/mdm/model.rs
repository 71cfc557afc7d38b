// src/mdm/model.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Choice-like field kinds that can pull options from master data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "selectBox")]
    SelectBox,
    #[serde(rename = "checkBox")]
    CheckBox,
    #[serde(rename = "radio")]
    Radio,
    #[serde(rename = "multiselect")]
    MultiSelect,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::SelectBox => "selectBox",
            FieldType::CheckBox => "checkBox",
            FieldType::Radio => "radio",
            FieldType::MultiSelect => "multiselect",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "selectBox" => Some(FieldType::SelectBox),
            "checkBox" => Some(FieldType::CheckBox),
            "radio" => Some(FieldType::Radio),
            "multiselect" => Some(FieldType::MultiSelect),
            _ => None,
        }
    }
}

/// Where a field's options come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionsSource {
    #[serde(rename = "static")]
    Static,
    #[serde(rename = "formOptions")]
    FormOptions,
    #[serde(rename = "jdbcOptions")]
    JdbcOptions,
    #[serde(rename = "restOptions")]
    RestOptions,
    #[serde(rename = "unknown")]
    Unknown,
}

/// Binder keys in match order.
pub const EXTERNAL_BINDERS: [(&str, OptionsSource); 3] = [
    ("formOptions", OptionsSource::FormOptions),
    ("jdbcOptions", OptionsSource::JdbcOptions),
    ("restOptions", OptionsSource::RestOptions),
];

impl OptionsSource {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionsSource::Static => "static",
            OptionsSource::FormOptions => "formOptions",
            OptionsSource::JdbcOptions => "jdbcOptions",
            OptionsSource::RestOptions => "restOptions",
            OptionsSource::Unknown => "unknown",
        }
    }

    /// Classify an options binder by its class name, case-insensitively.
    pub fn from_binder_class(class_name: &str) -> Self {
        let class_name = class_name.to_lowercase();
        EXTERNAL_BINDERS
            .iter()
            .find(|(key, _)| class_name.contains(&key.to_lowercase()))
            .map(|(_, source)| *source)
            .unwrap_or(OptionsSource::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdmDependency {
    pub form_id: String,
    pub form_name: String,
    pub field_id: String,
    pub field_label: String,
    pub field_type: FieldType,
    pub options_source: OptionsSource,
    /// Binder `properties`, or the static option list.
    pub options_config: Value,
    pub has_ajax_cascade: bool,
    pub cascade_config: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub by_field_type: BTreeMap<String, usize>,
    pub by_options_source: BTreeMap<String, usize>,
    pub ajax_cascade_count: usize,
    pub unique_forms_with_mdm: usize,
}

impl Statistics {
    pub fn from_dependencies(dependencies: &[MdmDependency]) -> Self {
        let mut stats = Statistics::default();
        let mut forms = std::collections::BTreeSet::new();

        for dep in dependencies {
            *stats
                .by_field_type
                .entry(dep.field_type.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_options_source
                .entry(dep.options_source.as_str().to_string())
                .or_default() += 1;
            if dep.has_ajax_cascade {
                stats.ajax_cascade_count += 1;
            }
            forms.insert(dep.form_id.as_str());
        }

        stats.unique_forms_with_mdm = forms.len();
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub application_id: String,
    pub application_name: String,
    pub total_forms: usize,
    pub total_mdm_fields: usize,
    pub dependencies: Vec<MdmDependency>,
    pub warnings: Vec<String>,
    pub statistics: Statistics,
}

impl AnalysisReport {
    pub fn summary(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();

        let _ = writeln!(out, "\n{}\nSUMMARY\n{}", rule, rule);
        let _ = writeln!(out, "Application: {} ({})", self.application_name, self.application_id);
        let _ = writeln!(out, "Total Forms: {}", self.total_forms);
        let _ = writeln!(out, "Forms with MDM: {}", self.statistics.unique_forms_with_mdm);
        let _ = writeln!(out, "Total MDM Fields: {}", self.total_mdm_fields);
        let _ = writeln!(out, "AJAX Cascades: {}", self.statistics.ajax_cascade_count);

        let _ = writeln!(out, "\nBy Field Type:");
        for (field_type, count) in &self.statistics.by_field_type {
            let _ = writeln!(out, "  {}: {}", field_type, count);
        }

        let _ = writeln!(out, "\nBy Options Source:");
        for (source, count) in &self.statistics.by_options_source {
            let _ = writeln!(out, "  {}: {}", source, count);
        }

        if !self.warnings.is_empty() {
            let _ = writeln!(out, "\nWarnings ({}):", self.warnings.len());
            for warning in &self.warnings {
                let _ = writeln!(out, "  ⚠️  {}", warning);
            }
        }

        let _ = writeln!(out, "\n{}", rule);
        out
    }
}
