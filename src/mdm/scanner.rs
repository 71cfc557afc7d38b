// src/mdm/scanner.rs
use super::model::{AnalysisReport, FieldType, MdmDependency, OptionsSource, Statistics};
use serde_json::{Map, Value};
use std::borrow::Cow;
use tracing::{debug, info, warn};

const UNKNOWN: &str = "unknown";

/// Identity of the form whose tree is being walked.
#[derive(Debug, Clone, Copy)]
pub struct FormRef<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

/// Scan a parsed application document. Per-form problems become warnings.
pub fn analyze_document(doc: &Value) -> AnalysisReport {
    let mut warnings = Vec::new();
    let mut dependencies = Vec::new();

    let forms = form_list(doc, &mut warnings);
    info!("Found {} forms to analyze", forms.len());

    for (index, form) in forms.iter().enumerate() {
        if let Err(warning) = scan_form(form, &mut dependencies) {
            warn!("Form #{}: {}", index, warning);
            warnings.push(warning);
        }
    }

    let statistics = Statistics::from_dependencies(&dependencies);
    let report = AnalysisReport {
        application_id: string_field(doc, "appId").into_owned(),
        application_name: string_field(doc, "appName").into_owned(),
        total_forms: forms.len(),
        total_mdm_fields: dependencies.len(),
        dependencies,
        warnings,
        statistics,
    };

    info!(
        forms = report.total_forms,
        mdm_fields = report.total_mdm_fields,
        warnings = report.warnings.len(),
        "Analysis complete"
    );
    report
}

/// `forms`, falling back to `formDefinitionList`.
fn form_list<'a>(doc: &'a Value, warnings: &mut Vec<String>) -> &'a [Value] {
    let Some((key, forms)) = ["forms", "formDefinitionList"]
        .iter()
        .find_map(|key| doc.get(*key).map(|v| (*key, v)))
    else {
        warnings.push("Could not find forms in application structure".to_string());
        return &[];
    };

    match forms {
        Value::Array(forms) => forms.as_slice(),
        Value::Null => &[],
        _ => {
            warnings.push(format!("Application key '{}' is not a list of forms", key));
            &[]
        }
    }
}

/// Walk one form definition; `Err` carries the warning text.
pub fn scan_form(form: &Value, dependencies: &mut Vec<MdmDependency>) -> Result<(), String> {
    if !form.is_object() {
        return Err("Skipping form entry that is not an object".to_string());
    }

    let id = string_field(form, "id");
    let name = string_field(form, "name");
    debug!("Analyzing form: {}", id);

    let parsed;
    let definition = match form.get("json") {
        Some(Value::String(raw)) => {
            parsed = serde_json::from_str::<Value>(raw)
                .map_err(|e| format!("Form '{}' has an invalid JSON definition: {}", id, e))?;
            &parsed
        }
        Some(structured) => structured,
        None => return Ok(()),
    };

    let form_ref = FormRef {
        id: &id,
        name: &name,
    };
    walk_elements(definition, form_ref, dependencies);
    Ok(())
}

/// Depth-first walk over `elements` and `properties.elements`.
pub fn walk_elements(element: &Value, form: FormRef<'_>, dependencies: &mut Vec<MdmDependency>) {
    let Value::Object(node) = element else {
        return;
    };

    let class_name = node.get("className").and_then(Value::as_str).unwrap_or("");
    if let Some(field_type) = FieldType::from_tag(&field_type_tag(class_name)) {
        if let Some(dep) = evaluate_field(node, form, field_type) {
            debug!("Found MDM field: {} ({})", dep.field_id, dep.options_source.as_str());
            dependencies.push(dep);
        }
    }

    let children = node.get("elements").and_then(Value::as_array);
    let nested = node
        .get("properties")
        .and_then(|p| p.get("elements"))
        .and_then(Value::as_array);

    for child in children.into_iter().chain(nested).flatten() {
        walk_elements(child, form, dependencies);
    }
}

/// Tag from a qualified class name: last path component, lower camel case.
/// Anything ending in `SelectBox` is a `selectBox`.
pub fn field_type_tag(class_name: &str) -> String {
    let last = class_name.rsplit('.').next().unwrap_or(class_name);
    if last.ends_with("SelectBox") {
        return FieldType::SelectBox.as_str().to_string();
    }

    let mut chars = last.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn evaluate_field(
    node: &Map<String, Value>,
    form: FormRef<'_>,
    field_type: FieldType,
) -> Option<MdmDependency> {
    let empty = Map::new();
    let props = node
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut options_source = OptionsSource::Static;
    let mut options_config = Value::Object(Map::new());

    if let Some(options) = props.get("options") {
        options_config = options.clone();
    }

    if let Some(Value::Object(binder)) = props.get("optionsBinder") {
        let binder_class = binder.get("className").and_then(Value::as_str).unwrap_or("");
        options_source = OptionsSource::from_binder_class(binder_class);
        options_config = binder
            .get("properties")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
    }

    let has_ajax_cascade = is_set(props.get("controlField")) || is_set(props.get("cascadeOptions"));
    let cascade_config = has_ajax_cascade.then(|| {
        let mut config = Map::new();
        config.insert(
            "controlField".to_string(),
            props.get("controlField").cloned().unwrap_or(Value::Null),
        );
        config.insert(
            "cascadeOptions".to_string(),
            props
                .get("cascadeOptions")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        );
        config
    });

    if options_source == OptionsSource::Static && !has_ajax_cascade {
        return None;
    }

    Some(MdmDependency {
        form_id: form.id.to_string(),
        form_name: form.name.to_string(),
        field_id: map_string(props, "id").into_owned(),
        field_label: map_string(props, "label").into_owned(),
        field_type,
        options_source,
        options_config,
        has_ajax_cascade,
        cascade_config,
    })
}

/// Present and not null, false, zero or empty.
fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
    }
}

fn string_field<'a>(value: &'a Value, key: &str) -> Cow<'a, str> {
    match value.as_object() {
        Some(map) => map_string(map, key),
        None => Cow::Borrowed(UNKNOWN),
    }
}

fn map_string<'a>(map: &'a Map<String, Value>, key: &str) -> Cow<'a, str> {
    match map.get(key) {
        Some(Value::String(s)) => Cow::Borrowed(s),
        None | Some(Value::Null) => Cow::Borrowed(UNKNOWN),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn select_box(id: &str, properties: Value) -> Value {
        let mut props = properties;
        props["id"] = json!(id);
        props["label"] = json!(format!("{} label", id));
        json!({ "className": "org.joget.apps.form.lib.SelectBox", "properties": props })
    }

    fn form(id: &str, elements: Vec<Value>) -> Value {
        let definition = json!({
            "className": "org.joget.apps.form.model.Form",
            "properties": { "id": id },
            "elements": elements,
        });
        json!({ "id": id, "name": format!("{} form", id), "json": definition.to_string() })
    }

    fn jdbc_binder() -> Value {
        json!({
            "className": "org.joget.plugin.enterprise.JdbcOptionsBinder",
            "properties": { "sql": "SELECT code, name FROM md_district" }
        })
    }

    #[test]
    fn test_field_type_tag() {
        assert_eq!(field_type_tag("org.joget.apps.form.lib.SelectBox"), "selectBox");
        assert_eq!(field_type_tag("org.joget.plugin.enterprise.MultiSelectBox"), "selectBox");
        assert_eq!(field_type_tag("org.joget.apps.form.lib.CheckBox"), "checkBox");
        assert_eq!(field_type_tag("org.joget.apps.form.lib.Radio"), "radio");
        assert_eq!(field_type_tag("org.joget.apps.form.lib.TextField"), "textField");
        assert_eq!(field_type_tag("radio"), "radio");
        assert_eq!(field_type_tag(""), "");
    }

    #[test]
    fn test_two_forms_one_jdbc_select() {
        let doc = json!({
            "appId": "farmers",
            "appName": "Farmers Registry",
            "forms": [
                form("f1", vec![select_box("district", json!({ "optionsBinder": jdbc_binder() }))]),
                form("f2", vec![json!({
                    "className": "org.joget.apps.form.lib.TextField",
                    "properties": { "id": "name", "label": "Name" }
                })]),
            ]
        });

        let report = analyze_document(&doc);
        assert_eq!(report.application_id, "farmers");
        assert_eq!(report.application_name, "Farmers Registry");
        assert_eq!(report.total_forms, 2);
        assert_eq!(report.total_mdm_fields, 1);
        assert_eq!(report.total_mdm_fields, report.dependencies.len());
        assert_eq!(
            report.statistics.by_options_source,
            BTreeMap::from([("jdbcOptions".to_string(), 1)])
        );

        let dep = &report.dependencies[0];
        assert_eq!(dep.form_id, "f1");
        assert_eq!(dep.form_name, "f1 form");
        assert_eq!(dep.field_id, "district");
        assert_eq!(dep.field_type, FieldType::SelectBox);
        assert_eq!(dep.options_config["sql"], "SELECT code, name FROM md_district");
        assert!(!dep.has_ajax_cascade);
        assert!(dep.cascade_config.is_none());
    }

    #[test]
    fn test_missing_forms_key_is_a_warning() {
        let report = analyze_document(&json!({ "appId": "x" }));
        assert_eq!(report.total_forms, 0);
        assert_eq!(report.total_mdm_fields, 0);
        assert_eq!(report.warnings, vec!["Could not find forms in application structure"]);
        assert_eq!(report.application_name, "unknown");
    }

    #[test]
    fn test_form_definition_list_fallback() {
        let doc = json!({
            "formDefinitionList": [
                form("f1", vec![select_box("crop", json!({ "optionsBinder": jdbc_binder() }))]),
            ]
        });
        let report = analyze_document(&doc);
        assert_eq!(report.total_forms, 1);
        assert_eq!(report.total_mdm_fields, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_static_only_field_is_ignored() {
        let options = json!([{ "value": "y", "label": "Yes" }, { "value": "n", "label": "No" }]);
        let mut deps = Vec::new();
        scan_form(
            &form("f1", vec![select_box("yesno", json!({ "options": options }))]),
            &mut deps,
        )
        .unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_control_field_without_binder_is_recorded_as_static() {
        let options = json!([{ "value": "a", "label": "A" }]);
        let mut deps = Vec::new();
        scan_form(
            &form(
                "f1",
                vec![select_box("village", json!({ "options": options, "controlField": "district" }))],
            ),
            &mut deps,
        )
        .unwrap();

        assert_eq!(deps.len(), 1);
        let dep = &deps[0];
        assert_eq!(dep.options_source, OptionsSource::Static);
        assert!(dep.has_ajax_cascade);
        assert_eq!(dep.options_config, options);
        let cascade = dep.cascade_config.as_ref().unwrap();
        assert_eq!(cascade["controlField"], "district");
        assert_eq!(cascade["cascadeOptions"], json!({}));
    }

    #[test]
    fn test_empty_control_field_is_not_a_cascade() {
        let mut deps = Vec::new();
        scan_form(
            &form("f1", vec![select_box("x", json!({ "options": [], "controlField": "" }))]),
            &mut deps,
        )
        .unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_unknown_binder() {
        let binder = json!({ "className": "com.example.LdapBinder", "properties": {} });
        let mut deps = Vec::new();
        scan_form(
            &form("f1", vec![select_box("user", json!({ "optionsBinder": binder }))]),
            &mut deps,
        )
        .unwrap();
        assert_eq!(deps[0].options_source, OptionsSource::Unknown);
    }

    #[test]
    fn test_both_recursion_paths_are_followed() {
        let deep_select = select_box("deep", json!({ "optionsBinder": jdbc_binder() }));
        let nested_select = select_box("nested", json!({ "optionsBinder": jdbc_binder() }));
        let section = json!({
            "className": "org.joget.apps.form.model.Section",
            "elements": [{
                "className": "org.joget.apps.form.model.Column",
                "elements": [deep_select],
            }],
            "properties": { "elements": [nested_select] },
        });

        let mut deps = Vec::new();
        scan_form(&form("f1", vec![section]), &mut deps).unwrap();
        let ids: Vec<_> = deps.iter().map(|d| d.field_id.as_str()).collect();
        assert_eq!(ids, vec!["deep", "nested"]);
    }

    #[test]
    fn test_structured_form_json_is_accepted() {
        let form = json!({
            "id": "f1",
            "json": {
                "elements": [{
                    "className": "org.joget.apps.form.lib.Radio",
                    "properties": {
                        "id": "gender",
                        "optionsBinder": {
                            "className": "org.joget.apps.form.lib.FormOptionsBinder",
                            "properties": { "formDefId": "md_gender" }
                        }
                    }
                }]
            }
        });
        let mut deps = Vec::new();
        scan_form(&form, &mut deps).unwrap();
        assert_eq!(deps[0].field_type, FieldType::Radio);
        assert_eq!(deps[0].options_source, OptionsSource::FormOptions);
        assert_eq!(deps[0].form_name, "unknown");
        assert_eq!(deps[0].field_label, "unknown");
    }

    #[test]
    fn test_bad_form_json_is_a_warning_and_scan_continues() {
        let doc = json!({
            "forms": [
                { "id": "broken", "json": "{not json" },
                "not-an-object",
                form("ok", vec![select_box("s", json!({ "cascadeOptions": { "url": "/x" } }))]),
            ]
        });

        let report = analyze_document(&doc);
        assert_eq!(report.total_forms, 3);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("broken"));
        assert_eq!(report.total_mdm_fields, 1);
        assert_eq!(report.statistics.ajax_cascade_count, 1);
        assert_eq!(report.statistics.unique_forms_with_mdm, 1);
    }
}
