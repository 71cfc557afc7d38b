// tests/mdm_scan_tests.rs
use joget_ops::mdm::{analyze_archive, write_report, AnalysisReport, FieldType, OptionsSource, ScanError};
use serde_json::json;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

fn write_export(path: &Path, document: &serde_json::Value) {
    let mut zip = ZipWriter::new(std::fs::File::create(path).unwrap());
    zip.start_file("appDefinition.xml", FileOptions::default()).unwrap();
    zip.write_all(b"<appDefinition/>").unwrap();
    zip.start_file("farmersRegistry.json", FileOptions::default()).unwrap();
    zip.write_all(document.to_string().as_bytes()).unwrap();
    zip.finish().unwrap();
}

fn registry_export() -> serde_json::Value {
    // One form stores its definition as a JSON string, the other inline.
    let household = json!({
        "className": "org.joget.apps.form.model.Form",
        "elements": [{
            "className": "org.joget.apps.form.model.Section",
            "elements": [{
                "className": "org.joget.apps.form.model.Column",
                "elements": [
                    {
                        "className": "org.joget.apps.form.lib.SelectBox",
                        "properties": {
                            "id": "district",
                            "label": "District",
                            "optionsBinder": {
                                "className": "org.joget.plugin.enterprise.JdbcOptionsBinder",
                                "properties": {"sql": "SELECT code, name FROM md_district"}
                            }
                        }
                    },
                    {
                        "className": "org.joget.apps.form.lib.SelectBox",
                        "properties": {
                            "id": "village",
                            "label": "Village",
                            "controlField": "district",
                            "optionsBinder": {
                                "className": "org.joget.apps.form.lib.FormOptionsBinder",
                                "properties": {"formDefId": "md_village"}
                            }
                        }
                    },
                    {
                        "className": "org.joget.apps.form.lib.TextField",
                        "properties": {"id": "head_name", "label": "Head of household"}
                    }
                ]
            }]
        }]
    });

    json!({
        "appId": "farmersRegistry",
        "appName": "Farmers Registry",
        "forms": [
            {"id": "household", "name": "Household", "json": household.to_string()},
            {
                "id": "crops",
                "name": "Crops",
                "json": {
                    "elements": [{
                        "className": "org.joget.apps.form.lib.Radio",
                        "properties": {
                            "id": "season",
                            "label": "Season",
                            "options": [{"value": "A", "label": "A"}, {"value": "B", "label": "B"}]
                        }
                    }, {
                        "className": "org.joget.apps.form.lib.CheckBox",
                        "properties": {
                            "id": "crops",
                            "label": "Crops",
                            "optionsBinder": {
                                "className": "org.example.RestOptionsBinder",
                                "properties": {"url": "https://md.example/crops"}
                            }
                        }
                    }]
                }
            },
            {"id": "broken", "name": "Broken", "json": "{not json"}
        ]
    })
}

#[test]
fn test_export_is_scanned_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("farmers.zip");
    write_export(&archive, &registry_export());

    let report = analyze_archive(&archive).unwrap();

    assert_eq!(report.application_id, "farmersRegistry");
    assert_eq!(report.application_name, "Farmers Registry");
    assert_eq!(report.total_forms, 3);
    assert_eq!(report.total_mdm_fields, report.dependencies.len());
    assert_eq!(report.total_mdm_fields, 3);
    assert_eq!(report.warnings.len(), 1);

    let ids: Vec<&str> = report.dependencies.iter().map(|d| d.field_id.as_str()).collect();
    assert_eq!(ids, ["district", "village", "crops"]);

    let village = &report.dependencies[1];
    assert_eq!(village.form_id, "household");
    assert_eq!(village.field_type, FieldType::SelectBox);
    assert_eq!(village.options_source, OptionsSource::FormOptions);
    assert!(village.has_ajax_cascade);
    assert_eq!(village.cascade_config.as_ref().unwrap()["controlField"], "district");

    let crops = &report.dependencies[2];
    assert_eq!(crops.field_type, FieldType::CheckBox);
    assert_eq!(crops.options_source, OptionsSource::RestOptions);

    assert_eq!(report.statistics.unique_forms_with_mdm, 2);
    assert_eq!(report.statistics.ajax_cascade_count, 1);
    assert_eq!(report.statistics.by_field_type["selectBox"], 2);
    assert_eq!(report.statistics.by_options_source["restOptions"], 1);
}

#[test]
fn test_report_file_is_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("farmers.zip");
    write_export(&archive, &registry_export());
    let report = analyze_archive(&archive).unwrap();

    let output = dir.path().join("reports").join("mdm.json");
    write_report(&report, &output).unwrap();

    let written: serde_json::Value = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(written["application_id"], "farmersRegistry");
    assert_eq!(written["dependencies"][0]["field_type"], "selectBox");
    assert_eq!(written["dependencies"][0]["options_source"], "jdbcOptions");
    assert_eq!(
        written["dependencies"][0]["options_config"]["sql"],
        "SELECT code, name FROM md_district"
    );

    let parsed: AnalysisReport = serde_json::from_value(written).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn test_export_without_forms_warns() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("empty.zip");
    write_export(&archive, &json!({"appId": "empty", "appName": "Empty"}));

    let report = analyze_archive(&archive).unwrap();
    assert_eq!(report.total_forms, 0);
    assert!(report.dependencies.is_empty());
    assert_eq!(report.warnings, ["Could not find forms in application structure"]);
}

#[test]
fn test_missing_export_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = analyze_archive(&dir.path().join("absent.zip")).unwrap_err();
    assert!(matches!(err, ScanError::NotFound(_)));
}
