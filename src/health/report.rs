// src/health/report.rs
use super::checker::HealthReport;
use super::status::{reduce, HealthStatus};
use serde_json::{Map, Value};
use std::fmt::Write;

const RULE_WIDTH: usize = 70;

/// Human-readable block for one instance.
pub fn render_text(report: &HealthReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "HEALTH CHECK RESULTS: {}", report.instance);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "\nOverall Status: {}\n", report.overall_status.label());

    for check in &report.checks {
        let _ = writeln!(out, "{} {}", check.status.label(), check.check_name);
        let _ = writeln!(out, "    {}", check.message);
        for (key, value) in &check.details {
            let _ = writeln!(out, "      {}: {}", key, display_value(value));
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", rule);
    out
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `{instance: {overall_status, checks}}` for `--json`.
pub fn to_json(reports: &[HealthReport]) -> Value {
    let mut root = Map::new();
    for report in reports {
        let body = serde_json::to_value(report).unwrap_or(Value::Null);
        root.insert(report.instance.clone(), body);
    }
    Value::Object(root)
}

/// Worst status across a batch; drives the exit code.
pub fn batch_status(reports: &[HealthReport]) -> HealthStatus {
    reduce(reports.iter().map(|r| r.overall_status))
}
