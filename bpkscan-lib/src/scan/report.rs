// Presenter-facing views of scan results.
use crate::scan::coordinator::ScanResult;
use crate::scan::resolver::PropertyOverride;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub element: String,
    pub element_id: u64,
    pub overrides: Vec<PropertyOverride>,
}

pub fn summarize(results: &[ScanResult]) -> Vec<ReportEntry> {
    results
        .iter()
        .map(|result| ReportEntry {
            element: result.descriptor.clone(),
            element_id: result.element_id.0,
            overrides: result.overrides.clone(),
        })
        .collect()
}

/// Plain-text report, one block per element and one line per override.
pub fn render_text(entries: &[ReportEntry]) -> String {
    if entries.is_empty() {
        return "No framework overrides found.\n".to_string();
    }
    let total: usize = entries.iter().map(|entry| entry.overrides.len()).sum();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} element(s) with {} overridden propert{}:",
        entries.len(),
        total,
        if total == 1 { "y" } else { "ies" }
    );
    for entry in entries {
        let _ = writeln!(out, "\n{} (#{})", entry.element, entry.element_id);
        for o in &entry.overrides {
            let _ = writeln!(
                out,
                "  {}: {} -> {}  ({} overridden by {})",
                o.property, o.intended, o.overriding, o.author_rule, o.overriding_rule
            );
        }
    }
    out
}
