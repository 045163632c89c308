//! Markdown case reports.

use std::fmt::Write;

use crate::agents::types::Case;

/// Renders a case as a Markdown document: a header with confidence and cost,
/// then one section per transcript entry in role order.
pub fn render_markdown(case: &Case) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "# ⚖️ Case #{}\n", case.id);
    if !case.query.is_empty() {
        let _ = writeln!(out, "**Query:** {}", case.query);
    }
    let _ = writeln!(out, "**Confidence:** {:.1}%", case.judge_confidence);
    let _ = writeln!(out, "**Cost:** ${:.5}\n", case.estimated_cost);

    for entry in &case.transcript {
        let _ = writeln!(out, "### {} ({})", entry.role, entry.model);
        let _ = writeln!(out, "{}\n", entry.content);
        let _ = writeln!(out, "---");
    }

    out
}

/// Suggested file name for a case report.
pub fn report_file_name(case: &Case) -> String {
    format!("Case_{}.md", case.id)
}
