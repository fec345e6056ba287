//! Operator console rendering of a cycle report.
//!
//! Formatting only — every decision and outcome is fixed by the time a
//! `CycleReport` reaches this module.

use std::io::{self, Write};

use crate::pipeline::types::{Action, CycleReport, Outcome, ReportEntry};

/// Print one visual block per report entry, then the fetch failures.
pub fn print_report(report: &CycleReport, out: &mut impl Write) -> io::Result<()> {
    for entry in &report.entries {
        print_entry(entry, out)?;
    }
    for (id, error) in &report.fetch_failures {
        writeln!(out, "!! fetch failed for {id}: {error}")?;
    }
    Ok(())
}

fn print_entry(entry: &ReportEntry, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "────────────────────────────────────────")?;
    writeln!(out, "Message ID  {}", entry.message_id)?;
    writeln!(out, "Labels      {}", entry.labels.join(" | "))?;
    writeln!(out, "From        {}", entry.sender)?;
    match &entry.outcome {
        Outcome::Applied => {
            writeln!(out, "Action      {} {}", marker(entry.action), entry.action.label())?;
        }
        Outcome::Failed(reason) => {
            writeln!(out, "Action      ❌ {} ({reason})", entry.action.label())?;
        }
        Outcome::Recommended => {
            if let Some(subject) = &entry.subject {
                writeln!(out, "Subject     {subject}")?;
            }
            writeln!(out, "Action      {} {} (manual review)", marker(entry.action), entry.action.label())?;
            if let Some(preview) = &entry.preview {
                writeln!(out, "Preview     {preview}")?;
            }
        }
    }
    Ok(())
}

fn marker(action: Action) -> &'static str {
    match action {
        Action::Delete => "✅",
        Action::Archive => "📦",
        Action::NoOp => "💡",
    }
}
