//! CLI output formatting for a sync pass.
//!
//! Output is information-first: each section leads with its positional index
//! and title, with what happened to it shown as indented context lines.
//!
//! ```text
//! Sections
//! 001 Movies (3 items)
//!     Dropped: No Poster (no artwork)
//! 002 Shows (1 item)
//! Skipped section 5: Network error: connection reset
//!
//! Artwork
//!     2 written
//!     103: Download failed: Upstream returned 404 for http://plex.local/t/103
//!
//! Snapshot → data/library.json
//! ```
//!
//! [`format_sync_report`] returns `Vec<String>` for testability and is pure;
//! [`print_sync_report`] writes it to stdout.

use crate::fetch::DropReason;
use crate::sync::SyncReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// `001 Movies (3 items)`
fn section_header(index: usize, title: &str, count: usize) -> String {
    format!("{} {} ({})", format_index(index), title, plural(count, "item"))
}

fn drop_reason(reason: DropReason) -> &'static str {
    match reason {
        DropReason::MissingArtwork => "no artwork",
        DropReason::UnsafeId => "unusable id",
    }
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    let mut lines = vec!["Sections".to_string()];

    for (i, section) in report.fetch.sections.iter().enumerate() {
        lines.push(section_header(
            i + 1,
            &section.section_title,
            section.items.len(),
        ));
        for dropped in report
            .fetch
            .dropped
            .iter()
            .filter(|d| d.section_id == section.section_id)
        {
            lines.push(format!(
                "{}Dropped: {} ({})",
                indent(1),
                dropped.title,
                drop_reason(dropped.reason)
            ));
        }
    }
    for skipped in &report.fetch.skipped {
        lines.push(format!(
            "Skipped section {}: {}",
            skipped.section_id, skipped.error
        ));
    }

    lines.push(String::new());
    lines.push("Artwork".to_string());
    lines.push(format!(
        "{}{} written",
        indent(1),
        report.materialize.completed.len()
    ));
    for failed in &report.materialize.failed {
        lines.push(format!("{}{}: {}", indent(1), failed.id, failed.error));
    }

    lines.push(String::new());
    lines.push(format!(
        "Snapshot \u{2192} {}",
        report.snapshot_path.display()
    ));
    lines
}

pub fn print_sync_report(report: &SyncReport) {
    for line in format_sync_report(report) {
        println!("{}", line);
    }
}
