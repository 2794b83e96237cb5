use super::classify::Classification;
use chrono::NaiveDateTime;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

const BANNER_WIDTH: usize = 100;

/// Render the human-readable change proposal: a dated header, then every drop with
/// its reason, then every rename.
pub fn render_proposal(classification: &Classification, timestamp: NaiveDateTime) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{}\n\nDATE: {}, TIME: {}\n\n{}\n\n",
        "/".repeat(BANNER_WIDTH),
        timestamp.format("%Y-%m-%d"),
        timestamp.format("%H:%M:%S"),
        "v".repeat(BANNER_WIDTH),
    );

    let _ = write!(out, "START DROPS\n{}\n\n", "=".repeat(11));
    for dropped in &classification.dropped {
        let _ = writeln!(out, "DROP {}    : [{}]", dropped.path, dropped.reason);
    }

    let _ = write!(
        out,
        "{}\n\nSTART RENAMES\n{}\n\n",
        "-".repeat(BANNER_WIDTH),
        "=".repeat(13)
    );
    for rename in &classification.renamed {
        let _ = writeln!(out, "RENAME {} > {}", rename.old_path, rename.new_path);
    }

    out
}

/// Write the proposal for review. Each run replaces the previous proposal.
pub fn write_proposal(path: &Path, content: &str) -> io::Result<()> {
    fs::write(path, content)?;
    debug!("Proposal written to {}", path.display());
    Ok(())
}

/// Append an applied proposal to the cumulative history log.
pub fn append_applied_changes(path: &Path, content: &str) -> io::Result<()> {
    let mut log = OpenOptions::new().create(true).append(true).open(path)?;
    log.write_all(content.as_bytes())?;
    debug!("Applied changes appended to {}", path.display());
    Ok(())
}
