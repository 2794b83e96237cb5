use super::classify::{Classification, Rename};
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::storage::statement::{id_set, id_set_value};
use crate::storage::{QueryExecutor, Statement};
use rusqlite::types::Value;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MARKER_SUFFIX: &str = ".touch";

/// One delete covering every dropped id, then one path update per rename.
pub fn resolution_statements(classification: &Classification) -> Vec<Statement> {
    let mut batch = Vec::with_capacity(classification.renamed.len() + 1);

    let dropped = classification.dropped_ids();
    if !dropped.is_empty() {
        batch.push(Statement::new(
            format!("DELETE FROM file WHERE id IN {}", id_set(1)),
            vec![id_set_value(&dropped)],
        ));
    }

    for rename in &classification.renamed {
        batch.push(Statement::new(
            "UPDATE file SET path = ?1 WHERE id = ?2",
            vec![Value::Text(rename.new_path.clone()), Value::Integer(rename.id)],
        ));
    }

    batch
}

/// Commit drops and renames as a single transaction.
pub fn apply_classification<Q: QueryExecutor + ?Sized>(
    db: &Q,
    classification: &Classification,
) -> Result<usize, Error> {
    let batch = resolution_statements(classification);
    let changed = db.execute_all(&batch)?;
    info!(
        "Applied {} drops and {} renames ({} rows)",
        classification.dropped.len(),
        classification.renamed.len(),
        changed
    );
    Ok(changed)
}

pub fn marker_path(path: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", path, MARKER_SUFFIX))
}

/// Leave an empty marker beside every renamed file that now lives under the discovery
/// root. Best effort: failures are logged and skipped. Returns the number written.
pub fn touch_markers(
    renamed: &[Rename],
    discovery_root: &Path,
    reporter: &dyn ProgressReporter,
) -> usize {
    let targets: Vec<&Rename> = renamed
        .iter()
        .filter(|r| Path::new(&r.new_path).starts_with(discovery_root))
        .collect();

    let mut written = 0;
    for (i, rename) in targets.iter().enumerate() {
        let marker = marker_path(&rename.new_path);
        match OpenOptions::new().create(true).append(true).open(&marker) {
            Ok(_) => written += 1,
            Err(err) => debug!("Could not create marker {}: {}", marker.display(), err),
        }
        reporter.on_marker_progress(i + 1, targets.len());
    }
    written
}
