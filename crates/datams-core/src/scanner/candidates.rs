use crate::progress::ProgressReporter;
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

const PROGRESS_INTERVAL: usize = 1000;

/// Unique basename → canonical path, built fresh for each resolution run.
///
/// A basename seen more than once anywhere across the scanned trees is never a key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateIndex {
    entries: BTreeMap<String, PathBuf>,
    total_files: usize,
}

impl CandidateIndex {
    pub fn get(&self, basename: &str) -> Option<&Path> {
        self.entries.get(basename).map(PathBuf::as_path)
    }

    pub fn contains(&self, basename: &str) -> bool {
        self.entries.contains_key(basename)
    }

    /// Every regular file seen across all scanned trees.
    pub fn total_files(&self) -> usize {
        self.total_files
    }

    /// Entries usable for resolution.
    pub fn useful(&self) -> usize {
        self.entries.len()
    }

    /// Files whose basename collided and were excluded.
    pub fn ignored(&self) -> usize {
        self.total_files - self.entries.len()
    }
}

enum Sighting {
    Unique(PathBuf),
    Collided,
}

/// Walk every root and index files by basename.
///
/// The first sighting of a basename records its path; any later sighting, in the same
/// tree or another, marks it collided. Both happen under the map's shard lock, so two
/// threads racing on the same basename always leave it collided.
pub fn build_candidate_index(roots: &[&Path], reporter: &dyn ProgressReporter) -> CandidateIndex {
    let sightings: DashMap<String, Sighting> = DashMap::new();
    let total = AtomicUsize::new(0);

    // Roots are walked one after another; each walk is parallel.
    for root in roots {
        reporter.on_scan_start(&root.to_string_lossy());
        visit_tree(root, &sightings, &total, reporter);
    }

    let entries: BTreeMap<String, PathBuf> = sightings
        .into_iter()
        .filter_map(|(name, sighting)| match sighting {
            Sighting::Unique(path) => Some((name, path)),
            Sighting::Collided => None,
        })
        .collect();

    let index = CandidateIndex {
        entries,
        total_files: total.into_inner(),
    };
    debug!(
        "Candidate index: {} files seen, {} unique basenames",
        index.total_files(),
        index.useful()
    );
    index
}

fn visit_tree(
    root: &Path,
    sightings: &DashMap<String, Sighting>,
    total: &AtomicUsize,
    reporter: &dyn ProgressReporter,
) {
    WalkDir::new(root)
        .into_iter()
        .par_bridge()
        .for_each(|entry_result| {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    let denied = err
                        .io_error()
                        .map_or(false, |e| e.kind() == io::ErrorKind::PermissionDenied);
                    if denied {
                        error!("Access denied while scanning {}: {}", root.display(), err);
                    } else {
                        warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                    }
                    return;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                return;
            }

            let canonical = match fs::canonicalize(path) {
                Ok(p) => p,
                Err(err) => {
                    warn!("Error canonicalizing {}: {}", path.display(), err);
                    return;
                }
            };
            let Some(basename) = canonical.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                return;
            };

            sightings
                .entry(basename)
                .and_modify(|sighting| *sighting = Sighting::Collided)
                .or_insert(Sighting::Unique(canonical));

            let seen = total.fetch_add(1, Ordering::Relaxed) + 1;
            if seen % PROGRESS_INTERVAL == 0 {
                reporter.on_scan_progress(seen);
            }
        });
}
