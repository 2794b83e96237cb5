use crate::error::Error;
use crate::scanner::CandidateIndex;
use crate::storage::models::FileRecord;
use ahash::{AHashMap, AHashSet};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    NonUniqueBasename,
    NoMatchFound,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NonUniqueBasename => f.write_str("non-unique basename"),
            DropReason::NoMatchFound => f.write_str("no match found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub id: i64,
    pub old_path: String,
    pub new_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropped {
    pub id: i64,
    pub path: String,
    pub reason: DropReason,
}

/// Three disjoint partitions of a file record snapshot, each in snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub unchanged: Vec<i64>,
    pub renamed: Vec<Rename>,
    pub dropped: Vec<Dropped>,
}

impl Classification {
    pub fn total(&self) -> usize {
        self.unchanged.len() + self.renamed.len() + self.dropped.len()
    }

    /// Records whose path no longer exists.
    pub fn requiring_resolution(&self) -> usize {
        self.renamed.len() + self.dropped.len()
    }

    pub fn non_unique(&self) -> usize {
        self.dropped
            .iter()
            .filter(|d| d.reason == DropReason::NonUniqueBasename)
            .count()
    }

    pub fn has_changes(&self) -> bool {
        !self.renamed.is_empty() || !self.dropped.is_empty()
    }

    pub fn dropped_ids(&self) -> Vec<i64> {
        self.dropped.iter().map(|d| d.id).collect()
    }

    /// Every record id lands in exactly one partition.
    pub fn ensure_partition(&self, records: &[FileRecord]) -> Result<(), Error> {
        let mut seen: AHashSet<i64> = AHashSet::with_capacity(self.total());
        let ids = self
            .unchanged
            .iter()
            .copied()
            .chain(self.renamed.iter().map(|r| r.id))
            .chain(self.dropped.iter().map(|d| d.id));
        for id in ids {
            if !seen.insert(id) {
                return Err(Error::Partition(format!("record {} classified twice", id)));
            }
        }
        let expected: AHashSet<i64> = records.iter().map(|r| r.id).collect();
        if seen != expected {
            let missing = expected.difference(&seen).count();
            let extra = seen.difference(&expected).count();
            return Err(Error::Partition(format!(
                "{} records unclassified, {} unknown ids classified",
                missing, extra
            )));
        }
        Ok(())
    }
}

pub fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Classify records against the live filesystem.
pub fn classify(records: &[FileRecord], index: &CandidateIndex) -> Classification {
    classify_with(records, index, |path| Path::new(path).exists())
}

/// Partition records into unchanged, renamed and dropped.
///
/// 1. A record whose path exists is unchanged, whatever the index holds.
/// 2. Missing records sharing a basename with another missing record are dropped
///    as non-unique; none of them is matched.
/// 3. Remaining missing records are renamed to their index entry, or dropped when
///    the index has none (including basenames the index excluded as collided).
pub fn classify_with<F>(records: &[FileRecord], index: &CandidateIndex, exists: F) -> Classification
where
    F: Fn(&str) -> bool,
{
    let mut result = Classification::default();
    let mut missing: Vec<(&FileRecord, String)> = Vec::new();

    for record in records {
        if exists(&record.path) {
            result.unchanged.push(record.id);
        } else {
            missing.push((record, basename(&record.path)));
        }
    }

    let mut counts: AHashMap<&str, usize> = AHashMap::with_capacity(missing.len());
    for (_, name) in &missing {
        *counts.entry(name.as_str()).or_insert(0) += 1;
    }

    for (record, name) in &missing {
        if counts.get(name.as_str()).copied().unwrap_or(0) > 1 {
            result.dropped.push(Dropped {
                id: record.id,
                path: record.path.clone(),
                reason: DropReason::NonUniqueBasename,
            });
            continue;
        }
        match index.get(name) {
            Some(new_path) => result.renamed.push(Rename {
                id: record.id,
                old_path: record.path.clone(),
                new_path: new_path.to_string_lossy().into_owned(),
            }),
            None => result.dropped.push(Dropped {
                id: record.id,
                path: record.path.clone(),
                reason: DropReason::NoMatchFound,
            }),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use crate::scanner::build_candidate_index;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    fn record(id: i64, path: &str) -> FileRecord {
        FileRecord {
            id,
            path: path.to_string(),
        }
    }

    fn index_with(files: &[&str]) -> (tempfile::TempDir, CandidateIndex) {
        let tmp = tempdir().unwrap();
        for file in files {
            let path = tmp.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x").unwrap();
        }
        let index = build_candidate_index(&[tmp.path()], &SilentReporter);
        (tmp, index)
    }

    #[test]
    fn test_existing_path_is_unchanged_regardless_of_index() {
        let (_tmp, index) = index_with(&["a.dat"]);
        let records = vec![record(1, "/old/a.dat")];
        let result = classify_with(&records, &index, |_| true);
        assert_eq!(result.unchanged, vec![1]);
        assert!(!result.has_changes());
    }

    #[test]
    fn test_unique_missing_record_is_renamed() {
        let (_tmp, index) = index_with(&["cruise/a.dat"]);
        let records = vec![record(4, "/gone/a.dat")];
        let result = classify_with(&records, &index, |_| false);
        assert_eq!(result.renamed.len(), 1);
        assert_eq!(result.renamed[0].old_path, "/gone/a.dat");
        assert!(result.renamed[0].new_path.ends_with("cruise/a.dat"));
    }

    #[test]
    fn test_shared_missing_basename_drops_both() {
        let (_tmp, index) = index_with(&["a.dat"]);
        let records = vec![record(1, "/x/a.dat"), record(2, "/y/a.dat")];
        let result = classify_with(&records, &index, |_| false);
        assert!(result.renamed.is_empty());
        assert_eq!(result.dropped.len(), 2);
        assert!(result
            .dropped
            .iter()
            .all(|d| d.reason == DropReason::NonUniqueBasename));
    }

    #[test]
    fn test_filesystem_collision_reads_as_no_match() {
        let (_tmp, index) = index_with(&["one/b.dat", "two/b.dat"]);
        let records = vec![record(9, "/old/b.dat")];
        let result = classify_with(&records, &index, |_| false);
        assert_eq!(
            result.dropped,
            vec![Dropped {
                id: 9,
                path: "/old/b.dat".to_string(),
                reason: DropReason::NoMatchFound,
            }]
        );
    }

    #[test]
    fn test_existing_record_does_not_count_toward_basename_uniqueness() {
        let (_tmp, index) = index_with(&["new/a.dat"]);
        let records = vec![record(1, "/here/a.dat"), record(2, "/gone/a.dat")];
        let result = classify_with(&records, &index, |p| p == "/here/a.dat");
        assert_eq!(result.unchanged, vec![1]);
        assert_eq!(result.renamed.len(), 1);
        assert_eq!(result.renamed[0].id, 2);
    }

    #[test]
    fn test_ensure_partition_detects_duplicates() {
        let records = vec![record(1, "/a"), record(2, "/b")];
        let bad = Classification {
            unchanged: vec![1, 1],
            renamed: vec![],
            dropped: vec![],
        };
        assert!(matches!(
            bad.ensure_partition(&records),
            Err(Error::Partition(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_classification_partitions_ids(
            names in prop::collection::vec(0u8..6, 0..40),
            present in prop::collection::vec(any::<bool>(), 40),
        ) {
            let (_tmp, index) = index_with(&["f0.dat", "f1.dat", "dup/f2.dat", "f2.dat"]);
            let records: Vec<FileRecord> = names
                .iter()
                .enumerate()
                .map(|(i, n)| record(i as i64 + 1, &format!("/db/{}/f{}.dat", i, n)))
                .collect();
            let result = classify_with(&records, &index, |p| {
                let i: usize = p.split('/').nth(2).unwrap().parse().unwrap();
                present[i]
            });
            prop_assert!(result.ensure_partition(&records).is_ok());
            prop_assert_eq!(result.total(), records.len());

            let again = classify_with(&records, &index, |p| {
                let i: usize = p.split('/').nth(2).unwrap().parse().unwrap();
                present[i]
            });
            prop_assert_eq!(result, again);
        }
    }
}
