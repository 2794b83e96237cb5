use crate::error::Error;
use crate::layout::DirectoryLayout;
use crate::progress::ProgressReporter;
use crate::resolve::{self, Classification};
use crate::scanner;
use crate::storage::queries;
use crate::storage::QueryExecutor;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct ResolveEngine {
    layout: DirectoryLayout,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub files_scanned: usize,
    pub candidates: usize,
    pub total_records: usize,
    pub unchanged: usize,
    pub requiring_resolution: usize,
    pub non_unique: usize,
    pub resolvable: usize,
    pub to_drop: usize,
}

/// Read-only outcome of a resolution run, persisted for review before anything changes.
#[derive(Debug)]
pub struct ResolutionPlan {
    pub stats: ResolutionStats,
    pub classification: Classification,
    pub proposal: String,
    pub proposal_path: PathBuf,
    pub scan_duration: Duration,
    pub classify_duration: Duration,
}

#[derive(Debug)]
pub struct ApplyOutcome {
    pub rows_changed: usize,
    pub markers_written: usize,
    pub applied_log: PathBuf,
    pub duration: Duration,
}

impl ResolveEngine {
    pub fn new(layout: DirectoryLayout) -> Self {
        Self { layout }
    }

    /// Build the proposal:
    /// 1. Scan processed-uploads and discovery trees into a candidate index
    /// 2. Snapshot the file table and classify every record
    /// 3. Write the proposal document to the info directory
    pub fn plan<Q: QueryExecutor + ?Sized>(
        &self,
        db: &Q,
        reporter: &dyn ProgressReporter,
    ) -> Result<ResolutionPlan, Error> {
        info!("Building candidate pool...");
        let scan_start = Instant::now();
        let roots = [self.layout.processed.as_path(), self.layout.discovery.as_path()];
        let index = scanner::build_candidate_index(&roots, reporter);
        let scan_duration = scan_start.elapsed();
        reporter.on_scan_complete(index.total_files(), index.useful(), scan_duration.as_secs_f64());

        info!("Classifying file records...");
        let classify_start = Instant::now();
        let records = queries::file_records(db)?;
        let classification = resolve::classify(&records, &index);
        classification.ensure_partition(&records)?;
        let classify_duration = classify_start.elapsed();
        reporter.on_classify_complete(records.len(), classify_duration.as_secs_f64());

        let stats = ResolutionStats {
            files_scanned: index.total_files(),
            candidates: index.useful(),
            total_records: records.len(),
            unchanged: classification.unchanged.len(),
            requiring_resolution: classification.requiring_resolution(),
            non_unique: classification.non_unique(),
            resolvable: classification.renamed.len(),
            to_drop: classification.dropped.len(),
        };
        debug!("Resolution stats: {:?}", stats);

        let proposal = resolve::render_proposal(&classification, chrono::Local::now().naive_local());
        let proposal_path = self.layout.proposed_changes_path();
        resolve::write_proposal(&proposal_path, &proposal)?;

        Ok(ResolutionPlan {
            stats,
            classification,
            proposal,
            proposal_path,
            scan_duration,
            classify_duration,
        })
    }

    /// Commit a reviewed plan, mark resolved discovery files, and log the change set.
    pub fn apply<Q: QueryExecutor + ?Sized>(
        &self,
        db: &Q,
        plan: &ResolutionPlan,
        reporter: &dyn ProgressReporter,
    ) -> Result<ApplyOutcome, Error> {
        let start = Instant::now();
        let statements = plan.classification.dropped.len().min(1) + plan.classification.renamed.len();
        reporter.on_apply_start(statements);
        let rows_changed = resolve::apply_classification(db, &plan.classification)?;
        reporter.on_apply_complete(rows_changed, start.elapsed().as_secs_f64());

        let markers_written = resolve::touch_markers(
            &plan.classification.renamed,
            &self.layout.discovery,
            reporter,
        );
        debug!("{} marker files written", markers_written);

        let applied_log = self.layout.applied_changes_path();
        resolve::append_applied_changes(&applied_log, &plan.proposal)?;

        Ok(ApplyOutcome {
            rows_changed,
            markers_written,
            applied_log,
            duration: start.elapsed(),
        })
    }
}
