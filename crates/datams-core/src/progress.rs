/// Trait for reporting resolution progress.
///
/// The CLI implements it with indicatif. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _root: &str) {}
    fn on_scan_progress(&self, _files_found: usize) {}
    fn on_scan_complete(&self, _total_files: usize, _useful: usize, _duration_secs: f64) {}
    fn on_classify_complete(&self, _records: usize, _duration_secs: f64) {}
    fn on_apply_start(&self, _statements: usize) {}
    fn on_apply_complete(&self, _rows: usize, _duration_secs: f64) {}
    fn on_marker_progress(&self, _written: usize, _total: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
