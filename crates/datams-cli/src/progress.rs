use colored::*;
use datams_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Progress bars for a resolution run.
///
/// - Scan: spinner per root (total unknown upfront)
/// - Apply: spinner while the transaction runs
/// - Markers: bar over renamed discovery files
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn spinner(&self, message: String) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars(TICKS),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn done(message: String) {
        eprintln!("  {} {}", "✓".green(), message);
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, root: &str) {
        self.spinner(format!("Scanning {}...", root));
    }

    fn on_scan_progress(&self, files_found: usize) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!("Scanning... {} files found", files_found));
        }
    }

    fn on_scan_complete(&self, total_files: usize, useful: usize, duration_secs: f64) {
        self.finish_bar();
        Self::done(format!(
            "Scan complete: {} files, {} unique candidates in {:.2}s",
            total_files, useful, duration_secs
        ));
    }

    fn on_classify_complete(&self, records: usize, duration_secs: f64) {
        Self::done(format!(
            "Classified {} file records in {:.2}s",
            records, duration_secs
        ));
    }

    fn on_apply_start(&self, statements: usize) {
        self.spinner(format!("Applying {} statements...", statements));
    }

    fn on_apply_complete(&self, rows: usize, duration_secs: f64) {
        self.finish_bar();
        Self::done(format!("Committed {} rows in {:.2}s", rows, duration_secs));
    }

    fn on_marker_progress(&self, written: usize, total: usize) {
        let mut guard = self.bar.lock().unwrap();
        if guard.is_none() {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::with_template("  Marking [{bar:30.cyan/dim}] {pos}/{len} files")
                    .unwrap()
                    .progress_chars("━╸─"),
            );
            *guard = Some(pb);
        }
        if let Some(pb) = guard.as_ref() {
            pb.set_position(written as u64);
            if written >= total {
                pb.finish_and_clear();
            }
        }
        if written >= total {
            guard.take();
        }
    }
}
