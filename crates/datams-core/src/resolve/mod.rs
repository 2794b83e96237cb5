pub mod apply;
pub mod classify;
pub mod proposal;

pub use apply::{apply_classification, resolution_statements, touch_markers};
pub use classify::{classify, classify_with, Classification, DropReason, Dropped, Rename};
pub use proposal::{append_applied_changes, render_proposal, write_proposal};
