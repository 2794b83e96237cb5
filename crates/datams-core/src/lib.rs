pub mod associations;
pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod progress;
pub mod requests;
pub mod resolve;
pub mod scanner;
pub mod storage;
pub mod update;
pub mod users;

pub use config::AppConfig;
pub use engine::{ApplyOutcome, ResolutionPlan, ResolutionStats, ResolveEngine};
pub use error::Error;
pub use layout::DirectoryLayout;
pub use progress::{ProgressReporter, SilentReporter};
