pub mod candidates;

pub use candidates::{build_candidate_index, CandidateIndex};
