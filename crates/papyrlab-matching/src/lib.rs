//! # PapyrLab Matching
//!
//! Turns precomputed patch-correlation results into placement candidates for
//! a pair of fragments and lets the operator walk through them.
//!
//! - **Artifact**: loading and validating one pair's score grids and samples
//! - **Aggregation**: best score per translation id, ranked per side
//! - **Pairs**: directory discovery and the pair overview table
//! - **Navigation**: preview, flip, solo, apply and reset of candidates
//!
//! Rankings are computed once when a pair is added and never change.

pub mod aggregation;
pub mod artifact;
pub mod navigation;
pub mod pairs;
pub mod tier;

pub use aggregation::{aggregate, global_score, PairRankings, Ranking};
pub use artifact::{Displacement, PairAlignmentResult, SampleSet, ScoreSide, TranslationId};
pub use navigation::{
    AlignmentNavState, AlignmentSession, AnnotationPoint, Candidate, NavOutcome, NavPhase,
};
pub use pairs::{load_pair_results, sorted_pairs, PairSummary};
pub use tier::{ScoreTier, TierThresholds};
