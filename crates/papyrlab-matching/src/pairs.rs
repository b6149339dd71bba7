//! Discovery of pair artifacts and the pair overview table.

use crate::aggregation::global_score;
use crate::artifact::{PairAlignmentResult, ScoreSide};
use papyrlab_core::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One row of the pair overview.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSummary {
    /// `"A ↔ B"`
    pub label: String,
    /// Best combined score.
    pub global_score: Option<f64>,
    pub recto_max: Option<f64>,
    pub verso_max: Option<f64>,
}

impl PairSummary {
    pub fn from_result(result: &PairAlignmentResult) -> Self {
        let side_max = |side| result.score_grid(side).and_then(global_score);
        Self {
            label: result.label(),
            global_score: side_max(ScoreSide::Combined),
            recto_max: side_max(ScoreSide::Recto),
            verso_max: side_max(ScoreSide::Verso),
        }
    }

    /// Headline score for ordering by `side`.
    pub fn score(&self, side: ScoreSide) -> Option<f64> {
        match side {
            ScoreSide::Combined => self.global_score,
            ScoreSide::Recto => self.recto_max,
            ScoreSide::Verso => self.verso_max,
        }
    }
}

/// Loads every `*.json` artifact of a directory in file-name order.
///
/// Files that cannot be read or validated, and pairs whose combined grid is
/// empty, are skipped with a warning.
pub fn load_pair_results(dir: impl AsRef<Path>) -> Result<Vec<PairAlignmentResult>> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    debug!("Found {} artifact files in {}", paths.len(), dir.display());

    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        match PairAlignmentResult::load_from_file(&path) {
            Ok(result) if result.is_empty() => {
                warn!("Skipping {} (empty score grid)", path.display());
            }
            Ok(result) => results.push(result),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    info!("Loaded {} pair results from {}", results.len(), dir.display());
    Ok(results)
}

/// Indices of `summaries` ordered by the side's score, best first.
///
/// Pairs without a score for that side go last; ties keep input order.
pub fn sorted_pairs(summaries: &[PairSummary], side: ScoreSide) -> Vec<usize> {
    let mut order: Vec<usize> = (0..summaries.len()).collect();
    order.sort_by(|&a, &b| match (summaries[a].score(side), summaries[b].score(side)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    order
}
