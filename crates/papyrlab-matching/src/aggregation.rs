//! Candidate aggregation and ranking.
//!
//! Many score-grid cells share a translation id: they are redundant samples
//! of the same discrete displacement. Aggregation keeps the best (maximum)
//! score of each id and ranks the ids by it, best first. Equal scores are
//! ordered by ascending id so repeated runs agree.

use crate::artifact::{PairAlignmentResult, ScoreSide, TranslationId};
use ndarray::Array2;
use papyrlab_core::{InputError, Result};
use std::collections::BTreeMap;

/// Translation ids ranked by their best score.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ranking {
    ids: Vec<TranslationId>,
    scores: Vec<f64>,
}

impl Ranking {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids, best first.
    pub fn ids(&self) -> &[TranslationId] {
        &self.ids
    }

    /// Scores parallel to [`Ranking::ids`].
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// `(id, score)` at a rank.
    pub fn get(&self, rank: usize) -> Option<(TranslationId, f64)> {
        Some((*self.ids.get(rank)?, self.scores[rank]))
    }

    /// Highest valid rank, `None` when empty.
    pub fn max_rank(&self) -> Option<usize> {
        self.ids.len().checked_sub(1)
    }

    /// Rank of a translation id.
    pub fn rank_of(&self, id: TranslationId) -> Option<usize> {
        self.ids.iter().position(|&t| t == id)
    }
}

/// Reduces a score grid to one ranked entry per translation id.
///
/// Cells holding NaN are ignored.
pub fn aggregate(scores: &Array2<f64>, ids: &Array2<TranslationId>) -> Result<Ranking> {
    if scores.dim() != ids.dim() {
        return Err(InputError::ShapeMismatch {
            field: "score_grid".to_string(),
            expected: ids.dim(),
            actual: scores.dim(),
        }
        .into());
    }

    let mut best: BTreeMap<TranslationId, f64> = BTreeMap::new();
    for (&score, &id) in scores.iter().zip(ids.iter()) {
        if score.is_nan() {
            continue;
        }
        best.entry(id)
            .and_modify(|s| *s = s.max(score))
            .or_insert(score);
    }

    // BTreeMap yields ascending ids and the sort is stable
    let mut entries: Vec<(TranslationId, f64)> = best.into_iter().collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(Ranking {
        ids: entries.iter().map(|&(id, _)| id).collect(),
        scores: entries.iter().map(|&(_, s)| s).collect(),
    })
}

/// Largest non-NaN value of a grid.
pub fn global_score(scores: &Array2<f64>) -> Option<f64> {
    scores
        .iter()
        .copied()
        .filter(|s| !s.is_nan())
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |m| m.max(s))))
}

/// Rankings of one pair for every side, computed once at load time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PairRankings {
    pub combined: Ranking,
    pub recto: Ranking,
    pub verso: Ranking,
}

impl PairRankings {
    /// Aggregates every side the artifact carries; missing sides rank nothing.
    ///
    /// All sides use the recto-derived translation id grid.
    pub fn compute(result: &PairAlignmentResult) -> Result<Self> {
        let ids = result.translation_id_grid();
        let side = |side: ScoreSide| -> Result<Ranking> {
            match result.score_grid(side) {
                Some(grid) => aggregate(grid, ids),
                None => Ok(Ranking::default()),
            }
        };
        Ok(Self {
            combined: side(ScoreSide::Combined)?,
            recto: side(ScoreSide::Recto)?,
            verso: side(ScoreSide::Verso)?,
        })
    }

    pub fn for_side(&self, side: ScoreSide) -> &Ranking {
        match side {
            ScoreSide::Combined => &self.combined,
            ScoreSide::Recto => &self.recto,
            ScoreSide::Verso => &self.verso,
        }
    }
}
