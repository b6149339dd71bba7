//! Alignment navigation.
//!
//! The session walks through the ranked candidates of each loaded pair and
//! previews them by moving one fragment next to the other. Positions are
//! tracked against per-fragment baselines:
//!
//! - the first preview touching a fragment snapshots its box
//! - every preview starts from the baselines, so previews never accumulate
//! - `apply` turns the current positions of the pair into new baselines
//! - `reset_all` puts every snapshotted fragment back on its baseline
//!
//! Navigation on a pair whose fragments were deleted is logged and ignored.

use crate::aggregation::PairRankings;
use crate::artifact::{Displacement, PairAlignmentResult, ScoreSide, TranslationId};
use crate::pairs::{self, PairSummary};
use crate::tier::{ScoreTier, TierThresholds};
use papyrlab_core::{BoundingBox, FragmentId, Result};
use papyrlab_layout::FragmentRegistry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Where the session is in the preview/commit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavPhase {
    /// No pair selected.
    #[default]
    Idle,
    /// A candidate is shown; baselines still hold the committed positions.
    Previewing,
    /// The last preview was committed.
    Applied,
}

/// Navigation state of one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlignmentNavState {
    pub current_rank: usize,
    pub solo: bool,
    pub flip: bool,
    pub side: ScoreSide,
    /// Set by a preview, cleared by apply.
    pub apply_enabled: bool,
}

/// A ranked candidate placement, resolved against the registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub rank: usize,
    pub total: usize,
    pub translation_id: TranslationId,
    pub score: f64,
    /// Displacement of `moved` from `anchor`, already negated when flipped.
    pub displacement: Displacement,
    pub anchor: FragmentId,
    pub moved: FragmentId,
    /// Target top-left `(x, y)` of the moved fragment.
    pub position: (i32, i32),
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavOutcome {
    /// The candidate is now previewed.
    Moved(Candidate),
    /// Already at the first or last rank; nothing changed.
    BoundaryReached,
    /// The pair has no candidates on the active side.
    NoCandidates,
    /// The pair or one of its fragments does not exist; nothing changed.
    Aborted,
}

/// A correlation sample shown on the canvas for the previewed candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationPoint {
    pub x: f64,
    pub y: f64,
    pub score: f64,
    pub tier: ScoreTier,
}

#[derive(Debug, Clone)]
struct PairEntry {
    result: PairAlignmentResult,
    rankings: PairRankings,
    fragment_a: FragmentId,
    fragment_b: FragmentId,
    state: AlignmentNavState,
}

enum Resolution {
    Ready(Candidate),
    Empty,
    Aborted,
}

/// Alignment state across all loaded pairs.
#[derive(Debug, Clone, Default)]
pub struct AlignmentSession {
    pairs: Vec<PairEntry>,
    active: Option<usize>,
    phase: NavPhase,
    baselines: BTreeMap<FragmentId, BoundingBox>,
    annotations: Vec<AnnotationPoint>,
    hidden: BTreeSet<FragmentId>,
    thresholds: TierThresholds,
}

/// Finds the fragment an artifact refers to; a `_recto` suffix on either
/// side of the comparison is ignored.
fn resolve_name(registry: &FragmentRegistry, name: &str) -> Option<FragmentId> {
    if let Some(f) = registry.find_by_name(name) {
        return Some(f.id);
    }
    let bare = name.strip_suffix("_recto").unwrap_or(name);
    registry
        .fragments()
        .find(|f| f.name.strip_suffix("_recto").unwrap_or(&f.name) == bare)
        .map(|f| f.id)
}

impl AlignmentSession {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self {
            thresholds,
            ..Default::default()
        }
    }

    pub fn thresholds(&self) -> TierThresholds {
        self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: TierThresholds) {
        self.thresholds = thresholds;
    }

    /// Registers a pair and ranks its candidates.
    ///
    /// Returns the pair index, or `None` when a fragment name does not match
    /// any fragment of the registry.
    pub fn add_pair(
        &mut self,
        result: PairAlignmentResult,
        registry: &FragmentRegistry,
    ) -> Result<Option<usize>> {
        let rankings = PairRankings::compute(&result)?;
        let (Some(fragment_a), Some(fragment_b)) = (
            resolve_name(registry, &result.fragment_a),
            resolve_name(registry, &result.fragment_b),
        ) else {
            warn!("Skipping pair {}: fragment not in project", result.label());
            return Ok(None);
        };

        debug!(
            "Pair {} ranked {} candidates",
            result.label(),
            rankings.combined.len()
        );
        self.pairs.push(PairEntry {
            result,
            rankings,
            fragment_a,
            fragment_b,
            state: AlignmentNavState::default(),
        });
        Ok(Some(self.pairs.len() - 1))
    }

    /// Loads every artifact of a directory; returns how many pairs were added.
    pub fn load_directory(
        &mut self,
        dir: impl AsRef<Path>,
        registry: &FragmentRegistry,
    ) -> Result<usize> {
        let mut added = 0;
        for result in pairs::load_pair_results(dir)? {
            let label = result.label();
            match self.add_pair(result, registry) {
                Ok(Some(_)) => added += 1,
                Ok(None) => {}
                Err(e) => warn!("Skipping pair {}: {}", label, e),
            }
        }
        info!("{} pairs available for alignment", added);
        Ok(added)
    }

    /// Forgets all pairs and transient state. Fragment positions are kept.
    pub fn clear(&mut self) {
        *self = Self::new(self.thresholds);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn result(&self, pair: usize) -> Option<&PairAlignmentResult> {
        self.pairs.get(pair).map(|e| &e.result)
    }

    pub fn rankings(&self, pair: usize) -> Option<&PairRankings> {
        self.pairs.get(pair).map(|e| &e.rankings)
    }

    pub fn state(&self, pair: usize) -> Option<&AlignmentNavState> {
        self.pairs.get(pair).map(|e| &e.state)
    }

    /// `(fragment_a, fragment_b)` of a pair.
    pub fn fragments(&self, pair: usize) -> Option<(FragmentId, FragmentId)> {
        self.pairs.get(pair).map(|e| (e.fragment_a, e.fragment_b))
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn phase(&self) -> NavPhase {
        self.phase
    }

    /// Samples of the previewed candidate in canvas coordinates.
    pub fn annotations(&self) -> &[AnnotationPoint] {
        &self.annotations
    }

    /// Fragments hidden by solo mode.
    pub fn hidden(&self) -> &BTreeSet<FragmentId> {
        &self.hidden
    }

    pub fn is_hidden(&self, id: FragmentId) -> bool {
        self.hidden.contains(&id)
    }

    /// Box the fragment returns to on reset, if it was touched by a preview.
    pub fn baseline(&self, id: FragmentId) -> Option<BoundingBox> {
        self.baselines.get(&id).copied()
    }

    pub fn summaries(&self) -> Vec<PairSummary> {
        self.pairs
            .iter()
            .map(|e| PairSummary::from_result(&e.result))
            .collect()
    }

    /// Pair indices ordered by the side's best score.
    pub fn sorted_pairs(&self, side: ScoreSide) -> Vec<usize> {
        pairs::sorted_pairs(&self.summaries(), side)
    }

    /// Drops every reference to a deleted fragment.
    pub fn forget_fragment(&mut self, id: FragmentId) {
        self.baselines.remove(&id);
        self.hidden.remove(&id);
    }

    /// Selects a pair and previews its best candidate.
    pub fn select_pair(&mut self, pair: usize, registry: &mut FragmentRegistry) -> NavOutcome {
        self.preview(pair, 0, registry)
    }

    /// Moves `direction` ranks forward (+) or back (-); 0 re-previews.
    pub fn step(&mut self, pair: usize, direction: i32, registry: &mut FragmentRegistry) -> NavOutcome {
        let Some(entry) = self.pairs.get(pair) else {
            warn!("Navigation on unknown pair {}", pair);
            return NavOutcome::Aborted;
        };
        let Some(max_rank) = entry.rankings.for_side(entry.state.side).max_rank() else {
            return NavOutcome::NoCandidates;
        };
        let current = entry.state.current_rank.min(max_rank);
        let target = (current as i64 + direction as i64).clamp(0, max_rank as i64) as usize;
        if direction != 0 && target == current {
            debug!("Pair {} already at rank {} of {}", pair, current, max_rank + 1);
            return NavOutcome::BoundaryReached;
        }
        self.preview(pair, target, registry)
    }

    /// Swaps anchor and moved fragment and re-previews the current rank.
    pub fn set_flip(&mut self, pair: usize, flip: bool, registry: &mut FragmentRegistry) -> NavOutcome {
        self.with_state_change(pair, registry, |state| state.flip = flip)
    }

    /// Switches the score side; rank and flip start over.
    pub fn set_side(&mut self, pair: usize, side: ScoreSide, registry: &mut FragmentRegistry) -> NavOutcome {
        self.with_state_change(pair, registry, |state| {
            state.side = side;
            state.current_rank = 0;
            state.flip = false;
        })
    }

    fn with_state_change<F>(&mut self, pair: usize, registry: &mut FragmentRegistry, change: F) -> NavOutcome
    where
        F: FnOnce(&mut AlignmentNavState),
    {
        let Some(entry) = self.pairs.get_mut(pair) else {
            warn!("Navigation on unknown pair {}", pair);
            return NavOutcome::Aborted;
        };
        let previous = entry.state;
        change(&mut entry.state);
        let rank = entry.state.current_rank;

        let outcome = self.preview(pair, rank, registry);
        if outcome == NavOutcome::Aborted {
            if let Some(entry) = self.pairs.get_mut(pair) {
                entry.state = previous;
            }
        }
        outcome
    }

    /// Enables or disables solo display of a pair.
    ///
    /// Only one pair can be solo; every fragment outside the solo pair is
    /// hidden. Disabling a pair that is not solo changes nothing. Positions
    /// are not touched.
    pub fn set_solo(&mut self, pair: usize, enabled: bool, registry: &FragmentRegistry) -> bool {
        let Some(entry) = self.pairs.get(pair) else {
            warn!("Solo on unknown pair {}", pair);
            return false;
        };
        let keep = [entry.fragment_a, entry.fragment_b];

        if !enabled && !entry.state.solo {
            return true;
        }
        if enabled {
            for other in &mut self.pairs {
                other.state.solo = false;
            }
            self.hidden = registry
                .fragment_ids()
                .filter(|id| !keep.contains(id))
                .collect();
        } else {
            self.hidden.clear();
        }
        self.pairs[pair].state.solo = enabled;
        true
    }

    /// Index of the pair in solo mode.
    pub fn solo_pair(&self) -> Option<usize> {
        self.pairs.iter().position(|e| e.state.solo)
    }

    /// Commits the previewed positions of a pair as its new baselines.
    ///
    /// Does nothing unless a preview happened since the last apply.
    pub fn apply(&mut self, pair: usize, registry: &FragmentRegistry) -> bool {
        let Some(entry) = self.pairs.get_mut(pair) else {
            warn!("Apply on unknown pair {}", pair);
            return false;
        };
        if !entry.state.apply_enabled {
            return false;
        }
        let (Some(a), Some(b)) = (
            registry.fragment(entry.fragment_a),
            registry.fragment(entry.fragment_b),
        ) else {
            warn!("Apply on pair {} whose fragments were removed", pair);
            return false;
        };

        self.baselines.insert(a.id, a.bbox);
        self.baselines.insert(b.id, b.bbox);
        entry.state.apply_enabled = false;
        self.phase = NavPhase::Applied;
        info!("Applied rank {} of pair {}", entry.state.current_rank, pair);
        true
    }

    /// Restores every baseline and clears solo, flip and annotations.
    ///
    /// Ranks and sides are kept.
    pub fn reset_all(&mut self, registry: &mut FragmentRegistry) {
        for (&id, &bbox) in &self.baselines {
            if registry.set_bbox(id, bbox).is_err() {
                debug!("Fragment {} no longer exists, not restored", id);
            }
        }
        self.baselines.clear();
        self.annotations.clear();
        self.hidden.clear();
        for entry in &mut self.pairs {
            entry.state.solo = false;
            entry.state.flip = false;
            entry.state.apply_enabled = false;
        }
        self.active = None;
        self.phase = NavPhase::Idle;
        debug!("Alignment reset");
    }

    /// The candidate at the pair's current rank, without moving anything.
    pub fn current_candidate(&self, pair: usize, registry: &FragmentRegistry) -> Option<Candidate> {
        let rank = self.pairs.get(pair)?.state.current_rank;
        match self.resolve(pair, rank, registry) {
            Resolution::Ready(candidate) => Some(candidate),
            Resolution::Empty | Resolution::Aborted => None,
        }
    }

    fn anchor_box(&self, id: FragmentId, registry: &FragmentRegistry) -> Option<BoundingBox> {
        let current = registry.fragment(id)?.bbox;
        Some(self.baselines.get(&id).copied().unwrap_or(current))
    }

    fn resolve(&self, pair: usize, rank: usize, registry: &FragmentRegistry) -> Resolution {
        let Some(entry) = self.pairs.get(pair) else {
            warn!("Navigation on unknown pair {}", pair);
            return Resolution::Aborted;
        };
        let state = entry.state;
        let ranking = entry.rankings.for_side(state.side);
        let Some(max_rank) = ranking.max_rank() else {
            return Resolution::Empty;
        };
        let rank = rank.min(max_rank);
        let Some((translation_id, score)) = ranking.get(rank) else {
            return Resolution::Empty;
        };

        // Verso candidates reuse the recto displacement of the same id
        let Some(displacement) = entry.result.displacement(translation_id) else {
            warn!(
                "Pair {}: translation id {} has no displacement",
                entry.result.label(),
                translation_id
            );
            return Resolution::Aborted;
        };

        let (anchor, moved, displacement) = if state.flip {
            match displacement.checked_neg() {
                Some(negated) => (entry.fragment_b, entry.fragment_a, negated),
                None => {
                    warn!("Pair {}: displacement {:?} cannot be flipped", entry.result.label(), displacement);
                    return Resolution::Aborted;
                }
            }
        } else {
            (entry.fragment_a, entry.fragment_b, displacement)
        };

        let (Some(anchor_box), true) = (self.anchor_box(anchor, registry), registry.contains(moved)) else {
            warn!(
                "Pair {} refers to a fragment that is no longer in the project",
                entry.result.label()
            );
            return Resolution::Aborted;
        };

        let Some(position) = displacement.offset(anchor_box.left, anchor_box.top) else {
            warn!(
                "Pair {}: displacement {:?} moves fragment {} off the canvas",
                entry.result.label(),
                displacement,
                moved
            );
            return Resolution::Aborted;
        };

        Resolution::Ready(Candidate {
            rank,
            total: ranking.len(),
            translation_id,
            score,
            displacement,
            anchor,
            moved,
            position,
        })
    }

    fn preview(&mut self, pair: usize, rank: usize, registry: &mut FragmentRegistry) -> NavOutcome {
        let candidate = match self.resolve(pair, rank, registry) {
            Resolution::Ready(candidate) => candidate,
            Resolution::Empty => return NavOutcome::NoCandidates,
            Resolution::Aborted => return NavOutcome::Aborted,
        };

        // Both fragments exist: resolve checked them
        for id in [candidate.anchor, candidate.moved] {
            if let Some(fragment) = registry.fragment(id) {
                let bbox = *self.baselines.entry(id).or_insert(fragment.bbox);
                if let Err(e) = registry.set_bbox(id, bbox) {
                    warn!("Could not restore fragment {}: {}", id, e);
                }
            }
        }
        let (x, y) = candidate.position;
        if let Err(e) = registry.set_position(candidate.moved, x, y) {
            warn!("Could not move fragment {}: {}", candidate.moved, e);
            return NavOutcome::Aborted;
        }

        let anchor_box = self.baselines.get(&candidate.anchor).copied().unwrap_or_default();
        self.annotations = self.collect_annotations(pair, &candidate, anchor_box);

        if let Some(entry) = self.pairs.get_mut(pair) {
            entry.state.current_rank = candidate.rank;
            entry.state.apply_enabled = true;
        }
        self.active = Some(pair);
        self.phase = NavPhase::Previewing;
        debug!(
            "Pair {} rank {}/{}: id {} score {:.3} moves {} to ({}, {})",
            pair,
            candidate.rank + 1,
            candidate.total,
            candidate.translation_id,
            candidate.score,
            candidate.moved,
            x,
            y
        );
        NavOutcome::Moved(candidate)
    }

    fn collect_annotations(
        &self,
        pair: usize,
        candidate: &Candidate,
        anchor_box: BoundingBox,
    ) -> Vec<AnnotationPoint> {
        let Some(entry) = self.pairs.get(pair) else {
            return Vec::new();
        };
        let flip = entry.state.flip;
        let samples = entry.result.samples(entry.state.side);
        samples
            .indices_of(candidate.translation_id)
            .map(|i| {
                let (y, x) = if flip {
                    samples.b_coords[i]
                } else {
                    samples.a_coords[i]
                };
                let score = samples.scores[i];
                AnnotationPoint {
                    x: x + anchor_box.left as f64,
                    y: y + anchor_box.top as f64,
                    score,
                    tier: self.thresholds.classify(score),
                }
            })
            .collect()
    }
}
