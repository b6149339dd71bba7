//! Pair alignment artifacts.
//!
//! An artifact is produced offline by the patch-correlation stage for one
//! ordered pair of fragments. On disk it is a JSON document:
//!
//! ```json
//! {
//!   "fragment_a": "P.Herc.1_recto",
//!   "fragment_b": "P.Herc.2_recto",
//!   "score_grid": [[0.1, 0.4], [0.9, 0.2]],
//!   "score_grid_recto": [[...]],
//!   "score_grid_verso": [[...]],
//!   "translation_id_grid": [[3, 3], [7, 8]],
//!   "recto": {
//!     "translation_ids": [3, 7],
//!     "relative_displacements": [[10, -20], [0, 5]],
//!     "scores": [0.8, 0.9],
//!     "a_coords": [[12.0, 40.0], [3.0, 4.0]],
//!     "b_coords": [[2.0, 60.0], [3.0, -1.0]]
//!   },
//!   "verso": { ... }
//! }
//! ```
//!
//! Coordinates and displacements are `(y, x)` / `(dy, dx)`. The combined grid
//! is `score_grid` when present, otherwise the element-wise sum of the side
//! grids. The translation id grid is derived from the recto side and is used
//! for every side.

use ndarray::Array2;
use papyrlab_core::{InputError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Neg;
use std::path::Path;
use tracing::{debug, warn};

/// Label of a discrete relative displacement between two fragments.
pub type TranslationId = i64;

/// Which score field a ranking is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScoreSide {
    /// Sum of recto and verso scores.
    #[default]
    Combined,
    Recto,
    Verso,
}

impl fmt::Display for ScoreSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreSide::Combined => write!(f, "combined"),
            ScoreSide::Recto => write!(f, "recto"),
            ScoreSide::Verso => write!(f, "verso"),
        }
    }
}

/// Relative displacement `(dy, dx)` of the moved fragment from the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Displacement {
    pub dy: i32,
    pub dx: i32,
}

impl Displacement {
    pub fn new(dy: i32, dx: i32) -> Self {
        Self { dy, dx }
    }

    /// `-self`, or `None` if a component is `i32::MIN`.
    pub fn checked_neg(self) -> Option<Self> {
        Some(Self::new(self.dy.checked_neg()?, self.dx.checked_neg()?))
    }

    /// `(x, y) + (dx, dy)`, or `None` on overflow.
    pub fn offset(self, x: i32, y: i32) -> Option<(i32, i32)> {
        Some((x.checked_add(self.dx)?, y.checked_add(self.dy)?))
    }
}

impl Neg for Displacement {
    type Output = Displacement;

    fn neg(self) -> Displacement {
        Displacement::new(-self.dy, -self.dx)
    }
}

/// Fine-grained correlation samples of one side.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleSet {
    pub translation_ids: Vec<TranslationId>,
    pub displacements: Vec<Displacement>,
    pub scores: Vec<f64>,
    /// `(y, x)` in fragment A's local frame.
    pub a_coords: Vec<(f64, f64)>,
    /// `(y, x)` in fragment B's local frame.
    pub b_coords: Vec<(f64, f64)>,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.translation_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translation_ids.is_empty()
    }

    /// Indices of the samples tagged with `id`.
    pub fn indices_of(&self, id: TranslationId) -> impl Iterator<Item = usize> + '_ {
        self.translation_ids
            .iter()
            .enumerate()
            .filter(move |&(_, &t)| t == id)
            .map(|(i, _)| i)
    }
}

#[derive(Debug, Deserialize)]
struct RawSamples {
    translation_ids: Option<Vec<TranslationId>>,
    relative_displacements: Option<Vec<[i32; 2]>>,
    scores: Option<Vec<f64>>,
    a_coords: Option<Vec<[f64; 2]>>,
    b_coords: Option<Vec<[f64; 2]>>,
}

#[derive(Debug, Deserialize)]
struct RawArtifact {
    fragment_a: Option<String>,
    fragment_b: Option<String>,
    score_grid: Option<Vec<Vec<f64>>>,
    score_grid_recto: Option<Vec<Vec<f64>>>,
    score_grid_verso: Option<Vec<Vec<f64>>>,
    translation_id_grid: Option<Vec<Vec<TranslationId>>>,
    recto: Option<RawSamples>,
    verso: Option<RawSamples>,
}

/// Validated alignment data for one fragment pair. Read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PairAlignmentResult {
    pub fragment_a: String,
    pub fragment_b: String,
    combined: Array2<f64>,
    recto: Option<Array2<f64>>,
    verso: Option<Array2<f64>>,
    translation_ids: Array2<TranslationId>,
    recto_samples: SampleSet,
    verso_samples: Option<SampleSet>,
    displacements: BTreeMap<TranslationId, Displacement>,
}

fn missing(field: &str) -> InputError {
    InputError::MissingField {
        field: field.to_string(),
    }
}

fn to_array<T: Clone>(field: &str, rows: Vec<Vec<T>>) -> Result<Array2<T>> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, |r| r.len());
    let mut flat = Vec::with_capacity(nrows * ncols);
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != ncols {
            return Err(InputError::RaggedGrid {
                field: field.to_string(),
                row: i,
                expected: ncols,
                actual: row.len(),
            }
            .into());
        }
        flat.extend(row);
    }
    // A grid of empty rows has no cells
    let shape = if ncols == 0 { (0, 0) } else { (nrows, ncols) };
    Array2::from_shape_vec(shape, flat).map_err(|e| {
        InputError::Malformed {
            reason: format!("{}: {}", field, e),
        }
        .into()
    })
}

fn check_shape(field: &str, grid: &Array2<f64>, expected: (usize, usize)) -> Result<()> {
    if grid.dim() != expected {
        return Err(InputError::ShapeMismatch {
            field: field.to_string(),
            expected,
            actual: grid.dim(),
        }
        .into());
    }
    Ok(())
}

fn check_len(field: String, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(InputError::LengthMismatch {
            field,
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

impl RawSamples {
    fn validate(self, side: &str) -> Result<SampleSet> {
        let field = |name: &str| format!("{}.{}", side, name);
        let translation_ids = self
            .translation_ids
            .ok_or_else(|| missing(&field("translation_ids")))?;
        let displacements = self
            .relative_displacements
            .ok_or_else(|| missing(&field("relative_displacements")))?;
        let scores = self.scores.ok_or_else(|| missing(&field("scores")))?;
        let a_coords = self.a_coords.ok_or_else(|| missing(&field("a_coords")))?;
        let b_coords = self.b_coords.ok_or_else(|| missing(&field("b_coords")))?;

        let n = translation_ids.len();
        check_len(field("relative_displacements"), n, displacements.len())?;
        check_len(field("scores"), n, scores.len())?;
        check_len(field("a_coords"), n, a_coords.len())?;
        check_len(field("b_coords"), n, b_coords.len())?;
        if let Some(i) = displacements.iter().position(|d| d.contains(&i32::MIN)) {
            return Err(InputError::Malformed {
                reason: format!("{}[{}] is out of range", field("relative_displacements"), i),
            }
            .into());
        }

        Ok(SampleSet {
            translation_ids,
            displacements: displacements
                .into_iter()
                .map(|[dy, dx]| Displacement::new(dy, dx))
                .collect(),
            scores,
            a_coords: a_coords.into_iter().map(|[y, x]| (y, x)).collect(),
            b_coords: b_coords.into_iter().map(|[y, x]| (y, x)).collect(),
        })
    }
}

/// First displacement seen for each translation id.
fn displacement_table(samples: &SampleSet) -> BTreeMap<TranslationId, Displacement> {
    let mut table = BTreeMap::new();
    for (&id, &d) in samples.translation_ids.iter().zip(&samples.displacements) {
        match table.get(&id) {
            None => {
                table.insert(id, d);
            }
            Some(&existing) if existing != d => {
                warn!(
                    "Translation id {} has conflicting displacements {:?} and {:?}, keeping the first",
                    id, existing, d
                );
            }
            Some(_) => {}
        }
    }
    table
}

impl PairAlignmentResult {
    /// Parses and validates an artifact document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawArtifact = serde_json::from_str(json)?;
        Self::validate(raw)
    }

    /// Reads and validates an artifact file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let result = Self::from_json_str(&content)?;
        debug!(
            "Loaded pair {} / {} from {}",
            result.fragment_a,
            result.fragment_b,
            path.as_ref().display()
        );
        Ok(result)
    }

    fn validate(raw: RawArtifact) -> Result<Self> {
        let fragment_a = raw.fragment_a.ok_or_else(|| missing("fragment_a"))?;
        let fragment_b = raw.fragment_b.ok_or_else(|| missing("fragment_b"))?;
        let id_rows = raw
            .translation_id_grid
            .ok_or_else(|| missing("translation_id_grid"))?;
        let translation_ids = to_array("translation_id_grid", id_rows)?;
        let shape = translation_ids.dim();

        let grid = |field: &str, rows: Option<Vec<Vec<f64>>>| -> Result<Option<Array2<f64>>> {
            match rows {
                Some(rows) => {
                    let grid = to_array(field, rows)?;
                    check_shape(field, &grid, shape)?;
                    Ok(Some(grid))
                }
                None => Ok(None),
            }
        };
        let combined = grid("score_grid", raw.score_grid)?;
        let recto = grid("score_grid_recto", raw.score_grid_recto)?;
        let verso = grid("score_grid_verso", raw.score_grid_verso)?;

        let combined = match (combined, &recto, &verso) {
            (Some(c), _, _) => c,
            (None, Some(r), Some(v)) => r + v,
            (None, Some(r), None) => r.clone(),
            (None, None, Some(v)) => v.clone(),
            (None, None, None) => return Err(missing("score_grid").into()),
        };

        let recto_samples = raw.recto.ok_or_else(|| missing("recto"))?.validate("recto")?;
        let verso_samples = match raw.verso {
            Some(samples) => Some(samples.validate("verso")?),
            None => None,
        };
        let displacements = displacement_table(&recto_samples);

        Ok(Self {
            fragment_a,
            fragment_b,
            combined,
            recto,
            verso,
            translation_ids,
            recto_samples,
            verso_samples,
            displacements,
        })
    }

    /// Score grid of a side; the combined grid always exists.
    pub fn score_grid(&self, side: ScoreSide) -> Option<&Array2<f64>> {
        match side {
            ScoreSide::Combined => Some(&self.combined),
            ScoreSide::Recto => self.recto.as_ref(),
            ScoreSide::Verso => self.verso.as_ref(),
        }
    }

    /// Translation id of every grid cell (recto-derived, shared by all sides).
    pub fn translation_id_grid(&self) -> &Array2<TranslationId> {
        &self.translation_ids
    }

    /// Samples used for annotation on a side.
    ///
    /// Verso falls back to the recto samples when the artifact has none.
    pub fn samples(&self, side: ScoreSide) -> &SampleSet {
        match side {
            ScoreSide::Verso => self.verso_samples.as_ref().unwrap_or(&self.recto_samples),
            ScoreSide::Combined | ScoreSide::Recto => &self.recto_samples,
        }
    }

    /// Canonical displacement for a translation id, from the recto samples.
    pub fn displacement(&self, id: TranslationId) -> Option<Displacement> {
        self.displacements.get(&id).copied()
    }

    /// True when the combined grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.combined.is_empty()
    }

    /// `"A ↔ B"`
    pub fn label(&self) -> String {
        format!("{} ↔ {}", self.fragment_a, self.fragment_b)
    }
}
