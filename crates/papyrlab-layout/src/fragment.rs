//! Fragment records.
//!
//! A fragment is one scanned papyrus piece placed on the canvas. Its recto
//! image defines the bounding box; the centre is the centroid of the opaque
//! pixels so that spatial picking favours the visible papyrus rather than the
//! transparent padding around it.

use image::RgbaImage;
use papyrlab_core::{BoundingBox, Error, FragmentId, GroupId, InputError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pixels with an alpha at or above this value count as papyrus.
pub const OPAQUE_ALPHA_THRESHOLD: u8 = 150;

/// A fragment placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub id: FragmentId,
    /// File stem of the recto image.
    pub name: String,
    /// Recto image path, empty for fragments created from bare sizes.
    pub filename: PathBuf,
    pub bbox: BoundingBox,
    /// Centre in canvas coordinates as `(x, y)`.
    pub center: (f64, f64),
    pub note: String,
    pub(crate) group_id: Option<GroupId>,
}

impl Fragment {
    /// Creates an ungrouped fragment centred on its bounding box.
    pub fn new(id: FragmentId, name: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            id,
            name: name.into(),
            filename: PathBuf::new(),
            center: bbox.center(),
            bbox,
            note: String::new(),
            group_id: None,
        }
    }

    /// Attaches the recto image path and derives the name from its stem.
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = filename.into();
        if let Some(stem) = self.filename.file_stem() {
            self.name = stem.to_string_lossy().into_owned();
        }
        self
    }

    /// Overrides the centre (e.g. when restoring a saved project).
    pub fn with_center(mut self, center: (f64, f64)) -> Self {
        self.center = center;
        self
    }

    /// Marks the fragment as a member of `group`; the registry creates the
    /// group when the fragment is added.
    pub fn with_group(mut self, group: Option<GroupId>) -> Self {
        self.group_id = group;
        self
    }

    /// Loads a recto image and places its top-left corner at `(x, y)`.
    ///
    /// Paths mentioning `verso` are rejected.
    pub fn from_image(id: FragmentId, path: &Path, x: i32, y: i32) -> Result<Self> {
        let shown = path.to_string_lossy();
        if shown.contains("verso") {
            return Err(InputError::VersoAsRecto {
                path: shown.into_owned(),
            }
            .into());
        }

        let img = image::open(path)
            .map_err(|e| Error::Image(format!("{}: {}", shown, e)))?
            .to_rgba8();
        let bbox = BoundingBox::at(x, y, img.width(), img.height());
        let center = match opaque_centroid(&img) {
            Some((cx, cy)) => (x as f64 + cx, y as f64 + cy),
            None => bbox.center(),
        };
        debug!(
            "Loaded fragment {} from {} ({}x{})",
            id,
            shown,
            bbox.width,
            bbox.height
        );

        Ok(Self::new(id, String::new(), bbox)
            .with_filename(path)
            .with_center(center))
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    pub fn is_grouped(&self) -> bool {
        self.group_id.is_some()
    }

    /// Moves the fragment by `(dx, dy)`; the centre follows the box.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.bbox = self.bbox.translated(dx, dy);
        self.center.0 += dx as f64;
        self.center.1 += dy as f64;
    }

    /// Moves the top-left corner to `(x, y)`.
    pub fn set_position(&mut self, x: i32, y: i32) {
        let dx = x - self.bbox.left;
        let dy = y - self.bbox.top;
        self.translate(dx, dy);
    }

    /// Squared distance from the centre to `(x, y)`.
    pub fn center_distance_sq(&self, x: f64, y: f64) -> f64 {
        let dx = self.center.0 - x;
        let dy = self.center.1 - y;
        dx * dx + dy * dy
    }

    /// Path of the verso image for this fragment, if one exists on disk.
    pub fn back_image_path(&self) -> Option<PathBuf> {
        back_image_path(&self.filename)
    }
}

/// Centroid `(x, y)` of the opaque pixels of an image, in image coordinates.
///
/// Returns `None` when no pixel reaches [`OPAQUE_ALPHA_THRESHOLD`].
pub fn opaque_centroid(img: &RgbaImage) -> Option<(f64, f64)> {
    let mut count = 0u64;
    let mut sum_x = 0f64;
    let mut sum_y = 0f64;
    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[3] >= OPAQUE_ALPHA_THRESHOLD {
            count += 1;
            sum_x += x as f64;
            sum_y += y as f64;
        }
    }
    if count == 0 {
        return None;
    }
    Some((sum_x / count as f64, sum_y / count as f64))
}

/// Finds the verso image that belongs to a recto image.
///
/// Tries `<stem>_back.<ext>`, then replaces `recto` with `verso`, then
/// `front` with `back`.
pub fn back_image_path(recto: &Path) -> Option<PathBuf> {
    let stem = recto.file_stem()?.to_string_lossy().into_owned();
    let mut candidates = Vec::with_capacity(3);

    let back_name = match recto.extension() {
        Some(ext) => format!("{}_back.{}", stem, ext.to_string_lossy()),
        None => format!("{}_back", stem),
    };
    candidates.push(recto.with_file_name(back_name));

    let full = recto.to_string_lossy();
    if full.contains("recto") {
        candidates.push(PathBuf::from(full.replace("recto", "verso")));
    }
    if full.contains("front") {
        candidates.push(PathBuf::from(full.replace("front", "back")));
    }

    candidates.into_iter().find(|p| p.is_file())
}
