//! Initial layout packing for imported fragment batches.
//!
//! Rectangles are packed with a maximal-rectangles packer using the
//! best-short-side-fit rule, largest area first. Nothing is rotated.
//!
//! When the batch does not fit in the working area the limiting dimension is
//! grown once:
//! - width-limited: width becomes the sum of all widths plus the margin
//! - height-limited: height becomes the tallest height plus the margin
//!
//! A strip that wide always holds the batch side by side, so the retry cannot
//! fail unless the input is degenerate; a failure is still reported as a
//! [`CapacityError`] rather than a panic.

use papyrlab_core::{CapacityError, InputError, Result, WorkingArea};
use tracing::{debug, info};

/// Extra room added to a grown dimension.
pub const DEFAULT_GROWTH_MARGIN: u32 = 100;

/// Result of packing a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackingOutcome {
    /// Top-left `(x, y)` of every rectangle, in input order.
    pub positions: Vec<(i32, i32)>,
    /// The area the batch was finally packed into.
    pub area: WorkingArea,
    /// True when the area had to be grown.
    pub grown: bool,
}

/// Packs batches of rectangles into a working area.
#[derive(Debug, Clone, Copy)]
pub struct Packer {
    margin: u32,
}

impl Default for Packer {
    fn default() -> Self {
        Self::new(DEFAULT_GROWTH_MARGIN)
    }
}

impl Packer {
    pub fn new(margin: u32) -> Self {
        Self { margin }
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Places every `(width, height)` without overlap.
    ///
    /// Identical input always yields identical output.
    pub fn pack(&self, sizes: &[(u32, u32)], area: WorkingArea) -> Result<PackingOutcome> {
        for (index, &(width, height)) in sizes.iter().enumerate() {
            if width == 0 || height == 0 {
                return Err(InputError::InvalidSize {
                    index,
                    width,
                    height,
                }
                .into());
            }
        }

        if sizes.is_empty() {
            return Ok(PackingOutcome {
                positions: Vec::new(),
                area,
                grown: false,
            });
        }

        if let Some(positions) = pack_into(sizes, area.width as u64, area.height as u64) {
            debug!(
                "Packed {} fragments into {}x{}",
                sizes.len(),
                area.width,
                area.height
            );
            return Ok(PackingOutcome {
                positions,
                area,
                grown: false,
            });
        }

        let margin = self.margin as u64;
        let sum_width: u64 = sizes.iter().map(|&(w, _)| w as u64).sum();
        let max_height: u64 = sizes.iter().map(|&(_, h)| h as u64).max().unwrap_or(0);

        let width_limited = (area.width as u64) < sum_width + margin;
        let height_limited = (area.height as u64) < max_height + margin;

        let width = if width_limited {
            sum_width + margin
        } else {
            area.width as u64
        };
        let height = if height_limited {
            max_height + margin
        } else {
            area.height as u64
        };

        info!(
            "Working area {}x{} too small for {} fragments, retrying with {}x{}",
            area.width,
            area.height,
            sizes.len(),
            width,
            height
        );

        let fail = CapacityError::DoesNotFit {
            width,
            height,
            count: sizes.len(),
        };
        let grown_area = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) => WorkingArea::new(w, h),
            _ => return Err(fail.into()),
        };

        match pack_into(sizes, width, height) {
            Some(positions) => Ok(PackingOutcome {
                positions,
                area: grown_area,
                grown: true,
            }),
            None => Err(fail.into()),
        }
    }
}

/// Packs with the default growth margin.
pub fn pack(sizes: &[(u32, u32)], area: WorkingArea) -> Result<PackingOutcome> {
    Packer::default().pack(sizes, area)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x: u64,
    y: u64,
    w: u64,
    h: u64,
}

impl Rect {
    fn right(&self) -> u64 {
        self.x + self.w
    }

    fn bottom(&self) -> u64 {
        self.y + self.h
    }

    fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Maximal-rectangles bin.
struct MaxRectsBin {
    free: Vec<Rect>,
}

impl MaxRectsBin {
    fn new(width: u64, height: u64) -> Self {
        Self {
            free: vec![Rect {
                x: 0,
                y: 0,
                w: width,
                h: height,
            }],
        }
    }

    /// Best short side fit; ties keep the earliest free rectangle.
    fn find_position(&self, w: u64, h: u64) -> Option<Rect> {
        let mut best: Option<(u64, u64, Rect)> = None;
        for free in &self.free {
            if free.w < w || free.h < h {
                continue;
            }
            let leftover_h = free.w - w;
            let leftover_v = free.h - h;
            let short = leftover_h.min(leftover_v);
            let long = leftover_h.max(leftover_v);
            let better = match best {
                None => true,
                Some((best_short, best_long, _)) => {
                    short < best_short || (short == best_short && long < best_long)
                }
            };
            if better {
                best = Some((short, long, Rect { x: free.x, y: free.y, w, h }));
            }
        }
        best.map(|(_, _, rect)| rect)
    }

    fn place(&mut self, used: Rect) {
        let mut next = Vec::with_capacity(self.free.len() + 4);
        for free in self.free.drain(..) {
            if !free.overlaps(&used) {
                next.push(free);
                continue;
            }
            if used.x > free.x {
                next.push(Rect {
                    x: free.x,
                    y: free.y,
                    w: used.x - free.x,
                    h: free.h,
                });
            }
            if used.right() < free.right() {
                next.push(Rect {
                    x: used.right(),
                    y: free.y,
                    w: free.right() - used.right(),
                    h: free.h,
                });
            }
            if used.y > free.y {
                next.push(Rect {
                    x: free.x,
                    y: free.y,
                    w: free.w,
                    h: used.y - free.y,
                });
            }
            if used.bottom() < free.bottom() {
                next.push(Rect {
                    x: free.x,
                    y: used.bottom(),
                    w: free.w,
                    h: free.bottom() - used.bottom(),
                });
            }
        }
        self.free = prune(next);
    }
}

/// Drops free rectangles contained in another one (keeps the first of equals).
fn prune(rects: Vec<Rect>) -> Vec<Rect> {
    let mut kept: Vec<Rect> = Vec::with_capacity(rects.len());
    for (i, r) in rects.iter().enumerate() {
        let redundant = rects.iter().enumerate().any(|(j, other)| {
            i != j && other.contains(r) && (other != r || j < i)
        });
        if !redundant {
            kept.push(*r);
        }
    }
    kept
}

fn pack_into(sizes: &[(u32, u32)], width: u64, height: u64) -> Option<Vec<(i32, i32)>> {
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    // Stable sort keeps input order among equal areas
    order.sort_by(|&a, &b| {
        let area_a = sizes[a].0 as u64 * sizes[a].1 as u64;
        let area_b = sizes[b].0 as u64 * sizes[b].1 as u64;
        area_b.cmp(&area_a)
    });

    let mut bin = MaxRectsBin::new(width, height);
    let mut positions = vec![(0i32, 0i32); sizes.len()];
    for index in order {
        let (w, h) = sizes[index];
        let rect = bin.find_position(w as u64, h as u64)?;
        let x = i32::try_from(rect.x).ok()?;
        let y = i32::try_from(rect.y).ok()?;
        bin.place(rect);
        positions[index] = (x, y);
    }
    Some(positions)
}
