//! # PapyrLab Core
//!
//! Core types shared by every PapyrLab crate: the error taxonomy, axis-aligned
//! bounding boxes, the working area, typed identifiers and unit conversion.

pub mod error;
pub mod geometry;
pub mod types;
pub mod units;

pub use error::{CapacityError, Error, InputError, Result};
pub use geometry::{BoundingBox, WorkingArea};
pub use types::{FragmentId, GroupId};
pub use units::{centimeters_to_pixels, pixels_to_centimeters};
