//! # PapyrLab Layout
//!
//! Owns everything about where fragments sit on the canvas:
//!
//! - **Packing**: non-overlapping initial placement of an imported batch
//! - **Registry**: fragment records, spatial queries, groups and id allocation
//! - **Selection**: the operator's current selection, group-aware
//! - **Grid**: the column layout guide drawn over the working area
//! - **Project**: the persisted document tying the above together
//!
//! ```text
//! Project
//!   ├── WorkingArea
//!   ├── FragmentRegistry (fragments + groups, bidirectional membership)
//!   └── ColumnGrid (optional)
//! ```

pub mod fragment;
pub mod grid;
pub mod group;
pub mod packing;
pub mod project;
pub mod registry;
pub mod selection;

pub use fragment::{back_image_path, opaque_centroid, Fragment, OPAQUE_ALPHA_THRESHOLD};
pub use grid::{CellState, ColumnGrid, GridNote};
pub use group::Group;
pub use packing::{pack, Packer, PackingOutcome, DEFAULT_GROWTH_MARGIN};
pub use project::{FragmentSpec, Project, ProjectFile, PROJECT_FORMAT_VERSION};
pub use registry::FragmentRegistry;
pub use selection::Selection;
