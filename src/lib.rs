//! # PapyrLab
//!
//! Fragment arrangement and match-alignment engine for recomposing torn
//! papyrus fragments into a reconstructed document.
//!
//! ## Architecture
//!
//! PapyrLab is organized as a workspace with multiple crates:
//!
//! 1. **papyrlab-core** - Errors, bounding boxes, working area, typed ids
//! 2. **papyrlab-layout** - Packing, fragment and group registry, selection, project files
//! 3. **papyrlab-matching** - Pair artifacts, candidate ranking, alignment navigation
//! 4. **papyrlab-settings** - User configuration
//! 5. **papyrlab** - The [`Session`] controller that ties them together
//!
//! Everything runs synchronously on the calling thread. A host application
//! owns one [`Session`] and forwards operator actions to it.

pub mod session;

pub use session::{Session, ViewSide};

pub use papyrlab_core::{
    BoundingBox, CapacityError, Error, FragmentId, GroupId, InputError, Result, WorkingArea,
};

pub use papyrlab_layout::{
    CellState, ColumnGrid, Fragment, FragmentRegistry, FragmentSpec, Group, Project, Selection,
};

pub use papyrlab_matching::{
    AlignmentNavState, AlignmentSession, AnnotationPoint, Candidate, Displacement, NavOutcome,
    NavPhase, PairAlignmentResult, PairSummary, ScoreSide, ScoreTier, TierThresholds,
};

pub use papyrlab_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support (INFO by default)
///
/// Fails if a global subscriber is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
