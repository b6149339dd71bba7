//! Error handling for PapyrLab
//!
//! Provides the error types shared by the arrangement and alignment engines:
//! - Input errors (malformed artifacts, bad size lists, invalid requests)
//! - Capacity errors (a batch that cannot be packed into the working area)
//!
//! Inconsistent navigation state (a pair that refers to a deleted fragment) is
//! not an error: it is logged and the operation degrades to a no-op.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Input error type
///
/// Raised before any state is mutated when a caller hands the engine data it
/// cannot use.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// A required field is absent from an artifact or project file
    #[error("Missing required field '{field}'")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// Two arrays that must share a shape do not
    #[error("Shape mismatch for '{field}': expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The offending field.
        field: String,
        /// The expected `(rows, cols)` shape.
        expected: (usize, usize),
        /// The shape actually found.
        actual: (usize, usize),
    },

    /// Parallel flat arrays have different lengths
    #[error("Length mismatch for '{field}': expected {expected}, got {actual}")]
    LengthMismatch {
        /// The offending field.
        field: String,
        /// The expected length.
        expected: usize,
        /// The length actually found.
        actual: usize,
    },

    /// A grid row is shorter or longer than the first row
    #[error("Ragged grid '{field}': row {row} has {actual} columns, expected {expected}")]
    RaggedGrid {
        /// The offending field.
        field: String,
        /// Index of the first ragged row.
        row: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the ragged row.
        actual: usize,
    },

    /// A rectangle in a packing request has a zero dimension
    #[error("Invalid size at index {index}: {width}x{height}")]
    InvalidSize {
        /// Position of the entry in the request.
        index: usize,
        /// The requested width.
        width: u32,
        /// The requested height.
        height: u32,
    },

    /// Two records claim the same identifier
    #[error("Duplicate {kind} id {id}")]
    DuplicateId {
        /// What kind of record ("fragment", "group").
        kind: String,
        /// The duplicated identifier.
        id: u32,
    },

    /// A request refers to an identifier that does not exist
    #[error("Unknown {kind} id {id}")]
    UnknownId {
        /// What kind of record ("fragment", "group").
        kind: String,
        /// The unknown identifier.
        id: u32,
    },

    /// Grouping needs at least two distinct fragments
    #[error("Grouping requires at least 2 fragments, got {count}")]
    SelectionTooSmall {
        /// Number of distinct fragments supplied.
        count: usize,
    },

    /// A verso image was offered where a recto image is expected
    #[error("Verso image cannot be imported as a recto fragment: {path}")]
    VersoAsRecto {
        /// The rejected path.
        path: String,
    },

    /// The data is structurally invalid for another reason
    #[error("Malformed input: {reason}")]
    Malformed {
        /// Why the input was rejected.
        reason: String,
    },
}

/// Capacity error type
///
/// Raised when a batch cannot be packed even after the area-growth retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    /// The rectangles do not fit in the (already grown) area
    #[error("{count} fragments do not fit in a {width}x{height} area")]
    DoesNotFit {
        /// Width of the last area tried.
        width: u64,
        /// Height of the last area tried.
        height: u64,
        /// Number of rectangles in the batch.
        count: usize,
    },
}

/// Main error type for PapyrLab
#[derive(Error, Debug)]
pub enum Error {
    /// Input error
    #[error(transparent)]
    Input(#[from] InputError),

    /// Capacity error
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is an input error
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Input(_))
    }

    /// Check if this is a capacity error
    pub fn is_capacity_error(&self) -> bool {
        matches!(self, Error::Capacity(_))
    }
}

/// Result type for PapyrLab operations
pub type Result<T> = std::result::Result<T, Error>;
