//! Error types for representative selection and summary loading.

use thiserror::Error;

/// Rejected input to the representative selector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    /// The sample has no items, so no centroid exists.
    #[error("Sample is empty, at least one item is required")]
    EmptySample,

    /// A linearity, branching or derived cocluster index is NaN or infinite.
    #[error("Non-finite {field} at index {index}: {value}")]
    NonFinite {
        index: usize,
        field: &'static str,
        value: f64,
    },

    /// A parallel identifier sequence does not line up with the sample.
    #[error("Identifier count {actual} does not match sample length {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Errors while reading the tree summary or mutation JSON.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Tree keys must be non-negative integers.
    #[error("Tree key {0:?} is not a tree index")]
    InvalidTreeKey(String),

    #[error("SSM {id} has {ref_len} ref_reads but {total_len} total_reads")]
    ReadCountMismatch {
        id: String,
        ref_len: usize,
        total_len: usize,
    },
}

/// Errors while writing a rendered chart or the representative report.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Plotting failed: {0}")]
    Plot(String),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
