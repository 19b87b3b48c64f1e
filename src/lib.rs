//! Summary charts for an ensemble of inferred tumor phylogenies.
//!
//! The [`selector`] module holds the representative-tree selection; the other
//! modules load tree summaries, reduce them to chart data and render charts.

pub mod charts;
pub mod error;
pub mod render;
pub mod report;
pub mod selector;
pub mod summary;

pub use error::{InvalidInputError, RenderError, SummaryError};
pub use selector::{
    compute_centroid, compute_derived_points, euclidean_distance, select_representative,
    select_representative_labeled, DerivedPoint, SelectionResult, ShapeIndices,
};
