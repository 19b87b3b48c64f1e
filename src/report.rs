//! The `representative.json` report written next to the charts.

use crate::charts::{scatter_layer, Ensemble, ScatterLayer};
use crate::error::RenderError;
use crate::selector::DerivedPoint;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub const REPORT_FILE: &str = "representative.json";

/// Contents of `representative.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeReport {
    pub tree_index: usize,
    pub tree_id: u64,
    pub centroid: DerivedPoint,
    pub points: Vec<DerivedPoint>,
}

impl RepresentativeReport {
    pub fn from_layer(layer: &ScatterLayer) -> Self {
        RepresentativeReport {
            tree_index: layer.selection.index,
            tree_id: layer.representative_id,
            centroid: layer.selection.centroid,
            points: layer.selection.points.clone(),
        }
    }
}

/// Write the report for `layer` as pretty-printed JSON.
pub fn write_report(layer: &ScatterLayer, path: &Path) -> Result<(), RenderError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &RepresentativeReport::from_layer(layer))?;
    info!("Representative tree saved to {:?}", path);
    Ok(())
}

/// Select the representative tree and write `dir/representative.json`.
///
/// An ensemble without a selectable tree is not an error: the report is
/// skipped and `None` is returned, so the remaining charts still render.
pub fn report_representative(ensemble: &Ensemble, dir: &Path) -> Result<Option<ScatterLayer>, RenderError> {
    match scatter_layer(ensemble) {
        Ok(layer) => {
            info!(
                "Representative tree: {} (index {})",
                layer.representative_id, layer.selection.index
            );
            write_report(&layer, &dir.join(REPORT_FILE))?;
            Ok(Some(layer))
        }
        Err(e) => {
            warn!("Skipping index scatter plot and {}: {}", REPORT_FILE, e);
            Ok(None)
        }
    }
}
