//! Chart data: the reductions behind every summary chart.

use crate::error::{InvalidInputError, SummaryError};
use crate::selector::{select_representative_labeled, SelectionResult, ShapeIndices};
use crate::summary::{Mutations, Population, Ssm, Tree, TreeSummary};
use log::{debug, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Knobs shared by all charts
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Number of cancerous populations (after the clonal one) to chart
    pub pops_to_examine: usize,
    /// A population without CNVs needs this many SSMs to count as cancerous
    pub min_ssms: u64,
    pub vaf_bucket_size: f64,
    /// Grid resolution of the linearity/branching density overlay
    pub density_bins: usize,
    pub contour_levels: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            pops_to_examine: 3,
            min_ssms: 3,
            vaf_bucket_size: 0.03,
            density_bins: 40,
            contour_levels: 20,
        }
    }
}

/// Mean VAF over the samples of one SSM. Zero-depth samples are skipped.
fn ssm_vaf(ssm: &Ssm) -> Option<f64> {
    let vafs: Vec<f64> = ssm
        .ref_reads
        .iter()
        .zip(&ssm.total_reads)
        .filter(|(_, d)| **d > 0)
        .map(|(&a, &d)| (d as f64 - a as f64) / d as f64)
        .collect();
    if vafs.is_empty() {
        None
    } else {
        Some(vafs.iter().sum::<f64>() / vafs.len() as f64)
    }
}

/// One VAF per SSM, ordered by SSM id.
pub fn vaf_values(muts: &Mutations) -> Vec<f64> {
    let mut ssms: Vec<(&String, &Ssm)> = muts.ssms.iter().collect();
    ssms.sort_by(|a, b| a.0.cmp(b.0));

    let vafs: Vec<Option<f64>> = ssms.par_iter().map(|(_, ssm)| ssm_vaf(ssm)).collect();

    let mut out = Vec::with_capacity(vafs.len());
    for ((id, _), vaf) in ssms.iter().zip(vafs) {
        match vaf {
            Some(v) => out.push(v),
            None => debug!("SSM {} has no reads in any sample, skipping", id),
        }
    }
    if out.len() < ssms.len() {
        warn!("Skipped {} SSMs without read depth", ssms.len() - out.len());
    }
    let negative = out.iter().filter(|v| **v < 0.0).count();
    if negative > 0 {
        warn!("{} SSMs have more reference reads than total reads (negative VAF)", negative);
    }
    out
}

/// Extent of the VAF axis: covers [0, 1] and every finite VAF, so SSMs with
/// more reference reads than total reads still land in a bucket.
pub fn vaf_axis_range(vafs: &[f64]) -> (f64, f64) {
    vafs.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((0.0f64, 1.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// The `desired` populations following the clonal one, by descending mean
/// cellular prevalence. Missing slots are `None`.
pub fn top_cell_prev_populations<'a>(
    populations: &[&'a Population],
    desired: usize,
) -> Vec<Option<&'a Population>> {
    let mut pops: Vec<(&'a Population, f64)> = populations
        .iter()
        .map(|&p| (p, p.mean_cellular_prevalence()))
        .collect();
    pops.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut sliced: Vec<Option<&'a Population>> =
        pops.iter().skip(1).take(desired).map(|(p, _)| Some(*p)).collect();
    sliced.resize(desired, None);
    sliced
}

pub fn count_cancerous_populations(tree: &Tree, min_ssms: u64) -> usize {
    tree.populations
        .values()
        .filter(|p| p.num_cnvs > 0 || p.num_ssms >= min_ssms)
        .count()
}

/// (population count, number of trees) rows from the smallest to the largest
/// observed count, including counts no tree has.
pub fn population_count_histogram(pop_counts: &[usize]) -> Vec<(usize, usize)> {
    let (Some(&min_count), Some(&max_count)) = (pop_counts.iter().min(), pop_counts.iter().max())
    else {
        return Vec::new();
    };

    let mut histogram: FxHashMap<usize, usize> = FxHashMap::default();
    for &count in pop_counts {
        *histogram.entry(count).or_insert(0) += 1;
    }

    (min_count..=max_count)
        .map(|i| (i, histogram.get(&i).copied().unwrap_or(0)))
        .collect()
}

/// Per-tree values gathered from a summary, in tree order
#[derive(Debug, Clone, Default)]
pub struct Ensemble {
    pub tree_ids: Vec<u64>,
    pub shapes: Vec<ShapeIndices>,
    pub pop_counts: Vec<usize>,
    /// Mean cellular prevalence per examined population slot
    pub cell_prevs: Vec<Vec<f64>>,
    /// SSM count per examined population slot
    pub ssm_counts: Vec<Vec<f64>>,
}

pub fn build_ensemble(summary: &TreeSummary, config: &ChartConfig) -> Result<Ensemble, SummaryError> {
    let mut ensemble = Ensemble {
        cell_prevs: vec![Vec::new(); config.pops_to_examine],
        ssm_counts: vec![Vec::new(); config.pops_to_examine],
        ..Default::default()
    };

    for (tree_id, tree) in summary.ordered_trees()? {
        ensemble.tree_ids.push(tree_id);
        ensemble.shapes.push(tree.shape());
        ensemble.pop_counts.push(count_cancerous_populations(tree, config.min_ssms));

        let pops = tree.ordered_populations();
        let top = top_cell_prev_populations(&pops, config.pops_to_examine);
        for (slot, pop) in top.iter().enumerate() {
            if let Some(pop) = pop {
                ensemble.cell_prevs[slot].push(pop.mean_cellular_prevalence());
                ensemble.ssm_counts[slot].push(pop.num_ssms as f64);
            }
        }
    }

    debug!(
        "Ensemble: {} trees, population slots filled: {:?}",
        ensemble.tree_ids.len(),
        ensemble.cell_prevs.iter().map(|v| v.len()).collect::<Vec<_>>()
    );
    Ok(ensemble)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Histogram {
    pub buckets: Vec<Bucket>,
}

impl Histogram {
    fn build(values: &[f64], min: f64, max: f64, size: f64, n: usize) -> Self {
        let mut buckets: Vec<Bucket> = (0..n)
            .map(|i| Bucket {
                start: min + i as f64 * size,
                end: min + (i + 1) as f64 * size,
                count: 0,
            })
            .collect();

        let mut skipped = 0usize;
        for &v in values {
            if !v.is_finite() || v < min || v > max {
                skipped += 1;
                continue;
            }
            let idx = (((v - min) / size).floor() as usize).min(n - 1);
            buckets[idx].count += 1;
        }
        if skipped > 0 {
            debug!("Histogram: {} values outside [{}, {}]", skipped, min, max);
        }

        Histogram { buckets }
    }

    /// Buckets of width `size` starting at `min` and covering `max`.
    pub fn with_bucket_size(values: &[f64], min: f64, max: f64, size: f64) -> Self {
        let n = ((max - min) / size).ceil().max(1.0) as usize;
        Self::build(values, min, max, size, n)
    }

    /// Roughly square-root many buckets over the extent of the data.
    pub fn auto(values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Histogram::default();
        }
        let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if hi - lo <= 0.0 {
            return Self::build(&finite, lo, lo + 1.0, 1.0, 1);
        }

        let n = ((finite.len() as f64).sqrt().ceil() as usize).clamp(1, 40);
        Self::build(&finite, lo, hi, (hi - lo) / n as f64, n)
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.buckets.iter().map(|b| b.count).max().unwrap_or(0)
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        Some((self.buckets.first()?.start, self.buckets.last()?.end))
    }
}

/// 2D histogram of (linearity, branching), quantized into contour levels
#[derive(Debug, Clone)]
pub struct DensityGrid {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub bins: usize,
    /// Row-major by y, then x
    pub counts: Vec<usize>,
    pub levels: usize,
    /// Largest cell count, the top contour level
    pub max_count: usize,
}

fn padded_extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if hi - lo <= 0.0 {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

impl DensityGrid {
    pub fn new(shapes: &[ShapeIndices], bins: usize, levels: usize) -> Self {
        let bins = bins.max(1);
        let x_range = padded_extent(shapes.iter().map(|s| s.linearity_index));
        let y_range = padded_extent(shapes.iter().map(|s| s.branching_index));

        let cell = |v: f64, (lo, hi): (f64, f64)| -> usize {
            (((v - lo) / (hi - lo) * bins as f64).floor() as usize).min(bins - 1)
        };

        let mut counts = vec![0usize; bins * bins];
        for s in shapes {
            let ix = cell(s.linearity_index, x_range);
            let iy = cell(s.branching_index, y_range);
            counts[iy * bins + ix] += 1;
        }

        let max_count = counts.iter().copied().max().unwrap_or(0);
        DensityGrid { x_range, y_range, bins, counts, levels: levels.max(1), max_count }
    }

    pub fn count(&self, ix: usize, iy: usize) -> usize {
        self.counts[iy * self.bins + ix]
    }

    /// Contour level of a cell: 0 for empty cells, otherwise 1..=levels.
    pub fn level(&self, ix: usize, iy: usize) -> usize {
        let c = self.count(ix, iy);
        if c == 0 || self.max_count == 0 {
            return 0;
        }
        ((c as f64 / self.max_count as f64) * self.levels as f64).ceil() as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Dot,
    Cross,
    Diamond,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub marker: MarkerKind,
    pub size: u32,
}

/// Linearity vs. branching scatter with the representative tree and the
/// centroid marked
#[derive(Debug, Clone)]
pub struct ScatterLayer {
    pub points: Vec<ScatterPoint>,
    pub selection: SelectionResult,
    pub representative_id: u64,
}

pub fn scatter_layer(ensemble: &Ensemble) -> Result<ScatterLayer, InvalidInputError> {
    let (selection, &representative_id) =
        select_representative_labeled(&ensemble.shapes, &ensemble.tree_ids)?;

    let mut points: Vec<ScatterPoint> = ensemble
        .shapes
        .iter()
        .zip(&ensemble.tree_ids)
        .enumerate()
        .map(|(i, (s, id))| {
            let best = i == selection.index;
            ScatterPoint {
                x: s.linearity_index,
                y: s.branching_index,
                label: format!("Tree {}", id),
                marker: if best { MarkerKind::Cross } else { MarkerKind::Dot },
                size: if best { 30 } else { 6 },
            }
        })
        .collect();

    points.push(ScatterPoint {
        x: selection.centroid.linearity,
        y: selection.centroid.branching,
        label: "Mean".to_string(),
        marker: MarkerKind::Diamond,
        size: 30,
    });

    debug!(
        "Representative tree {} (index {}), centroid ({:.4}, {:.4}, {:.4})",
        representative_id,
        selection.index,
        selection.centroid.linearity,
        selection.centroid.branching,
        selection.centroid.cocluster
    );

    Ok(ScatterLayer { points, selection, representative_id })
}
