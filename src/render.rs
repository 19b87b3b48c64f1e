//! Chart layout and drawing with plotters: bitmap charts are encoded through
//! `image`, vector charts are written as SVG text.

use crate::charts::{
    population_count_histogram, vaf_axis_range, ChartConfig, DensityGrid, Ensemble, Histogram, MarkerKind,
    ScatterLayer,
};
use crate::error::RenderError;
use image::RgbImage;
use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};

const FONT: &str = "sans-serif";
const FONT_SIZE: u32 = 16;
const TITLE_SIZE: u32 = 24;
const HISTOGRAM_HEIGHT: u32 = 450;
const SCATTER_HEIGHT: u32 = 1000;

const BAR_COLOR: RGBColor = RGBColor(51, 102, 204);
const POINT_COLOR: RGBColor = RGBColor(31, 119, 180);
const REPRESENTATIVE_COLOR: RGBColor = RGBColor(214, 39, 40);
const MEAN_COLOR: RGBColor = RGBColor(255, 127, 14);

/// Viridis colormap stops, dark to light
const VIRIDIS: [RGBColor; 9] = [
    RGBColor(68, 1, 84),
    RGBColor(71, 44, 122),
    RGBColor(59, 81, 139),
    RGBColor(44, 113, 142),
    RGBColor(33, 144, 141),
    RGBColor(39, 173, 129),
    RGBColor(92, 200, 99),
    RGBColor(170, 220, 50),
    RGBColor(253, 231, 37),
];

/// Interpolate the viridis colormap at `t` in [0, 1]
fn viridis(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f64;
    let i = (t.floor() as usize).min(VIRIDIS.len() - 2);
    let f = t - i as f64;
    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Chart {
    Histogram {
        histogram: Histogram,
        /// Fixed x-axis range; defaults to the bucket range
        x_range: Option<(f64, f64)>,
    },
    Columns {
        rows: Vec<(String, usize)>,
    },
    Scatter {
        layer: ScatterLayer,
        density: DensityGrid,
    },
}

#[derive(Debug, Clone)]
pub struct ChartSpec {
    /// File stem of the written chart
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
    pub chart: Chart,
}

/// Lay out every chart for an ensemble, in display order.
///
/// `vafs` is absent when no mutation file was given; `scatter` is absent when
/// the representative tree could not be selected.
pub fn plan_charts(
    ensemble: &Ensemble,
    vafs: Option<&[f64]>,
    scatter: Option<ScatterLayer>,
    config: &ChartConfig,
    width: u32,
) -> Vec<ChartSpec> {
    let mut specs = Vec::new();

    if let Some(vafs) = vafs {
        let (vaf_min, vaf_max) = vaf_axis_range(vafs);
        specs.push(ChartSpec {
            name: "vafs".to_string(),
            title: format!("VAFs ({} variants)", vafs.len()),
            x_label: "VAF".to_string(),
            y_label: "Number of variants".to_string(),
            width,
            height: HISTOGRAM_HEIGHT,
            chart: Chart::Histogram {
                histogram: Histogram::with_bucket_size(vafs, vaf_min, vaf_max, config.vaf_bucket_size),
                x_range: Some((vaf_min, vaf_max)),
            },
        });
    }

    if let Some(layer) = scatter {
        specs.push(ChartSpec {
            name: "lin_vs_branch".to_string(),
            title: "Branching index vs. linearity index".to_string(),
            x_label: "Linearity index".to_string(),
            y_label: "Branching index".to_string(),
            width,
            height: SCATTER_HEIGHT,
            chart: Chart::Scatter {
                layer,
                density: DensityGrid::new(&ensemble.shapes, config.density_bins, config.contour_levels),
            },
        });
    }

    for (i, values) in ensemble.cell_prevs.iter().enumerate() {
        specs.push(ChartSpec {
            name: format!("cell_prev_pop{}", i + 1),
            title: format!(
                "Cellular prevalence (cancerous population {}) ({} values)",
                i + 1,
                values.len()
            ),
            x_label: "Cellular prevalence".to_string(),
            y_label: "Trees".to_string(),
            width,
            height: HISTOGRAM_HEIGHT,
            chart: Chart::Histogram { histogram: Histogram::auto(values), x_range: None },
        });
    }

    for (i, values) in ensemble.ssm_counts.iter().enumerate() {
        specs.push(ChartSpec {
            name: format!("ssm_counts_pop{}", i + 1),
            title: format!("Number of SSMs (cancerous population {}) ({} values)", i + 1, values.len()),
            x_label: "SSMs".to_string(),
            y_label: "Trees".to_string(),
            width,
            height: HISTOGRAM_HEIGHT,
            chart: Chart::Histogram { histogram: Histogram::auto(values), x_range: None },
        });
    }

    let rows = population_count_histogram(&ensemble.pop_counts)
        .into_iter()
        .map(|(count, trees)| (count.to_string(), trees))
        .collect();
    specs.push(ChartSpec {
        name: "pop_counts".to_string(),
        title: format!("Distribution of cancerous populations ({} values)", ensemble.pop_counts.len()),
        x_label: "Number of cancerous populations".to_string(),
        y_label: "Trees".to_string(),
        width,
        height: HISTOGRAM_HEIGHT,
        chart: Chart::Columns { rows },
    });

    specs
}

type DrawResult = Result<(), Box<dyn Error>>;

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    histogram: &Histogram,
    x_range: Option<(f64, f64)>,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = x_range.or_else(|| histogram.range()).unwrap_or((0.0, 1.0));
    let y_max = histogram.max_count().max(1) as u32;

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .caption(&spec.title, (FONT, TITLE_SIZE))
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0u32..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .label_style((FONT, FONT_SIZE))
        .draw()?;

    chart.draw_series(
        histogram
            .buckets
            .iter()
            .filter(|b| b.count > 0)
            .map(|b| Rectangle::new([(b.start, 0), (b.end, b.count as u32)], BAR_COLOR.filled())),
    )?;

    Ok(())
}

fn draw_columns<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, spec: &ChartSpec, rows: &[(String, usize)]) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let n = rows.len().max(1) as u32;
    let y_max = rows.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1) as u32;

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .caption(&spec.title, (FONT, TITLE_SIZE))
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..n).into_segmented(), 0u32..y_max)?;

    let row_label = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => rows.get(*i as usize).map(|(label, _)| label.clone()).unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n as usize)
        .x_label_formatter(&row_label)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .label_style((FONT, FONT_SIZE))
        .draw()?;

    chart.draw_series(
        plotters::series::Histogram::vertical(&chart)
            .style(BAR_COLOR.filled())
            .margin(10)
            .data(rows.iter().enumerate().map(|(i, (_, count))| (i as u32, *count as u32))),
    )?;

    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    layer: &ScatterLayer,
    density: &DensityGrid,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let pad = |(lo, hi): (f64, f64)| {
        let m = (hi - lo) * 0.05;
        (lo - m, hi + m)
    };
    let (x_min, x_max) = pad(density.x_range);
    let (y_min, y_max) = pad(density.y_range);

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .caption(&spec.title, (FONT, TITLE_SIZE))
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .label_style((FONT, FONT_SIZE))
        .draw()?;

    let cell_w = (density.x_range.1 - density.x_range.0) / density.bins as f64;
    let cell_h = (density.y_range.1 - density.y_range.0) / density.bins as f64;
    chart.draw_series((0..density.bins).flat_map(|iy| (0..density.bins).map(move |ix| (ix, iy))).filter_map(
        |(ix, iy)| {
            let level = density.level(ix, iy);
            if level == 0 {
                return None;
            }
            let x0 = density.x_range.0 + ix as f64 * cell_w;
            let y0 = density.y_range.0 + iy as f64 * cell_h;
            let color = viridis(level as f64 / density.levels as f64);
            Some(Rectangle::new([(x0, y0), (x0 + cell_w, y0 + cell_h)], color.filled()))
        },
    ))?;

    // Plain points first so the highlighted markers stay on top
    chart.draw_series(
        layer
            .points
            .iter()
            .filter(|p| p.marker == MarkerKind::Dot)
            .map(|p| Circle::new((p.x, p.y), p.size / 2, POINT_COLOR.filled())),
    )?;

    let label_font = (FONT, FONT_SIZE).into_font();
    chart.draw_series(layer.points.iter().filter(|p| p.marker == MarkerKind::Cross).map(|p| {
        let arm = p.size as i32 / 2;
        EmptyElement::at((p.x, p.y))
            + Cross::new((0, 0), arm, REPRESENTATIVE_COLOR.stroke_width(3))
            + Text::new(p.label.clone(), (arm + 6, -arm - 6), label_font.clone())
    }))?;
    chart.draw_series(layer.points.iter().filter(|p| p.marker == MarkerKind::Diamond).map(|p| {
        let r = p.size as i32 / 2;
        EmptyElement::at((p.x, p.y))
            + Polygon::new(vec![(0, -r), (r, 0), (0, r), (-r, 0)], MEAN_COLOR.filled())
            + Text::new(p.label.clone(), (r + 6, -r - 6), label_font.clone())
    }))?;

    Ok(())
}

/// Draw one chart onto a plotters drawing area.
pub fn draw<DB: DrawingBackend>(spec: &ChartSpec, root: &DrawingArea<DB, Shift>) -> DrawResult
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    match &spec.chart {
        Chart::Histogram { histogram, x_range } => draw_histogram(root, spec, histogram, *x_range)?,
        Chart::Columns { rows } => draw_columns(root, spec, rows)?,
        Chart::Scatter { layer, density } => draw_scatter(root, spec, layer, density)?,
    }
    root.present()?;
    Ok(())
}

/// Render a chart to an SVG document.
pub fn render_svg(spec: &ChartSpec) -> Result<String, RenderError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (spec.width, spec.height)).into_drawing_area();
        draw(spec, &root).map_err(|e| RenderError::Plot(e.to_string()))?;
    }
    Ok(svg)
}

/// Render a chart to an RGB image.
pub fn render_png(spec: &ChartSpec) -> Result<RgbImage, RenderError> {
    let mut buffer = vec![0u8; spec.width as usize * spec.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (spec.width, spec.height)).into_drawing_area();
        draw(spec, &root).map_err(|e| RenderError::Plot(e.to_string()))?;
    }
    RgbImage::from_raw(spec.width, spec.height, buffer)
        .ok_or_else(|| RenderError::Plot(format!("pixel buffer does not fit {}x{}", spec.width, spec.height)))
}

/// Render a chart and write it to `dir/<name>.<ext>`.
pub fn write_chart(spec: &ChartSpec, dir: &Path, format: OutputFormat) -> Result<PathBuf, RenderError> {
    let path = dir.join(format!("{}.{}", spec.name, format.extension()));
    debug!("Rendering {} ({}x{})", spec.name, spec.width, spec.height);

    match format {
        OutputFormat::Png => render_png(spec)?.save(&path)?,
        OutputFormat::Svg => std::fs::write(&path, render_svg(spec)?)?,
    }

    Ok(path)
}
