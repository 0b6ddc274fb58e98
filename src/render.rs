//! Comparison charts
//!
//! Renders a [`Comparison`] as PNG with `plotters`:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │               cross-GPU decode attention (MHA)                   │
//! ├─────────────────────┬─────────────────────┬──────────────────────┤
//! │  ms / tok vs S      │  GB/s vs S + peaks  │  % of peak vs S      │
//! ├─────────────────────┴─────────────────────┴──────────────────────┤
//! │           math SDP only (flash/mem-efficient disabled)           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sizes are fixed at 150 DPI. All x axes are log base 2.

use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;

use crate::compare::{Comparison, GpuSeries};
use crate::error::{AttnCompareError, Result};

/// Output resolution
pub const DPI: u32 = 150;

/// Three-panel chart size (15 x 5 in)
pub const COMPARISON_SIZE: (u32, u32) = (15 * DPI, 5 * DPI);

/// Percent-of-peak chart size (8 x 5 in)
pub const PERCENT_SIZE: (u32, u32) = (8 * DPI, 5 * DPI);

/// Footer caption: only the reference attention path was measured
pub const FOOTNOTE: &str = "math SDP only (flash/mem-efficient disabled)";

const FOOTER_PX: i32 = 36;
const FONT: &str = "sans-serif";

/// Matplotlib "tab10" cycle
const PALETTE: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

const REFERENCE_GREY: RGBColor = RGBColor(0x80, 0x80, 0x80);

/// Colour for the series at `index` in legend order
#[must_use]
pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// One chart panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    /// Milliseconds per token
    Latency,
    /// Measured bandwidth with per-GPU peak lines
    Bandwidth,
    /// Bandwidth as % of peak with a 100% line
    PercentOfPeak,
}

impl Panel {
    /// Panels of the comparison chart, left to right
    pub const ALL: [Panel; 3] = [Panel::Latency, Panel::Bandwidth, Panel::PercentOfPeak];

    /// Y axis label
    #[must_use]
    pub fn y_desc(self) -> &'static str {
        match self {
            Self::Latency => "ms / tok",
            Self::Bandwidth => "bandwidth (GB/s)",
            Self::PercentOfPeak => "% of peak bandwidth",
        }
    }

    /// Points for one series; `None` when the panel does not apply
    #[must_use]
    pub fn points(self, series: &GpuSeries) -> Option<Vec<(f64, f64)>> {
        let raw = match self {
            Self::Latency => series.latency(),
            Self::Bandwidth => series.bandwidth(),
            Self::PercentOfPeak => series.percent_of_peak()?,
        };
        Some(
            raw.into_iter()
                .filter(|&(s, _)| s > 0)
                .map(|(s, y)| (s as f64, y))
                .collect(),
        )
    }

    /// Horizontal reference lines as `(y, series index)`; `None` index is grey
    #[must_use]
    pub fn reference_lines(self, cmp: &Comparison) -> Vec<(f64, Option<usize>)> {
        match self {
            Self::Latency => Vec::new(),
            Self::Bandwidth => cmp
                .series
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.peak_bw_gbs().map(|peak| (peak, Some(i))))
                .collect(),
            Self::PercentOfPeak => vec![(100.0, None)],
        }
    }
}

/// Log2 x range padded by a quarter octave on each side
#[must_use]
pub fn x_range(cmp: &Comparison) -> Range<f64> {
    match cmp.seq_len_bounds() {
        Some((lo, hi)) => {
            let lo = lo.max(1) as f64;
            let hi = (hi.max(1) as f64).max(lo);
            let pad = 2f64.powf(0.25);
            (lo / pad)..(hi * pad)
        },
        None => 1.0..2.0,
    }
}

/// Linear y range from zero to 10% above the tallest point or reference line
#[must_use]
pub fn y_range(cmp: &Comparison, panel: Panel) -> Range<f64> {
    let data_max = cmp
        .series
        .iter()
        .filter_map(|s| panel.points(s))
        .flatten()
        .map(|(_, y)| y)
        .fold(0.0f64, f64::max);
    let ref_max = panel
        .reference_lines(cmp)
        .into_iter()
        .map(|(y, _)| y)
        .fold(0.0f64, f64::max);

    let top = data_max.max(ref_max);
    if top > 0.0 && top.is_finite() {
        0.0..top * 1.1
    } else {
        0.0..1.0
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> AttnCompareError {
    AttnCompareError::RenderError {
        reason: e.to_string(),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| AttnCompareError::IoError {
                message: format!("Failed to create {}: {e}", dir.display()),
            })
        },
        _ => Ok(()),
    }
}

/// Draw a single panel into `area`
///
/// # Errors
///
/// Returns `RenderError` if the backend fails.
pub fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    cmp: &Comparison,
    panel: Panel,
) -> Result<()> {
    let x = x_range(cmp);
    let (x_lo, x_hi) = (x.start, x.end);

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x.log_scale().base(2.0), y_range(cmp, panel))
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("sequence length")
        .y_desc(panel.y_desc())
        .x_label_formatter(&|v| format!("{v:.0}"))
        .draw()
        .map_err(render_err)?;

    let mut labelled = false;

    for (idx, series) in cmp.series.iter().enumerate() {
        let Some(points) = panel.points(series) else {
            continue;
        };
        if points.is_empty() {
            continue;
        }
        let color = series_color(idx);

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(render_err)?
            .label(series.label())
            .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 20, ly)], color.stroke_width(2)));
        chart
            .draw_series(points.iter().map(|&(sx, sy)| Circle::new((sx, sy), 3, color.filled())))
            .map_err(render_err)?;
        labelled = true;
    }

    for (y, owner) in panel.reference_lines(cmp) {
        let line = vec![(x_lo, y), (x_hi, y)];
        match owner {
            Some(idx) => {
                let color = series_color(idx);
                chart
                    .draw_series(LineSeries::new(line, color.mix(0.5).stroke_width(1)))
                    .map_err(render_err)?
                    .label(format!("peak ({y:.0})"))
                    .legend(move |(lx, ly)| {
                        PathElement::new(vec![(lx, ly), (lx + 20, ly)], color.mix(0.5).stroke_width(1))
                    });
                labelled = true;
            },
            None => {
                chart
                    .draw_series(LineSeries::new(line, REFERENCE_GREY.mix(0.5).stroke_width(1)))
                    .map_err(render_err)?;
            },
        }
    }

    if labelled {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font((FONT, 12))
            .draw()
            .map_err(render_err)?;
    }

    Ok(())
}

/// Split `root` into title, plot body, and footnote; returns the body
fn frame<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
) -> Result<DrawingArea<DB, Shift>> {
    root.fill(&WHITE).map_err(render_err)?;
    let body = root.titled(title, (FONT, 28)).map_err(render_err)?;

    let height = i32::try_from(body.dim_in_pixel().1).unwrap_or(i32::MAX);
    let (plots, footer) = body.split_vertically((height - FOOTER_PX).max(0));
    footer
        .titled(FOOTNOTE, (FONT, 16).into_font().style(FontStyle::Italic))
        .map_err(render_err)?;

    Ok(plots)
}

/// Draw the three-panel comparison into `root`
///
/// # Errors
///
/// Returns `RenderError` if the backend fails.
pub fn draw_comparison<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    cmp: &Comparison,
) -> Result<()> {
    let plots = frame(root, &cmp.title())?;
    let areas = plots.split_evenly((1, Panel::ALL.len()));
    for (area, panel) in areas.iter().zip(Panel::ALL) {
        draw_panel(area, cmp, panel)?;
    }
    Ok(())
}

/// Draw only the percent-of-peak panel into `root`
///
/// # Errors
///
/// Returns `RenderError` if the backend fails.
pub fn draw_percent_of_peak<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    cmp: &Comparison,
) -> Result<()> {
    let title = format!("{}: % of peak bandwidth", cmp.title());
    let plots = frame(root, &title)?;
    draw_panel(&plots, cmp, Panel::PercentOfPeak)
}

/// Write the three-panel comparison PNG
///
/// # Errors
///
/// Returns `IoError` if the parent directory cannot be created, `RenderError`
/// if drawing or encoding fails.
pub fn render_comparison(cmp: &Comparison, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let root = BitMapBackend::new(path, COMPARISON_SIZE).into_drawing_area();
    draw_comparison(&root, cmp)?;
    root.present().map_err(render_err)
}

/// Write the standalone percent-of-peak PNG
///
/// # Errors
///
/// As [`render_comparison`].
pub fn render_percent_of_peak(cmp: &Comparison, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let root = BitMapBackend::new(path, PERCENT_SIZE).into_drawing_area();
    draw_percent_of_peak(&root, cmp)?;
    root.present().map_err(render_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Alignment;
    use crate::gpu::GpuCatalog;
    use crate::results::{BenchmarkRow, ResultTable};

    fn table(gpu: &str, points: &[(u64, f64)]) -> ResultTable {
        let rows = points
            .iter()
            .map(|&(s, bw)| BenchmarkRow {
                gpu: Some(gpu.to_string()),
                label: "MHA".to_string(),
                seq_len: s,
                ms_tok: s as f64 / 1e4,
                bw_gbs: bw,
                kv_mb: None,
                peak_mb: None,
            })
            .collect();
        ResultTable::from_rows(format!("{gpu}.csv"), rows).unwrap()
    }

    fn comparison() -> Comparison {
        let tables = vec![
            table("NVIDIA H100 80GB HBM3", &[(256, 900.0), (8192, 2800.0)]),
            table("NVIDIA GeForce RTX 2060", &[(256, 150.0), (1024, 280.0)]),
            table("UnknownGPU9000", &[(512, 50.0)]),
        ];
        Comparison::build(&tables, &GpuCatalog::builtin(), "MHA", Alignment::PerGpu).unwrap()
    }

    #[test]
    fn test_sizes_follow_dpi() {
        assert_eq!(COMPARISON_SIZE, (2250, 750));
        assert_eq!(PERCENT_SIZE, (1200, 750));
    }

    #[test]
    fn test_series_color_cycles() {
        assert_eq!(series_color(0), series_color(10));
        assert_ne!(series_color(0), series_color(1));
    }

    #[test]
    fn test_x_range_pads_log_bounds() {
        let x = x_range(&comparison());
        assert!(x.start < 256.0 && x.start > 128.0);
        assert!(x.end > 8192.0 && x.end < 16384.0);
    }

    #[test]
    fn test_x_range_empty_comparison() {
        let cmp = Comparison::build(&[], &GpuCatalog::builtin(), "MHA", Alignment::PerGpu).unwrap();
        assert_eq!(x_range(&cmp), 1.0..2.0);
        assert_eq!(y_range(&cmp, Panel::Latency), 0.0..1.0);
    }

    #[test]
    fn test_y_range_includes_peak_lines() {
        let cmp = comparison();
        let y = y_range(&cmp, Panel::Bandwidth);
        assert!((y.end - 3350.0 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_y_range_percent_includes_hundred() {
        let y = y_range(&comparison(), Panel::PercentOfPeak);
        assert!(y.end >= 110.0);
    }

    #[test]
    fn test_panel_points() {
        let cmp = comparison();
        let h100 = &cmp.series[0];
        assert_eq!(h100.label(), "H100 SXM");
        assert_eq!(
            Panel::Bandwidth.points(h100).unwrap(),
            vec![(256.0, 900.0), (8192.0, 2800.0)]
        );
        let unknown = &cmp.series[2];
        assert!(Panel::PercentOfPeak.points(unknown).is_none());
        assert_eq!(Panel::Latency.points(unknown).unwrap().len(), 1);
    }

    #[test]
    fn test_reference_lines() {
        let cmp = comparison();
        assert!(Panel::Latency.reference_lines(&cmp).is_empty());
        assert_eq!(
            Panel::Bandwidth.reference_lines(&cmp),
            vec![(3350.0, Some(0)), (336.0, Some(1))]
        );
        assert_eq!(Panel::PercentOfPeak.reference_lines(&cmp), vec![(100.0, None)]);
    }

    #[test]
    #[ignore = "requires system fonts for text rasterization"]
    fn test_render_comparison_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/compare.png");
        render_comparison(&comparison(), &path).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    #[ignore = "requires system fonts for text rasterization"]
    fn test_render_percent_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compare-pct.png");
        render_percent_of_peak(&comparison(), &path).unwrap();
        assert!(path.exists());
    }
}
