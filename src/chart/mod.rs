//! Chart files (SVG) rendered with Plotters.
//!
//! Each ranked list becomes a horizontal bar chart and the monthly series a
//! line chart, one file per chart in the output directory:
//!
//! - `sales_by_category.svg`
//! - `profit_by_region.svg`
//! - `monthly_sales.svg`
//!
//! We use the SVG backend because it needs no native font stack.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::{AggregateResult, MonthKey, MonthlySales, Ranked};
use crate::error::AppError;
use crate::report::{Kpis, Presenter, RankedKind};

type DrawResult = Result<(), Box<dyn Error>>;

/// Chart-file presenter: one SVG per ranked list and one for the series.
#[derive(Debug, Clone)]
pub struct SvgPresenter {
    dir: PathBuf,
    size: (u32, u32),
    written: Vec<PathBuf>,
}

impl SvgPresenter {
    /// Creates `dir` if it does not exist.
    pub fn new(dir: &Path, size: (u32, u32)) -> Result<Self, AppError> {
        fs::create_dir_all(dir)
            .map_err(|e| AppError::new(4, format!("Failed to create chart dir '{}': {e}", dir.display())))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            size,
            written: Vec::new(),
        })
    }

    /// Paths of the files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn record(&mut self, path: PathBuf) {
        tracing::info!(path = %path.display(), "wrote chart");
        self.written.push(path);
    }
}

impl Presenter for SvgPresenter {
    type Error = AppError;

    fn kpis(&mut self, _kpis: &Kpis) -> Result<(), Self::Error> {
        // KPIs are scalar figures; they have no chart.
        Ok(())
    }

    fn ranked(&mut self, kind: RankedKind, rows: &[Ranked]) -> Result<(), Self::Error> {
        let path = self.dir.join(format!("{}.svg", kind.file_stem()));
        draw_bar_chart(&path, self.size, kind, rows)
            .map_err(|e| AppError::new(4, format!("Failed to draw chart '{}': {e}", path.display())))?;
        self.record(path);
        Ok(())
    }

    fn series(&mut self, title: &str, points: &[MonthlySales]) -> Result<(), Self::Error> {
        let path = self.dir.join("monthly_sales.svg");
        draw_line_chart(&path, self.size, title, points)
            .map_err(|e| AppError::new(4, format!("Failed to draw chart '{}': {e}", path.display())))?;
        self.record(path);
        Ok(())
    }
}

/// Write the dashboard chart set for `result` into `dir`.
pub fn write_charts(result: &AggregateResult, dir: &Path, size: (u32, u32)) -> Result<Vec<PathBuf>, AppError> {
    let mut presenter = SvgPresenter::new(dir, size)?;
    crate::report::present(result, &crate::report::DASHBOARD_RANKINGS, &mut presenter)?;
    Ok(presenter.written)
}

fn to_f64(v: Decimal) -> f64 {
    v.to_f64().unwrap_or(0.0)
}

/// Bar palette, cycled per bar (Plotters' `Palette99`).
fn bar_color(idx: usize) -> RGBColor {
    let (r, g, b) = Palette99::pick(idx).rgb();
    RGBColor(r, g, b)
}

fn draw_bar_chart(path: &Path, size: (u32, u32), kind: RankedKind, rows: &[Ranked]) -> DrawResult {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let values: Vec<f64> = rows.iter().map(|r| to_f64(r.value)).collect();
    let (x0, x1) = value_bounds(&values);
    let n = rows.len().max(1) as i32;

    let mut chart = ChartBuilder::on(&root)
        .caption(kind.title(), ("sans-serif", 24))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 120)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x0..x1, (0..n).into_segmented())?;

    // Largest value on top, as in the ranked list.
    let key_at = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => rows
            .get((n - 1 - *i) as usize)
            .map(|r| r.key.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(kind.value_label())
        .y_desc(kind.key_label())
        .y_labels(rows.len().max(1))
        .y_label_formatter(&key_at)
        .x_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(idx, &v)| {
        let row = n - 1 - idx as i32;
        Rectangle::new(
            [(0.0, SegmentValue::Exact(row)), (v, SegmentValue::Exact(row + 1))],
            bar_color(idx).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

fn draw_line_chart(path: &Path, size: (u32, u32), title: &str, points: &[MonthlySales]) -> DrawResult {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let xy: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (month_ordinal(p.month), to_f64(p.sales)))
        .collect();

    let (x0, x1) = match (xy.first(), xy.last()) {
        (Some(&(a, _)), Some(&(b, _))) if b > a => (a, b),
        (Some(&(a, _)), _) => (a - 1.0, a + 1.0),
        _ => (0.0, 1.0),
    };
    let y_max = xy.iter().map(|&(_, y)| y).fold(0.0_f64, f64::max);
    let y1 = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x0..x1, 0.0..y1)?;

    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Sales ($)")
        .x_labels(8)
        .x_label_formatter(&|v| month_label(*v))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    let line_color = RGBColor(31, 119, 180);
    chart.draw_series(LineSeries::new(xy.iter().copied(), &line_color))?;
    chart.draw_series(xy.iter().map(|&(x, y)| Circle::new((x, y), 3, line_color.filled())))?;

    root.present()?;
    Ok(())
}

/// Axis bounds that always include zero, padded by 5%.
fn value_bounds(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max - min <= 0.0 {
        return (0.0, 1.0);
    }
    let pad = (max - min) * 0.05;
    (if min < 0.0 { min - pad } else { 0.0 }, if max > 0.0 { max + pad } else { 0.0 })
}

fn month_ordinal(m: MonthKey) -> f64 {
    (m.year as f64) * 12.0 + (m.month as f64 - 1.0)
}

fn month_label(ordinal: f64) -> String {
    let o = ordinal.round() as i64;
    let year = o.div_euclid(12);
    let month = o.rem_euclid(12) + 1;
    format!("{year:04}-{month:02}")
}
