//! Monthly sales chart for the dashboard, drawn with Plotters into the Ratatui
//! buffer through `plotters-ratatui-backend`.
//!
//! Besides the sales line the chart marks the mean monthly sales as a flat
//! reference line and highlights the best month.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};
use rust_decimal::prelude::ToPrimitive;

use crate::domain::{MonthKey, MonthlySales};

const SALES_LINE: RGBColor = RGBColor(0, 255, 255);
const MEAN_LINE: RGBColor = RGBColor(110, 110, 110);
const PEAK_MARK: RGBColor = RGBColor(255, 215, 0);

/// Months since year 0, so consecutive months are one unit apart on the x axis.
pub(super) fn month_ordinal(m: MonthKey) -> f64 {
    (m.year as f64) * 12.0 + (m.month as f64 - 1.0)
}

/// Monthly sales in chart coordinates, with the bounds the axis ticks share.
pub struct MonthlySalesChart {
    /// (month ordinal, sales) in month order.
    pub points: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    /// Dollars; the lower bound sits at zero unless a month is negative.
    pub y_bounds: [f64; 2],
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl MonthlySalesChart {
    pub fn from_series(series: &[MonthlySales], fmt_x: fn(f64) -> String, fmt_y: fn(f64) -> String) -> Self {
        let points: Vec<(f64, f64)> = series
            .iter()
            .map(|p| (month_ordinal(p.month), p.sales.to_f64().unwrap_or(0.0)))
            .collect();
        let (x_bounds, y_bounds) = bounds(&points);
        Self {
            points,
            x_bounds,
            y_bounds,
            fmt_x,
            fmt_y,
        }
    }

    /// Mean of the plotted months (months without orders are not plotted).
    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().map(|&(_, y)| y).sum::<f64>() / self.points.len() as f64)
    }

    /// The best month; the earliest one wins a tie.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .copied()
            .fold(None, |best: Option<(f64, f64)>, p| match best {
                Some(b) if b.1 >= p.1 => Some(b),
                _ => Some(p),
            })
    }
}

fn bounds(points: &[(f64, f64)]) -> ([f64; 2], [f64; 2]) {
    let (mut x0, mut x1) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        x0 = x0.min(x);
        x1 = x1.max(x);
        y0 = y0.min(y);
        y1 = y1.max(y);
    }

    // A single month (or flat sales) still needs a non-empty range.
    if !(x0.is_finite() && x1.is_finite()) || x1 <= x0 {
        let mid = if x0.is_finite() { x0 } else { 0.0 };
        x0 = mid - 1.0;
        x1 = mid + 1.0;
    }
    if !(y0.is_finite() && y1.is_finite()) || y1 <= y0 {
        let mid = if y0.is_finite() { y0 } else { 0.0 };
        y0 = mid - 1.0;
        y1 = mid + 1.0;
    }
    let pad = ((y1 - y0) * 0.05).max(1e-12);
    let y_lo = if y0 >= 0.0 { 0.0 } else { y0 - pad };

    ([x0, x1], [y_lo, y1 + pad])
}

impl Widget for MonthlySalesChart {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let mean = self.mean();
        let peak = self.peak();
        let Self {
            points,
            x_bounds: [x0, x1],
            y_bounds: [y0, y1],
            fmt_x,
            fmt_y,
        } = self;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_x(*v))
                .y_label_formatter(&|v| fmt_y(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            if let Some(mean) = mean {
                chart.draw_series(LineSeries::new([(x0, mean), (x1, mean)], &MEAN_LINE))?;
            }
            chart.draw_series(LineSeries::new(points.iter().copied(), &SALES_LINE))?;
            // Circle radii come out mis-scaled on terminal cells; use pixels.
            chart.draw_series(points.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;
            if let Some(p) = peak {
                chart.draw_series(std::iter::once(Pixel::new(p, PEAK_MARK)))?;
            }
            Ok(())
        });

        widget.render(area, buf);
    }
}
