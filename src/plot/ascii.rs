//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - monthly totals: `o`
//! - connecting line: `-`
//!
//! The x axis is calendar time, so months without orders show up as gaps
//! in spacing rather than being squeezed out.

use rust_decimal::prelude::ToPrimitive;

use crate::domain::{MonthKey, MonthlySales};

/// Render the monthly sales series.
pub fn render_series_plot(points: &[MonthlySales], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let xy: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (month_ordinal(p.month), p.sales.to_f64().unwrap_or(0.0)))
        .collect();

    let (x_min, x_max) = range(xy.iter().map(|&(x, _)| x)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(xy.iter().map(|&(_, y)| y)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first so the markers overlay it.
    let cells: Vec<(usize, usize)> = xy
        .iter()
        .map(|&(x, y)| (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height)))
        .collect();
    for pair in cells.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }
    for &(x, y) in &cells {
        grid[y][x] = 'o';
    }

    let first = points.first().map(|p| p.month.to_string()).unwrap_or_else(|| "-".to_string());
    let last = points.last().map(|p| p.month.to_string()).unwrap_or_else(|| "-".to_string());

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: month=[{first}, {last}] | sales=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn month_ordinal(m: MonthKey) -> f64 {
    (m.year as f64) * 12.0 + (m.month as f64 - 1.0)
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    if max > min {
        Some((min, max))
    } else {
        // Single point or flat series: widen so it lands mid-plot.
        Some((min - 1.0, max + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(year: i32, month: u32, sales: i64) -> MonthlySales {
        MonthlySales {
            month: MonthKey { year, month },
            sales: sales.into(),
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let points = vec![point(2023, 1, 100), point(2023, 10, 110)];
        let txt = render_series_plot(&points, 10, 5);
        let expected = concat!(
            "Plot: month=[2023-01, 2023-10] | sales=[99.50, 110.50]\n",
            "        -o\n",
            "      --\n",
            "    --\n",
            "  --\n",
            "o-\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_series_renders_blank_grid() {
        let txt = render_series_plot(&[], 10, 5);
        assert!(txt.starts_with("Plot: month=[-, -]"));
        assert_eq!(txt.lines().count(), 6);
    }
}
