//! Formatted terminal output: KPI block, ranked tables, monthly series.
//!
//! We keep formatting code in one place so:
//! - the engine stays free of presentation concerns
//! - output changes are localized (important for snapshot tests)

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{FilterSpec, MonthlySales, Ranked};
use crate::io::ingest::LoadedDataset;
use crate::report::{Kpis, Presenter, RankedKind};

/// Console presenter: accumulates a plain-text report.
#[derive(Debug, Clone)]
pub struct TextPresenter {
    out: String,
    plot: Option<(usize, usize)>,
}

impl TextPresenter {
    /// `plot` is the ASCII plot size (columns, rows) for the time series, if any.
    pub fn new(plot: Option<(usize, usize)>) -> Self {
        Self {
            out: String::new(),
            plot,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Presenter for TextPresenter {
    type Error = std::convert::Infallible;

    fn kpis(&mut self, kpis: &Kpis) -> Result<(), Self::Error> {
        self.out.push_str(&format_kpis(kpis));
        self.out.push('\n');
        Ok(())
    }

    fn ranked(&mut self, kind: RankedKind, rows: &[Ranked]) -> Result<(), Self::Error> {
        self.out.push_str(&format!("=== {} ===\n", kind.title().to_uppercase()));
        self.out.push_str(&format_ranked_table(kind, rows));
        self.out.push('\n');
        Ok(())
    }

    fn series(&mut self, title: &str, points: &[MonthlySales]) -> Result<(), Self::Error> {
        self.out.push_str(&format!("=== {} ===\n", title.to_uppercase()));
        self.out.push_str(&format_monthly_table(points));
        if let Some((width, height)) = self.plot {
            if !points.is_empty() {
                self.out.push('\n');
                self.out.push_str(&crate::plot::render_series_plot(points, width, height));
            }
        }
        Ok(())
    }
}

/// Header describing the dataset and the applied filter.
pub fn format_run_header(loaded: &LoadedDataset, source: &str, spec: &FilterSpec, kept: usize) -> String {
    let mut out = String::new();

    out.push_str("=== superstore - Sales Analytics ===\n");
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!(
        "Rows: read={} | loaded={} | skipped={}\n",
        loaded.rows_read,
        loaded.dataset.len(),
        loaded.row_errors.len()
    ));
    for e in loaded.row_errors.iter().take(5) {
        out.push_str(&format!("  (skipped line {}) {}\n", e.line, e.message));
    }
    if loaded.row_errors.len() > 5 {
        out.push_str(&format!("  ... and {} more\n", loaded.row_errors.len() - 5));
    }
    out.push_str(&format!(
        "Filter: {} .. {} | categories: {} | regions: {}\n",
        spec.date_start(),
        spec.date_end(),
        join_set(spec.categories().iter()),
        join_set(spec.regions().iter()),
    ));
    out.push_str(&format!("Matching orders: {kept}\n\n"));

    out
}

fn join_set<'a>(values: impl Iterator<Item = &'a String>) -> String {
    let parts: Vec<&str> = values.map(String::as_str).collect();
    if parts.is_empty() {
        "(none)".to_string()
    } else {
        parts.join(", ")
    }
}

/// The KPI block.
pub fn format_kpis(kpis: &Kpis) -> String {
    let mut out = String::new();
    out.push_str("=== KEY METRICS ===\n");
    out.push_str(&format!("Orders: {}\n", kpis.order_count));
    out.push_str(&format!("Total Sales: {}\n", fmt_currency(kpis.total_sales)));
    out.push_str(&format!("Total Profit: {}\n", fmt_currency(kpis.total_profit)));
    out.push_str(&format!(
        "Average Order Value: {}\n",
        fmt_currency(kpis.average_order_value)
    ));
    out
}

/// A two-column table of a ranked list.
pub fn format_ranked_table(kind: RankedKind, rows: &[Ranked]) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<24} {:>16}\n", kind.key_label(), kind.value_label()).trim_end());
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<16}\n", "", "").trim_end());
    out.push('\n');

    if rows.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    for r in rows {
        out.push_str(format!("{:<24} {:>16}\n", truncate(&r.key, 24), fmt_currency(r.value)).trim_end());
        out.push('\n');
    }
    out
}

/// Month-by-month sales table.
pub fn format_monthly_table(points: &[MonthlySales]) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<8} {:>16}\n", "Month", "Sales ($)").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<16}\n", "", "").trim_end());
    out.push('\n');

    if points.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    for p in points {
        out.push_str(&format!("{:<8} {:>16}\n", p.month.to_string(), fmt_currency(p.sales)));
    }
    out
}

/// Format an amount as `$1,234.56` (two decimals, thousands separators).
///
/// Negative amounts keep the sign after the currency symbol: `$-5.00`.
pub fn fmt_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("${sign}{}.{frac_part}", group_thousands(int_part))
}

fn group_thousands(int_part: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MonthKey;
    use crate::report::{DASHBOARD_RANKINGS, present};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(fmt_currency(dec("0")), "$0.00");
        assert_eq!(fmt_currency(dec("150")), "$150.00");
        assert_eq!(fmt_currency(dec("2297200.8603")), "$2,297,200.86");
        assert_eq!(fmt_currency(dec("-6.8714")), "$-6.87");
        assert_eq!(fmt_currency(dec("999.995")), "$1,000.00");
        assert_eq!(fmt_currency(dec("-0.001")), "$0.00");
    }

    #[test]
    fn ranked_table_snapshot() {
        let rows = vec![
            Ranked { key: "Tech".to_string(), value: dec("200") },
            Ranked { key: "Furniture".to_string(), value: dec("100") },
        ];
        let txt = format_ranked_table(RankedKind::SalesByCategory, &rows);
        let expected = concat!(
            "Category                        Sales ($)\n",
            "------------------------ ----------------\n",
            "Tech                              $200.00\n",
            "Furniture                         $100.00\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn text_presenter_renders_all_sections() {
        let result = crate::domain::AggregateResult {
            order_count: 2,
            total_sales: dec("300"),
            total_profit: dec("5"),
            average_order_value: dec("150"),
            sales_by_category: vec![Ranked { key: "Tech".to_string(), value: dec("200") }],
            monthly_sales_series: vec![MonthlySales {
                month: MonthKey { year: 2023, month: 1 },
                sales: dec("100"),
            }],
            ..Default::default()
        };
        let mut presenter = TextPresenter::new(None);
        present(&result, &DASHBOARD_RANKINGS, &mut presenter).unwrap();
        let txt = presenter.finish();
        assert!(txt.contains("Total Sales: $300.00\n"));
        assert!(txt.contains("Average Order Value: $150.00\n"));
        assert!(txt.contains("=== PROFIT BY REGION ===\n"));
        assert!(txt.contains("(no data)\n"));
        assert!(txt.contains("2023-01           $100.00\n"));
    }
}
