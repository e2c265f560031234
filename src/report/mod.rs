//! Reporting: presenting aggregate results and profiling datasets.
//!
//! The engine returns plain data; every output surface implements
//! [`Presenter`] and is driven by [`present`]:
//! - console text (`format::TextPresenter`)
//! - SVG chart files (`crate::chart::SvgPresenter`)

use crate::domain::{AggregateResult, MonthlySales, Ranked};

pub mod format;
pub mod profile;

pub use format::*;
pub use profile::*;

/// Key figures shown at the top of every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kpis {
    pub order_count: usize,
    pub total_sales: rust_decimal::Decimal,
    pub total_profit: rust_decimal::Decimal,
    pub average_order_value: rust_decimal::Decimal,
}

impl From<&AggregateResult> for Kpis {
    fn from(r: &AggregateResult) -> Self {
        Self {
            order_count: r.order_count,
            total_sales: r.total_sales,
            total_profit: r.total_profit,
            average_order_value: r.average_order_value,
        }
    }
}

/// Which grouped sum a ranked list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankedKind {
    SalesByCategory,
    ProfitByCategory,
    SalesByRegion,
    ProfitByRegion,
}

impl RankedKind {
    pub fn title(self) -> &'static str {
        match self {
            RankedKind::SalesByCategory => "Sales by Category",
            RankedKind::ProfitByCategory => "Profit by Category",
            RankedKind::SalesByRegion => "Sales by Region",
            RankedKind::ProfitByRegion => "Profit by Region",
        }
    }

    pub fn key_label(self) -> &'static str {
        match self {
            RankedKind::SalesByCategory | RankedKind::ProfitByCategory => "Category",
            RankedKind::SalesByRegion | RankedKind::ProfitByRegion => "Region",
        }
    }

    pub fn value_label(self) -> &'static str {
        match self {
            RankedKind::SalesByCategory | RankedKind::SalesByRegion => "Sales ($)",
            RankedKind::ProfitByCategory | RankedKind::ProfitByRegion => "Profit ($)",
        }
    }

    /// File stem used when the list is written as a chart.
    pub fn file_stem(self) -> &'static str {
        match self {
            RankedKind::SalesByCategory => "sales_by_category",
            RankedKind::ProfitByCategory => "profit_by_category",
            RankedKind::SalesByRegion => "sales_by_region",
            RankedKind::ProfitByRegion => "profit_by_region",
        }
    }
}

/// One output surface for aggregate results.
///
/// One method per output shape: KPI block, ranked list, time series.
pub trait Presenter {
    type Error;

    fn kpis(&mut self, kpis: &Kpis) -> Result<(), Self::Error>;

    fn ranked(&mut self, kind: RankedKind, rows: &[Ranked]) -> Result<(), Self::Error>;

    fn series(&mut self, title: &str, points: &[MonthlySales]) -> Result<(), Self::Error>;
}

/// Which ranked lists a presenter receives.
pub const DASHBOARD_RANKINGS: [RankedKind; 2] = [RankedKind::SalesByCategory, RankedKind::ProfitByRegion];
pub const ALL_RANKINGS: [RankedKind; 4] = [
    RankedKind::SalesByCategory,
    RankedKind::ProfitByCategory,
    RankedKind::SalesByRegion,
    RankedKind::ProfitByRegion,
];

/// Feed an aggregate result through a presenter: KPIs, the selected ranked
/// lists, then the monthly sales series.
pub fn present<P: Presenter>(
    result: &AggregateResult,
    rankings: &[RankedKind],
    presenter: &mut P,
) -> Result<(), P::Error> {
    presenter.kpis(&Kpis::from(result))?;
    for &kind in rankings {
        presenter.ranked(kind, ranked_rows(result, kind))?;
    }
    presenter.series("Monthly Sales Over Time", &result.monthly_sales_series)
}

/// The ranked list of `result` selected by `kind`.
pub fn ranked_rows(result: &AggregateResult, kind: RankedKind) -> &[Ranked] {
    match kind {
        RankedKind::SalesByCategory => &result.sales_by_category,
        RankedKind::ProfitByCategory => &result.profit_by_category,
        RankedKind::SalesByRegion => &result.sales_by_region,
        RankedKind::ProfitByRegion => &result.profit_by_region,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Presenter for Recorder {
        type Error = std::convert::Infallible;

        fn kpis(&mut self, kpis: &Kpis) -> Result<(), Self::Error> {
            self.calls.push(format!("kpis:{}", kpis.order_count));
            Ok(())
        }

        fn ranked(&mut self, kind: RankedKind, rows: &[Ranked]) -> Result<(), Self::Error> {
            self.calls.push(format!("{}:{}", kind.file_stem(), rows.len()));
            Ok(())
        }

        fn series(&mut self, _title: &str, points: &[MonthlySales]) -> Result<(), Self::Error> {
            self.calls.push(format!("series:{}", points.len()));
            Ok(())
        }
    }

    #[test]
    fn present_calls_each_shape_in_order() {
        let result = AggregateResult {
            order_count: 3,
            sales_by_category: vec![Ranked {
                key: "Tech".to_string(),
                value: 1.into(),
            }],
            ..AggregateResult::default()
        };
        let mut rec = Recorder::default();
        present(&result, &DASHBOARD_RANKINGS, &mut rec).unwrap();
        assert_eq!(
            rec.calls,
            vec!["kpis:3", "sales_by_category:1", "profit_by_region:0", "series:0"]
        );
    }
}
