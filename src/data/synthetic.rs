//! Synthetic Superstore-style sales data.
//!
//! Used for demos and tests when no real export is at hand. Output is fully
//! determined by `SampleConfig` (seeded RNG), so the same config always yields
//! the same rows.

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::domain::{Dataset, Record};
use crate::error::{AppError, ValidationError};

pub const SAMPLE_HEADERS: [&str; 9] = [
    "Row ID",
    "Order ID",
    "Order Date",
    "Ship Mode",
    "Segment",
    "Category",
    "Region",
    "Sales",
    "Profit",
];

const CATEGORIES: [&str; 3] = ["Furniture", "Office Supplies", "Technology"];
const REGIONS: [&str; 4] = ["Central", "East", "South", "West"];
const SHIP_MODES: [&str; 4] = ["Standard Class", "Second Class", "First Class", "Same Day"];
const SEGMENTS: [&str; 3] = ["Consumer", "Corporate", "Home Office"];

// log-normal sales: median ~ exp(4.0) = $55, long right tail
const SALES_LN_MU: f64 = 4.0;
const SALES_LN_SIGMA: f64 = 1.2;

// Profit margin per order; clamped so heavy discounts stay plausible.
const MARGIN_MEAN: f64 = 0.12;
const MARGIN_STD: f64 = 0.2;
const MARGIN_MIN: f64 = -0.8;
const MARGIN_MAX: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleConfig {
    pub rows: usize,
    pub seed: u64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rows: 500,
            seed: 42,
            start: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2017, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

/// Generate `config.rows` orders spread uniformly over `[start, end]`.
pub fn generate_dataset(config: &SampleConfig) -> Result<Dataset, AppError> {
    if config.rows == 0 {
        return Err(AppError::new(2, "Sample row count must be > 0."));
    }
    if config.start > config.end {
        return Err(ValidationError::InvertedDateRange {
            start: config.start,
            end: config.end,
        }
        .into());
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let sales_dist = LogNormal::new(SALES_LN_MU, SALES_LN_SIGMA)
        .map_err(|e| AppError::new(4, format!("Sales distribution error: {e}")))?;
    let margin_dist = Normal::new(MARGIN_MEAN, MARGIN_STD)
        .map_err(|e| AppError::new(4, format!("Margin distribution error: {e}")))?;

    let span_days = (config.end - config.start).num_days();
    let mut records = Vec::with_capacity(config.rows);

    for i in 0..config.rows {
        let order_date = config.start + Duration::days(rng.gen_range(0..=span_days));
        let category = *CATEGORIES.choose(&mut rng).unwrap_or(&CATEGORIES[0]);
        let region = *REGIONS.choose(&mut rng).unwrap_or(&REGIONS[0]);
        let ship_mode = *SHIP_MODES.choose(&mut rng).unwrap_or(&SHIP_MODES[0]);
        let segment = *SEGMENTS.choose(&mut rng).unwrap_or(&SEGMENTS[0]);

        let sales_f = sales_dist.sample(&mut rng);
        let margin = margin_dist.sample(&mut rng).clamp(MARGIN_MIN, MARGIN_MAX);

        let sales = to_decimal(sales_f, 2)?;
        let profit = to_decimal(sales_f * margin, 4)?;

        let mut record = Record::new(order_date, category, region, sales, profit);
        record.fields = vec![
            (i + 1).to_string(),
            format!("US-{}-{:06}", order_date.format("%Y"), i + 1),
            order_date.format("%m/%d/%Y").to_string(),
            ship_mode.to_string(),
            segment.to_string(),
            category.to_string(),
            region.to_string(),
            sales.to_string(),
            profit.to_string(),
        ];
        records.push(record);
    }

    tracing::debug!(rows = records.len(), seed = config.seed, "generated sample dataset");
    Ok(Dataset::new(
        SAMPLE_HEADERS.iter().map(|h| h.to_string()).collect(),
        records,
    ))
}

fn to_decimal(value: f64, dp: u32) -> Result<Decimal, AppError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(dp))
        .ok_or_else(|| AppError::new(4, format!("Generated amount {value} is not representable.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(seed: u64) -> SampleConfig {
        SampleConfig {
            rows: 50,
            seed,
            ..SampleConfig::default()
        }
    }

    #[test]
    fn same_seed_same_rows() {
        let a = generate_dataset(&small(7)).unwrap();
        let b = generate_dataset(&small(7)).unwrap();
        assert_eq!(a.records, b.records);

        let c = generate_dataset(&small(8)).unwrap();
        assert_ne!(a.records, c.records);
    }

    #[test]
    fn rows_respect_domain() {
        let config = small(1);
        let ds = generate_dataset(&config).unwrap();
        assert_eq!(ds.len(), 50);
        assert_eq!(ds.headers.len(), SAMPLE_HEADERS.len());
        for r in &ds.records {
            assert!(r.order_date >= config.start && r.order_date <= config.end);
            assert!(r.sales >= Decimal::ZERO);
            assert!(CATEGORIES.contains(&r.category.as_str()));
            assert!(REGIONS.contains(&r.region.as_str()));
            assert_eq!(r.fields.len(), SAMPLE_HEADERS.len());
        }
    }

    #[test]
    fn rejects_bad_config() {
        let zero = SampleConfig {
            rows: 0,
            ..SampleConfig::default()
        };
        assert_eq!(generate_dataset(&zero).unwrap_err().exit_code(), 2);

        let d = |m| NaiveDate::from_ymd_opt(2020, m, 1).unwrap();
        let inverted = SampleConfig {
            start: d(6),
            end: d(1),
            ..SampleConfig::default()
        };
        assert_eq!(generate_dataset(&inverted).unwrap_err().exit_code(), 2);
    }
}
