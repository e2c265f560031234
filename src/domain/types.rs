//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during filtering and aggregation
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// What the loader does with a row that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Abort the load on the first invalid row.
    #[default]
    Fail,
    /// Skip invalid rows and report them alongside the dataset.
    Skip,
}

/// Names of the columns the pipeline reads.
///
/// Defaults follow the Superstore export. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub order_date: String,
    pub category: String,
    pub region: String,
    pub sales: String,
    pub profit: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            order_date: "Order Date".to_string(),
            category: "Category".to_string(),
            region: "Region".to_string(),
            sales: "Sales".to_string(),
            profit: "Profit".to_string(),
        }
    }
}

/// One sales transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub order_date: NaiveDate,
    pub category: String,
    pub region: String,
    /// Non-negative sales amount.
    pub sales: Decimal,
    /// Signed profit amount.
    pub profit: Decimal,
    /// The raw row as read from the source, in header order.
    ///
    /// Empty for records built in memory. Used for pass-through exports.
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(
        order_date: NaiveDate,
        category: impl Into<String>,
        region: impl Into<String>,
        sales: Decimal,
        profit: Decimal,
    ) -> Self {
        Self {
            order_date,
            category: category.into(),
            region: region.into(),
            sales,
            profit,
            fields: Vec::new(),
        }
    }
}

/// The loaded dataset: header row plus records in source order.
///
/// Immutable once loaded; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, records: Vec<Record>) -> Self {
        Self { headers, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.category.as_str()))
    }

    /// Distinct regions in first-seen order.
    pub fn regions(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.region.as_str()))
    }

    /// Earliest and latest order date, if any records exist.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.order_date).min()?;
        let max = self.records.iter().map(|r| r.order_date).max()?;
        Some((min, max))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for v in values {
        if seen.insert(v) {
            out.push(v.to_string());
        }
    }
    out
}

/// User-selected date range and category/region allow-lists.
///
/// The date range is inclusive on both ends and never inverted. An empty
/// allow-list matches nothing; use [`FilterSpec::all`] to start from the full
/// observed domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FilterSpecRepr")]
pub struct FilterSpec {
    date_start: NaiveDate,
    date_end: NaiveDate,
    categories: BTreeSet<String>,
    regions: BTreeSet<String>,
}

#[derive(Deserialize)]
struct FilterSpecRepr {
    date_start: NaiveDate,
    date_end: NaiveDate,
    categories: BTreeSet<String>,
    regions: BTreeSet<String>,
}

impl TryFrom<FilterSpecRepr> for FilterSpec {
    type Error = ValidationError;

    fn try_from(value: FilterSpecRepr) -> Result<Self, Self::Error> {
        FilterSpec::new(value.date_start, value.date_end, value.categories, value.regions)
    }
}

impl FilterSpec {
    pub fn new(
        date_start: NaiveDate,
        date_end: NaiveDate,
        categories: impl IntoIterator<Item = impl Into<String>>,
        regions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, ValidationError> {
        if date_start > date_end {
            return Err(ValidationError::InvertedDateRange {
                start: date_start,
                end: date_end,
            });
        }
        Ok(Self {
            date_start,
            date_end,
            categories: categories.into_iter().map(Into::into).collect(),
            regions: regions.into_iter().map(Into::into).collect(),
        })
    }

    /// A filter admitting every record of `dataset`: its full date span and
    /// every observed category and region.
    pub fn all(dataset: &Dataset) -> Self {
        let (date_start, date_end) = dataset
            .date_bounds()
            .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        Self {
            date_start,
            date_end,
            categories: dataset.categories().into_iter().collect(),
            regions: dataset.regions().into_iter().collect(),
        }
    }

    pub fn date_start(&self) -> NaiveDate {
        self.date_start
    }

    pub fn date_end(&self) -> NaiveDate {
        self.date_end
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    /// Replace the date range, keeping the allow-lists.
    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedDateRange { start, end });
        }
        self.date_start = start;
        self.date_end = end;
        Ok(self)
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_regions(mut self, regions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    /// Add `value` to the category allow-list, or remove it if present.
    pub fn toggle_category(&mut self, value: &str) {
        toggle(&mut self.categories, value);
    }

    /// Add `value` to the region allow-list, or remove it if present.
    pub fn toggle_region(&mut self, value: &str) {
        toggle(&mut self.regions, value);
    }

    /// True when `record` satisfies all three predicates.
    pub fn matches(&self, record: &Record) -> bool {
        record.order_date >= self.date_start
            && record.order_date <= self.date_end
            && self.categories.contains(&record.category)
            && self.regions.contains(&record.region)
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

/// Calendar month bucket (`YYYY-MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of the month.
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for MonthKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (y, m) = value
            .split_once('-')
            .ok_or_else(|| format!("invalid month '{value}', expected YYYY-MM"))?;
        let year = y
            .parse::<i32>()
            .map_err(|_| format!("invalid year in month '{value}'"))?;
        let month = m
            .parse::<u32>()
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| format!("invalid month number in '{value}'"))?;
        Ok(Self { year, month })
    }
}

/// A grouped sum (one bar of a ranked chart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranked {
    pub key: String,
    pub value: Decimal,
}

/// Total sales of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySales {
    pub month: MonthKey,
    pub sales: Decimal,
}

/// Everything derived from one filtered record set.
///
/// Ranked lists are ordered by value descending; ties keep the order in which
/// the key was first seen. The monthly series is chronological and omits months
/// without records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateResult {
    pub order_count: usize,
    pub total_sales: Decimal,
    pub total_profit: Decimal,
    pub average_order_value: Decimal,
    pub sales_by_category: Vec<Ranked>,
    pub profit_by_category: Vec<Ranked>,
    pub sales_by_region: Vec<Ranked>,
    pub profit_by_region: Vec<Ranked>,
    pub monthly_sales_series: Vec<MonthlySales>,
}
