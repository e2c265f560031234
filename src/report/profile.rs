//! Dataset overview: shape, inferred column types, missing values and
//! `describe`-style statistics for numeric columns.
//!
//! Works on the raw fields of each record, so every column of the source file
//! is covered, not only the five the engine reads.

use crate::domain::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    /// Every value is missing.
    Empty,
}

impl ColumnKind {
    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::Integer => "int64",
            ColumnKind::Float => "float64",
            ColumnKind::Text => "object",
            ColumnKind::Empty => "empty",
        }
    }
}

/// Summary statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub non_missing: usize,
    pub missing: usize,
    pub describe: Option<Describe>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
}

/// Profile every column of the dataset.
pub fn profile_dataset(dataset: &Dataset) -> DatasetProfile {
    let columns = dataset
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<&str> = dataset
                .records
                .iter()
                .map(|r| r.fields.get(idx).map(|s| s.trim()).unwrap_or(""))
                .collect();
            profile_column(name, &values)
        })
        .collect();

    DatasetProfile {
        rows: dataset.len(),
        columns,
    }
}

fn profile_column(name: &str, values: &[&str]) -> ColumnProfile {
    let present: Vec<&str> = values.iter().copied().filter(|v| !v.is_empty()).collect();
    let missing = values.len() - present.len();

    let kind = if present.is_empty() {
        ColumnKind::Empty
    } else if present.iter().all(|v| v.parse::<i64>().is_ok()) {
        ColumnKind::Integer
    } else if present.iter().all(|v| v.parse::<f64>().map(f64::is_finite).unwrap_or(false)) {
        ColumnKind::Float
    } else {
        ColumnKind::Text
    };

    let describe = match kind {
        ColumnKind::Integer | ColumnKind::Float => {
            let nums: Vec<f64> = present.iter().filter_map(|v| v.parse::<f64>().ok()).collect();
            describe(&nums)
        }
        ColumnKind::Text | ColumnKind::Empty => None,
    };

    ColumnProfile {
        name: name.to_string(),
        kind,
        non_missing: present.len(),
        missing,
        describe,
    }
}

/// Count, mean, sample std, min, quartiles (linear interpolation) and max.
pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n as f64 - 1.0)).sqrt()
    });

    Some(Describe {
        count: n,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        q50: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Render the overview as text.
pub fn format_profile(profile: &DatasetProfile) -> String {
    let mut out = String::new();

    out.push_str("=== DATA OVERVIEW ===\n");
    out.push_str(&format!("Rows: {}, Columns: {}\n\n", profile.rows, profile.columns.len()));

    out.push_str("Column Types:\n");
    for c in &profile.columns {
        out.push_str(&format!("{:<24} {}\n", c.name, c.kind.label()));
    }

    out.push_str("\nMissing Values:\n");
    for c in &profile.columns {
        out.push_str(&format!("{:<24} {}\n", c.name, c.missing));
    }

    let numeric: Vec<(&str, &Describe)> = profile
        .columns
        .iter()
        .filter_map(|c| c.describe.as_ref().map(|d| (c.name.as_str(), d)))
        .collect();

    out.push_str("\nSummary Statistics:\n");
    if numeric.is_empty() {
        out.push_str("(no numeric columns)\n");
        return out;
    }

    out.push_str(
        format!(
            "{:<16} {:>10} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )
        .trim_end(),
    );
    out.push('\n');
    for (name, d) in numeric {
        let std = d.std.map(|s| format!("{s:.4}")).unwrap_or_else(|| "NaN".to_string());
        out.push_str(&format!(
            "{:<16} {:>10} {:>12.4} {:>12} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}\n",
            truncate_name(name),
            d.count,
            d.mean,
            std,
            d.min,
            d.q25,
            d.q50,
            d.q75,
            d.max
        ));
    }

    out
}

fn truncate_name(name: &str) -> String {
    name.chars().take(16).collect()
}
