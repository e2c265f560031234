use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Data-validation failures raised while turning raw values into records or
/// building a filter.
///
/// Each variant carries the offending raw value so the caller can report it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{}invalid date '{raw}' in `{field}`", line_prefix(.line))]
    InvalidDate {
        line: Option<usize>,
        field: String,
        raw: String,
    },
    #[error("{}invalid amount '{raw}' in `{field}`", line_prefix(.line))]
    InvalidAmount {
        line: Option<usize>,
        field: String,
        raw: String,
    },
    #[error("{}amount '{raw}' in `{field}` is outside ±{limit}", line_prefix(.line))]
    AmountOutOfRange {
        line: Option<usize>,
        field: String,
        raw: String,
        limit: Decimal,
    },
    #[error("{}negative sales amount '{raw}'", line_prefix(.line))]
    NegativeSales { line: Option<usize>, raw: String },
    #[error("{}missing required value: `{field}`", line_prefix(.line))]
    MissingField { line: Option<usize>, field: String },
    #[error("missing required column: `{0}`")]
    MissingColumn(String),
    #[error("date range is inverted: start {start} is after end {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
}

impl ValidationError {
    /// Attach a 1-based CSV line number to a row-level error.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Self::InvalidDate { field, raw, .. } => Self::InvalidDate {
                line: Some(line),
                field,
                raw,
            },
            Self::InvalidAmount { field, raw, .. } => Self::InvalidAmount {
                line: Some(line),
                field,
                raw,
            },
            Self::AmountOutOfRange { field, raw, limit, .. } => Self::AmountOutOfRange {
                line: Some(line),
                field,
                raw,
                limit,
            },
            Self::NegativeSales { raw, .. } => Self::NegativeSales {
                line: Some(line),
                raw,
            },
            Self::MissingField { field, .. } => Self::MissingField {
                line: Some(line),
                field,
            },
            other => other,
        }
    }
}

fn line_prefix(line: &Option<usize>) -> String {
    line.map(|l| format!("line {l}: ")).unwrap_or_default()
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::new(2, err.to_string())
    }
}
