//! Batch valuation of independent bond rows.
//!
//! Every row builds its own `Bond` and shares nothing with its neighbours, so
//! rows are valued in parallel. A row that fails carries its error message in
//! the result; it never aborts the rest of the batch.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use crate::error::BondAnalyticsError;
use crate::fixed_income::bonds::{Bond, BondTerms, DEFAULT_REDEMPTION};
use crate::fixed_income::duration::RiskMetrics;
use crate::solver::SolverConfig;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::BondAnalyticsResult;

/// Columns a tabular batch must carry, as (spreadsheet header, field name).
pub const REQUIRED_COLUMNS: [(&str, &str); 5] = [
    ("Settlement Date", "settlement_date"),
    ("Maturity Date", "maturity_date"),
    ("Coupon Rate", "coupon_rate"),
    ("Face Value", "face_value"),
    ("Frequency", "frequency"),
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One input row. Every field is optional so that a missing value can be
/// reported against the row instead of failing the whole request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    #[serde(default, alias = "Settlement Date")]
    pub settlement_date: Option<NaiveDate>,
    #[serde(default, alias = "Maturity Date")]
    pub maturity_date: Option<NaiveDate>,
    #[serde(default, alias = "Coupon Rate")]
    pub coupon_rate: Option<Rate>,
    #[serde(default, alias = "Face Value")]
    pub face_value: Option<Money>,
    /// Defaults to 100 when absent
    #[serde(default, alias = "Redemption")]
    pub redemption: Option<Money>,
    /// Payments per year; spreadsheets often hold this as a float
    #[serde(default, alias = "Frequency")]
    pub frequency: Option<f64>,
    #[serde(default, alias = "Market Price", alias = "Price")]
    pub market_price: Option<Money>,
    #[serde(default, alias = "YTM")]
    pub ytm: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInput {
    pub rows: Vec<BatchRow>,
    /// Order results by maturity date (rows without one go last)
    #[serde(default)]
    pub sort_by_maturity: bool,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// Result for one row: the input echoed back plus whatever could be computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRowResult {
    /// 1-based position in the input
    pub row_number: usize,
    #[serde(flatten)]
    pub input: BatchRow,
    pub calculated_ytm: Option<Rate>,
    pub calculated_price: Option<Money>,
    pub macaulay_duration: Option<f64>,
    pub modified_duration: Option<f64>,
    pub convexity: Option<f64>,
    /// Row could not be valued at all
    pub error: Option<String>,
    /// Row was valued but something is undefined (no quote, unsolvable
    /// yield, undefined metrics)
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    pub rows_total: usize,
    pub rows_valued: usize,
    pub rows_failed: usize,
    pub results: Vec<BatchRowResult>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value every row independently.
pub fn value_batch(input: &BatchInput) -> BondAnalyticsResult<ComputationOutput<BatchOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.rows.is_empty() {
        warnings.push("Batch contains no rows".into());
    }

    let config = input.solver;
    let mut results: Vec<BatchRowResult> = input
        .rows
        .par_iter()
        .enumerate()
        .map(|(i, row)| value_row(i + 1, row, &config))
        .collect();

    for r in &results {
        if let Some(msg) = r.error.as_ref().or(r.note.as_ref()) {
            warnings.push(format!("Row {}: {msg}", r.row_number));
        }
    }

    if input.sort_by_maturity {
        results.sort_by_key(|r| (r.input.maturity_date.is_none(), r.input.maturity_date));
    }

    let rows_failed = results.iter().filter(|r| r.error.is_some()).count();
    let rows_valued = results
        .iter()
        .filter(|r| r.calculated_ytm.is_some() || r.calculated_price.is_some())
        .count();

    info!(
        rows = results.len(),
        valued = rows_valued,
        failed = rows_failed,
        "batch valuation finished"
    );

    let output = BatchOutput {
        rows_total: results.len(),
        rows_valued,
        rows_failed,
        results,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "direction": "market_price -> ytm when present, otherwise ytm -> price",
        "default_redemption": DEFAULT_REDEMPTION,
        "tolerance": config.tolerance,
        "max_iterations": config.max_iterations,
        "sorted_by_maturity": input.sort_by_maturity,
    });

    Ok(with_metadata(
        "Batch Bond Valuation",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Required headers absent from `headers`. Either the spreadsheet header or
/// the field name satisfies a column.
pub fn missing_columns<S: AsRef<str>>(headers: &[S]) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|(display, field)| {
            !headers.iter().any(|h| {
                let h = h.as_ref().trim();
                h == *display || h == *field
            })
        })
        .map(|(display, _)| *display)
        .collect()
}

impl BatchRow {
    /// Bond terms for this row, or the first missing / malformed field.
    pub fn terms(&self) -> BondAnalyticsResult<BondTerms> {
        let settlement_date = require(self.settlement_date, "settlement_date")?;
        let maturity_date = require(self.maturity_date, "maturity_date")?;
        let coupon_rate = require(self.coupon_rate, "coupon_rate")?;
        let face_value = require(self.face_value, "face_value")?;
        let frequency = require(self.frequency, "frequency")?;

        if !frequency.is_finite() || frequency.fract() != 0.0 || frequency < 1.0 {
            return Err(BondAnalyticsError::InvalidInput {
                field: "frequency".into(),
                reason: format!("Frequency must be a positive whole number, got {frequency}"),
            });
        }
        let frequency = u32::try_from(frequency as i64).map_err(|_| {
            BondAnalyticsError::InvalidInput {
                field: "frequency".into(),
                reason: format!("Frequency {frequency} is out of range"),
            }
        })?;

        Ok(BondTerms {
            settlement_date,
            maturity_date,
            coupon_rate,
            face_value,
            redemption: self.redemption.unwrap_or(DEFAULT_REDEMPTION),
            frequency,
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn require<T>(value: Option<T>, field: &str) -> BondAnalyticsResult<T> {
    value.ok_or_else(|| BondAnalyticsError::MissingInput(format!("required field '{field}' is empty")))
}

struct RowValuation {
    calculated_ytm: Option<Rate>,
    calculated_price: Option<Money>,
    metrics: Option<RiskMetrics>,
    note: Option<String>,
}

fn value_row(row_number: usize, row: &BatchRow, config: &SolverConfig) -> BatchRowResult {
    let mut result = BatchRowResult {
        row_number,
        input: row.clone(),
        calculated_ytm: None,
        calculated_price: None,
        macaulay_duration: None,
        modified_duration: None,
        convexity: None,
        error: None,
        note: None,
    };

    match try_value_row(row, config) {
        Ok(v) => {
            result.calculated_ytm = v.calculated_ytm;
            result.calculated_price = v.calculated_price;
            result.note = v.note;
            if let Some(m) = v.metrics {
                result.macaulay_duration = Some(m.macaulay_duration);
                result.modified_duration = Some(m.modified_duration);
                result.convexity = Some(m.convexity);
            }
        }
        Err(e) => result.error = Some(e.to_string()),
    }
    result
}

fn try_value_row(row: &BatchRow, config: &SolverConfig) -> BondAnalyticsResult<RowValuation> {
    let bond = Bond::new(row.terms()?)?;
    let mut note = None;

    let (ytm, calculated_ytm, calculated_price) = match (row.market_price, row.ytm) {
        (Some(price), _) => match bond.solve_yield(price, config) {
            Ok(r) => (Some(r.root), Some(r.root), None),
            Err(failure) => {
                note = Some(format!(
                    "yield to maturity undefined for price {price} ({failure}); metrics undefined"
                ));
                (None, None, None)
            }
        },
        (None, Some(ytm)) => (Some(ytm), None, Some(bond.price(ytm)?)),
        (None, None) => {
            let missing = BondAnalyticsError::MissingInput(
                "neither market_price nor ytm supplied".into(),
            );
            note = Some(format!("{missing}; metrics undefined"));
            (None, None, None)
        }
    };

    let metrics = match ytm.map(|y| bond.risk_metrics(y)) {
        Some(Ok(m)) => Some(m),
        Some(Err(e)) => {
            note = Some(format!("risk metrics undefined: {e}"));
            None
        }
        None => None,
    };

    Ok(RowValuation {
        calculated_ytm,
        calculated_price,
        metrics,
        note,
    })
}
