use clap::Args;
use serde_json::Value;
use std::path::Path;

use bond_analytics_core::batch::{self, BatchInput, BatchRow};
use bond_analytics_core::solver::SolverConfig;
use bond_analytics_core::BondAnalyticsError;

use crate::input;

/// Arguments for batch valuation
#[derive(Args)]
pub struct BatchArgs {
    /// Path to a CSV file (one bond per row) or a JSON file
    /// (`{"rows": [...]}` or a bare array of rows)
    #[arg(long)]
    pub input: Option<String>,

    /// Order results by maturity date
    #[arg(long)]
    pub sort_by_maturity: bool,
}

pub fn run_batch(args: BatchArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut batch_input: BatchInput = if let Some(ref path) = args.input {
        if is_csv(path) {
            let (headers, rows) = input::file::read_csv::<BatchRow>(path)?;
            csv_batch(headers, rows, &format!("'{}'", path))?
        } else {
            parse_json_batch(input::file::read_json_value(path)?)?
        }
    } else if let Some(text) = input::stdin::read_stdin_text()? {
        if input::stdin::looks_like_json(&text) {
            parse_json_batch(input::stdin::parse_json(&text)?)?
        } else {
            let (headers, rows) = input::file::parse_csv::<BatchRow, _>(text.as_bytes(), "stdin")?;
            csv_batch(headers, rows, "stdin")?
        }
    } else {
        return Err("--input <rows.csv|rows.json> or piped CSV/JSON required for batch".into());
    };

    if args.sort_by_maturity {
        batch_input.sort_by_maturity = true;
    }

    let result = batch::value_batch(&batch_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Reject a table that lacks a required column before valuing any row.
fn csv_batch(
    headers: Vec<String>,
    rows: Vec<BatchRow>,
    source: &str,
) -> Result<BatchInput, Box<dyn std::error::Error>> {
    let missing = batch::missing_columns(&headers);
    if !missing.is_empty() {
        return Err(BondAnalyticsError::MissingInput(format!(
            "{} is missing columns: {}",
            source,
            missing.join(", ")
        ))
        .into());
    }
    Ok(rows_to_input(rows))
}

fn is_csv(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn rows_to_input(rows: Vec<BatchRow>) -> BatchInput {
    BatchInput {
        rows,
        sort_by_maturity: false,
        solver: SolverConfig::default(),
    }
}

/// Accept either the full `BatchInput` object or a bare array of rows.
fn parse_json_batch(data: Value) -> Result<BatchInput, Box<dyn std::error::Error>> {
    match data {
        Value::Array(_) => Ok(rows_to_input(serde_json::from_value(data)?)),
        other => Ok(serde_json::from_value(other)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_csv() {
        assert!(is_csv("bonds.csv"));
        assert!(is_csv("data/BONDS.CSV"));
        assert!(!is_csv("bonds.json"));
        assert!(!is_csv("bonds"));
    }

    #[test]
    fn test_csv_without_required_column_rejected() {
        let text = "Settlement Date,Maturity Date,Coupon Rate,Face Value\n2023-01-01,2028-01-01,0.05,100\n";
        let (headers, rows) = input::file::parse_csv::<BatchRow, _>(text.as_bytes(), "stdin").unwrap();
        let err = csv_batch(headers, rows, "stdin").unwrap_err();
        assert!(err.to_string().contains("Frequency"));
    }

    #[test]
    fn test_csv_rows_with_spreadsheet_headers() {
        let text = "Description,Settlement Date,Maturity Date,Coupon Rate,Face Value,Frequency,Market Price,YTM\n\
                    5y,2023-01-01,2028-01-01,0.05,100,2,95,\n\
                    no quote,2023-01-01,2028-01-01,0.05,100,2,,\n";
        let (headers, rows) = input::file::parse_csv::<BatchRow, _>(text.as_bytes(), "stdin").unwrap();
        let input = csv_batch(headers, rows, "stdin").unwrap();
        assert_eq!(input.rows.len(), 2);
        assert_eq!(input.rows[0].market_price, Some(95.0));
        assert_eq!(input.rows[0].ytm, None);
        assert_eq!(input.rows[1].market_price, None);
        assert_eq!(input.rows[1].frequency, Some(2.0));
    }

    #[test]
    fn test_bare_array_is_accepted() {
        let data = serde_json::json!([
            { "Settlement Date": "2023-01-01", "Maturity Date": "2028-01-01",
              "Coupon Rate": 0.05, "Face Value": 100, "Frequency": 2, "YTM": 0.05 }
        ]);
        let input = parse_json_batch(data).unwrap();
        assert_eq!(input.rows.len(), 1);
        assert!(!input.sort_by_maturity);
    }

    #[test]
    fn test_envelope_object_is_accepted() {
        let data = serde_json::json!({ "rows": [], "sort_by_maturity": true });
        let input = parse_json_batch(data).unwrap();
        assert!(input.rows.is_empty());
        assert!(input.sort_by_maturity);
    }
}
