//! Single-bond valuation in either direction (price -> yield or yield ->
//! price), plus the price/yield profile around a given yield.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::error::BondAnalyticsError;
use crate::fixed_income::bonds::{Bond, BondTerms};
use crate::fixed_income::duration::RiskMetrics;
use crate::fixed_income::schedule::CashFlowKind;
use crate::solver::SolverConfig;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::BondAnalyticsResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Relative tolerance (of face value) inside which a price counts as par.
const PAR_TOLERANCE: f64 = 1e-9;

pub const DEFAULT_PROFILE_HALF_WIDTH: Rate = 0.05;
pub const DEFAULT_PROFILE_POINTS: usize = 100;
/// Largest grid a profile will sample.
pub const MAX_PROFILE_POINTS: usize = 10_000;
/// Lowest yield a profile starts from.
const PROFILE_FLOOR: Rate = 0.001;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for single-bond analysis. Supply `market_price` to solve for yield or
/// `ytm` to compute price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondAnalysisInput {
    #[serde(flatten)]
    pub terms: BondTerms,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ytm: Option<Rate>,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// Where the price sits relative to face value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceClassification {
    Par,
    Premium,
    Discount,
}

/// One row of the discounted cash-flow table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowValuation {
    pub date: NaiveDate,
    pub time: Years,
    pub amount: Money,
    pub kind: CashFlowKind,
    pub discount_factor: f64,
    pub present_value: Money,
}

/// Output of single-bond analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondAnalysisOutput {
    pub price: Money,
    /// `None` when the yield search did not converge
    pub ytm: Option<Rate>,
    pub classification: PriceClassification,
    /// Annual coupon / price
    pub current_yield: Option<Rate>,
    pub coupon_amount: Money,
    pub num_cash_flows: usize,
    pub years_to_final_cash_flow: Years,
    pub risk_metrics: Option<RiskMetrics>,
    pub cash_flows: Vec<CashFlowValuation>,
}

/// Input for the price/yield profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceYieldProfileInput {
    #[serde(flatten)]
    pub terms: BondTerms,
    /// Yield the grid is centred on
    pub ytm: Rate,
    #[serde(default = "default_half_width")]
    pub half_width: Rate,
    #[serde(default = "default_points")]
    pub points: usize,
}

fn default_half_width() -> Rate {
    DEFAULT_PROFILE_HALF_WIDTH
}

fn default_points() -> usize {
    DEFAULT_PROFILE_POINTS
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub ytm: Rate,
    pub price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceYieldProfileOutput {
    pub centre_ytm: Rate,
    pub centre_price: Money,
    pub points: Vec<ProfilePoint>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value a bond from a market price or a yield and compute its risk metrics.
pub fn analyze_bond(
    input: &BondAnalysisInput,
) -> BondAnalyticsResult<ComputationOutput<BondAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let bond = Bond::new(input.terms)?;

    let (price, ytm) = match (input.market_price, input.ytm) {
        (Some(price), given_ytm) => {
            if given_ytm.is_some() {
                warnings.push("Both market_price and ytm supplied; ytm ignored".into());
            }
            let ytm = match bond.solve_yield(price, &input.solver) {
                Ok(r) => Some(r.root),
                Err(failure) => {
                    warnings.push(format!(
                        "Yield to maturity undefined for price {price}: {failure}"
                    ));
                    None
                }
            };
            (price, ytm)
        }
        (None, Some(ytm)) => (bond.price(ytm)?, Some(ytm)),
        (None, None) => {
            return Err(BondAnalyticsError::MissingInput(
                "Either market_price or ytm is required".into(),
            ))
        }
    };

    let risk_metrics = match ytm {
        Some(y) => match bond.risk_metrics(y) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(error = %e, "risk metrics undefined");
                warnings.push(format!("Risk metrics undefined: {e}"));
                None
            }
        },
        None => None,
    };

    let cash_flows = match ytm {
        Some(y) => discounted_cash_flows(&bond, y)?,
        None => Vec::new(),
    };

    let current_yield = (price > 0.0).then(|| bond.annual_coupon() / price);
    if current_yield.is_none() {
        warnings.push("Price is zero or negative; current yield undefined".into());
    }

    let output = BondAnalysisOutput {
        price,
        ytm,
        classification: classify_price(price, bond.face_value()),
        current_yield,
        coupon_amount: bond.coupon_amount(),
        num_cash_flows: bond.cash_flows().len(),
        years_to_final_cash_flow: bond.schedule().final_time(),
        risk_metrics,
        cash_flows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "day_count": "ACT/365",
        "compounding": "periodic, fractional exponent t * frequency",
        "ytm_method": "Newton-Raphson, analytic derivative",
        "tolerance": input.solver.tolerance,
        "max_iterations": input.solver.max_iterations,
        "price_type": "full (no accrued interest split)",
    });

    Ok(with_metadata(
        "Fixed-Coupon Bond Valuation & Risk",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Price the bond over an evenly spaced yield grid around `input.ytm`.
pub fn price_yield_profile(
    input: &PriceYieldProfileInput,
) -> BondAnalyticsResult<ComputationOutput<PriceYieldProfileOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if !(2..=MAX_PROFILE_POINTS).contains(&input.points) {
        return Err(BondAnalyticsError::InvalidInput {
            field: "points".into(),
            reason: format!(
                "A profile needs between 2 and {MAX_PROFILE_POINTS} points, got {}",
                input.points
            ),
        });
    }
    if !input.half_width.is_finite() || input.half_width <= 0.0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "half_width".into(),
            reason: "Half width must be positive".into(),
        });
    }

    let bond = Bond::new(input.terms)?;
    let centre_price = bond.price(input.ytm)?;

    let low = (input.ytm - input.half_width).max(PROFILE_FLOOR);
    let high = input.ytm + input.half_width;
    if high <= low {
        return Err(BondAnalyticsError::InvalidInput {
            field: "ytm".into(),
            reason: format!("Profile range is empty above the {PROFILE_FLOOR} floor"),
        });
    }
    let step = (high - low) / (input.points - 1) as f64;

    let mut points = Vec::with_capacity(input.points);
    for i in 0..input.points {
        let y = low + step * i as f64;
        match bond.price(y) {
            Ok(price) => points.push(ProfilePoint { ytm: y, price }),
            Err(e) => warnings.push(format!("Skipped yield {y}: {e}")),
        }
    }

    let output = PriceYieldProfileOutput {
        centre_ytm: input.ytm,
        centre_price,
        points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "low": low,
        "high": high,
        "points": input.points,
    });

    Ok(with_metadata(
        "Price / Yield Profile",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

pub fn classify_price(price: Money, face_value: Money) -> PriceClassification {
    let tolerance = PAR_TOLERANCE * face_value.abs().max(1.0);
    if (price - face_value).abs() <= tolerance {
        PriceClassification::Par
    } else if price > face_value {
        PriceClassification::Premium
    } else {
        PriceClassification::Discount
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn discounted_cash_flows(bond: &Bond, ytm: Rate) -> BondAnalyticsResult<Vec<CashFlowValuation>> {
    bond.cash_flows()
        .iter()
        .map(|cf| {
            let discount_factor = bond.discount_factor(ytm, cf.time)?;
            Ok(CashFlowValuation {
                date: cf.date,
                time: cf.time,
                amount: cf.amount,
                kind: cf.kind,
                discount_factor,
                present_value: cf.amount * discount_factor,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn terms(frequency: u32) -> BondTerms {
        BondTerms {
            settlement_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            maturity_date: NaiveDate::from_ymd_opt(2028, 1, 1).unwrap(),
            coupon_rate: 0.05,
            face_value: 100.0,
            redemption: 100.0,
            frequency,
        }
    }

    #[test]
    fn test_price_from_yield() {
        let input = BondAnalysisInput {
            terms: terms(2),
            market_price: None,
            ytm: Some(0.06),
            solver: SolverConfig::default(),
        };
        let out = analyze_bond(&input).unwrap();
        let r = &out.result;
        assert!(r.price < 100.0);
        assert_eq!(r.classification, PriceClassification::Discount);
        assert_eq!(r.ytm, Some(0.06));
        assert!(r.risk_metrics.is_some());
        assert_eq!(r.cash_flows.len(), 10);
        let pv_sum: f64 = r.cash_flows.iter().map(|cf| cf.present_value).sum();
        assert_relative_eq!(pv_sum, r.price, max_relative = 1e-12);
        assert!(out.warnings.is_empty());
        assert_eq!(out.metadata.precision, "ieee754_f64");
    }

    #[test]
    fn test_yield_from_price() {
        let input = BondAnalysisInput {
            terms: terms(2),
            market_price: Some(104.0),
            ytm: None,
            solver: SolverConfig::default(),
        };
        let r = analyze_bond(&input).unwrap().result;
        assert_eq!(r.classification, PriceClassification::Premium);
        assert!(r.ytm.unwrap() < 0.05);
        assert_relative_eq!(r.current_yield.unwrap(), 5.0 / 104.0);
    }

    #[test]
    fn test_market_price_wins_over_ytm() {
        let input = BondAnalysisInput {
            terms: terms(2),
            market_price: Some(95.0),
            ytm: Some(0.01),
            solver: SolverConfig::default(),
        };
        let out = analyze_bond(&input).unwrap();
        assert_eq!(out.result.price, 95.0);
        assert!(out.result.ytm.unwrap() > 0.05);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_missing_quote() {
        let input = BondAnalysisInput {
            terms: terms(2),
            market_price: None,
            ytm: None,
            solver: SolverConfig::default(),
        };
        assert!(matches!(
            analyze_bond(&input),
            Err(BondAnalyticsError::MissingInput(_))
        ));
    }

    #[test]
    fn test_unsolvable_price_leaves_metrics_undefined() {
        let input = BondAnalysisInput {
            terms: terms(2),
            market_price: Some(-5.0),
            ytm: None,
            solver: SolverConfig::default(),
        };
        let out = analyze_bond(&input).unwrap();
        assert_eq!(out.result.ytm, None);
        assert!(out.result.risk_metrics.is_none());
        assert!(out.result.cash_flows.is_empty());
        assert!(out.result.current_yield.is_none());
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_input_json_is_flat() {
        let input: BondAnalysisInput = serde_json::from_str(
            r#"{
                "settlement_date": "2023-01-01",
                "maturity_date": "2028-01-01",
                "coupon_rate": 0.05,
                "face_value": 100,
                "frequency": 1,
                "ytm": 0.05
            }"#,
        )
        .unwrap();
        assert_eq!(input.terms.redemption, 100.0);
        assert_eq!(input.solver, SolverConfig::default());
        let r = analyze_bond(&input).unwrap().result;
        assert!((r.price - 100.0).abs() < 0.05);
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify_price(100.0, 100.0), PriceClassification::Par);
        assert_eq!(classify_price(100.5, 100.0), PriceClassification::Premium);
        assert_eq!(classify_price(99.5, 100.0), PriceClassification::Discount);
    }

    #[test]
    fn test_profile_grid() {
        let input = PriceYieldProfileInput {
            terms: terms(2),
            ytm: 0.03,
            half_width: 0.05,
            points: 5,
        };
        let out = price_yield_profile(&input).unwrap().result;
        assert_eq!(out.points.len(), 5);
        // Lower bound floored at 0.1%.
        assert_relative_eq!(out.points[0].ytm, 0.001, epsilon = 1e-12);
        assert_relative_eq!(out.points[4].ytm, 0.08, epsilon = 1e-12);
        assert!(out.points.windows(2).all(|w| w[1].price < w[0].price));
    }

    #[test]
    fn test_profile_rejects_single_point() {
        let input = PriceYieldProfileInput {
            terms: terms(2),
            ytm: 0.03,
            half_width: 0.05,
            points: 1,
        };
        assert!(price_yield_profile(&input).is_err());
    }

    #[test]
    fn test_profile_rejects_oversized_grid() {
        for points in [MAX_PROFILE_POINTS + 1, usize::MAX] {
            let input = PriceYieldProfileInput {
                terms: terms(2),
                ytm: 0.03,
                half_width: 0.05,
                points,
            };
            match price_yield_profile(&input) {
                Err(BondAnalyticsError::InvalidInput { field, .. }) => assert_eq!(field, "points"),
                other => panic!("expected InvalidInput, got {other:?}"),
            }
        }

        let largest = PriceYieldProfileInput {
            terms: terms(2),
            ytm: 0.03,
            half_width: 0.05,
            points: MAX_PROFILE_POINTS,
        };
        assert_eq!(
            price_yield_profile(&largest).unwrap().result.points.len(),
            MAX_PROFILE_POINTS
        );
    }
}
