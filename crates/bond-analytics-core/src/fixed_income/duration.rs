//! Duration and convexity from closed-form sensitivities of the pricing
//! function. Exact for fractional year fractions; no finite differences.

use serde::{Deserialize, Serialize};

use crate::error::BondAnalyticsError;
use crate::fixed_income::bonds::Bond;
use crate::types::{Money, Rate, Years};
use crate::BondAnalyticsResult;

/// One basis point as a decimal.
const BASIS_POINT: Rate = 0.0001;

/// Parallel shift used for the price-change estimate.
const ESTIMATE_SHIFT: Rate = 0.01;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Interest-rate risk measures at a single yield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// PV-weighted average time to cash flows (years)
    pub macaulay_duration: Years,
    /// Macaulay duration / (1 + y/f)
    pub modified_duration: Years,
    /// Second derivative of price over price
    pub convexity: f64,
    /// Price change for a one basis point fall in yield
    pub dv01: Money,
    /// Fractional price change for a +100bp shift (duration + convexity)
    pub price_change_estimate: f64,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl Bond {
    pub fn macaulay_duration(&self, ytm: Rate) -> BondAnalyticsResult<Years> {
        let base = self.periodic_base(ytm)?;
        let f = f64::from(self.frequency());

        let (weighted, total) =
            self.cash_flows()
                .iter()
                .fold((0.0, 0.0), |(weighted, total), cf| {
                    let pv = cf.amount * base.powf(-cf.time * f);
                    (weighted + cf.time * pv, total + pv)
                });

        if total == 0.0 {
            return Err(BondAnalyticsError::DivisionByZero {
                context: "Macaulay duration: present value of cash flows is zero".into(),
            });
        }
        Ok(weighted / total)
    }

    pub fn modified_duration(&self, ytm: Rate) -> BondAnalyticsResult<Years> {
        let macaulay = self.macaulay_duration(ytm)?;
        Ok(macaulay / self.periodic_base(ytm)?)
    }

    /// Σ t(t + 1/f)·CF·(1 + y/f)^(-t·f - 2) / P
    pub fn convexity(&self, ytm: Rate) -> BondAnalyticsResult<f64> {
        let base = self.periodic_base(ytm)?;
        let f = f64::from(self.frequency());

        let second_derivative: f64 = self
            .cash_flows()
            .iter()
            .map(|cf| cf.time * (cf.time + 1.0 / f) * cf.amount * base.powf(-cf.time * f - 2.0))
            .sum();

        let price = self.price(ytm)?;
        if price == 0.0 {
            return Err(BondAnalyticsError::DivisionByZero {
                context: "convexity: price is zero".into(),
            });
        }
        Ok(second_derivative / price)
    }

    /// All risk measures at `ytm`.
    pub fn risk_metrics(&self, ytm: Rate) -> BondAnalyticsResult<RiskMetrics> {
        let price = self.price(ytm)?;
        let macaulay_duration = self.macaulay_duration(ytm)?;
        let modified_duration = self.modified_duration(ytm)?;
        let convexity = self.convexity(ytm)?;

        Ok(RiskMetrics {
            macaulay_duration,
            modified_duration,
            convexity,
            dv01: modified_duration * price * BASIS_POINT,
            price_change_estimate: -modified_duration * ESTIMATE_SHIFT
                + 0.5 * convexity * ESTIMATE_SHIFT * ESTIMATE_SHIFT,
        })
    }
}
