//! The immutable `Bond` value object.
//!
//! A bond validates its terms and builds its cash-flow schedule once, at
//! construction. Every valuation afterwards is a pure function of the yield.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BondAnalyticsError;
use crate::fixed_income::schedule::{CashFlowSchedule, ScheduledCashFlow};
use crate::types::{Money, Rate};
use crate::BondAnalyticsResult;

/// Redemption paid at maturity when none is given.
pub const DEFAULT_REDEMPTION: Money = 100.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Contractual terms of a fixed-coupon bullet bond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BondTerms {
    /// Settlement (valuation) date
    pub settlement_date: NaiveDate,
    /// Maturity date, strictly after settlement
    pub maturity_date: NaiveDate,
    /// Annual coupon rate as a decimal (e.g. 0.05 = 5%)
    pub coupon_rate: Rate,
    /// Notional the coupon is computed on
    pub face_value: Money,
    /// Principal repaid at maturity
    #[serde(default = "default_redemption")]
    pub redemption: Money,
    /// Coupons per year; must divide 12
    pub frequency: u32,
}

fn default_redemption() -> Money {
    DEFAULT_REDEMPTION
}

/// A validated bond with its schedule computed eagerly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bond {
    terms: BondTerms,
    schedule: CashFlowSchedule,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl Bond {
    pub fn new(terms: BondTerms) -> BondAnalyticsResult<Self> {
        validate_terms(&terms)?;
        let schedule = CashFlowSchedule::build(
            terms.settlement_date,
            terms.maturity_date,
            terms.coupon_rate,
            terms.face_value,
            terms.redemption,
            terms.frequency,
        )?;
        Ok(Self { terms, schedule })
    }

    pub fn from_parts(
        settlement_date: NaiveDate,
        maturity_date: NaiveDate,
        coupon_rate: Rate,
        face_value: Money,
        redemption: Money,
        frequency: u32,
    ) -> BondAnalyticsResult<Self> {
        Self::new(BondTerms {
            settlement_date,
            maturity_date,
            coupon_rate,
            face_value,
            redemption,
            frequency,
        })
    }

    pub fn terms(&self) -> &BondTerms {
        &self.terms
    }

    pub fn schedule(&self) -> &CashFlowSchedule {
        &self.schedule
    }

    pub fn cash_flows(&self) -> &[ScheduledCashFlow] {
        self.schedule.flows()
    }

    pub fn settlement_date(&self) -> NaiveDate {
        self.terms.settlement_date
    }

    pub fn maturity_date(&self) -> NaiveDate {
        self.terms.maturity_date
    }

    pub fn coupon_rate(&self) -> Rate {
        self.terms.coupon_rate
    }

    pub fn face_value(&self) -> Money {
        self.terms.face_value
    }

    pub fn redemption(&self) -> Money {
        self.terms.redemption
    }

    pub fn frequency(&self) -> u32 {
        self.terms.frequency
    }

    /// Coupon paid each period.
    pub fn coupon_amount(&self) -> Money {
        self.terms.face_value * self.terms.coupon_rate / f64::from(self.terms.frequency)
    }

    pub fn annual_coupon(&self) -> Money {
        self.terms.face_value * self.terms.coupon_rate
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_terms(terms: &BondTerms) -> BondAnalyticsResult<()> {
    if terms.settlement_date >= terms.maturity_date {
        return Err(BondAnalyticsError::InvalidInput {
            field: "maturity_date".into(),
            reason: "Settlement date must be before maturity date".into(),
        });
    }
    if terms.frequency == 0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "frequency".into(),
            reason: "Frequency must be a positive number of payments per year".into(),
        });
    }
    for (field, value) in [
        ("coupon_rate", terms.coupon_rate),
        ("face_value", terms.face_value),
        ("redemption", terms.redemption),
    ] {
        if !value.is_finite() {
            return Err(BondAnalyticsError::InvalidInput {
                field: field.into(),
                reason: "Value must be a finite number".into(),
            });
        }
    }
    Ok(())
}
