//! Cash-flow schedule generation for fixed-coupon bullet bonds.
//!
//! Payment dates are produced by stepping backwards from maturity in whole
//! months; time fractions use actual/365 from settlement.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::BondAnalyticsError;
use crate::types::{Money, Rate, Years};
use crate::BondAnalyticsResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MONTHS_PER_YEAR: u32 = 12;
const DAYS_PER_YEAR: f64 = 365.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What a scheduled payment consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashFlowKind {
    #[serde(rename = "coupon")]
    Coupon,
    #[serde(rename = "coupon+redemption")]
    CouponAndRedemption,
}

/// A single future payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCashFlow {
    pub date: NaiveDate,
    /// Years from settlement (actual/365)
    pub time: Years,
    pub amount: Money,
    pub kind: CashFlowKind,
}

/// Ordered (ascending) payments remaining after settlement. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSchedule {
    flows: Vec<ScheduledCashFlow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl CashFlowSchedule {
    /// Build the schedule for a bond settling on `settlement` and maturing on
    /// `maturity`.
    ///
    /// A zero coupon still yields one entry per period; all but the last carry
    /// an amount of zero.
    pub fn build(
        settlement: NaiveDate,
        maturity: NaiveDate,
        coupon_rate: Rate,
        face_value: Money,
        redemption: Money,
        frequency: u32,
    ) -> BondAnalyticsResult<Self> {
        if settlement >= maturity {
            return Err(BondAnalyticsError::InvalidInput {
                field: "maturity_date".into(),
                reason: "Settlement date must be before maturity date".into(),
            });
        }

        let dates = payment_dates(settlement, maturity, frequency)?;
        let coupon = face_value * coupon_rate / f64::from(frequency);
        let last = dates.len() - 1;

        let flows = dates
            .into_iter()
            .enumerate()
            .map(|(i, date)| {
                let time = (date - settlement).num_days() as f64 / DAYS_PER_YEAR;
                if i == last {
                    ScheduledCashFlow {
                        date,
                        time,
                        amount: coupon + redemption,
                        kind: CashFlowKind::CouponAndRedemption,
                    }
                } else {
                    ScheduledCashFlow {
                        date,
                        time,
                        amount: coupon,
                        kind: CashFlowKind::Coupon,
                    }
                }
            })
            .collect();

        Ok(Self { flows })
    }

    pub fn flows(&self) -> &[ScheduledCashFlow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.flows.iter().map(|cf| cf.date).collect()
    }

    pub fn time_fractions(&self) -> Vec<Years> {
        self.flows.iter().map(|cf| cf.time).collect()
    }

    pub fn amounts(&self) -> Vec<Money> {
        self.flows.iter().map(|cf| cf.amount).collect()
    }

    /// Years from settlement to the final (redemption) payment.
    pub fn final_time(&self) -> Years {
        self.flows.last().map(|cf| cf.time).unwrap_or_default()
    }
}

/// Months between coupon dates. `frequency` must divide 12.
pub fn months_per_period(frequency: u32) -> BondAnalyticsResult<u32> {
    if frequency == 0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "frequency".into(),
            reason: "Frequency must be a positive number of payments per year".into(),
        });
    }
    if MONTHS_PER_YEAR % frequency != 0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "frequency".into(),
            reason: format!(
                "Frequency {frequency} does not give a whole-month coupon period (12 / {frequency})"
            ),
        });
    }
    Ok(MONTHS_PER_YEAR / frequency)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Walk backwards from maturity until a candidate falls on or before
/// settlement. Each step offsets the previous date, so day-of-month clamping
/// carries forward (Aug 31 -> May 31 -> Feb 29 -> Nov 29).
fn payment_dates(
    settlement: NaiveDate,
    maturity: NaiveDate,
    frequency: u32,
) -> BondAnalyticsResult<Vec<NaiveDate>> {
    let step = Months::new(months_per_period(frequency)?);
    let mut dates = Vec::new();

    let mut date = maturity;
    while date > settlement {
        dates.push(date);
        date = date.checked_sub_months(step).ok_or_else(|| {
            BondAnalyticsError::DateError(format!(
                "Coupon date before {date} is outside the supported calendar range"
            ))
        })?;
    }

    dates.reverse();
    Ok(dates)
}
