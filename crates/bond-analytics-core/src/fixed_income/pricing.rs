//! Price as a function of yield.
//!
//! Each cash flow is discounted at `(1 + y/f)^(t·f)` with `t` the exact
//! actual/365 year fraction, so price is smooth in both yield and settlement
//! date.

use crate::error::BondAnalyticsError;
use crate::fixed_income::bonds::Bond;
use crate::types::{Money, Rate, Years};
use crate::BondAnalyticsResult;

impl Bond {
    /// Present value of all remaining cash flows at yield `ytm`.
    pub fn price(&self, ytm: Rate) -> BondAnalyticsResult<Money> {
        let base = self.periodic_base(ytm)?;
        let f = f64::from(self.frequency());
        Ok(self
            .cash_flows()
            .iter()
            .map(|cf| cf.amount * base.powf(-cf.time * f))
            .sum())
    }

    /// dP/dy = -Σ t·CF·(1 + y/f)^(-t·f - 1)
    pub fn price_derivative(&self, ytm: Rate) -> BondAnalyticsResult<f64> {
        let base = self.periodic_base(ytm)?;
        let f = f64::from(self.frequency());
        Ok(-self
            .cash_flows()
            .iter()
            .map(|cf| cf.time * cf.amount * base.powf(-cf.time * f - 1.0))
            .sum::<f64>())
    }

    /// Discount factor for a cash flow `time` years from settlement.
    pub fn discount_factor(&self, ytm: Rate, time: Years) -> BondAnalyticsResult<f64> {
        let base = self.periodic_base(ytm)?;
        Ok(base.powf(-time * f64::from(self.frequency())))
    }

    /// `1 + y/f`, which must be strictly positive for any discounting.
    pub(crate) fn periodic_base(&self, ytm: Rate) -> BondAnalyticsResult<f64> {
        let frequency = self.frequency();
        let base = 1.0 + ytm / f64::from(frequency);
        if !ytm.is_finite() || base <= 0.0 {
            return Err(BondAnalyticsError::UndefinedDiscountFactor {
                rate: ytm,
                frequency,
            });
        }
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn five_year(frequency: u32) -> Bond {
        Bond::from_parts(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2028, 1, 1).unwrap(),
            0.05,
            100.0,
            100.0,
            frequency,
        )
        .unwrap()
    }

    #[test]
    fn test_par_bond_prices_near_par() {
        let price = five_year(1).price(0.05).unwrap();
        // Leap-day drift puts the flows slightly past whole years.
        assert!((price - 100.0).abs() < 0.05, "price {price}");
        assert!(price < 100.0);
    }

    #[test]
    fn test_discount_and_premium() {
        let bond = five_year(2);
        assert!(bond.price(0.06).unwrap() < 100.0);
        assert!(bond.price(0.04).unwrap() > 100.0);
    }

    #[test]
    fn test_zero_yield_is_sum_of_cash_flows() {
        let bond = five_year(2);
        assert_relative_eq!(bond.price(0.0).unwrap(), 125.0, epsilon = 1e-12);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let bond = five_year(2);
        let h = 1e-6;
        let numeric = (bond.price(0.05 + h).unwrap() - bond.price(0.05 - h).unwrap()) / (2.0 * h);
        assert_relative_eq!(bond.price_derivative(0.05).unwrap(), numeric, max_relative = 1e-6);
    }

    #[test]
    fn test_undefined_discount_factor() {
        let bond = five_year(2);
        assert!(matches!(
            bond.price(-2.0),
            Err(BondAnalyticsError::UndefinedDiscountFactor { .. })
        ));
        assert!(bond.price(-2.5).is_err());
        assert!(bond.price(f64::NAN).is_err());
        // Negative yields are fine while 1 + y/f stays positive.
        assert!(bond.price(-0.02).unwrap() > 125.0 - 1e-9);
    }

    #[test]
    fn test_discount_factor_at_one_year() {
        let bond = five_year(1);
        assert_relative_eq!(bond.discount_factor(0.05, 1.0).unwrap(), 1.0 / 1.05);
    }
}
