//! Yield-to-maturity: inverts the pricing function with Newton-Raphson.
//!
//! A search that does not converge is a data condition (the price is not
//! attainable for this bond), so it comes back as `None` rather than an error.

use tracing::{debug, warn};

use crate::fixed_income::bonds::Bond;
use crate::solver::{newton_raphson, SolveFailure, SolverConfig, SolverResult};
use crate::types::{Money, Rate};

/// Starting yield when the bond pays no coupon.
const ZERO_COUPON_GUESS: Rate = 0.05;

impl Bond {
    /// Yield that prices the bond at `price`, or `None` when the search fails.
    pub fn yield_to_maturity(&self, price: Money) -> Option<Rate> {
        self.solve_yield(price, &SolverConfig::default())
            .ok()
            .map(|r| r.root)
    }

    /// Same as [`Bond::yield_to_maturity`] but exposes iteration statistics or
    /// the failure reason.
    pub fn solve_yield(
        &self,
        price: Money,
        config: &SolverConfig,
    ) -> Result<SolverResult, SolveFailure> {
        let guess = self.initial_yield_guess();
        if !price.is_finite() || price <= 0.0 {
            warn!(price, "yield requested for a non-positive or non-finite price");
            return Err(SolveFailure::Undefined { at: guess });
        }

        let outcome = newton_raphson(
            |y| self.price(y).map(|p| p - price).unwrap_or(f64::NAN),
            |y| self.price_derivative(y).unwrap_or(f64::NAN),
            guess,
            config,
        );

        match &outcome {
            Ok(r) => debug!(price, ytm = r.root, iterations = r.iterations, "yield solved"),
            Err(failure) => warn!(price, %failure, "yield search failed"),
        }
        outcome
    }

    /// Coupon rate when positive, otherwise 5%.
    pub fn initial_yield_guess(&self) -> Rate {
        if self.coupon_rate() > 0.0 {
            self.coupon_rate()
        } else {
            ZERO_COUPON_GUESS
        }
    }
}
