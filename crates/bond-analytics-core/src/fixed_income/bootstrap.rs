//! Zero-coupon curve bootstrapping from coupon-bearing benchmark prices.
//!
//! Instruments are solved strictly in ascending maturity. Each instrument's
//! intermediate coupons are discounted on the part of the curve already
//! solved (linear interpolation, flat beyond either end), and what remains of
//! its price pins down the zero rate at its own maturity.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::BondAnalyticsError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::BondAnalyticsResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_FACE_VALUE: Money = 100.0;
pub const DEFAULT_FREQUENCY: u32 = 2;

/// Upper bound on `maturity * frequency` (100 years of monthly coupons).
pub const MAX_PERIODS: u32 = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A benchmark bond used to strip one tenor of the curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkInstrument {
    /// Maturity in years (e.g. 0.5, 1.0, 2.0)
    pub maturity: Years,
    /// Market price per `face_value`
    pub price: Money,
    /// Annual coupon rate as a decimal
    pub coupon_rate: Rate,
}

/// Input for curve bootstrapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapInput {
    /// Benchmarks in any order; they are sorted by maturity before solving.
    pub instruments: Vec<BenchmarkInstrument>,
    #[serde(default = "default_face_value")]
    pub face_value: Money,
    #[serde(default = "default_frequency")]
    pub frequency: u32,
}

fn default_face_value() -> Money {
    DEFAULT_FACE_VALUE
}

fn default_frequency() -> u32 {
    DEFAULT_FREQUENCY
}

/// One solved tenor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldCurvePoint {
    pub maturity: Years,
    pub price: Money,
    pub coupon_rate: Rate,
    /// floor(maturity * frequency)
    pub periods: u32,
    /// `None` when the price is inconsistent with the shorter tenors.
    pub zero_rate: Option<Rate>,
    /// (1 + zero_rate/f)^(-periods)
    pub discount_factor: Option<f64>,
}

/// Forward rate implied between two consecutive solved tenors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardRate {
    pub start: Years,
    pub end: Years,
    pub rate: Rate,
}

/// Append-only zero curve, ascending by maturity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldCurve {
    frequency: u32,
    points: Vec<YieldCurvePoint>,
}

/// Output of [`bootstrap_curve`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapOutput {
    pub points: Vec<YieldCurvePoint>,
    pub forward_rates: Vec<ForwardRate>,
}

// ---------------------------------------------------------------------------
// YieldCurve
// ---------------------------------------------------------------------------

impl YieldCurve {
    fn new(frequency: u32) -> Self {
        Self {
            frequency,
            points: Vec::new(),
        }
    }

    fn push(&mut self, point: YieldCurvePoint) {
        debug_assert!(self
            .points
            .last()
            .map_or(true, |last| last.maturity <= point.maturity));
        self.points.push(point);
    }

    pub fn points(&self) -> &[YieldCurvePoint] {
        &self.points
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Zero rate at `t` years, interpolated linearly between the solved
    /// tenors that bracket it and held flat outside them. Points whose rate is
    /// undefined are skipped. `None` if no tenor has been solved.
    pub fn zero_rate_at(&self, t: Years) -> Option<Rate> {
        let known: Vec<(Years, Rate)> = self
            .points
            .iter()
            .filter_map(|p| p.zero_rate.map(|z| (p.maturity, z)))
            .collect();

        let (first, last) = (known.first()?, known.last()?);
        if t <= first.0 {
            return Some(first.1);
        }
        if t >= last.0 {
            return Some(last.1);
        }

        known
            .windows(2)
            .find(|w| w[0].0 <= t && t <= w[1].0)
            .map(|w| {
                let ((t0, z0), (t1, z1)) = (w[0], w[1]);
                let dt = t1 - t0;
                if dt == 0.0 {
                    z0
                } else {
                    z0 + (t - t0) / dt * (z1 - z0)
                }
            })
    }

    /// Periodic forward rates between consecutive tenors with defined
    /// discount factors.
    pub fn forward_rates(&self) -> Vec<ForwardRate> {
        let f = f64::from(self.frequency);
        let defined: Vec<(&YieldCurvePoint, f64)> = self
            .points
            .iter()
            .filter_map(|p| p.discount_factor.map(|df| (p, df)))
            .collect();

        defined
            .windows(2)
            .filter_map(|w| {
                let ((near, df_near), (far, df_far)) = (w[0], w[1]);
                if far.periods <= near.periods || df_far <= 0.0 {
                    return None;
                }
                let span = f64::from(far.periods - near.periods);
                let rate = ((df_near / df_far).powf(1.0 / span) - 1.0) * f;
                rate.is_finite().then_some(ForwardRate {
                    start: near.maturity,
                    end: far.maturity,
                    rate,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Bootstrap a zero curve from parallel sequences of maturities, prices and
/// coupon rates. The result is sorted ascending by maturity.
pub fn bootstrap_yield_curve(
    maturities: &[Years],
    prices: &[Money],
    coupon_rates: &[Rate],
    face_value: Money,
    frequency: u32,
) -> BondAnalyticsResult<YieldCurve> {
    if maturities.len() != prices.len() || maturities.len() != coupon_rates.len() {
        return Err(BondAnalyticsError::InvalidInput {
            field: "instruments".into(),
            reason: format!(
                "Maturities ({}), prices ({}) and coupon rates ({}) must have the same length",
                maturities.len(),
                prices.len(),
                coupon_rates.len()
            ),
        });
    }

    let instruments: Vec<BenchmarkInstrument> = maturities
        .iter()
        .zip(prices)
        .zip(coupon_rates)
        .map(|((&maturity, &price), &coupon_rate)| BenchmarkInstrument {
            maturity,
            price,
            coupon_rate,
        })
        .collect();

    let mut warnings = Vec::new();
    build_curve(&instruments, face_value, frequency, &mut warnings)
}

/// Bootstrap a zero curve and derive forward rates, wrapped in the standard
/// output envelope. Arbitrage violations are reported as warnings.
pub fn bootstrap_curve(
    input: &BootstrapInput,
) -> BondAnalyticsResult<ComputationOutput<BootstrapOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let curve = build_curve(
        &input.instruments,
        input.face_value,
        input.frequency,
        &mut warnings,
    )?;

    let output = BootstrapOutput {
        forward_rates: curve.forward_rates(),
        points: curve.points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "method": "sequential bootstrap, ascending maturity",
        "interpolation": "linear on zero rates, flat extrapolation",
        "compounding": "periodic",
        "frequency": input.frequency,
        "face_value": input.face_value,
    });

    Ok(with_metadata(
        "Zero Curve Bootstrap",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn build_curve(
    instruments: &[BenchmarkInstrument],
    face_value: Money,
    frequency: u32,
    warnings: &mut Vec<String>,
) -> BondAnalyticsResult<YieldCurve> {
    validate_instruments(instruments, face_value, frequency)?;

    let mut sorted = instruments.to_vec();
    sorted.sort_by(|a, b| a.maturity.total_cmp(&b.maturity));

    let f = f64::from(frequency);
    let mut curve = YieldCurve::new(frequency);

    for inst in &sorted {
        let periods = periods_for(inst.maturity, f);
        let zero_rate = solve_tenor(&curve, inst, periods, face_value, f, warnings);
        let discount_factor = zero_rate
            .map(|z| 1.0 + z / f)
            .filter(|base| *base > 0.0)
            .map(|base| base.powi(-(periods as i32)))
            .filter(|df| df.is_finite());

        debug!(
            maturity = inst.maturity,
            periods,
            zero_rate = ?zero_rate,
            "bootstrapped tenor"
        );

        curve.push(YieldCurvePoint {
            maturity: inst.maturity,
            price: inst.price,
            coupon_rate: inst.coupon_rate,
            periods,
            zero_rate,
            discount_factor,
        });
    }

    Ok(curve)
}

/// Solve the zero rate for one instrument against the curve solved so far.
fn solve_tenor(
    curve: &YieldCurve,
    inst: &BenchmarkInstrument,
    periods: u32,
    face_value: Money,
    f: f64,
    warnings: &mut Vec<String>,
) -> Option<Rate> {
    let coupon = face_value * inst.coupon_rate / f;
    let final_flow = face_value + coupon;

    // Single outstanding period: one discounted cash flow, solved directly.
    if periods == 1 {
        let rate = (final_flow / inst.price - 1.0) * f;
        return rate.is_finite().then_some(rate);
    }

    let pv_coupons = if coupon == 0.0 {
        0.0
    } else {
        coupon_present_value(curve, coupon, periods, f)
    };

    if !pv_coupons.is_finite() {
        warnings.push(format!(
            "Coupons of the {}y instrument could not be discounted on the solved curve; zero rate undefined",
            inst.maturity
        ));
        return None;
    }

    let remaining = inst.price - pv_coupons;
    if remaining <= 0.0 {
        let msg = format!(
            "Arbitrage violation at {}y: price {} does not exceed the present value of its coupons ({:.6}); zero rate undefined",
            inst.maturity, inst.price, pv_coupons
        );
        warn!("{msg}");
        warnings.push(msg);
        return None;
    }

    let rate = ((final_flow / remaining).powf(1.0 / f64::from(periods)) - 1.0) * f;
    if rate.is_finite() {
        Some(rate)
    } else {
        warnings.push(format!(
            "Zero rate at {}y is not a finite number; left undefined",
            inst.maturity
        ));
        None
    }
}

/// PV of the coupons paid at periods 1..periods-1 on the solved curve.
/// Nothing solved yet means nothing to discount against, so the coupons
/// contribute zero and the maturity flow carries the whole price.
fn coupon_present_value(curve: &YieldCurve, coupon: Money, periods: u32, f: f64) -> Money {
    if curve.points.iter().all(|p| p.zero_rate.is_none()) {
        return 0.0;
    }

    (1..periods)
        .map(|t| {
            let z = curve.zero_rate_at(f64::from(t) / f).unwrap_or(f64::NAN);
            let base = 1.0 + z / f;
            if base > 0.0 {
                coupon / base.powi(t as i32)
            } else {
                f64::NAN
            }
        })
        .sum()
}

fn periods_for(maturity: Years, f: f64) -> u32 {
    (maturity * f).floor() as u32
}

fn validate_instruments(
    instruments: &[BenchmarkInstrument],
    face_value: Money,
    frequency: u32,
) -> BondAnalyticsResult<()> {
    if instruments.is_empty() {
        return Err(BondAnalyticsError::MissingInput(
            "Bootstrap requires at least one benchmark instrument".into(),
        ));
    }
    if frequency == 0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "frequency".into(),
            reason: "Frequency must be a positive number of payments per year".into(),
        });
    }
    if !face_value.is_finite() || face_value <= 0.0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "face_value".into(),
            reason: "Face value must be positive".into(),
        });
    }

    let f = f64::from(frequency);
    for inst in instruments {
        if !inst.maturity.is_finite() || inst.maturity <= 0.0 {
            return Err(BondAnalyticsError::InvalidInput {
                field: "maturity".into(),
                reason: format!("Maturity must be positive, got {}", inst.maturity),
            });
        }
        if !inst.price.is_finite() || inst.price <= 0.0 {
            return Err(BondAnalyticsError::InvalidInput {
                field: "price".into(),
                reason: format!("Price must be positive, got {} at {}y", inst.price, inst.maturity),
            });
        }
        if !inst.coupon_rate.is_finite() {
            return Err(BondAnalyticsError::InvalidInput {
                field: "coupon_rate".into(),
                reason: format!("Coupon rate must be finite at {}y", inst.maturity),
            });
        }
        if inst.maturity * f > f64::from(MAX_PERIODS) {
            return Err(BondAnalyticsError::InvalidInput {
                field: "maturity".into(),
                reason: format!(
                    "Maturity {}y exceeds {MAX_PERIODS} coupon periods at frequency {frequency}",
                    inst.maturity
                ),
            });
        }
        if periods_for(inst.maturity, f) == 0 {
            return Err(BondAnalyticsError::InvalidInput {
                field: "maturity".into(),
                reason: format!(
                    "Maturity {}y is shorter than one coupon period at frequency {frequency}",
                    inst.maturity
                ),
            });
        }
    }
    Ok(())
}
