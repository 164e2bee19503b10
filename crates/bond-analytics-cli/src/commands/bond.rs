use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use bond_analytics_core::fixed_income::analysis::{
    self, BondAnalysisInput, PriceYieldProfileInput, DEFAULT_PROFILE_HALF_WIDTH,
    DEFAULT_PROFILE_POINTS,
};
use bond_analytics_core::fixed_income::bonds::{BondTerms, DEFAULT_REDEMPTION};
use bond_analytics_core::solver::{SolverConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};

use crate::input;

/// Contractual terms shared by the single-bond commands
#[derive(Args)]
pub struct BondTermsArgs {
    /// Settlement date (YYYY-MM-DD)
    #[arg(long)]
    pub settlement: Option<NaiveDate>,

    /// Maturity date (YYYY-MM-DD)
    #[arg(long)]
    pub maturity: Option<NaiveDate>,

    /// Annual coupon rate (e.g. 0.05 for 5%)
    #[arg(long)]
    pub coupon_rate: Option<f64>,

    /// Face value the coupon is paid on
    #[arg(long, default_value = "100")]
    pub face_value: f64,

    /// Amount repaid at maturity
    #[arg(long, default_value_t = DEFAULT_REDEMPTION)]
    pub redemption: f64,

    /// Coupons per year (1, 2, 3, 4, 6 or 12)
    #[arg(long, default_value = "2")]
    pub frequency: u32,
}

impl BondTermsArgs {
    fn to_terms(&self) -> Result<BondTerms, Box<dyn std::error::Error>> {
        Ok(BondTerms {
            settlement_date: self
                .settlement
                .ok_or("--settlement is required (or provide --input)")?,
            maturity_date: self
                .maturity
                .ok_or("--maturity is required (or provide --input)")?,
            coupon_rate: self
                .coupon_rate
                .ok_or("--coupon-rate is required (or provide --input)")?,
            face_value: self.face_value,
            redemption: self.redemption,
            frequency: self.frequency,
        })
    }
}

/// Arguments for single-bond analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub terms: BondTermsArgs,

    /// Market price; the yield is solved from it
    #[arg(long)]
    pub price: Option<f64>,

    /// Yield to maturity; the price is computed from it
    #[arg(long)]
    pub ytm: Option<f64>,

    /// Newton-Raphson convergence tolerance
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: f64,

    /// Newton-Raphson iteration cap
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: u32,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the price/yield profile
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub terms: BondTermsArgs,

    /// Yield the grid is centred on
    #[arg(long)]
    pub ytm: Option<f64>,

    /// Distance either side of the centre yield
    #[arg(long, default_value_t = DEFAULT_PROFILE_HALF_WIDTH)]
    pub half_width: f64,

    /// Number of grid points
    #[arg(long, default_value_t = DEFAULT_PROFILE_POINTS)]
    pub points: usize,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input: BondAnalysisInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        if args.price.is_none() && args.ytm.is_none() {
            return Err("--price or --ytm is required (or provide --input)".into());
        }
        BondAnalysisInput {
            terms: args.terms.to_terms()?,
            market_price: args.price,
            ytm: args.ytm,
            solver: SolverConfig {
                tolerance: args.tolerance,
                max_iterations: args.max_iterations,
            },
        }
    };

    let result = analysis::analyze_bond(&analysis_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_profile(args: ProfileArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let profile_input: PriceYieldProfileInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        PriceYieldProfileInput {
            terms: args.terms.to_terms()?,
            ytm: args.ytm.ok_or("--ytm is required (or provide --input)")?,
            half_width: args.half_width,
            points: args.points,
        }
    };

    let result = analysis::price_yield_profile(&profile_input)?;
    Ok(serde_json::to_value(result)?)
}
