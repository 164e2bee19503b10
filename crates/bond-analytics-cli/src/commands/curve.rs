use clap::Args;
use serde_json::Value;

use bond_analytics_core::fixed_income::bootstrap::{
    self, BenchmarkInstrument, BootstrapInput, DEFAULT_FACE_VALUE, DEFAULT_FREQUENCY,
};

use crate::input;

/// Arguments for zero-curve bootstrapping
#[derive(Args)]
pub struct BootstrapArgs {
    /// Benchmark maturities in years, comma-separated (e.g. 0.5,1,1.5)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub maturities: Vec<f64>,

    /// Benchmark prices per face value, comma-separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub prices: Vec<f64>,

    /// Annual coupon rates as decimals, comma-separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub coupon_rates: Vec<f64>,

    /// Face value shared by all benchmarks
    #[arg(long, default_value_t = DEFAULT_FACE_VALUE)]
    pub face_value: f64,

    /// Coupons per year
    #[arg(long, default_value_t = DEFAULT_FREQUENCY)]
    pub frequency: u32,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_bootstrap(args: BootstrapArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bootstrap_input: BootstrapInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        if args.maturities.is_empty() {
            return Err("--maturities, --prices and --coupon-rates are required (or provide --input)".into());
        }
        if args.prices.len() != args.maturities.len()
            || args.coupon_rates.len() != args.maturities.len()
        {
            return Err(format!(
                "--maturities ({}), --prices ({}) and --coupon-rates ({}) must have the same length",
                args.maturities.len(),
                args.prices.len(),
                args.coupon_rates.len()
            )
            .into());
        }
        BootstrapInput {
            instruments: args
                .maturities
                .iter()
                .zip(&args.prices)
                .zip(&args.coupon_rates)
                .map(|((&maturity, &price), &coupon_rate)| BenchmarkInstrument {
                    maturity,
                    price,
                    coupon_rate,
                })
                .collect(),
            face_value: args.face_value,
            frequency: args.frequency,
        }
    };

    let result = bootstrap::bootstrap_curve(&bootstrap_input)?;
    Ok(serde_json::to_value(result)?)
}
