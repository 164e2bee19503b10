use approx::assert_relative_eq;
use bond_analytics_core::fixed_income::analysis::{
    analyze_bond, price_yield_profile, BondAnalysisInput, PriceClassification,
    PriceYieldProfileInput,
};
use bond_analytics_core::fixed_income::bonds::{Bond, BondTerms};
use bond_analytics_core::fixed_income::schedule::CashFlowKind;
use bond_analytics_core::solver::SolverConfig;
use bond_analytics_core::BondAnalyticsError;
use chrono::NaiveDate;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn five_year_terms(frequency: u32) -> BondTerms {
    BondTerms {
        settlement_date: ymd(2023, 1, 1),
        maturity_date: ymd(2028, 1, 1),
        coupon_rate: 0.05,
        face_value: 100.0,
        redemption: 100.0,
        frequency,
    }
}

// ===========================================================================
// Pricing scenarios
// ===========================================================================

#[test]
fn test_annual_par_bond_prices_near_100() {
    let bond = Bond::new(five_year_terms(1)).unwrap();
    let price = bond.price(0.05).unwrap();
    assert!((price - 100.0).abs() < 0.05, "price = {price}");
    assert_relative_eq!(price, 99.98727, epsilon = 1e-4);
}

#[test]
fn test_yield_above_coupon_is_discount() {
    let bond = Bond::new(five_year_terms(1)).unwrap();
    let price = bond.price(0.06).unwrap();
    assert!(price < 100.0);
    assert_relative_eq!(price, 95.7731, epsilon = 1e-3);
}

#[test]
fn test_yield_to_maturity_reprices_95() {
    let bond = Bond::new(five_year_terms(1)).unwrap();
    let ytm = bond.yield_to_maturity(95.0).unwrap();
    assert!((bond.price(ytm).unwrap() - 95.0).abs() < 1e-4);
}

#[test]
fn test_semiannual_reference_prices() {
    let bond = Bond::new(five_year_terms(2)).unwrap();
    assert_eq!(bond.cash_flows().len(), 10);
    assert_relative_eq!(bond.price(0.05).unwrap(), 99.98937, epsilon = 1e-4);
    assert_relative_eq!(bond.price(0.06).unwrap(), 95.7228, epsilon = 1e-3);
    assert_relative_eq!(bond.price(0.04).unwrap(), 104.4823, epsilon = 1e-3);
}

// ===========================================================================
// Schedule
// ===========================================================================

#[test]
fn test_schedule_final_flow_carries_redemption() {
    let bond = Bond::new(BondTerms {
        redemption: 102.0,
        ..five_year_terms(2)
    })
    .unwrap();
    let flows = bond.cash_flows();
    let last = flows.last().unwrap();
    assert_eq!(last.date, ymd(2028, 1, 1));
    assert_eq!(last.kind, CashFlowKind::CouponAndRedemption);
    assert_relative_eq!(last.amount, 104.5);
    assert!(flows[..flows.len() - 1]
        .iter()
        .all(|cf| cf.kind == CashFlowKind::Coupon && cf.amount == 2.5));
}

#[test]
fn test_schedule_steps_back_from_month_end() {
    let bond = Bond::from_parts(ymd(2023, 3, 15), ymd(2024, 8, 31), 0.04, 100.0, 100.0, 4)
        .unwrap();
    let dates = bond.schedule().dates();
    assert_eq!(
        dates,
        vec![
            ymd(2023, 5, 29),
            ymd(2023, 8, 29),
            ymd(2023, 11, 29),
            ymd(2024, 2, 29),
            ymd(2024, 5, 31),
            ymd(2024, 8, 31),
        ]
    );
}

#[test]
fn test_invalid_terms_rejected() {
    let backwards = BondTerms {
        settlement_date: ymd(2028, 1, 1),
        maturity_date: ymd(2023, 1, 1),
        ..five_year_terms(2)
    };
    assert!(matches!(
        Bond::new(backwards),
        Err(BondAnalyticsError::InvalidInput { .. })
    ));

    let zero_frequency = five_year_terms(0);
    assert!(Bond::new(zero_frequency).is_err());
}

// ===========================================================================
// Risk measures
// ===========================================================================

#[test]
fn test_duration_bounds_for_coupon_bond() {
    let bond = Bond::new(five_year_terms(2)).unwrap();
    let final_time = bond.schedule().final_time();
    for y in [0.01, 0.05, 0.12] {
        let mac = bond.macaulay_duration(y).unwrap();
        let modified = bond.modified_duration(y).unwrap();
        assert!(mac > 0.0 && mac <= final_time, "y={y} mac={mac}");
        assert!(modified < mac);
        assert!(bond.convexity(y).unwrap() > 0.0);
    }
}

#[test]
fn test_duration_falls_as_yield_rises() {
    let bond = Bond::new(five_year_terms(2)).unwrap();
    let low = bond.macaulay_duration(0.02).unwrap();
    let high = bond.macaulay_duration(0.10).unwrap();
    assert!(high < low);
}

#[test]
fn test_undefined_yield_propagates_as_error() {
    let bond = Bond::new(five_year_terms(2)).unwrap();
    assert!(matches!(
        bond.price(-2.5),
        Err(BondAnalyticsError::UndefinedDiscountFactor { .. })
    ));
    assert!(bond.macaulay_duration(-2.5).is_err());
}

// ===========================================================================
// Analysis envelope
// ===========================================================================

#[test]
fn test_analyze_from_market_price() {
    let input = BondAnalysisInput {
        terms: five_year_terms(2),
        market_price: Some(95.0),
        ytm: None,
        solver: SolverConfig::default(),
    };
    let out = analyze_bond(&input).unwrap();
    let r = &out.result;
    assert_eq!(r.price, 95.0);
    assert_eq!(r.classification, PriceClassification::Discount);
    let ytm = r.ytm.unwrap();
    assert!(ytm > 0.05);
    assert!(r.risk_metrics.is_some());
    assert_eq!(r.num_cash_flows, 10);
    assert_eq!(r.cash_flows.len(), 10);
    let pv_total: f64 = r.cash_flows.iter().map(|cf| cf.present_value).sum();
    assert_relative_eq!(pv_total, 95.0, epsilon = 1e-4);
    assert_eq!(out.metadata.precision, "ieee754_f64");
}

#[test]
fn test_analyze_from_yield() {
    let input = BondAnalysisInput {
        terms: five_year_terms(2),
        market_price: None,
        ytm: Some(0.04),
        solver: SolverConfig::default(),
    };
    let out = analyze_bond(&input).unwrap();
    assert_eq!(out.result.classification, PriceClassification::Premium);
    assert_relative_eq!(out.result.price, 104.4823, epsilon = 1e-3);
}

#[test]
fn test_analyze_market_price_wins_over_yield() {
    let input = BondAnalysisInput {
        terms: five_year_terms(2),
        market_price: Some(95.0),
        ytm: Some(0.04),
        solver: SolverConfig::default(),
    };
    let out = analyze_bond(&input).unwrap();
    assert_eq!(out.result.price, 95.0);
    assert!(!out.warnings.is_empty());
}

#[test]
fn test_analyze_requires_price_or_yield() {
    let input = BondAnalysisInput {
        terms: five_year_terms(2),
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
fn test_analysis_input_from_json_defaults() {
    let input: BondAnalysisInput = serde_json::from_str(
        r#"{
            "settlement_date": "2023-01-01",
            "maturity_date": "2028-01-01",
            "coupon_rate": 0.05,
            "face_value": 100,
            "frequency": 2,
            "ytm": 0.05
        }"#,
    )
    .unwrap();
    assert_eq!(input.terms.redemption, 100.0);
    assert_eq!(input.solver, SolverConfig::default());
    assert!(analyze_bond(&input).is_ok());
}

#[test]
fn test_profile_is_decreasing_in_yield() {
    let input = PriceYieldProfileInput {
        terms: five_year_terms(2),
        ytm: 0.05,
        half_width: 0.05,
        points: 100,
    };
    let out = price_yield_profile(&input).unwrap();
    let points = &out.result.points;
    assert_eq!(points.len(), 100);
    assert_relative_eq!(points[0].ytm, 0.001, epsilon = 1e-12);
    assert_relative_eq!(points[99].ytm, 0.10, epsilon = 1e-12);
    assert!(points.windows(2).all(|w| w[1].price < w[0].price));
}
