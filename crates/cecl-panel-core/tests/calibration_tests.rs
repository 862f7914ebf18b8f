use cecl_panel_core::calibration::{
    calibrate_products, compute_scalers, cumulative_from_hazards, hazards_from_cumulative,
    CalibrationInput, SCALER_CAP, SCALER_FLOOR,
};
use cecl_panel_core::ecl::{sum_by_month, DEFAULT_LGD};
use cecl_panel_core::simulation::{generate_portfolio, PortfolioInput};
use cecl_panel_core::ProductType;
use proptest::prelude::*;
use std::collections::BTreeMap;

// ===========================================================================
// Strategies
// ===========================================================================

/// Non-decreasing cumulative curves in [0, 1].
fn cumulative_curve() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..0.15, 1..36).prop_map(|steps| {
        let mut acc = 0.0f64;
        steps
            .into_iter()
            .map(|s| {
                acc = (acc + s).min(1.0);
                acc
            })
            .collect()
    })
}

fn curve_with_model() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    cumulative_curve().prop_flat_map(|cum| {
        let n = cum.len();
        (Just(cum), prop::collection::vec(0.0f64..0.5, n))
    })
}

proptest! {
    #[test]
    fn prop_hazards_bounded_and_same_length(cum in cumulative_curve()) {
        let h = hazards_from_cumulative(&cum);
        prop_assert_eq!(h.len(), cum.len());
        prop_assert!(h.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn prop_scalers_bounded_and_shaped((cum, model) in curve_with_model()) {
        let s = compute_scalers(&model, &cum).unwrap();
        prop_assert_eq!(s.len(), model.len());
        prop_assert!(s.iter().all(|v| (SCALER_FLOOR..=SCALER_CAP).contains(v)));
    }

    #[test]
    fn prop_raising_one_entry_never_lowers_its_hazard(
        cum in cumulative_curve(),
        pick in any::<prop::sample::Index>(),
        frac in 0.0f64..=1.0,
    ) {
        let i = pick.index(cum.len());
        let ceiling = cum.get(i + 1).copied().unwrap_or(1.0);
        let mut bumped = cum.clone();
        bumped[i] = cum[i] + frac * (ceiling - cum[i]);
        let before = hazards_from_cumulative(&cum)[i];
        let after = hazards_from_cumulative(&bumped)[i];
        prop_assert!(after >= before - 1e-12);
    }
}

// ===========================================================================
// Concrete curves
// ===========================================================================

#[test]
fn test_flat_cumulative_step_has_zero_hazard() {
    let h = hazards_from_cumulative(&[0.0, 0.02, 0.05, 0.05, 0.10]);
    assert_eq!(h.len(), 5);
    assert!(h.iter().all(|v| *v >= 0.0));
    assert_eq!(h[0], 0.0);
    assert!((h[1] - 0.02).abs() < 1e-12);
    assert!((h[2] - 0.03 / 0.98).abs() < 1e-12);
    assert_eq!(h[3], 0.0);
    let survival: Vec<f64> = cumulative_from_hazards(&h).iter().map(|c| 1.0 - c).collect();
    assert!(survival.windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn test_scaled_model_reaccumulates_to_target() {
    let model = [0.01, 0.02, 0.03];
    let target = [0.01, 0.03, 0.06];
    let s = compute_scalers(&model, &target).unwrap();
    let scaled: Vec<f64> = model.iter().zip(&s).map(|(m, k)| m * k).collect();
    let cum = cumulative_from_hazards(&scaled);
    for (c, t) in cum.iter().zip(&target) {
        assert!((c - t).abs() < 1e-9, "{c} vs {t}");
    }
}

// ===========================================================================
// Calibration over a simulated panel
// ===========================================================================

#[test]
fn test_scaled_aggregates_match_direct_sums() {
    let portfolio = generate_portfolio(&PortfolioInput {
        num_borrowers: 250,
        products: vec![ProductType::Card, ProductType::Personal],
        months: 12,
        seed: 4242,
        ..PortfolioInput::default()
    })
    .unwrap()
    .result;
    let panel: Vec<_> = portfolio
        .panels
        .values()
        .flat_map(|p| p.records.iter().cloned())
        .collect();

    let mut targets = BTreeMap::new();
    targets.insert(ProductType::Card, (1..=12).map(|i| 0.004 * i as f64).collect());
    targets.insert(ProductType::Personal, (1..=12).map(|i| 0.002 * i as f64).collect());
    let out = calibrate_products(&CalibrationInput {
        panel: panel.clone(),
        targets,
        months: Some(9),
        default_lgd: DEFAULT_LGD,
    })
    .unwrap()
    .result;

    assert_eq!(out.products.len(), 2);
    assert_eq!(out.scaled.len(), 250 * 2 * 9);
    assert!(out.scaled.iter().all(|r| r.month_idx < 9));
    assert!(out
        .scaled
        .iter()
        .all(|r| (r.monthly_ecl_scaled - r.ecl.monthly_ecl * r.scale_factor).abs() < 1e-9));

    // Re-aggregating the scaled column reproduces the reported aggregates.
    let direct = sum_by_month(
        out.scaled.iter().map(|r| {
            (
                r.ecl.record.asof_month,
                r.ecl.record.product,
                r.monthly_ecl_scaled,
                r.ecl.ead_t,
            )
        }),
        false,
    );
    assert_eq!(direct.len(), out.scaled_overall.len());
    for (a, b) in direct.iter().zip(&out.scaled_overall) {
        assert_eq!(a.asof_month, b.asof_month);
        assert!((a.portfolio_monthly_ecl - b.portfolio_monthly_ecl).abs() < 1e-6);
        assert!((a.portfolio_ead - b.portfolio_ead).abs() < 1e-6);
    }
    for p in &out.products {
        assert_eq!(p.scalers.factors.len(), 12);
        assert_eq!(p.target_hazards.len(), 12);
    }
}
