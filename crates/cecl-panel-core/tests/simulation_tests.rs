use cecl_panel_core::calendar::default_start_month;
use cecl_panel_core::macro_series::{MacroSeries, FED_FUNDS, UNEMPLOYMENT};
use cecl_panel_core::simulation::{
    generate_portfolio, simulate_panel, simulate_with_policy, BalanceModel, Hazard, PortfolioInput,
    SimulationInput, TransitionPolicy,
};
use cecl_panel_core::time_value::{amortization_schedule, to_f64, AmortizationInput};
use cecl_panel_core::validation::validate_panel;
use cecl_panel_core::{CeclError, DelinquencyState, Loan, PerformanceRecord, ProductType};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

// ===========================================================================
// Helpers
// ===========================================================================

fn portfolio(seed: u64, months: usize) -> cecl_panel_core::simulation::PortfolioOutput {
    generate_portfolio(&PortfolioInput {
        num_borrowers: 300,
        months,
        seed,
        ..PortfolioInput::default()
    })
    .unwrap()
    .result
}

fn by_loan(records: &[PerformanceRecord]) -> BTreeMap<u64, Vec<&PerformanceRecord>> {
    let mut out: BTreeMap<u64, Vec<&PerformanceRecord>> = BTreeMap::new();
    for r in records {
        out.entry(r.loan_id).or_default().push(r);
    }
    out
}

fn flat_macro(months: usize) -> MacroSeries {
    let dates = cecl_panel_core::calendar::month_range(default_start_month(), months).unwrap();
    let mut cols = BTreeMap::new();
    cols.insert(UNEMPLOYMENT.to_string(), vec![5.0; months]);
    MacroSeries::new(dates, cols).unwrap()
}

fn personal_loan(balance: f64, rate: f64, term: u32) -> Loan {
    Loan {
        loan_id: 20_000_001,
        borrower_id: 1,
        product: ProductType::Personal,
        origination_dt: default_start_month(),
        maturity_months: term,
        interest_rate: rate,
        orig_balance: balance,
        secured_flag: false,
        ltv_at_orig: None,
        risk_grade: None,
        underwriting_dti: None,
        underwriting_fico: Some(700),
        channel: None,
        state: None,
        vintage: None,
        credit_limit: None,
    }
}

fn frozen(product: ProductType) -> TransitionPolicy {
    let zero = Hazard {
        base: 0.0,
        risk: 0.0,
        stress: 0.0,
        stress_mult: 0.0,
        lo: 0.0,
        hi: 0.0,
    };
    let mut policy = TransitionPolicy::for_product(product);
    policy.advance = [zero; 4];
    policy.cure = [zero; 3];
    policy.balance = BalanceModel::Installment { prepay: None };
    policy
}

// ===========================================================================
// State machine
// ===========================================================================

#[test]
fn test_every_product_panel_respects_state_machine() {
    let out = portfolio(12345, 24);
    assert_eq!(out.panels.len(), 5);
    for (product, panel) in &out.panels {
        assert_eq!(panel.records.len(), 300 * 24, "{product}");
        let issues = validate_panel(*product, &panel.records);
        assert!(issues.is_empty(), "{product}: {issues:?}");
    }
}

#[test]
fn test_charged_off_loans_hold_zero_balance_and_fixed_lgd() {
    let out = portfolio(2024, 24);
    for panel in out.panels.values() {
        for rows in by_loan(&panel.records).values() {
            let Some(co) = rows.iter().position(|r| r.default_flag) else {
                continue;
            };
            let lgd = rows[co].loss_given_default;
            assert!(lgd.is_some());
            assert_eq!(rows[co].current_principal, 0.0);
            for r in &rows[co + 1..] {
                assert_eq!(r.roll_rate_bucket, DelinquencyState::ChargedOff);
                assert_eq!(r.balance_ead, 0.0);
                assert_eq!(r.loss_given_default, lgd);
                assert!(!r.default_flag);
            }
        }
    }
}

#[test]
fn test_recovery_lands_once_at_scheduled_lag() {
    let out = portfolio(77, 24);
    let mut seen = 0;
    for panel in out.panels.values() {
        for rows in by_loan(&panel.records).values() {
            let recoveries: Vec<usize> = rows
                .iter()
                .enumerate()
                .filter(|(_, r)| r.recovery_amt > 0.0)
                .map(|(i, _)| i)
                .collect();
            assert!(recoveries.len() <= 1);
            let Some(&at) = recoveries.first() else {
                continue;
            };
            seen += 1;
            let co = rows.iter().position(|r| r.default_flag).unwrap();
            let r = rows[at];
            assert_eq!(at - co, r.recovery_lag_m as usize);
            let expected = (1.0 - rows[co].loss_given_default.unwrap()) * rows[co].balance_ead;
            assert!((r.recovery_amt - expected).abs() < 1e-6);
        }
    }
    assert!(seen > 0, "expected at least one realized recovery");
}

#[test]
fn test_cure_flags_only_on_return_to_current() {
    let out = portfolio(5, 18);
    for panel in out.panels.values() {
        for rows in by_loan(&panel.records).values() {
            for pair in rows.windows(2) {
                if pair[1].cure_flag {
                    assert!(pair[0].roll_rate_bucket.is_delinquent());
                    assert_eq!(pair[1].roll_rate_bucket, DelinquencyState::Current);
                }
            }
        }
    }
}

// ===========================================================================
// Balances
// ===========================================================================

#[test]
fn test_level_payment_retires_balance_at_maturity() {
    let input = SimulationInput {
        product: ProductType::Personal,
        loans: vec![personal_loan(1000.0, 0.12, 12)],
        macro_series: flat_macro(12),
        start_month: default_start_month(),
        horizon_months: 12,
        seed: 1,
        unemployment_baseline: None,
    };
    let out = simulate_with_policy(&frozen(ProductType::Personal), &input).unwrap();
    let rows = &out.result.records;
    assert_eq!(rows.len(), 12);
    assert!(rows.iter().all(|r| r.roll_rate_bucket == DelinquencyState::Current));
    assert!(rows[11].balance_ead.abs() < 1e-6);
    let repaid: f64 = rows.iter().map(|r| r.scheduled_principal).sum();
    assert!((repaid - 1000.0).abs() < 1e-6);

    let schedule = amortization_schedule(&AmortizationInput {
        principal: dec!(1000),
        annual_rate: dec!(0.12),
        term_months: 12,
    })
    .unwrap();
    assert!(to_f64(schedule.result.residual_balance).abs() < 1e-9);
    assert!((to_f64(schedule.result.payment) - 88.84878867834168).abs() < 1e-6);
}

#[test]
fn test_loan_repaid_while_past_due_returns_to_current() {
    let mut policy = frozen(ProductType::Personal);
    policy.advance[0] = Hazard {
        base: 1.0,
        risk: 0.0,
        stress: 0.0,
        stress_mult: 0.0,
        lo: 1.0,
        hi: 1.0,
    };
    let input = SimulationInput {
        product: ProductType::Personal,
        loans: vec![personal_loan(900.0, 0.12, 3)],
        macro_series: flat_macro(8),
        start_month: default_start_month(),
        horizon_months: 8,
        seed: 3,
        unemployment_baseline: None,
    };
    let out = simulate_with_policy(&policy, &input).unwrap();
    let rows = &out.result.records;
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0].roll_rate_bucket, DelinquencyState::Dpd30);
    assert_eq!(rows[1].roll_rate_bucket, DelinquencyState::Dpd30);

    // Final scheduled payment lands in the third month.
    assert_eq!(rows[2].roll_rate_bucket, DelinquencyState::Current);
    assert!(rows[2].cure_flag);
    for r in &rows[2..] {
        assert_eq!(r.roll_rate_bucket, DelinquencyState::Current);
        assert_eq!(r.days_past_due, 0);
        assert_eq!(r.balance_ead, 0.0);
    }
    assert!(rows[3..].iter().all(|r| !r.cure_flag));
    assert!(validate_panel(ProductType::Personal, rows).is_empty());
}

#[test]
fn test_revolving_balances_stay_within_limit() {
    let out = portfolio(31, 12);
    for product in [ProductType::Card, ProductType::Heloc] {
        let loans: BTreeMap<u64, &Loan> = out.loans[&product].iter().map(|l| (l.loan_id, l)).collect();
        for r in &out.panels[&product].records {
            let limit = loans[&r.loan_id].credit_limit.unwrap();
            if !r.default_flag {
                assert!(r.balance_ead <= 0.99 * limit + 1e-6);
            }
            let u = r.utilization.unwrap();
            assert!((0.0..=1.0).contains(&u));
        }
    }
}

// ===========================================================================
// Reproducibility and failures
// ===========================================================================

#[test]
fn test_same_seed_reproduces_panels() {
    let a = portfolio(999, 6);
    let b = portfolio(999, 6);
    for product in ProductType::ALL {
        assert_eq!(a.panels[&product].records, b.panels[&product].records);
    }
    let c = portfolio(1000, 6);
    assert_ne!(a.panels[&ProductType::Card].records, c.panels[&ProductType::Card].records);
}

#[test]
fn test_macro_without_unemployment_is_schema_error() {
    let dates = vec![default_start_month()];
    let mut columns = BTreeMap::new();
    columns.insert(FED_FUNDS.to_string(), vec![1.0]);
    let input = SimulationInput {
        product: ProductType::Personal,
        loans: vec![personal_loan(1000.0, 0.1, 12)],
        macro_series: MacroSeries {
            asof_month: dates,
            columns,
        },
        start_month: default_start_month(),
        horizon_months: 3,
        seed: 1,
        unemployment_baseline: None,
    };
    match simulate_panel(&input) {
        Err(CeclError::Schema { missing, .. }) => assert_eq!(missing, vec!["unemployment"]),
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn test_zero_horizon_rejected() {
    let input = SimulationInput {
        product: ProductType::Personal,
        loans: vec![personal_loan(1000.0, 0.1, 12)],
        macro_series: flat_macro(1),
        start_month: default_start_month(),
        horizon_months: 0,
        seed: 1,
        unemployment_baseline: None,
    };
    assert!(matches!(
        simulate_panel(&input).unwrap_err(),
        CeclError::InvalidInput { .. }
    ));
}
