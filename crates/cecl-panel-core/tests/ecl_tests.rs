use cecl_panel_core::ecl::{run_cecl, CeclInput, DEFAULT_LGD};
use cecl_panel_core::simulation::{generate_portfolio, PortfolioInput};
use cecl_panel_core::{CeclError, ProductType};
use pretty_assertions::assert_eq;
use serde_json::json;

fn simulated_panel(seed: u64) -> Vec<cecl_panel_core::PerformanceRecord> {
    generate_portfolio(&PortfolioInput {
        num_borrowers: 200,
        months: 18,
        seed,
        ..PortfolioInput::default()
    })
    .unwrap()
    .result
    .panels
    .into_values()
    .flat_map(|p| p.records)
    .collect()
}

#[test]
fn test_loss_is_charged_on_default_months_only() {
    let panel = simulated_panel(8);
    let out = run_cecl(&CeclInput {
        panel: panel.clone(),
        default_lgd: DEFAULT_LGD,
    })
    .unwrap()
    .result;

    let expected: f64 = panel
        .iter()
        .filter(|r| r.default_flag)
        .map(|r| r.loss_given_default.unwrap() * r.balance_ead)
        .sum();
    assert!((out.total_ecl - expected).abs() < 1e-6);
    assert!(out
        .monthly
        .iter()
        .filter(|r| !r.record.default_flag)
        .all(|r| r.monthly_ecl == 0.0));
}

#[test]
fn test_aggregates_reconcile() {
    let out = run_cecl(&CeclInput {
        panel: simulated_panel(9),
        default_lgd: DEFAULT_LGD,
    })
    .unwrap()
    .result;

    assert_eq!(out.overall.len(), 18);
    let products: std::collections::BTreeSet<_> = out.by_product.iter().filter_map(|a| a.product).collect();
    assert_eq!(products.len(), ProductType::ALL.len());

    let overall_total: f64 = out.overall.iter().map(|a| a.portfolio_monthly_ecl).sum();
    let lifetime_total: f64 = out.lifetime.iter().map(|l| l.lifetime_ecl).sum();
    assert!((overall_total - lifetime_total).abs() < 1e-6);
    assert!((overall_total - out.total_ecl).abs() < 1e-6);
    assert_eq!(out.lifetime.len(), 200 * 5);
    assert!(out.lifetime.iter().all(|l| l.months == 18));
}

#[test]
fn test_json_panel_missing_columns_names_full_set() {
    let value = json!({"panel": [{"loan_id": 1, "asof_month": "2020-01-01"}]});
    match CeclInput::from_json(value) {
        Err(CeclError::Schema { missing, .. }) => {
            assert!(missing.contains(&"balance_ead".to_string()));
            assert!(missing.contains(&"default_flag".to_string()));
            assert!(missing.contains(&"loss_given_default".to_string()));
            assert!(!missing.contains(&"loan_id".to_string()));
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn test_loss_columns_only_panel_is_a_schema_error() {
    let value = json!({"panel": [{
        "asof_month": "2020-01-01",
        "loan_id": 1,
        "balance_ead": 100.0,
        "default_flag": true,
        "loss_given_default": null
    }]});
    match CeclInput::from_json(value) {
        Err(CeclError::Schema { context, missing }) => {
            assert_eq!(context, "panel");
            assert!(missing.contains(&"borrower_id".to_string()));
            assert!(missing.contains(&"roll_rate_bucket".to_string()));
            assert!(!missing.contains(&"default_flag".to_string()));
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn test_unset_lgd_falls_back_to_default() {
    let mut panel = simulated_panel(10);
    for r in panel.iter_mut() {
        r.loss_given_default = None;
    }
    let out = run_cecl(&CeclInput {
        panel: panel.clone(),
        default_lgd: 0.5,
    })
    .unwrap()
    .result;
    let expected: f64 = panel
        .iter()
        .filter(|r| r.default_flag)
        .map(|r| 0.5 * r.balance_ead)
        .sum();
    assert!((out.total_ecl - expected).abs() < 1e-6);
}
