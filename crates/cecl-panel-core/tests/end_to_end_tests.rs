use cecl_panel_core::calibration::{calibrate_products, CalibrationInput};
use cecl_panel_core::ecl::{run_cecl, CeclInput, DEFAULT_LGD};
use cecl_panel_core::macro_series::MacroAdjustment;
use cecl_panel_core::reporting::{build_report, ReportInput};
use cecl_panel_core::scenarios::{run_scenarios, ScenarioSetInput, ScenarioSpec};
use cecl_panel_core::simulation::{generate_portfolio, PortfolioInput};
use cecl_panel_core::validation::{validate_dataset, ValidationInput};
use cecl_panel_core::{DelinquencyState, ProductType};
use std::collections::BTreeMap;

#[test]
fn test_generate_validate_report_calibrate() {
    let portfolio = generate_portfolio(&PortfolioInput {
        num_borrowers: 150,
        months: 12,
        seed: 31337,
        ..PortfolioInput::default()
    })
    .unwrap()
    .result;

    // Validation runs on the JSON form, as records arrive from disk.
    let mut input = ValidationInput::default();
    for (product, loans) in &portfolio.loans {
        input.loans.insert(
            *product,
            loans.iter().map(|l| serde_json::to_value(l).unwrap()).collect(),
        );
    }
    for (product, panel) in &portfolio.panels {
        input.panels.insert(
            *product,
            panel.records.iter().map(|r| serde_json::to_value(r).unwrap()).collect(),
        );
    }
    let report = validate_dataset(&input).unwrap().result;
    assert!(report.passed, "{:?}", report.issues);

    let panel: Vec<_> = portfolio
        .panels
        .values()
        .flat_map(|p| p.records.iter().cloned())
        .collect();
    let loans: Vec<_> = portfolio.loans.values().flatten().cloned().collect();

    let cecl = run_cecl(&CeclInput {
        panel: panel.clone(),
        default_lgd: DEFAULT_LGD,
    })
    .unwrap()
    .result;

    let rep = build_report(&ReportInput {
        panel: panel.clone(),
        loans: loans.clone(),
        default_lgd: DEFAULT_LGD,
    })
    .unwrap()
    .result;
    assert_eq!(rep.coverage.len(), 5);
    assert_eq!(rep.monthly_overall.len(), cecl.overall.len());
    assert_eq!(
        rep.vintages.iter().map(|v| v.loans).sum::<usize>(),
        loans.len()
    );
    let co = DelinquencyState::ChargedOff;
    assert_eq!(rep.roll_rates.rate(co, co), if rep.roll_rates.row_total(co) > 0 { 1.0 } else { 0.0 });
    for from in DelinquencyState::ALL {
        for to in DelinquencyState::ALL {
            if to.index() > from.index() + 1 {
                assert_eq!(rep.roll_rates.count(from, to), 0);
            }
        }
    }

    let mut targets = BTreeMap::new();
    targets.insert(ProductType::Mortgage, vec![0.0, 0.001, 0.002, 0.004, 0.006, 0.008]);
    let cal = calibrate_products(&CalibrationInput {
        panel,
        targets,
        months: None,
        default_lgd: DEFAULT_LGD,
    })
    .unwrap()
    .result;
    assert_eq!(cal.products[0].months, 6);
    assert_eq!(cal.scaled.len(), 150 * 6);
}

#[test]
fn test_adverse_scenario_reported_alongside_base() {
    let set = ScenarioSetInput {
        scenarios: vec![
            ScenarioSpec {
                name: "base".into(),
                n_borrowers: 120,
                months: 6,
                macro_adjustments: MacroAdjustment::default(),
                seed: None,
                probability: Some(0.7),
            },
            ScenarioSpec {
                name: "severe".into(),
                n_borrowers: 120,
                months: 6,
                macro_adjustments: MacroAdjustment {
                    unemployment_add: 4.0,
                    hpi_yoy_add: -10.0,
                },
                seed: None,
                probability: Some(0.3),
            },
        ],
        start_month: cecl_panel_core::calendar::default_start_month(),
        seed: 12345,
        products: ProductType::ALL.to_vec(),
        macro_series: None,
        default_lgd: DEFAULT_LGD,
    };
    let out = run_scenarios(&set).unwrap().result;
    assert_eq!(out.comparison.len(), 2);
    assert_eq!(out.runs[1].by_product.len(), 5 * 6);
    assert!(out.probability_weighted_ecl.unwrap() >= 0.0);
}
