use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

use super::engine::{simulate_panel, PanelOutput, SimulationInput};
use crate::calendar::{add_months, default_start_month};
use crate::macro_series::{synthesize, MacroSeries, SyntheticMacroInput};
use crate::origination::{generate_loans, OriginationInput};
use crate::population::{generate_borrowers, PopulationInput};
use crate::types::{with_metadata, Borrower, ComputationOutput, Loan, ProductType};
use crate::CeclResult;

/// Months of synthetic history generated ahead of the start month.
const MACRO_LOOKBACK_MONTHS: u32 = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioInput {
    #[serde(default = "default_borrowers")]
    pub num_borrowers: usize,
    #[serde(default = "default_products")]
    pub products: Vec<ProductType>,
    #[serde(default = "default_months")]
    pub months: usize,
    #[serde(default = "default_start_month")]
    pub start_month: NaiveDate,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Synthesized from `seed` when absent.
    #[serde(default)]
    pub macro_series: Option<MacroSeries>,
    #[serde(default)]
    pub unemployment_baseline: Option<f64>,
}

fn default_borrowers() -> usize {
    1000
}

fn default_products() -> Vec<ProductType> {
    ProductType::ALL.to_vec()
}

fn default_months() -> usize {
    12
}

fn default_seed() -> u64 {
    crate::DEFAULT_SEED
}

impl Default for PortfolioInput {
    fn default() -> Self {
        PortfolioInput {
            num_borrowers: default_borrowers(),
            products: default_products(),
            months: default_months(),
            start_month: default_start_month(),
            seed: default_seed(),
            macro_series: None,
            unemployment_baseline: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioOutput {
    pub macro_series: MacroSeries,
    pub borrowers: Vec<Borrower>,
    pub loans: BTreeMap<ProductType, Vec<Loan>>,
    pub panels: BTreeMap<ProductType, PanelOutput>,
}

/// Borrowers, one loan per borrower per product, and each product's panel.
///
/// All stages share one base seed; products stay independent through their
/// fixed seed offsets.
pub fn generate_portfolio(input: &PortfolioInput) -> CeclResult<ComputationOutput<PortfolioOutput>> {
    let start = Instant::now();

    let macro_series = match &input.macro_series {
        Some(series) => series.clone(),
        None => {
            let first = input
                .start_month
                .checked_sub_months(chrono::Months::new(MACRO_LOOKBACK_MONTHS))
                .unwrap_or(input.start_month);
            let last = add_months(input.start_month, input.months.saturating_sub(1) as u32)?;
            synthesize(&SyntheticMacroInput {
                start: first,
                end: last,
                seed: input.seed,
            })?
        }
    };

    let borrowers = generate_borrowers(&PopulationInput {
        num_borrowers: input.num_borrowers,
        seed: input.seed,
    })?;

    let mut products = input.products.clone();
    products.sort();
    products.dedup();

    let mut loans = BTreeMap::new();
    let mut panels = BTreeMap::new();
    let mut warnings = Vec::new();
    for product in products {
        let product_loans = generate_loans(&OriginationInput {
            product,
            borrowers: borrowers.clone(),
            seed: input.seed,
        })?;
        let panel = simulate_panel(&SimulationInput {
            product,
            loans: product_loans.clone(),
            macro_series: macro_series.clone(),
            start_month: input.start_month,
            horizon_months: input.months,
            seed: input.seed,
            unemployment_baseline: input.unemployment_baseline,
        })?;
        warnings.extend(panel.warnings.into_iter().map(|w| format!("{product}: {w}")));
        loans.insert(product, product_loans);
        panels.insert(product, panel.result);
    }

    let elapsed = start.elapsed().as_micros() as u64;
    info!(
        borrowers = borrowers.len(),
        products = panels.len(),
        months = input.months,
        elapsed_us = elapsed,
        "generated portfolio"
    );

    let assumptions = serde_json::json!({
        "num_borrowers": input.num_borrowers,
        "products": panels.keys().collect::<Vec<_>>(),
        "months": input.months,
        "start_month": input.start_month,
        "seed": input.seed,
        "macro_supplied": input.macro_series.is_some(),
    });

    Ok(with_metadata(
        "Synthetic borrower population, per-product origination and Markov panel simulation",
        &assumptions,
        warnings,
        elapsed,
        PortfolioOutput {
            macro_series,
            borrowers,
            loans,
            panels,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portfolio_covers_requested_products() {
        let out = generate_portfolio(&PortfolioInput {
            num_borrowers: 30,
            products: vec![ProductType::Mortgage, ProductType::Card, ProductType::Card],
            months: 4,
            ..PortfolioInput::default()
        })
        .unwrap();
        let p = out.result;
        assert_eq!(p.panels.keys().copied().collect::<Vec<_>>(), vec![
            ProductType::Card,
            ProductType::Mortgage
        ]);
        assert_eq!(p.panels[&ProductType::Card].records.len(), 120);
        assert_eq!(p.loans[&ProductType::Mortgage].len(), 30);
        assert_eq!(p.macro_series.len(), 16);
    }

    #[test]
    fn test_loans_link_back_to_borrowers() {
        let out = generate_portfolio(&PortfolioInput {
            num_borrowers: 10,
            products: vec![ProductType::Auto],
            months: 2,
            ..PortfolioInput::default()
        })
        .unwrap();
        let p = out.result;
        for (loan, borrower) in p.loans[&ProductType::Auto].iter().zip(&p.borrowers) {
            assert_eq!(loan.borrower_id, borrower.borrower_id);
            assert_eq!(loan.underwriting_fico, Some(borrower.fico_baseline));
        }
    }
}
