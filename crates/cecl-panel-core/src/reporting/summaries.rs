use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ecl::PortfolioAggregate;
use crate::types::{Loan, ProductType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRow {
    pub product: ProductType,
    pub asof_month: NaiveDate,
    pub monthly_ecl: f64,
    pub ead: f64,
    pub coverage_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummaryRow {
    pub asof_month: NaiveDate,
    pub portfolio_monthly_ecl: f64,
    pub portfolio_ead: f64,
    pub coverage_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VintageRow {
    pub product: ProductType,
    pub vintage: String,
    pub loans: usize,
    pub orig_balance_total: f64,
}

/// Latest month per product. Rows without a product are ignored.
pub fn coverage_by_product(by_product: &[PortfolioAggregate]) -> Vec<CoverageRow> {
    let mut latest: BTreeMap<ProductType, &PortfolioAggregate> = BTreeMap::new();
    for a in by_product {
        let Some(product) = a.product else { continue };
        match latest.get(&product) {
            Some(prev) if prev.asof_month >= a.asof_month => {}
            _ => {
                latest.insert(product, a);
            }
        }
    }
    latest
        .into_iter()
        .map(|(product, a)| CoverageRow {
            product,
            asof_month: a.asof_month,
            monthly_ecl: a.portfolio_monthly_ecl,
            ead: a.portfolio_ead,
            coverage_pct: a.coverage_pct(),
        })
        .collect()
}

/// Overall aggregates in month order with coverage attached.
pub fn monthly_summary_overall(overall: &[PortfolioAggregate]) -> Vec<MonthlySummaryRow> {
    let mut rows: Vec<MonthlySummaryRow> = overall
        .iter()
        .map(|a| MonthlySummaryRow {
            asof_month: a.asof_month,
            portfolio_monthly_ecl: a.portfolio_monthly_ecl,
            portfolio_ead: a.portfolio_ead,
            coverage_pct: a.coverage_pct(),
        })
        .collect();
    rows.sort_by_key(|r| r.asof_month);
    rows
}

/// Originated balance by product and vintage. Loans without a vintage are
/// grouped under their origination month.
pub fn vintage_summary(loans: &[Loan]) -> Vec<VintageRow> {
    let mut acc: BTreeMap<(ProductType, String), (usize, f64)> = BTreeMap::new();
    for l in loans {
        let vintage = l
            .vintage
            .clone()
            .unwrap_or_else(|| l.origination_dt.format("%Y-%m").to_string());
        let slot = acc.entry((l.product, vintage)).or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += l.orig_balance;
    }
    acc.into_iter()
        .map(|((product, vintage), (loans, total))| VintageRow {
            product,
            vintage,
            loans,
            orig_balance_total: total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(month: u32, product: Option<ProductType>, ecl: f64, ead: f64) -> PortfolioAggregate {
        PortfolioAggregate {
            asof_month: NaiveDate::from_ymd_opt(2020, month, 1).unwrap(),
            product,
            portfolio_monthly_ecl: ecl,
            portfolio_ead: ead,
        }
    }

    #[test]
    fn test_coverage_uses_latest_month() {
        let rows = vec![
            agg(3, Some(ProductType::Card), 5.0, 100.0),
            agg(1, Some(ProductType::Card), 1.0, 100.0),
            agg(2, Some(ProductType::Auto), 0.0, 0.0),
        ];
        let cov = coverage_by_product(&rows);
        assert_eq!(cov.len(), 2);
        assert_eq!(cov[0].product, ProductType::Card);
        assert_eq!(cov[0].coverage_pct, 5.0);
        assert_eq!(cov[1].coverage_pct, 0.0);
    }

    #[test]
    fn test_monthly_summary_sorted() {
        let rows = vec![agg(2, None, 2.0, 50.0), agg(1, None, 1.0, 50.0)];
        let s = monthly_summary_overall(&rows);
        assert_eq!(s[0].asof_month.format("%m").to_string(), "01");
        assert_eq!(s[1].coverage_pct, 4.0);
    }
}
