use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::monthly::EclRecord;
use crate::types::ProductType;

/// Month-level sum of loss and exposure.
///
/// `product` is `None` for cross-product aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAggregate {
    pub asof_month: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductType>,
    pub portfolio_monthly_ecl: f64,
    pub portfolio_ead: f64,
}

impl PortfolioAggregate {
    /// ECL over EAD in percent; zero when there is no exposure.
    pub fn coverage_pct(&self) -> f64 {
        if self.portfolio_ead > 0.0 {
            self.portfolio_monthly_ecl / self.portfolio_ead * 100.0
        } else {
            0.0
        }
    }
}

/// Sum `(month, product, ecl, ead)` tuples into month-ordered aggregates.
///
/// Any loss column can be aggregated this way, including a scaled one.
pub fn sum_by_month<I>(rows: I, keep_product: bool) -> Vec<PortfolioAggregate>
where
    I: IntoIterator<Item = (NaiveDate, ProductType, f64, f64)>,
{
    let mut acc: BTreeMap<(Option<ProductType>, NaiveDate), (f64, f64)> = BTreeMap::new();
    for (month, product, ecl, ead) in rows {
        let key = (keep_product.then_some(product), month);
        let slot = acc.entry(key).or_insert((0.0, 0.0));
        slot.0 += ecl;
        slot.1 += ead;
    }
    acc.into_iter()
        .map(|((product, asof_month), (ecl, ead))| PortfolioAggregate {
            asof_month,
            product,
            portfolio_monthly_ecl: ecl,
            portfolio_ead: ead,
        })
        .collect()
}

fn tuples(monthly: &[EclRecord]) -> impl Iterator<Item = (NaiveDate, ProductType, f64, f64)> + '_ {
    monthly
        .iter()
        .map(|r| (r.record.asof_month, r.record.product, r.monthly_ecl, r.ead_t))
}

/// Monthly sums across every row.
pub fn compute_portfolio_aggregates(monthly: &[EclRecord]) -> Vec<PortfolioAggregate> {
    sum_by_month(tuples(monthly), false)
}

/// Monthly sums per product, ordered by product then month.
pub fn aggregates_by_product(monthly: &[EclRecord]) -> Vec<PortfolioAggregate> {
    sum_by_month(tuples(monthly), true)
}

/// Month-wise sum of per-product aggregates.
pub fn overall_aggregates(by_product: &[PortfolioAggregate]) -> Vec<PortfolioAggregate> {
    let mut acc: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for a in by_product {
        let slot = acc.entry(a.asof_month).or_insert((0.0, 0.0));
        slot.0 += a.portfolio_monthly_ecl;
        slot.1 += a.portfolio_ead;
    }
    acc.into_iter()
        .map(|(asof_month, (ecl, ead))| PortfolioAggregate {
            asof_month,
            product: None,
            portfolio_monthly_ecl: ecl,
            portfolio_ead: ead,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecl::monthly::tests::row;
    use crate::ecl::monthly::{compute_monthly_ecl, DEFAULT_LGD};

    #[test]
    fn test_overall_matches_direct_monthly_sum() {
        let mut panel = vec![
            row(1, 1, 1_000.0, false, None),
            row(1, 2, 900.0, true, Some(0.6)),
            row(2, 1, 500.0, true, None),
            row(2, 2, 0.0, true, Some(0.6)),
        ];
        panel[2].product = ProductType::Card;
        panel[3].product = ProductType::Card;
        let m = compute_monthly_ecl(&panel, DEFAULT_LGD);
        let by_product = aggregates_by_product(&m);
        assert_eq!(by_product.len(), 4);
        assert_eq!(by_product[0].product, Some(ProductType::Card));
        let overall = overall_aggregates(&by_product);
        let direct = compute_portfolio_aggregates(&m);
        assert_eq!(overall, direct);
        assert!((overall[0].portfolio_ead - 1_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_zero_without_exposure() {
        let a = PortfolioAggregate {
            asof_month: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            product: None,
            portfolio_monthly_ecl: 5.0,
            portfolio_ead: 0.0,
        };
        assert_eq!(a.coverage_pct(), 0.0);
    }
}
