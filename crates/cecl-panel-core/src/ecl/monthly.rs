use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::types::{PerformanceRecord, ProductType};

/// LGD assumed wherever the panel leaves it unset.
pub const DEFAULT_LGD: f64 = 0.85;

/// A panel row extended with its loss components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EclRecord {
    #[serde(flatten)]
    pub record: PerformanceRecord,
    /// Point-in-time default occurrence (0 or 1).
    pub pd_t: f64,
    pub lgd_t: f64,
    pub ead_t: f64,
    pub monthly_ecl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanLifetimeEcl {
    pub loan_id: u64,
    pub product: ProductType,
    pub months: usize,
    pub lifetime_ecl: f64,
}

/// `monthly_ecl = pd_t * lgd_t * ead_t` for every row.
///
/// PD is the row's default flag taken as a point estimate; missing LGD falls
/// back to `default_lgd`.
pub fn compute_monthly_ecl(panel: &[PerformanceRecord], default_lgd: f64) -> Vec<EclRecord> {
    let mut backfilled_defaults = 0usize;
    let out: Vec<EclRecord> = panel
        .iter()
        .map(|r| {
            let pd_t = if r.default_flag { 1.0 } else { 0.0 };
            let lgd_t = match r.loss_given_default {
                Some(lgd) if lgd.is_finite() => lgd,
                _ => {
                    if r.default_flag {
                        backfilled_defaults += 1;
                    }
                    default_lgd
                }
            };
            let ead_t = r.balance_ead;
            EclRecord {
                record: r.clone(),
                pd_t,
                lgd_t,
                ead_t,
                monthly_ecl: pd_t * lgd_t * ead_t,
            }
        })
        .collect();
    if backfilled_defaults > 0 {
        warn!(
            rows = backfilled_defaults,
            default_lgd, "defaulted rows carried no LGD; default applied"
        );
    }
    out
}

/// Per-loan sum of monthly ECL, ordered by loan id.
pub fn compute_lifetime_ecl(monthly: &[EclRecord]) -> Vec<LoanLifetimeEcl> {
    let mut by_loan: BTreeMap<u64, LoanLifetimeEcl> = BTreeMap::new();
    for r in monthly {
        let entry = by_loan
            .entry(r.record.loan_id)
            .or_insert_with(|| LoanLifetimeEcl {
                loan_id: r.record.loan_id,
                product: r.record.product,
                months: 0,
                lifetime_ecl: 0.0,
            });
        entry.months += 1;
        entry.lifetime_ecl += r.monthly_ecl;
    }
    by_loan.into_values().collect()
}
