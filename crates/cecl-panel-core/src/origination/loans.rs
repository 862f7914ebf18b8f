use chrono::{Duration, NaiveDate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use super::terms::{OriginationTerms, OriginationWindow, Sizing};
use crate::calendar::add_months;
use crate::error::CeclError;
use crate::types::{Borrower, Loan, ProductType};
use crate::CeclResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginationInput {
    pub product: ProductType,
    pub borrowers: Vec<Borrower>,
    /// Base seed; the product offset is added internally.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    crate::DEFAULT_SEED
}

/// Originate one loan of `input.product` per borrower.
///
/// Loan ids run from the product's id base in borrower order. The stream is
/// seeded with `seed + product.origination_seed_offset()`.
pub fn generate_loans(input: &OriginationInput) -> CeclResult<Vec<Loan>> {
    let start = Instant::now();
    if input.borrowers.is_empty() {
        return Err(CeclError::InsufficientData(
            "Cannot originate loans for an empty borrower set".into(),
        ));
    }

    let product = input.product;
    let terms = OriginationTerms::for_product(product);
    let seed = input.seed.wrapping_add(product.origination_seed_offset());
    let mut rng = StdRng::seed_from_u64(seed);
    let channel_idx = WeightedIndex::new(terms.channels.iter().map(|c| c.1)).map_err(|e| {
        CeclError::InvalidInput {
            field: "channels".into(),
            reason: e.to_string(),
        }
    })?;

    let mut loans = Vec::with_capacity(input.borrowers.len());
    for (i, b) in input.borrowers.iter().enumerate() {
        let origination_dt = draw_origination_date(&terms, &mut rng)?;
        let (term_lo, term_hi) = terms.term_months;
        let maturity_months = rng.gen_range(term_lo..term_hi);
        let interest_rate = terms.rate.sample(&mut rng, b.fico_baseline)?;

        let (orig_balance, credit_limit) = match terms.sizing {
            Sizing::Amortizing(amount) => (amount.sample(&mut rng, 0.0)?, None),
            Sizing::IncomeLine {
                income_share,
                limit_lo,
                limit_hi,
                draw_share,
                min_balance,
            } => {
                let share = rng.gen_range(income_share.0..income_share.1);
                let limit = (b.income_annual / 12.0 * share).clamp(limit_lo, limit_hi);
                let drawn = rng.gen_range(draw_share.0..draw_share.1);
                let balance = (limit * b.credit_utilization_baseline * drawn).max(min_balance);
                (balance, Some(limit))
            }
            Sizing::FixedLine { limit, draw_share } => {
                let limit = limit.sample(&mut rng, 0.0)?;
                let drawn = rng.gen_range(draw_share.0..draw_share.1);
                (limit * drawn, Some(limit))
            }
        };

        let ltv_at_orig = match terms.ltv {
            Some(band) => Some(band.sample(&mut rng, 0.0)?),
            None => None,
        };
        let dti_shift = match (terms.dti_includes_utilization, credit_limit) {
            (true, Some(limit)) if limit > 0.0 => orig_balance / limit,
            _ => 0.0,
        };
        let underwriting_dti = terms.dti.sample(&mut rng, dti_shift)?;
        let channel = terms.channels[channel_idx.sample(&mut rng)].0;

        loans.push(Loan {
            loan_id: product.loan_id_base() + i as u64,
            borrower_id: b.borrower_id,
            product,
            origination_dt,
            maturity_months,
            interest_rate,
            orig_balance,
            secured_flag: product.is_secured(),
            ltv_at_orig,
            risk_grade: Some(terms.grades.grade(b.fico_baseline).to_string()),
            underwriting_dti: Some(underwriting_dti),
            underwriting_fico: Some(b.fico_baseline),
            channel: Some(channel.to_string()),
            state: Some(b.state.clone()),
            vintage: Some(origination_dt.format("%Y-%m").to_string()),
            credit_limit,
        });
    }

    info!(
        product = %product,
        loans = loans.len(),
        seed,
        elapsed_us = start.elapsed().as_micros() as u64,
        "originated loans"
    );
    Ok(loans)
}

fn draw_origination_date(terms: &OriginationTerms, rng: &mut StdRng) -> CeclResult<NaiveDate> {
    match terms.window {
        OriginationWindow::Months(n) => add_months(terms.anchor, rng.gen_range(0..n)),
        OriginationWindow::Days(n) => {
            let offset = rng.gen_range(0..n) as i64;
            terms
                .anchor
                .checked_add_signed(Duration::days(offset))
                .ok_or_else(|| CeclError::DateError(format!("{} + {offset} days", terms.anchor)))
        }
    }
}
