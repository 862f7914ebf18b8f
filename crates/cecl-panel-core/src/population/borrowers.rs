//! Synthetic borrower population with correlated credit attributes.
//!
//! A single systemic factor `z ~ N(0,1)` drives both the baseline FICO
//! (up with `z`) and the baseline utilization (down with `z`), so weaker
//! borrowers carry higher revolving usage.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::{LogNormal, Normal, Poisson};
use std::time::Instant;
use tracing::info;

use crate::error::CeclError;
use crate::types::{Borrower, Segment};
use crate::CeclResult;

pub const US_STATES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY",
];

const INDUSTRIES: [&str; 10] = [
    "tech",
    "finance",
    "healthcare",
    "education",
    "manufacturing",
    "retail",
    "hospitality",
    "transport",
    "construction",
    "other",
];

const EDUCATION: [(&str, f64); 3] = [("hs", 0.35), ("college", 0.45), ("grad", 0.20)];

const SEGMENTS: [(Segment, f64); 5] = [
    (Segment::Mass, 0.60),
    (Segment::Affluent, 0.20),
    (Segment::SmallBusiness, 0.08),
    (Segment::Private, 0.06),
    (Segment::Student, 0.06),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationInput {
    pub num_borrowers: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    crate::DEFAULT_SEED
}

fn dist_err(name: &str, e: impl std::fmt::Display) -> CeclError {
    CeclError::InvalidInput {
        field: "distribution".into(),
        reason: format!("Invalid {name} parameters: {e}"),
    }
}

/// Draw `num_borrowers` borrowers from one seeded stream.
pub fn generate_borrowers(input: &PopulationInput) -> CeclResult<Vec<Borrower>> {
    let start = Instant::now();
    let n = input.num_borrowers;
    if n == 0 {
        return Err(CeclError::InvalidInput {
            field: "num_borrowers".into(),
            reason: "Population must contain at least one borrower".into(),
        });
    }

    let mut rng = StdRng::seed_from_u64(input.seed);

    let states: Vec<&str> = (0..n)
        .map(|_| US_STATES[rng.gen_range(0..US_STATES.len())])
        .collect();
    let income_dist = LogNormal::new(10.5, 0.5).map_err(|e| dist_err("LogNormal", e))?;
    let income: Vec<f64> = (0..n).map(|_| rng.sample(&income_dist)).collect();
    let employment_tenure: Vec<u32> = (0..n).map(|_| rng.gen_range(0..360)).collect();
    let industry: Vec<&str> = (0..n)
        .map(|_| INDUSTRIES[rng.gen_range(0..INDUSTRIES.len())])
        .collect();
    let edu_idx = WeightedIndex::new(EDUCATION.iter().map(|(_, w)| *w))
        .map_err(|e| dist_err("education weights", e))?;
    let education: Vec<&str> = (0..n).map(|_| EDUCATION[edu_idx.sample(&mut rng)].0).collect();
    let household_size: Vec<u32> = (0..n).map(|_| rng.gen_range(1..6)).collect();

    let std_normal = Normal::new(0.0, 1.0).map_err(|e| dist_err("Normal", e))?;
    let fico_noise = Normal::new(0.0, 40.0).map_err(|e| dist_err("Normal", e))?;
    let util_noise = Normal::new(0.0, 0.15).map_err(|e| dist_err("Normal", e))?;

    let systemic: Vec<f64> = (0..n).map(|_| rng.sample(&std_normal)).collect();
    let fico: Vec<u32> = systemic
        .iter()
        .map(|z| {
            let raw = 690.0 + 60.0 * z + rng.sample(&fico_noise);
            raw.clamp(500.0, 850.0) as u32
        })
        .collect();
    let utilization: Vec<f64> = systemic
        .iter()
        .map(|z| (0.35 + 0.1 * (-z) + rng.sample(&util_noise)).clamp(0.0, 1.0))
        .collect();

    let mut prior_delinquencies = Vec::with_capacity(n);
    for f in &fico {
        let lambda = ((720.0 - *f as f64) / 200.0).clamp(0.05, 2.0);
        let pois = Poisson::new(lambda).map_err(|e| dist_err("Poisson", e))?;
        prior_delinquencies.push(rng.sample(&pois) as u32);
    }
    let bank_tenure: Vec<u32> = (0..n).map(|_| rng.gen_range(1..360)).collect();
    let seg_idx = WeightedIndex::new(SEGMENTS.iter().map(|(_, w)| *w))
        .map_err(|e| dist_err("segment weights", e))?;
    let segments: Vec<Segment> = (0..n).map(|_| SEGMENTS[seg_idx.sample(&mut rng)].0).collect();
    let zip3: Vec<u32> = (0..n).map(|_| rng.gen_range(100..999)).collect();

    let borrowers: Vec<Borrower> = (0..n)
        .map(|i| Borrower {
            borrower_id: i as u64 + 1,
            state: states[i].to_string(),
            zip3: zip3[i].to_string(),
            income_annual: income[i],
            employment_tenure_months: employment_tenure[i],
            industry: industry[i].to_string(),
            education: education[i].to_string(),
            household_size: household_size[i],
            fico_baseline: fico[i],
            credit_utilization_baseline: utilization[i],
            prior_delinquencies: prior_delinquencies[i],
            bank_tenure_months: bank_tenure[i],
            segment: segments[i],
        })
        .collect();

    info!(
        borrowers = n,
        seed = input.seed,
        elapsed_us = start.elapsed().as_micros() as u64,
        "generated borrower population"
    );
    Ok(borrowers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population(n: usize, seed: u64) -> Vec<Borrower> {
        generate_borrowers(&PopulationInput {
            num_borrowers: n,
            seed,
        })
        .unwrap()
    }

    #[test]
    fn test_population_ids_and_ranges() {
        let b = population(500, 42);
        assert_eq!(b.len(), 500);
        assert_eq!(b[0].borrower_id, 1);
        assert_eq!(b[499].borrower_id, 500);
        for x in &b {
            assert!((500..=850).contains(&x.fico_baseline));
            assert!((0.0..=1.0).contains(&x.credit_utilization_baseline));
            assert!(x.income_annual > 0.0);
            assert!((1..6).contains(&x.household_size));
            assert_eq!(x.state.len(), 2);
        }
    }

    #[test]
    fn test_fico_and_utilization_negatively_correlated() {
        let b = population(4000, 7);
        let n = b.len() as f64;
        let mf = b.iter().map(|x| x.fico_baseline as f64).sum::<f64>() / n;
        let mu = b.iter().map(|x| x.credit_utilization_baseline).sum::<f64>() / n;
        let cov = b
            .iter()
            .map(|x| (x.fico_baseline as f64 - mf) * (x.credit_utilization_baseline - mu))
            .sum::<f64>();
        assert!(cov < 0.0, "cov={cov}");
    }

    #[test]
    fn test_population_reproducible() {
        assert_eq!(population(50, 9), population(50, 9));
    }

    #[test]
    fn test_empty_population_rejected() {
        let r = generate_borrowers(&PopulationInput {
            num_borrowers: 0,
            seed: 1,
        });
        assert!(r.is_err());
    }
}
