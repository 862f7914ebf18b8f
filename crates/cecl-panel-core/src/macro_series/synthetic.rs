use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use std::collections::BTreeMap;

use super::series::{MacroSeries, FED_FUNDS, HPI_YOY, UNEMPLOYMENT};
use crate::calendar::{month_range, months_between};
use crate::error::CeclError;
use crate::CeclResult;

/// Request for a synthetic monthly macro history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticMacroInput {
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
    #[serde(default = "default_macro_seed")]
    pub seed: u64,
}

fn default_macro_seed() -> u64 {
    crate::DEFAULT_SEED
}

struct Ar1 {
    mu: f64,
    phi: f64,
    sigma: f64,
    init: f64,
}

impl Ar1 {
    fn path(&self, rng: &mut StdRng, n: usize) -> CeclResult<Vec<f64>> {
        let shock = normal(0.0, self.sigma)?;
        let mut x = Vec::with_capacity(n);
        if n == 0 {
            return Ok(x);
        }
        x.push(self.init);
        for t in 1..n {
            let next = self.mu + self.phi * (x[t - 1] - self.mu) + rng.sample(&shock);
            x.push(next);
        }
        Ok(x)
    }
}

fn normal(mean: f64, sd: f64) -> CeclResult<Normal> {
    Normal::new(mean, sd).map_err(|e| CeclError::InvalidInput {
        field: "distribution".into(),
        reason: format!("Invalid Normal parameters: {e}"),
    })
}

/// Generate an AR(1) synthetic macro series between `start` and `end`.
pub fn synthesize(input: &SyntheticMacroInput) -> CeclResult<MacroSeries> {
    let span = months_between(input.start, input.end);
    if span < 0 {
        return Err(CeclError::DateError(format!(
            "end {} precedes start {}",
            input.end, input.start
        )));
    }
    let n = span as usize + 1;
    let months = month_range(input.start, n)?;
    let mut rng = StdRng::seed_from_u64(input.seed);

    let unemployment: Vec<f64> = Ar1 { mu: 5.5, phi: 0.9, sigma: 0.15, init: 5.5 }
        .path(&mut rng, n)?
        .into_iter()
        .map(|v| v.clamp(2.5, 15.0))
        .collect();
    let cpi_yoy = Ar1 { mu: 2.5, phi: 0.7, sigma: 0.2, init: 2.5 }.path(&mut rng, n)?;
    let gdp = Ar1 { mu: 2.0, phi: 0.6, sigma: 0.8, init: 2.0 }.path(&mut rng, n)?;
    let fed_funds: Vec<f64> = Ar1 { mu: 2.0, phi: 0.8, sigma: 0.25, init: 2.0 }
        .path(&mut rng, n)?
        .into_iter()
        .map(|v| v.clamp(0.0, 8.0))
        .collect();
    let term_spread = normal(1.2, 0.2)?;
    let treasury_10y: Vec<f64> = fed_funds
        .iter()
        .map(|f| (f + rng.sample(&term_spread)).clamp(0.5, 10.0))
        .collect();
    let credit_spread: Vec<f64> = Ar1 { mu: 2.0, phi: 0.85, sigma: 0.25, init: 2.0 }
        .path(&mut rng, n)?
        .into_iter()
        .map(|v| v.clamp(0.5, 8.0))
        .collect();
    let hpi_yoy = Ar1 { mu: 3.0, phi: 0.7, sigma: 0.6, init: 3.0 }.path(&mut rng, n)?;

    let mut columns = BTreeMap::new();
    columns.insert(UNEMPLOYMENT.to_string(), unemployment);
    columns.insert("cpi_yoy".to_string(), cpi_yoy);
    columns.insert("gdp_growth_qoq_ann".to_string(), gdp);
    columns.insert(FED_FUNDS.to_string(), fed_funds);
    columns.insert("treasury_10y".to_string(), treasury_10y);
    columns.insert("credit_spread_bbb".to_string(), credit_spread);
    columns.insert(HPI_YOY.to_string(), hpi_yoy);

    MacroSeries::new(months, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(seed: u64) -> SyntheticMacroInput {
        SyntheticMacroInput {
            start: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            seed,
        }
    }

    #[test]
    fn test_synthetic_length_and_bounds() {
        let s = synthesize(&input(7)).unwrap();
        assert_eq!(s.len(), 72);
        let u = s.column(UNEMPLOYMENT).unwrap();
        assert!(u.iter().all(|v| (2.5..=15.0).contains(v)));
        let f = s.column(FED_FUNDS).unwrap();
        assert!(f.iter().all(|v| (0.0..=8.0).contains(v)));
    }

    #[test]
    fn test_synthetic_is_seed_deterministic() {
        assert_eq!(synthesize(&input(3)).unwrap(), synthesize(&input(3)).unwrap());
        assert_ne!(synthesize(&input(3)).unwrap(), synthesize(&input(4)).unwrap());
    }

    #[test]
    fn test_reversed_range_rejected() {
        let mut bad = input(1);
        std::mem::swap(&mut bad.start, &mut bad.end);
        assert!(matches!(synthesize(&bad), Err(CeclError::DateError(_))));
    }
}
