//! Per-product transition, loss-severity and balance parameters.
//!
//! Every product runs through the same Markov engine; what differs is the
//! coefficient table selected here by matching on [`ProductType`].

use serde::{Deserialize, Serialize};

use crate::numeric::seasoning_ramp;
use crate::types::{DelinquencyState, ProductType};

// ---------------------------------------------------------------------------
// Coefficient records
// ---------------------------------------------------------------------------

/// Closed-form monthly transition probability.
///
/// `p = clip(((base + risk * r) * (1 + stress_mult * s) + stress * s) * m, lo, hi)`
/// where `r = max(0, 720 - fico)`, `s` is positive unemployment deviation and
/// `m` the seasoning multiplier (1 for cures and seasoned loans).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub base: f64,
    pub risk: f64,
    pub stress: f64,
    pub stress_mult: f64,
    pub lo: f64,
    pub hi: f64,
}

impl Hazard {
    const fn linear(base: f64, risk: f64, stress: f64, lo: f64, hi: f64) -> Self {
        Hazard {
            base,
            risk,
            stress,
            stress_mult: 0.0,
            lo,
            hi,
        }
    }

    const fn scaled(base: f64, risk: f64, stress_mult: f64, lo: f64, hi: f64) -> Self {
        Hazard {
            base,
            risk,
            stress: 0.0,
            stress_mult,
            lo,
            hi,
        }
    }

    pub fn eval(&self, risk: f64, stress: f64, multiplier: f64) -> f64 {
        let p = ((self.base + self.risk * risk) * (1.0 + self.stress_mult * stress)
            + self.stress * stress)
            * multiplier;
        p.clamp(self.lo, self.hi)
    }
}

/// Seasoning multiplier `intercept + slope * min((t + 1) / ramp_months, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seasoning {
    pub ramp_months: u32,
    pub intercept: f64,
    pub slope: f64,
}

impl Seasoning {
    pub fn multiplier(&self, month_idx: usize) -> f64 {
        self.intercept + self.slope * seasoning_ramp(month_idx, self.ramp_months)
    }
}

/// Loss severity drawn at charge-off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LgdPolicy {
    pub base: f64,
    /// Applied to the signed unemployment deviation.
    pub unemployment_dev: f64,
    /// Applied to the positive part of the deviation.
    pub stress: f64,
    pub hpi_down: f64,
    pub hpi_down_cap: f64,
    pub noise_sd: f64,
    pub lo: f64,
    pub hi: f64,
}

impl LgdPolicy {
    /// `z` is a standard-normal draw, scaled by `noise_sd`.
    pub fn eval(&self, udev: f64, stress: f64, hpi_down: f64, z: f64) -> f64 {
        let raw = self.base
            + self.unemployment_dev * udev
            + self.stress * stress
            + self.hpi_down * hpi_down
            + self.noise_sd * z;
        raw.clamp(self.lo, self.hi)
    }
}

/// Single-monthly-mortality prepayment, `clip(base + fed * max(0, -fed_dev), 0, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prepayment {
    pub base: f64,
    pub fed_funds_drop: f64,
    pub max: f64,
}

impl Prepayment {
    pub fn smm(&self, fed_dev: f64) -> f64 {
        (self.base + self.fed_funds_drop * (-fed_dev).max(0.0)).clamp(0.0, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BalanceModel {
    /// Utilization path against a credit limit.
    Revolving {
        util_sd: f64,
        /// Mean reversion toward the starting utilization.
        kappa: f64,
        unemployment_dev: f64,
        hpi: f64,
        /// Minimum payment as a share of the limit.
        min_payment_pct: f64,
    },
    /// Level-payment amortization with optional prepayment.
    Installment { prepay: Option<Prepayment> },
}

// ---------------------------------------------------------------------------
// TransitionPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPolicy {
    pub product: ProductType,
    /// C→30, 30→60, 60→90+, 90+→CO.
    pub advance: [Hazard; 4],
    /// 30→C, 60→C, 90+→C.
    pub cure: [Hazard; 3],
    /// Scales C→30 only.
    pub seasoning: Option<Seasoning>,
    pub lgd: LgdPolicy,
    /// Half-open recovery lag range in months.
    pub recovery_lag: (u32, u32),
    pub balance: BalanceModel,
}

impl TransitionPolicy {
    pub fn for_product(product: ProductType) -> Self {
        match product {
            ProductType::Card => TransitionPolicy {
                product,
                advance: [
                    Hazard::scaled(0.010, 0.00010, 0.08, 0.002, 0.15),
                    Hazard::linear(0.10, 0.00010, 0.012, 0.02, 0.40),
                    Hazard::linear(0.18, 0.00012, 0.015, 0.04, 0.55),
                    Hazard::linear(0.35, 0.00015, 0.020, 0.10, 0.80),
                ],
                cure: [
                    Hazard::linear(0.38, -0.00015, -0.010, 0.05, 0.70),
                    Hazard::linear(0.22, -0.00012, -0.008, 0.02, 0.50),
                    Hazard::linear(0.06, -0.00008, -0.005, 0.0, 0.20),
                ],
                seasoning: None,
                lgd: LgdPolicy {
                    base: 0.85,
                    unemployment_dev: 0.0,
                    stress: 0.02,
                    hpi_down: 0.0,
                    hpi_down_cap: 0.0,
                    noise_sd: 0.0,
                    lo: 0.6,
                    hi: 0.98,
                },
                recovery_lag: (3, 10),
                balance: BalanceModel::Revolving {
                    util_sd: 0.03,
                    kappa: 0.10,
                    unemployment_dev: 0.02,
                    hpi: 0.0,
                    min_payment_pct: 0.025,
                },
            },
            ProductType::Auto => TransitionPolicy {
                product,
                advance: [
                    Hazard::scaled(0.006, 0.00008, 0.10, 0.001, 0.10),
                    Hazard::linear(0.08, 0.00008, 0.010, 0.01, 0.30),
                    Hazard::linear(0.14, 0.00010, 0.012, 0.03, 0.45),
                    Hazard::linear(0.30, 0.00012, 0.015, 0.08, 0.70),
                ],
                cure: [
                    Hazard::linear(0.40, -0.00015, -0.010, 0.05, 0.72),
                    Hazard::linear(0.25, -0.00012, -0.008, 0.02, 0.50),
                    Hazard::linear(0.08, -0.00009, -0.006, 0.0, 0.25),
                ],
                seasoning: Some(Seasoning {
                    ramp_months: 18,
                    intercept: 0.8,
                    slope: 0.4,
                }),
                lgd: LgdPolicy {
                    base: 0.5,
                    unemployment_dev: 0.02,
                    stress: 0.0,
                    hpi_down: 0.1,
                    hpi_down_cap: 0.5,
                    noise_sd: 0.0,
                    lo: 0.3,
                    hi: 0.9,
                },
                recovery_lag: (2, 7),
                balance: BalanceModel::Installment {
                    prepay: Some(Prepayment {
                        base: 0.002,
                        fed_funds_drop: 0.01,
                        max: 0.05,
                    }),
                },
            },
            ProductType::Personal => TransitionPolicy {
                product,
                advance: [
                    Hazard::scaled(0.008, 0.00012, 0.12, 0.0015, 0.15),
                    Hazard::linear(0.12, 0.00010, 0.012, 0.02, 0.45),
                    Hazard::linear(0.20, 0.00012, 0.015, 0.05, 0.60),
                    Hazard::linear(0.40, 0.00015, 0.020, 0.10, 0.85),
                ],
                cure: [
                    Hazard::linear(0.35, -0.00015, -0.010, 0.04, 0.65),
                    Hazard::linear(0.20, -0.00012, -0.008, 0.02, 0.45),
                    Hazard::linear(0.05, -0.00008, -0.005, 0.0, 0.18),
                ],
                seasoning: Some(Seasoning {
                    ramp_months: 12,
                    intercept: 0.7,
                    slope: 0.3,
                }),
                lgd: LgdPolicy {
                    base: 0.85,
                    unemployment_dev: 0.03,
                    stress: 0.0,
                    hpi_down: 0.0,
                    hpi_down_cap: 0.0,
                    noise_sd: 0.0,
                    lo: 0.6,
                    hi: 0.98,
                },
                recovery_lag: (3, 10),
                balance: BalanceModel::Installment {
                    prepay: Some(Prepayment {
                        base: 0.003,
                        fed_funds_drop: 0.005,
                        max: 0.04,
                    }),
                },
            },
            ProductType::Mortgage => TransitionPolicy {
                product,
                advance: [
                    Hazard::linear(0.003, 0.00003, 0.006, 0.0005, 0.12),
                    Hazard::linear(0.05, 0.00005, 0.006, 0.005, 0.25),
                    Hazard::linear(0.08, 0.00007, 0.010, 0.01, 0.35),
                    Hazard::linear(0.10, 0.00008, 0.012, 0.02, 0.45),
                ],
                cure: [
                    Hazard::linear(0.42, -0.00015, -0.010, 0.05, 0.75),
                    Hazard::linear(0.28, -0.00012, -0.008, 0.02, 0.55),
                    Hazard::linear(0.10, -0.00009, -0.006, 0.0, 0.30),
                ],
                seasoning: Some(Seasoning {
                    ramp_months: 24,
                    intercept: 0.6,
                    slope: 0.4,
                }),
                lgd: LgdPolicy {
                    base: 0.35,
                    unemployment_dev: 0.0,
                    stress: 0.03,
                    hpi_down: 0.15,
                    hpi_down_cap: 0.6,
                    noise_sd: 0.03,
                    lo: 0.15,
                    hi: 0.8,
                },
                recovery_lag: (3, 12),
                balance: BalanceModel::Installment {
                    prepay: Some(Prepayment {
                        base: 0.001,
                        fed_funds_drop: 0.015,
                        max: 0.05,
                    }),
                },
            },
            ProductType::Heloc => TransitionPolicy {
                product,
                advance: [
                    Hazard::linear(0.008, 0.00005, 0.008, 0.001, 0.22),
                    Hazard::linear(0.07, 0.00007, 0.010, 0.01, 0.32),
                    Hazard::linear(0.11, 0.00009, 0.012, 0.02, 0.42),
                    Hazard::linear(0.14, 0.00011, 0.015, 0.03, 0.55),
                ],
                cure: [
                    Hazard::linear(0.34, -0.00016, -0.009, 0.02, 0.60),
                    Hazard::linear(0.22, -0.00013, -0.007, 0.01, 0.45),
                    Hazard::linear(0.07, -0.00010, -0.005, 0.0, 0.22),
                ],
                seasoning: None,
                lgd: LgdPolicy {
                    base: 0.4,
                    unemployment_dev: 0.0,
                    stress: 0.03,
                    hpi_down: 0.2,
                    hpi_down_cap: 0.6,
                    noise_sd: 0.0,
                    lo: 0.2,
                    hi: 0.9,
                },
                recovery_lag: (6, 18),
                balance: BalanceModel::Revolving {
                    util_sd: 0.025,
                    kappa: 0.05,
                    unemployment_dev: 0.015,
                    hpi: 0.01,
                    min_payment_pct: 0.02,
                },
            },
        }
    }

    /// Probability of rolling one bucket forward from `state`; zero once charged off.
    pub fn advance_probability(
        &self,
        state: DelinquencyState,
        risk: f64,
        stress: f64,
        month_idx: usize,
    ) -> f64 {
        match state {
            DelinquencyState::ChargedOff => 0.0,
            DelinquencyState::Current => {
                let m = self
                    .seasoning
                    .map(|s| s.multiplier(month_idx))
                    .unwrap_or(1.0);
                self.advance[0].eval(risk, stress, m)
            }
            other => self.advance[other.index()].eval(risk, stress, 1.0),
        }
    }

    /// Width of the cure band that follows the advance band.
    ///
    /// Truncated so the two bands never exceed a unit interval.
    pub fn cure_probability(&self, state: DelinquencyState, p_advance: f64, risk: f64, stress: f64) -> f64 {
        match state {
            DelinquencyState::Current | DelinquencyState::ChargedOff => 0.0,
            other => {
                let p = self.cure[other.index() - 1].eval(risk, stress, 1.0);
                p.min(1.0 - p_advance).max(0.0)
            }
        }
    }
}

/// Risk term `max(0, 720 - fico)`.
pub fn risk_term(fico: u32) -> f64 {
    (720.0 - fico as f64).max(0.0)
}
