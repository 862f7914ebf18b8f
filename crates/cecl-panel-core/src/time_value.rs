//! Level-payment amortization.
//!
//! `level_payment` is the floating-point form the simulator calls once per
//! loan; `amortization_schedule` is the exact-decimal table used to check that
//! a level payment fully retires a balance.

use rust_decimal::prelude::*;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CeclError;
use crate::types::{with_decimal_metadata, ComputationOutput, Money, Rate};
use crate::CeclResult;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Level monthly payment for an annual `rate`, `principal` and `term` in months.
///
/// `principal * r / (1 - (1 + r)^-n)` with `r = rate / 12`; a zero rate
/// degenerates to straight-line `principal / n`.
pub fn level_payment(rate: f64, principal: f64, term: u32) -> CeclResult<f64> {
    if term == 0 {
        return Err(CeclError::InvalidInput {
            field: "maturity_months".into(),
            reason: "Term must be at least one month".into(),
        });
    }
    if rate < 0.0 {
        return Err(CeclError::InvalidInput {
            field: "interest_rate".into(),
            reason: "Rate cannot be negative".into(),
        });
    }
    let r = rate / MONTHS_PER_YEAR;
    if r > 0.0 {
        Ok(principal * (r / (1.0 - (1.0 + r).powi(-(term as i32)))))
    } else {
        Ok(principal / term as f64)
    }
}

/// Payment (PMT) in exact decimal arithmetic for a per-period `rate`.
pub fn pmt(rate: Rate, nper: u32, present_value: Money) -> CeclResult<Money> {
    if nper == 0 {
        return Err(CeclError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(present_value / Decimal::from(nper));
    }

    let factor = (Decimal::ONE + rate)
        .checked_powu(nper as u64)
        .ok_or_else(|| CeclError::InvalidInput {
            field: "nper".into(),
            reason: format!("(1 + rate)^{nper} overflows decimal range"),
        })?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(CeclError::InvalidInput {
            field: "rate".into(),
            reason: "PMT annuity factor is zero".into(),
        });
    }

    Ok(present_value * factor / annuity_factor)
}

// ---------------------------------------------------------------------------
// Amortization schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub principal: Money,
    /// Annual contract rate.
    pub annual_rate: Rate,
    pub term_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationPeriod {
    pub period: u32,
    pub opening_balance: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub payment: Money,
    pub total_interest: Money,
    pub periods: Vec<AmortizationPeriod>,
    /// Balance left after the final scheduled payment.
    pub residual_balance: Money,
}

/// Full level-payment schedule in exact decimal arithmetic.
pub fn amortization_schedule(
    input: &AmortizationInput,
) -> CeclResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.principal < Decimal::ZERO {
        return Err(CeclError::InvalidInput {
            field: "principal".into(),
            reason: "Principal cannot be negative".into(),
        });
    }
    if input.annual_rate < Decimal::ZERO {
        return Err(CeclError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Rate cannot be negative".into(),
        });
    }
    if input.annual_rate > dec!(1) {
        warnings.push(format!(
            "Annual rate {} looks like a percentage; rates are decimals",
            input.annual_rate
        ));
    }

    let monthly_rate = input.annual_rate / dec!(12);
    let payment = pmt(monthly_rate, input.term_months, input.principal)?;

    let mut balance = input.principal;
    let mut total_interest = Decimal::ZERO;
    let mut periods = Vec::with_capacity(input.term_months as usize);

    for period in 1..=input.term_months {
        let interest = balance * monthly_rate;
        let principal = (payment - interest).min(balance);
        let closing = balance - principal;
        total_interest += interest;
        periods.push(AmortizationPeriod {
            period,
            opening_balance: balance,
            interest,
            principal,
            closing_balance: closing,
        });
        balance = closing;
    }

    let output = AmortizationSchedule {
        payment,
        total_interest,
        periods,
        residual_balance: balance,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_decimal_metadata(
        "Level-payment amortization",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Convert a decimal amount to `f64`, falling back to 0 for out-of-range values.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_level_payment_one_percent_monthly() {
        // 1000 at 12% for 12 months: 88.8488
        let p = level_payment(0.12, 1000.0, 12).unwrap();
        assert!((p - 88.848_788_6).abs() < 1e-6, "payment={p}");
    }

    #[test]
    fn test_level_payment_zero_rate_is_straight_line() {
        let p = level_payment(0.0, 1200.0, 12).unwrap();
        assert_eq!(p, 100.0);
    }

    #[test]
    fn test_level_payment_rejects_zero_term() {
        assert!(level_payment(0.05, 1000.0, 0).is_err());
    }

    #[test]
    fn test_float_amortization_retires_balance() {
        let payment = level_payment(0.12, 1000.0, 12).unwrap();
        let mut balance = 1000.0_f64;
        for _ in 0..12 {
            let interest = 0.01 * balance;
            let principal = (payment - interest).min(balance);
            balance -= principal;
        }
        assert!(balance.abs() < 1e-9, "residual={balance}");
    }

    #[test]
    fn test_decimal_schedule_residual_is_zero() {
        let input = AmortizationInput {
            principal: dec!(1000),
            annual_rate: dec!(0.12),
            term_months: 12,
        };
        let out = amortization_schedule(&input).unwrap();
        let s = &out.result;
        assert_eq!(s.periods.len(), 12);
        assert!(s.residual_balance.abs() < dec!(0.0000001));
        assert!((s.payment - dec!(88.8488)).abs() < dec!(0.0001));
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_pmt_zero_rate() {
        assert_eq!(pmt(Decimal::ZERO, 4, dec!(100)).unwrap(), dec!(25));
    }
}
