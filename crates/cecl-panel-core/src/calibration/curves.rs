//! Hazard / cumulative-default conversions and calibration scalers.

use tracing::warn;

use crate::error::CeclError;
use crate::numeric::EPSILON;
use crate::CeclResult;

/// Lower bound on a calibration scaler.
pub const SCALER_FLOOR: f64 = 0.1;
/// Upper bound on a calibration scaler.
pub const SCALER_CAP: f64 = 10.0;

/// Per-period hazards implied by a cumulative default curve.
///
/// `increment_i = max(cum_i - cum_{i-1}, 0)`, `hazard_i = increment_i /
/// max(survival_{i-1}, 1e-9)`, survival starting at 1. Output is clamped to
/// `[0, 1]` and has the same length as the input.
pub fn hazards_from_cumulative(cum: &[f64]) -> Vec<f64> {
    let mut hazards = Vec::with_capacity(cum.len());
    let mut prev = 0.0;
    let mut survival: f64 = 1.0;
    for &c in cum {
        let increment = (c - prev).max(0.0);
        let hazard = (increment / survival.max(EPSILON)).clamp(0.0, 1.0);
        hazards.push(hazard);
        prev = c;
        survival *= 1.0 - hazard;
    }
    hazards
}

/// Cumulative default curve `1 - prod(1 - h_i)`.
pub fn cumulative_from_hazards(hazards: &[f64]) -> Vec<f64> {
    let mut survival: f64 = 1.0;
    hazards
        .iter()
        .map(|h| {
            survival *= 1.0 - h.clamp(0.0, 1.0);
            1.0 - survival
        })
        .collect()
}

/// Multiplicative scalers taking `model_hazards` onto the target curve's hazards.
///
/// `scaler_i = target_hazard_i / max(model_hazard_i, 1e-9)`, clamped to
/// `[0.1, 10]`.
pub fn compute_scalers(model_hazards: &[f64], target_cumulative: &[f64]) -> CeclResult<Vec<f64>> {
    if model_hazards.len() != target_cumulative.len() {
        return Err(CeclError::InvalidInput {
            field: "model_hazards".into(),
            reason: format!(
                "length {} does not match target curve length {}",
                model_hazards.len(),
                target_cumulative.len()
            ),
        });
    }
    let target = hazards_from_cumulative(target_cumulative);
    let mut clamped = 0usize;
    let scalers: Vec<f64> = target
        .iter()
        .zip(model_hazards)
        .map(|(t, m)| {
            let raw = t / m.max(EPSILON);
            let s = raw.clamp(SCALER_FLOOR, SCALER_CAP);
            if s != raw {
                clamped += 1;
            }
            s
        })
        .collect();
    if clamped > 0 {
        warn!(clamped, periods = scalers.len(), "calibration scalers hit clamp bounds");
    }
    Ok(scalers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{a} vs {b}");
    }

    #[test]
    fn test_flat_step_yields_zero_hazard() {
        let h = hazards_from_cumulative(&[0.0, 0.02, 0.05, 0.05, 0.10]);
        assert_eq!(h.len(), 5);
        assert_eq!(h[0], 0.0);
        assert_close(h[1], 0.02, 1e-12);
        assert_close(h[2], 0.03 / 0.98, 1e-12);
        assert_eq!(h[3], 0.0);
        assert!(h.iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn test_round_trip_through_cumulative() {
        let cum = [0.01, 0.03, 0.06, 0.06, 0.11];
        let back = cumulative_from_hazards(&hazards_from_cumulative(&cum));
        for (a, b) in back.iter().zip(cum) {
            assert_close(*a, b, 1e-12);
        }
    }

    #[test]
    fn test_scaled_model_reproduces_target() {
        let model = [0.01, 0.02, 0.03];
        let target = [0.01, 0.03, 0.06];
        let s = compute_scalers(&model, &target).unwrap();
        let scaled: Vec<f64> = model.iter().zip(&s).map(|(m, s)| m * s).collect();
        let cum = cumulative_from_hazards(&scaled);
        for (a, b) in cum.iter().zip(target) {
            assert_close(*a, b, 1e-9);
        }
    }

    #[test]
    fn test_zero_model_hazard_hits_cap() {
        let s = compute_scalers(&[0.0, 0.0], &[0.0, 0.05]).unwrap();
        assert_eq!(s, vec![SCALER_FLOOR, SCALER_CAP]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(compute_scalers(&[0.01], &[0.01, 0.02]).is_err());
    }

    #[test]
    fn test_exhausted_survival_is_floored() {
        let h = hazards_from_cumulative(&[1.0, 1.0, 1.0]);
        assert_eq!(h, vec![1.0, 0.0, 0.0]);
    }
}
