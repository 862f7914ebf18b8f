//! Small floating-point helpers shared by the simulator and the loss engines.

/// Floor applied to survivor pools and model hazards before dividing.
pub const EPSILON: f64 = 1e-9;

/// `max(x, 0)`.
pub fn positive_part(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}

/// Clamp that also maps NaN to the lower bound.
pub fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        lo
    } else {
        x.clamp(lo, hi)
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear seasoning ramp: `(month_idx + 1) / ramp_months`, capped at 1.
pub fn seasoning_ramp(month_idx: usize, ramp_months: u32) -> f64 {
    if ramp_months == 0 {
        return 1.0;
    }
    ((month_idx as f64 + 1.0) / ramp_months as f64).min(1.0)
}

/// Percentile of a **sorted** slice using linear interpolation.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_maps_nan_to_lower_bound() {
        assert_eq!(clip(f64::NAN, 0.1, 10.0), 0.1);
        assert_eq!(clip(50.0, 0.1, 10.0), 10.0);
        assert_eq!(clip(-1.0, 0.1, 10.0), 0.1);
    }

    #[test]
    fn test_seasoning_ramp_holds_at_one() {
        assert!((seasoning_ramp(0, 12) - 1.0 / 12.0).abs() < 1e-12);
        assert_eq!(seasoning_ramp(11, 12), 1.0);
        assert_eq!(seasoning_ramp(40, 12), 1.0);
        assert_eq!(seasoning_ramp(3, 0), 1.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&v, 50.0), 3.0);
        assert!((percentile_sorted(&v, 10.0) - 1.4).abs() < 1e-12);
    }
}
