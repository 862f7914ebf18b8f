use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::{month_range, month_start};
use crate::error::CeclError;
use crate::numeric::{mean, positive_part};
use crate::CeclResult;

pub const UNEMPLOYMENT: &str = "unemployment";
pub const FED_FUNDS: &str = "fed_funds";
pub const HPI_YOY: &str = "hpi_yoy";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Columnar macro table keyed by month.
///
/// Serialized as `{"asof_month": [...], "unemployment": [...], ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroSeries {
    pub asof_month: Vec<NaiveDate>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Vec<f64>>,
}

/// Macro covariates aligned one-to-one with the simulation horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedMacro {
    pub months: Vec<NaiveDate>,
    pub unemployment: Vec<f64>,
    /// Unemployment minus its horizon mean.
    pub unemployment_dev: Vec<f64>,
    /// Positive part of `unemployment_dev`.
    pub stress: Vec<f64>,
    /// Fed funds minus its horizon mean; zeros when the column is absent.
    pub fed_funds_dev: Vec<f64>,
    /// Home-price growth, percent YoY; zeros when the column is absent.
    pub hpi_yoy: Vec<f64>,
}

/// Additive scenario shocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroAdjustment {
    #[serde(default)]
    pub unemployment_add: f64,
    #[serde(default)]
    pub hpi_yoy_add: f64,
}

// ---------------------------------------------------------------------------
// MacroSeries
// ---------------------------------------------------------------------------

impl MacroSeries {
    pub fn new(asof_month: Vec<NaiveDate>, columns: BTreeMap<String, Vec<f64>>) -> CeclResult<Self> {
        let series = MacroSeries { asof_month, columns };
        series.validate()?;
        Ok(series)
    }

    /// Non-empty, rectangular, and carrying `unemployment`.
    pub fn validate(&self) -> CeclResult<()> {
        if !self.columns.contains_key(UNEMPLOYMENT) {
            return Err(CeclError::schema("macro series", [UNEMPLOYMENT.to_string()]));
        }
        if self.asof_month.is_empty() {
            return Err(CeclError::InsufficientData(
                "Macro series has no observations".into(),
            ));
        }
        for (name, values) in &self.columns {
            if values.len() != self.asof_month.len() {
                return Err(CeclError::InvalidInput {
                    field: format!("macro.{name}"),
                    reason: format!(
                        "column has {} values but {} months",
                        values.len(),
                        self.asof_month.len()
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.asof_month.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asof_month.is_empty()
    }
}

impl MacroAdjustment {
    pub fn is_neutral(&self) -> bool {
        self.unemployment_add == 0.0 && self.hpi_yoy_add == 0.0
    }

    /// Shift the adjusted columns; absent columns are left absent.
    pub fn apply(&self, series: &MacroSeries) -> MacroSeries {
        let mut out = series.clone();
        if let Some(col) = out.columns.get_mut(UNEMPLOYMENT) {
            col.iter_mut().for_each(|v| *v += self.unemployment_add);
        }
        if let Some(col) = out.columns.get_mut(HPI_YOY) {
            col.iter_mut().for_each(|v| *v += self.hpi_yoy_add);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

/// Align `series` to `months` consecutive months starting at `start`.
///
/// Each horizon month takes the latest non-NaN observation at or before it;
/// months earlier than every observation take the earliest one.
pub fn align(series: &MacroSeries, start: NaiveDate, months: usize) -> CeclResult<AlignedMacro> {
    align_with_baseline(series, start, months, None)
}

/// [`align`] with unemployment deviations measured from `baseline` instead
/// of the horizon mean.
pub fn align_with_baseline(
    series: &MacroSeries,
    start: NaiveDate,
    months: usize,
    baseline: Option<f64>,
) -> CeclResult<AlignedMacro> {
    series.validate()?;
    if months == 0 {
        return Err(CeclError::InvalidInput {
            field: "months".into(),
            reason: "Horizon must be at least one month".into(),
        });
    }

    let panel_months = month_range(start, months)?;

    let mut order: Vec<usize> = (0..series.len()).collect();
    order.sort_by_key(|&i| series.asof_month[i]);
    let obs_months: Vec<NaiveDate> = order
        .iter()
        .map(|&i| month_start(series.asof_month[i]))
        .collect();

    let fill = |name: &str| -> Option<Vec<f64>> {
        let raw = series.column(name)?;
        let observed: Vec<(NaiveDate, f64)> = order
            .iter()
            .zip(&obs_months)
            .map(|(&i, &m)| (m, raw[i]))
            .filter(|(_, v)| v.is_finite())
            .collect();
        if observed.is_empty() {
            return None;
        }
        Some(
            panel_months
                .iter()
                .map(|m| {
                    let upto = observed.partition_point(|(d, _)| d <= m);
                    if upto == 0 {
                        observed[0].1
                    } else {
                        observed[upto - 1].1
                    }
                })
                .collect(),
        )
    };

    let unemployment = fill(UNEMPLOYMENT).ok_or_else(|| {
        CeclError::InsufficientData("Macro column 'unemployment' has no finite values".into())
    })?;
    let u_mean = baseline.unwrap_or_else(|| mean(&unemployment));
    let unemployment_dev: Vec<f64> = unemployment.iter().map(|u| u - u_mean).collect();
    let stress = unemployment_dev.iter().map(|d| positive_part(*d)).collect();

    let fed_funds_dev = match fill(FED_FUNDS) {
        Some(fed) => {
            let f_mean = mean(&fed);
            fed.iter().map(|f| f - f_mean).collect()
        }
        None => vec![0.0; months],
    };
    let hpi_yoy = fill(HPI_YOY).unwrap_or_else(|| vec![0.0; months]);

    Ok(AlignedMacro {
        months: panel_months,
        unemployment,
        unemployment_dev,
        stress,
        fed_funds_dev,
        hpi_yoy,
    })
}

impl AlignedMacro {
    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Share of home-price decline, `clip(-hpi_yoy / 10, 0, cap)`.
    pub fn hpi_down(&self, t: usize, cap: f64) -> f64 {
        (-self.hpi_yoy[t] / 10.0).clamp(0.0, cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn series(months: Vec<NaiveDate>, unemp: Vec<f64>) -> MacroSeries {
        let mut cols = BTreeMap::new();
        cols.insert(UNEMPLOYMENT.to_string(), unemp);
        MacroSeries::new(months, cols).unwrap()
    }

    #[test]
    fn test_missing_unemployment_is_schema_error() {
        let mut cols = BTreeMap::new();
        cols.insert(FED_FUNDS.to_string(), vec![1.0]);
        let err = MacroSeries::new(vec![d(2020, 1)], cols).unwrap_err();
        assert!(matches!(err, CeclError::Schema { .. }));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let mut cols = BTreeMap::new();
        cols.insert(UNEMPLOYMENT.to_string(), vec![5.0, 6.0]);
        assert!(MacroSeries::new(vec![d(2020, 1)], cols).is_err());
    }

    #[test]
    fn test_align_forward_and_backward_fill() {
        // Observations at Feb and Apr; horizon Jan..May
        let s = series(vec![d(2020, 4), d(2020, 2)], vec![7.0, 5.0]);
        let a = align(&s, d(2020, 1), 5).unwrap();
        assert_eq!(a.unemployment, vec![5.0, 5.0, 5.0, 7.0, 7.0]);
        let m = mean(&a.unemployment);
        assert!((a.unemployment_dev[3] - (7.0 - m)).abs() < 1e-12);
        assert_eq!(a.stress[0], 0.0);
        assert!(a.stress[3] > 0.0);
    }

    #[test]
    fn test_optional_columns_default_to_zero_deviation() {
        let s = series(vec![d(2020, 1)], vec![5.0]);
        let a = align(&s, d(2020, 1), 3).unwrap();
        assert_eq!(a.fed_funds_dev, vec![0.0; 3]);
        assert_eq!(a.hpi_yoy, vec![0.0; 3]);
        assert_eq!(a.hpi_down(0, 0.6), 0.0);
    }

    #[test]
    fn test_baseline_replaces_horizon_mean() {
        let s = series(vec![d(2020, 1)], vec![8.0]);
        let a = align_with_baseline(&s, d(2020, 1), 2, Some(5.0)).unwrap();
        assert_eq!(a.unemployment_dev, vec![3.0, 3.0]);
        assert_eq!(a.stress, vec![3.0, 3.0]);
        let b = align(&s, d(2020, 1), 2).unwrap();
        assert_eq!(b.stress, vec![0.0, 0.0]);
    }

    #[test]
    fn test_adjustment_shifts_present_columns_only() {
        let s = series(vec![d(2020, 1)], vec![5.0]);
        let adj = MacroAdjustment {
            unemployment_add: 2.0,
            hpi_yoy_add: -5.0,
        };
        let out = adj.apply(&s);
        assert_eq!(out.column(UNEMPLOYMENT).unwrap(), &[7.0]);
        assert!(out.column(HPI_YOY).is_none());
    }
}
