use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::Rng;
use statrs::distribution::Normal;

use crate::error::CeclError;
use crate::types::ProductType;
use crate::CeclResult;

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Normal draw clipped to `[lo, hi]`.
#[derive(Debug, Clone, Copy)]
pub struct ClippedNormal {
    pub mean: f64,
    pub sd: f64,
    pub lo: f64,
    pub hi: f64,
}

impl ClippedNormal {
    pub const fn new(mean: f64, sd: f64, lo: f64, hi: f64) -> Self {
        ClippedNormal { mean, sd, lo, hi }
    }

    pub fn sample(&self, rng: &mut StdRng, shift: f64) -> CeclResult<f64> {
        let dist = Normal::new(self.mean, self.sd).map_err(|e| CeclError::InvalidInput {
            field: "distribution".into(),
            reason: format!("Invalid Normal parameters: {e}"),
        })?;
        Ok((rng.sample(&dist) + shift).clamp(self.lo, self.hi))
    }
}

/// Contract rate: `base + max(0, pivot - fico) * slope + noise`, clipped.
#[derive(Debug, Clone, Copy)]
pub struct RateModel {
    pub base: f64,
    pub fico_pivot: f64,
    pub slope: f64,
    pub noise: ClippedNormal,
}

impl RateModel {
    pub fn sample(&self, rng: &mut StdRng, fico: u32) -> CeclResult<f64> {
        let shift = self.base + (self.fico_pivot - fico as f64).max(0.0) * self.slope;
        self.noise.sample(rng, shift)
    }
}

/// How the origination date is scattered.
#[derive(Debug, Clone, Copy)]
pub enum OriginationWindow {
    /// Uniform over `n` month starts from the anchor.
    Months(u32),
    /// Uniform over `n` days from the anchor.
    Days(u32),
}

/// How the original balance (and line size) is drawn.
#[derive(Debug, Clone, Copy)]
pub enum Sizing {
    /// Closed-end amount.
    Amortizing(ClippedNormal),
    /// Line sized off monthly income; drawn balance follows baseline utilization.
    IncomeLine {
        income_share: (f64, f64),
        limit_lo: f64,
        limit_hi: f64,
        draw_share: (f64, f64),
        min_balance: f64,
    },
    /// Line drawn independently of income; balance is a uniform share of it.
    FixedLine {
        limit: ClippedNormal,
        draw_share: (f64, f64),
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradeScheme {
    /// D / C / B / A / AA with cuts at 639, 679, 719, 759.
    Prime,
    /// E / D / C / B / A with cuts at 629, 669, 709, 749.
    Installment,
}

impl GradeScheme {
    pub fn grade(&self, fico: u32) -> &'static str {
        let (cuts, labels): ([u32; 4], [&str; 5]) = match self {
            GradeScheme::Prime => ([639, 679, 719, 759], ["D", "C", "B", "A", "AA"]),
            GradeScheme::Installment => ([629, 669, 709, 749], ["E", "D", "C", "B", "A"]),
        };
        let idx = cuts.iter().take_while(|c| fico > **c).count();
        labels[idx]
    }
}

// ---------------------------------------------------------------------------
// Per-product terms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OriginationTerms {
    pub anchor: NaiveDate,
    pub window: OriginationWindow,
    /// Half-open term range in months.
    pub term_months: (u32, u32),
    pub rate: RateModel,
    pub sizing: Sizing,
    pub ltv: Option<ClippedNormal>,
    pub dti: ClippedNormal,
    /// Add the drawn share of the line to the DTI draw.
    pub dti_includes_utilization: bool,
    pub channels: &'static [(&'static str, f64)],
    pub grades: GradeScheme,
}

fn anchor(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or_default()
}

impl OriginationTerms {
    pub fn for_product(product: ProductType) -> Self {
        match product {
            ProductType::Card => OriginationTerms {
                anchor: anchor(2018, 1),
                window: OriginationWindow::Months(60),
                term_months: (120, 121),
                rate: RateModel {
                    base: 0.12,
                    fico_pivot: 720.0,
                    slope: 0.00025,
                    noise: ClippedNormal::new(0.0, 0.01, 0.08, 0.35),
                },
                sizing: Sizing::IncomeLine {
                    income_share: (0.2, 0.5),
                    limit_lo: 1_000.0,
                    limit_hi: 30_000.0,
                    draw_share: (0.6, 1.0),
                    min_balance: 100.0,
                },
                ltv: None,
                dti: ClippedNormal::new(0.3, 0.1, 0.05, 0.8),
                dti_includes_utilization: true,
                channels: &[("branch", 0.3), ("online", 0.35), ("mobile", 0.3), ("other", 0.05)],
                grades: GradeScheme::Prime,
            },
            ProductType::Auto => OriginationTerms {
                anchor: anchor(2019, 1),
                window: OriginationWindow::Days(48),
                term_months: (36, 85),
                rate: RateModel {
                    base: 0.05,
                    fico_pivot: 700.0,
                    slope: 0.0002,
                    noise: ClippedNormal::new(0.0, 0.005, 0.03, 0.18),
                },
                sizing: Sizing::Amortizing(ClippedNormal::new(25_000.0, 8_000.0, 5_000.0, 80_000.0)),
                ltv: Some(ClippedNormal::new(0.95, 0.1, 0.4, 1.2)),
                dti: ClippedNormal::new(0.35, 0.1, 0.05, 0.85),
                dti_includes_utilization: false,
                channels: &[("dealer", 1.0)],
                grades: GradeScheme::Installment,
            },
            ProductType::Personal => OriginationTerms {
                anchor: anchor(2020, 1),
                window: OriginationWindow::Days(24),
                term_months: (24, 61),
                rate: RateModel {
                    base: 0.12,
                    fico_pivot: 700.0,
                    slope: 0.0005,
                    noise: ClippedNormal::new(0.0, 0.01, 0.08, 0.36),
                },
                sizing: Sizing::Amortizing(ClippedNormal::new(12_000.0, 6_000.0, 1_000.0, 60_000.0)),
                ltv: None,
                dti: ClippedNormal::new(0.4, 0.12, 0.05, 0.95),
                dti_includes_utilization: false,
                channels: &[("branch", 0.4), ("online", 0.6)],
                grades: GradeScheme::Installment,
            },
            ProductType::Mortgage => OriginationTerms {
                anchor: anchor(2017, 1),
                window: OriginationWindow::Days(365 * 3),
                term_months: (180, 361),
                rate: RateModel {
                    base: 0.035,
                    fico_pivot: 700.0,
                    slope: 0.00005,
                    noise: ClippedNormal::new(0.0, 0.003, 0.02, 0.08),
                },
                sizing: Sizing::Amortizing(ClippedNormal::new(
                    350_000.0, 120_000.0, 50_000.0, 1_500_000.0,
                )),
                ltv: Some(ClippedNormal::new(0.8, 0.1, 0.3, 1.2)),
                dti: ClippedNormal::new(0.32, 0.08, 0.05, 0.7),
                dti_includes_utilization: false,
                channels: &[("retail", 0.7), ("broker", 0.3)],
                grades: GradeScheme::Prime,
            },
            ProductType::Heloc => OriginationTerms {
                anchor: anchor(2018, 1),
                window: OriginationWindow::Days(365 * 4),
                term_months: (120, 241),
                rate: RateModel {
                    base: 0.055,
                    fico_pivot: 700.0,
                    slope: 0.00015,
                    noise: ClippedNormal::new(0.0, 0.005, 0.03, 0.18),
                },
                sizing: Sizing::FixedLine {
                    limit: ClippedNormal::new(120_000.0, 60_000.0, 10_000.0, 500_000.0),
                    draw_share: (0.2, 0.8),
                },
                ltv: Some(ClippedNormal::new(0.7, 0.1, 0.2, 1.1)),
                dti: ClippedNormal::new(0.34, 0.1, 0.05, 0.85),
                dti_includes_utilization: false,
                channels: &[("branch", 0.6), ("online", 0.4)],
                grades: GradeScheme::Prime,
            },
        }
    }
}
