//! Monthly macro covariates: columnar series, horizon alignment, synthesis.

pub mod series;
pub mod synthetic;

pub use series::{
    align, align_with_baseline, AlignedMacro, MacroAdjustment, MacroSeries, FED_FUNDS, HPI_YOY,
    UNEMPLOYMENT,
};
pub use synthetic::{synthesize, SyntheticMacroInput};
