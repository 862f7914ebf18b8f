use napi::Result as NapiResult;
use napi_derive::napi;

use cecl_panel_core as core;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Generation & simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn synthesize_macro(input_json: String) -> NapiResult<String> {
    let input: core::macro_series::SyntheticMacroInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = core::macro_series::synthesize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn simulate_panel(input_json: String) -> NapiResult<String> {
    let input: core::simulation::SimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = core::simulation::simulate_panel(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn generate_portfolio(input_json: String) -> NapiResult<String> {
    let input: core::simulation::PortfolioInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = core::simulation::generate_portfolio(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Expected loss & calibration
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_cecl(input_json: String) -> NapiResult<String> {
    let value: serde_json::Value = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let input = core::ecl::CeclInput::from_json(value).map_err(to_napi_error)?;
    let output = core::ecl::run_cecl(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calibrate_curves(input_json: String) -> NapiResult<String> {
    let input: core::calibration::CalibrationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = core::calibration::calibrate_products(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn hazards_from_cumulative(input_json: String) -> NapiResult<String> {
    let input: core::calibration::HazardInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = core::calibration::hazards_for(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Validation, reporting & scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_panel(input_json: String) -> NapiResult<String> {
    let input: core::validation::ValidationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = core::validation::validate_dataset(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn panel_report(input_json: String) -> NapiResult<String> {
    let input: core::reporting::ReportInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = core::reporting::build_report(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_scenarios(input_json: String) -> NapiResult<String> {
    let input: core::scenarios::ScenarioSetInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = core::scenarios::run_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: core::time_value::AmortizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = core::time_value::amortization_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
