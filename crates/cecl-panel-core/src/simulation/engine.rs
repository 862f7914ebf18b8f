//! Monthly panel simulation: layered delinquency transitions, balance
//! paths and recovery scheduling for one product's loan batch.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::policy::{risk_term, BalanceModel, TransitionPolicy};
use crate::calendar::default_start_month;
use crate::error::CeclError;
use crate::macro_series::{align_with_baseline, AlignedMacro, MacroSeries};
use crate::numeric::EPSILON;
use crate::time_value::level_payment;
use crate::types::{
    with_metadata, ComputationOutput, DelinquencyState, Loan, PerformanceRecord, ProductType,
};
use crate::CeclResult;

/// Delinquent states evaluated each month, in layer order.
const LAYERS: [DelinquencyState; 4] = [
    DelinquencyState::Current,
    DelinquencyState::Dpd30,
    DelinquencyState::Dpd60,
    DelinquencyState::Dpd90Plus,
];

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub product: ProductType,
    pub loans: Vec<Loan>,
    pub macro_series: MacroSeries,
    #[serde(default = "default_start_month")]
    pub start_month: NaiveDate,
    #[serde(default = "default_horizon")]
    pub horizon_months: usize,
    /// Base seed; the product's simulation offset is added internally.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Reference unemployment level for stress; the horizon mean when unset.
    #[serde(default)]
    pub unemployment_baseline: Option<f64>,
}

fn default_horizon() -> usize {
    12
}

fn default_seed() -> u64 {
    crate::DEFAULT_SEED
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelSummary {
    pub loans: usize,
    pub months: usize,
    pub rows: usize,
    pub charge_offs: usize,
    pub cures: usize,
    pub prepayment_months: usize,
    pub paid_off: usize,
    pub recoveries_scheduled: usize,
    /// Recoveries whose landing month fell past the horizon.
    pub recoveries_dropped: usize,
    pub total_recovery: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelOutput {
    pub product: ProductType,
    pub months: Vec<NaiveDate>,
    /// Ordered by `(loan_id, asof_month)`.
    pub records: Vec<PerformanceRecord>,
    pub summary: PanelSummary,
}

// ---------------------------------------------------------------------------
// Per-loan running state
// ---------------------------------------------------------------------------

struct Account<'a> {
    loan: &'a Loan,
    risk: f64,
    state: DelinquencyState,
    balance: f64,
    monthly_rate: f64,
    /// Level payment; installment products only.
    payment: f64,
    limit: f64,
    util_start: f64,
    util: f64,
    lgd: Option<f64>,
}

impl Account<'_> {
    fn is_active(&self, revolving: bool) -> bool {
        self.state != DelinquencyState::ChargedOff && (revolving || self.balance > EPSILON)
    }
}

#[derive(Debug, Clone, Copy)]
struct ScheduledRecovery {
    amount: f64,
    lag: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct MonthFlows {
    principal: f64,
    interest: f64,
    prepaid: f64,
    defaulted: bool,
    cured: bool,
    exposure: f64,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Simulate one product's monthly performance panel.
pub fn simulate_panel(input: &SimulationInput) -> CeclResult<ComputationOutput<PanelOutput>> {
    let policy = TransitionPolicy::for_product(input.product);
    simulate_with_policy(&policy, input)
}

/// Run the Markov delinquency engine under an explicit policy.
pub fn simulate_with_policy(
    policy: &TransitionPolicy,
    input: &SimulationInput,
) -> CeclResult<ComputationOutput<PanelOutput>> {
    let start = Instant::now();
    check_loans(policy.product, &input.loans)?;
    let aligned = align_with_baseline(
        &input.macro_series,
        input.start_month,
        input.horizon_months,
        input.unemployment_baseline,
    )?;
    let seed = input.seed.wrapping_add(policy.product.simulation_seed_offset());

    info!(
        product = %policy.product,
        loans = input.loans.len(),
        months = input.horizon_months,
        seed,
        "starting panel simulation"
    );

    let (records, summary) = run(policy, &input.loans, &aligned, seed)?;

    let mut warnings = Vec::new();
    if summary.recoveries_dropped > 0 {
        warn!(
            product = %policy.product,
            dropped = summary.recoveries_dropped,
            "recoveries scheduled past the horizon were dropped"
        );
        warnings.push(format!(
            "{} recoveries landed past the {}-month horizon and were dropped",
            summary.recoveries_dropped, input.horizon_months
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    info!(
        product = %policy.product,
        rows = summary.rows,
        charge_offs = summary.charge_offs,
        elapsed_us = elapsed,
        "panel simulation complete"
    );

    let assumptions = serde_json::json!({
        "product": policy.product,
        "start_month": aligned.months.first(),
        "horizon_months": input.horizon_months,
        "seed": input.seed,
        "stream_seed": seed,
        "unemployment_baseline": input.unemployment_baseline,
        "seasoning": policy.seasoning,
        "recovery_lag": policy.recovery_lag,
    });

    Ok(with_metadata(
        "Monthly Markov delinquency simulation (C/30/60/90+/CO) with macro stress",
        &assumptions,
        warnings,
        elapsed,
        PanelOutput {
            product: policy.product,
            months: aligned.months.clone(),
            records,
            summary,
        },
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn check_loans(product: ProductType, loans: &[Loan]) -> CeclResult<()> {
    if loans.is_empty() {
        return Err(CeclError::InsufficientData(format!(
            "No {product} loans to simulate"
        )));
    }
    let mut missing = BTreeSet::new();
    for loan in loans {
        if loan.product != product {
            return Err(CeclError::InvalidInput {
                field: "product".into(),
                reason: format!(
                    "loan {} is {} but the batch is {product}",
                    loan.loan_id, loan.product
                ),
            });
        }
        if loan.underwriting_fico.is_none() {
            missing.insert("underwriting_fico".to_string());
        }
        if product.is_revolving() && loan.credit_limit.is_none() {
            missing.insert("credit_limit".to_string());
        }
        if !loan.interest_rate.is_finite() {
            missing.insert("interest_rate".to_string());
        }
        if !loan.orig_balance.is_finite() {
            missing.insert("orig_balance".to_string());
        }
    }
    if !missing.is_empty() {
        return Err(CeclError::schema(format!("{product} loans"), missing));
    }
    Ok(())
}

fn open_account<'a>(loan: &'a Loan, revolving: bool) -> CeclResult<Account<'a>> {
    let fico = loan.underwriting_fico.unwrap_or_default();
    let mut account = Account {
        loan,
        risk: risk_term(fico),
        state: DelinquencyState::Current,
        balance: loan.orig_balance.max(0.0),
        monthly_rate: loan.interest_rate / 12.0,
        payment: 0.0,
        limit: 0.0,
        util_start: 0.0,
        util: 0.0,
        lgd: None,
    };
    if revolving {
        let limit = loan.credit_limit.unwrap_or_default();
        if limit <= 0.0 {
            return Err(CeclError::InvalidInput {
                field: "credit_limit".into(),
                reason: format!("loan {} has a non-positive limit", loan.loan_id),
            });
        }
        account.limit = limit;
        account.util_start = (loan.orig_balance / limit).clamp(0.05, 0.95);
        account.util = account.util_start;
    } else {
        account.payment = level_payment(loan.interest_rate, account.balance, loan.maturity_months)?;
    }
    Ok(account)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

fn run(
    policy: &TransitionPolicy,
    loans: &[Loan],
    aligned: &AlignedMacro,
    seed: u64,
) -> CeclResult<(Vec<PerformanceRecord>, PanelSummary)> {
    let revolving = matches!(policy.balance, BalanceModel::Revolving { .. });
    let mut accounts: Vec<Account> = loans
        .iter()
        .map(|l| open_account(l, revolving))
        .collect::<CeclResult<_>>()?;

    let n = accounts.len();
    let m = aligned.len();
    let mut rng = StdRng::seed_from_u64(seed);
    let std_normal = Normal::new(0.0, 1.0).map_err(|e| CeclError::InvalidInput {
        field: "distribution".into(),
        reason: e.to_string(),
    })?;

    let mut recoveries: BTreeMap<(usize, usize), ScheduledRecovery> = BTreeMap::new();
    let mut records = Vec::with_capacity(n * m);
    let mut summary = PanelSummary {
        loans: n,
        months: m,
        ..PanelSummary::default()
    };

    for t in 0..m {
        let stress = aligned.stress[t];
        let udev = aligned.unemployment_dev[t];
        let mut flows = vec![MonthFlows::default(); n];

        // Layer membership is fixed at the start of the month.
        let opening: Vec<(DelinquencyState, bool)> = accounts
            .iter()
            .map(|a| (a.state, a.is_active(revolving)))
            .collect();

        for layer in LAYERS {
            let draws: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
            for (i, acc) in accounts.iter_mut().enumerate() {
                let (state, active) = opening[i];
                if state != layer || !active {
                    continue;
                }
                let p_adv = policy.advance_probability(state, acc.risk, stress, t);
                let p_cure = policy.cure_probability(state, p_adv, acc.risk, stress);
                let u = draws[i];
                if u < p_adv {
                    if let Some(next) = state.next() {
                        acc.state = next;
                        flows[i].defaulted = next == DelinquencyState::ChargedOff;
                    }
                } else if u < p_adv + p_cure {
                    acc.state = DelinquencyState::Current;
                    flows[i].cured = true;
                }
            }
        }

        match policy.balance {
            BalanceModel::Revolving {
                util_sd,
                kappa,
                unemployment_dev,
                hpi,
                min_payment_pct,
            } => {
                let shocks: Vec<f64> = (0..n).map(|_| rng.sample(&std_normal)).collect();
                for (i, acc) in accounts.iter_mut().enumerate() {
                    if opening[i].0 == DelinquencyState::ChargedOff {
                        continue;
                    }
                    acc.util = (acc.util
                        + kappa * (acc.util_start - acc.util)
                        + util_sd * shocks[i]
                        + unemployment_dev * udev
                        - hpi * aligned.hpi_yoy[t] / 10.0)
                        .clamp(0.01, 0.99);
                    let drawn = acc.util * acc.limit;
                    let interest = acc.monthly_rate * drawn;
                    let principal = if acc.state == DelinquencyState::Current {
                        (min_payment_pct * acc.limit).min(drawn)
                    } else {
                        0.0
                    };
                    acc.balance = drawn - principal;
                    flows[i].principal = principal;
                    flows[i].interest = interest;
                    if flows[i].defaulted {
                        flows[i].exposure = acc.balance + principal + interest;
                        acc.balance = 0.0;
                    }
                }
            }
            BalanceModel::Installment { prepay } => {
                let smm = prepay
                    .map(|p| p.smm(aligned.fed_funds_dev[t]))
                    .unwrap_or(0.0);
                for (i, acc) in accounts.iter_mut().enumerate() {
                    let (state, active) = opening[i];
                    if state == DelinquencyState::ChargedOff || !active {
                        continue;
                    }
                    let interest = acc.monthly_rate * acc.balance;
                    let principal = (acc.payment - interest).clamp(0.0, acc.balance);
                    acc.balance -= principal;
                    flows[i].principal = principal;
                    flows[i].interest = interest;
                    if flows[i].defaulted {
                        flows[i].exposure = acc.balance + principal + interest;
                        acc.balance = 0.0;
                        continue;
                    }
                    if acc.state == DelinquencyState::Current && smm > 0.0 {
                        let prepaid = smm * acc.balance;
                        acc.balance -= prepaid;
                        flows[i].prepaid = prepaid;
                    }
                    if acc.balance <= EPSILON {
                        acc.balance = 0.0;
                        // A loan repaid while past due leaves the book current.
                        if acc.state != DelinquencyState::Current {
                            acc.state = DelinquencyState::Current;
                            flows[i].cured = state.is_delinquent();
                        }
                        summary.paid_off += 1;
                    }
                }
            }
        }

        // Loss severity and recovery timing, in loan order.
        let hpi_down = aligned.hpi_down(t, policy.lgd.hpi_down_cap);
        let (lag_lo, lag_hi) = policy.recovery_lag;
        let mut charge_offs = 0usize;
        for (i, acc) in accounts.iter_mut().enumerate() {
            if !flows[i].defaulted {
                continue;
            }
            charge_offs += 1;
            let z = rng.sample(&std_normal);
            let lag = rng.gen_range(lag_lo..lag_hi.max(lag_lo + 1));
            let lgd = policy.lgd.eval(udev, stress, hpi_down, z);
            acc.lgd = Some(lgd);
            let target = t + lag as usize;
            if target < m {
                recoveries.insert(
                    (target, i),
                    ScheduledRecovery {
                        amount: (1.0 - lgd) * flows[i].exposure,
                        lag,
                    },
                );
                summary.recoveries_scheduled += 1;
            } else {
                summary.recoveries_dropped += 1;
            }
        }

        let cures = flows.iter().filter(|f| f.cured).count();
        debug!(
            product = %policy.product,
            month = t,
            charge_offs,
            cures,
            "simulated month"
        );
        summary.charge_offs += charge_offs;
        summary.cures += cures;

        let asof = aligned.months[t];
        for (i, acc) in accounts.iter().enumerate() {
            let f = flows[i];
            let recovery = recoveries.remove(&(t, i));
            let charged_off = acc.state == DelinquencyState::ChargedOff;
            if let Some(r) = recovery {
                summary.total_recovery += r.amount;
            }
            if f.prepaid > 0.0 {
                summary.prepayment_months += 1;
            }
            records.push(PerformanceRecord {
                asof_month: asof,
                loan_id: acc.loan.loan_id,
                borrower_id: acc.loan.borrower_id,
                product: policy.product,
                balance_ead: if f.defaulted { f.exposure } else { acc.balance },
                scheduled_principal: f.principal,
                current_principal: acc.balance,
                current_interest: f.interest,
                utilization: revolving.then(|| (acc.balance / acc.limit).clamp(0.0, 1.0)),
                prepay_flag: f.prepaid > 0.0,
                days_past_due: acc.state.days_past_due(),
                roll_rate_bucket: acc.state,
                default_flag: f.defaulted,
                chargeoff_flag: charged_off,
                recovery_amt: recovery.map(|r| r.amount).unwrap_or(0.0),
                recovery_lag_m: recovery.map(|r| r.lag).unwrap_or(0),
                cure_flag: f.cured,
                loss_given_default: if charged_off { acc.lgd } else { None },
                effective_rate: acc.loan.interest_rate,
                forbearance_flag: false,
            });
        }
    }

    summary.rows = records.len();
    summary.ending_balance = accounts.iter().map(|a| a.balance).sum();
    records.sort_by_key(|r| (r.loan_id, r.asof_month));
    Ok((records, summary))
}
