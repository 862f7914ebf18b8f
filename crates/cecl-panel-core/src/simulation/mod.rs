//! Monthly performance simulation.
//!
//! One Markov delinquency engine ([`engine`]) driven by a per-product
//! [`TransitionPolicy`](policy::TransitionPolicy), plus whole-portfolio
//! generation chaining population, origination and simulation.

pub mod engine;
pub mod policy;
pub mod portfolio;

pub use engine::{simulate_panel, simulate_with_policy, PanelOutput, PanelSummary, SimulationInput};
pub use policy::{BalanceModel, Hazard, LgdPolicy, Prepayment, Seasoning, TransitionPolicy};
pub use portfolio::{generate_portfolio, PortfolioInput, PortfolioOutput};
