//! Per-product loan origination conditioned on borrower attributes.

pub mod loans;
pub mod terms;

pub use loans::{generate_loans, OriginationInput};
pub use terms::OriginationTerms;
