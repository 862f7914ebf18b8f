pub mod borrowers;

pub use borrowers::{generate_borrowers, PopulationInput};
