pub mod amortize;
pub mod generate;
pub mod loss;
pub mod pipeline;
pub mod quality;
pub mod scenarios;
pub mod simulate;
