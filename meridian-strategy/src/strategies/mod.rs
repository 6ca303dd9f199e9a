/// Fast/slow moving-average crossover momentum strategy.
pub mod momentum;

pub use momentum::MomentumCrossover;
