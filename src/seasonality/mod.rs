//! Seasonal decomposition.

mod classical;

pub use classical::{seasonal_decompose, ClassicalDecomposition, DecompositionResult, DEFAULT_PERIOD};
