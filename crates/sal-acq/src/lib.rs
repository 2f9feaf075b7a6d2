#![deny(missing_docs)]
#![doc = "Acquisition functions for model-guided sensor placement."]

//! Scoring strategies that rank candidate observation locations against a
//! fitted [`sal_core::SpatialModel`]. Scalar functions summarise the
//! informativeness of a whole task; parallel functions score many candidate
//! placements at once. None of them mutate the caller's task: conditioned
//! variants are derived through the task's pure copy helpers.

use sal_core::{Matrix, ObservationTask, SalError};

pub mod normal;
pub mod parallel;
pub mod scalar;

pub use parallel::{ContextDist, ExpectedImprovement, Random, Stddev};
pub use scalar::{JointEntropy, MeanMarginalEntropy, MeanStddev, MeanVariance, PNormStddev};

/// Global informativeness measure of a task's current target configuration.
pub trait AcquisitionFunction {
    /// Scores the task, returning a single scalar.
    fn score(&mut self, task: &ObservationTask) -> Result<f64, SalError>;
}

/// Per-candidate scoring across a search set, one score per candidate column.
pub trait ParallelAcquisitionFunction {
    /// Scores every candidate location, returning one value per column of
    /// `candidates`, in column order.
    fn score(&mut self, task: &ObservationTask, candidates: &Matrix)
        -> Result<Vec<f64>, SalError>;
}
