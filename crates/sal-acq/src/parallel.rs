//! Parallel acquisition functions: one score per candidate placement.

use sal_core::{ErrorInfo, Matrix, ObservationTask, Query, RngHandle, SalError, SpatialModel};

use crate::normal;
use crate::ParallelAcquisitionFunction;

/// Stddev floor below which expected improvement degenerates to zero.
const EI_STDDEV_FLOOR: f64 = 1e-12;

/// Baseline: uniform random score per candidate.
///
/// Holds an advancing deterministic stream, so two instances constructed from
/// the same seed produce identical score vectors call for call.
pub struct Random {
    rng: RngHandle,
}

impl Random {
    /// Creates the baseline with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RngHandle::from_seed(seed),
        }
    }
}

impl ParallelAcquisitionFunction for Random {
    fn score(
        &mut self,
        _task: &ObservationTask,
        candidates: &Matrix,
    ) -> Result<Vec<f64>, SalError> {
        Ok((0..candidates.cols()).map(|_| self.rng.uniform()).collect())
    }
}

/// Distance from each candidate to its nearest existing context point.
pub struct ContextDist {
    context_set: usize,
}

impl ContextDist {
    /// Creates the function over the given context set.
    pub fn new(context_set: usize) -> Self {
        Self { context_set }
    }
}

impl ParallelAcquisitionFunction for ContextDist {
    fn score(
        &mut self,
        task: &ObservationTask,
        candidates: &Matrix,
    ) -> Result<Vec<f64>, SalError> {
        let context = task.context(self.context_set)?;
        if context.is_empty() {
            // No sensors placed yet: emit a degenerate vector whose first
            // candidate strictly wins, so an argmax caller still converges to
            // a deterministic first placement.
            let mut scores = vec![0.0; candidates.cols()];
            if let Some(first) = scores.first_mut() {
                *first = 1.0;
            }
            return Ok(scores);
        }
        if candidates.rows() != context.locations.rows() {
            return Err(SalError::Config(
                ErrorInfo::new("dims-mismatch", "candidates and context disagree on dimensions")
                    .with_context("candidates", candidates.rows().to_string())
                    .with_context("context", context.locations.rows().to_string()),
            ));
        }
        let mut scores = Vec::with_capacity(candidates.cols());
        for idx in 0..candidates.cols() {
            let candidate = candidates.col(idx);
            let mut nearest = f64::INFINITY;
            for point_idx in 0..context.len() {
                let point = context.locations.col(point_idx);
                let dist = candidate
                    .iter()
                    .zip(point)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt();
                nearest = nearest.min(dist);
            }
            scores.push(nearest);
        }
        Ok(scores)
    }
}

/// Marginal predictive stddev evaluated at each candidate location.
pub struct Stddev<'a> {
    model: &'a dyn SpatialModel,
}

impl<'a> Stddev<'a> {
    /// Creates the function.
    pub fn new(model: &'a dyn SpatialModel) -> Self {
        Self { model }
    }
}

impl ParallelAcquisitionFunction for Stddev<'_> {
    fn score(
        &mut self,
        task: &ObservationTask,
        candidates: &Matrix,
    ) -> Result<Vec<f64>, SalError> {
        let scored = task.with_sole_target(candidates.clone());
        self.model.stddev(Query::Task(&scored), 0)
    }
}

/// Expected improvement over a maximisation objective.
///
/// `EI = sigma * (mu - best) * Phi(Z) + sigma * phi(Z)` with
/// `Z = (mu - best) / sigma`, where `best` is the largest value observed in
/// the chosen context set. Candidates whose predictive stddev collapses below
/// a small floor score zero (the limit of the formula). With an empty chosen
/// context set the score falls back to the marginal stddev at each candidate,
/// so it stays defined before the first sensor is placed.
pub struct ExpectedImprovement<'a> {
    model: &'a dyn SpatialModel,
    context_set: usize,
}

impl<'a> ExpectedImprovement<'a> {
    /// Creates the function, taking the incumbent from context set 0.
    pub fn new(model: &'a dyn SpatialModel) -> Self {
        Self {
            model,
            context_set: 0,
        }
    }

    /// Selects the context set the incumbent best value is read from.
    pub fn with_context_set(mut self, context_set: usize) -> Self {
        self.context_set = context_set;
        self
    }
}

impl ParallelAcquisitionFunction for ExpectedImprovement<'_> {
    fn score(
        &mut self,
        task: &ObservationTask,
        candidates: &Matrix,
    ) -> Result<Vec<f64>, SalError> {
        let context = task.context(self.context_set)?;
        if !context.is_empty() && candidates.rows() != context.locations.rows() {
            return Err(SalError::Config(
                ErrorInfo::new("dims-mismatch", "candidates and context disagree on dimensions")
                    .with_context("candidates", candidates.rows().to_string())
                    .with_context("context", context.locations.rows().to_string()),
            ));
        }
        let scored = task.with_sole_target(candidates.clone());
        let query = Query::Task(&scored);
        let mean = self.model.mean(query, 0)?;
        let stddev = self.model.stddev(query, 0)?;
        if context.is_empty() {
            return Ok(stddev);
        }
        let best = context
            .values
            .values()
            .iter()
            .fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let scores = mean
            .iter()
            .zip(&stddev)
            .map(|(&mu, &sigma)| {
                if sigma < EI_STDDEV_FLOOR {
                    0.0
                } else {
                    let z = (mu - best) / sigma;
                    sigma * (mu - best) * normal::cdf(z) + sigma * normal::pdf(z)
                }
            })
            .collect();
        Ok(scores)
    }
}
