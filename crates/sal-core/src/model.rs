//! Capability contract for spatial predictive models.
//!
//! The core never looks inside a model: acquisition functions and the
//! autoregressive sampler consume exactly the operations listed on
//! [`SpatialModel`]. Optional operations default to a capability error so a
//! partially capable model surfaces the gap at first use, not at construction.

use std::any::Any;
use std::fmt::Debug;

use crate::errors::SalError;
use crate::rng::RngHandle;
use crate::task::{Matrix, ObservationTask};

/// Opaque handle for a model's cached predictive distribution.
///
/// Produced by [`SpatialModel::infer`] and handed back through
/// [`Query::Posterior`] so repeated statistics over the same conditioning do
/// not rerun the model forward.
pub trait PosteriorState: Debug {
    /// Downcast support for the owning model.
    fn as_any(&self) -> &dyn Any;
}

/// Input to a model operation: either a raw task to run forward, or an
/// already-computed predictive distribution to reuse.
#[derive(Debug, Clone, Copy)]
pub enum Query<'a> {
    /// Run the model forward on this task.
    Task(&'a ObservationTask),
    /// Reuse a cached predictive distribution.
    Posterior(&'a dyn PosteriorState),
}

impl<'a> From<&'a ObservationTask> for Query<'a> {
    fn from(task: &'a ObservationTask) -> Self {
        Query::Task(task)
    }
}

/// Output of the native autoregressive/joint sampling primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArModelOutput {
    /// One row per sample path, each covering the task's primary target set
    /// in column order.
    pub samples: Vec<Vec<f64>>,
    /// Marginal predictive mean under the conditioning used for the draw.
    pub mean: Vec<f64>,
    /// Marginal predictive variance under the same conditioning.
    pub variance: Vec<f64>,
}

/// Minimum capability contract for probabilistic spatial models.
///
/// The model is read-only shared state: every operation takes `&self` and may
/// be called concurrently. Randomness always enters through an explicitly
/// passed [`RngHandle`].
pub trait SpatialModel: Send + Sync {
    /// Runs the model forward and returns its predictive distribution.
    fn infer(&self, task: &ObservationTask) -> Result<Box<dyn PosteriorState>, SalError>;

    /// Marginal predictive mean over the given target set.
    fn mean(&self, query: Query<'_>, target_set: usize) -> Result<Vec<f64>, SalError> {
        let _ = (query, target_set);
        Err(SalError::missing_capability("mean"))
    }

    /// Marginal predictive variance over the given target set.
    fn variance(&self, query: Query<'_>, target_set: usize) -> Result<Vec<f64>, SalError> {
        let _ = (query, target_set);
        Err(SalError::missing_capability("variance"))
    }

    /// Marginal predictive standard deviation, derived from [`variance`].
    ///
    /// [`variance`]: SpatialModel::variance
    fn stddev(&self, query: Query<'_>, target_set: usize) -> Result<Vec<f64>, SalError> {
        let variance = self.variance(query, target_set)?;
        Ok(variance.into_iter().map(|v| v.max(0.0).sqrt()).collect())
    }

    /// Average entropy of the marginal predictive distributions.
    fn mean_marginal_entropy(&self, query: Query<'_>) -> Result<f64, SalError> {
        let _ = query;
        Err(SalError::missing_capability("mean_marginal_entropy"))
    }

    /// Entropy of the full joint predictive distribution.
    fn joint_entropy(&self, query: Query<'_>) -> Result<f64, SalError> {
        let _ = query;
        Err(SalError::missing_capability("joint_entropy"))
    }

    /// Joint log-density of the observed values on the given target set.
    fn logpdf(&self, query: Query<'_>, target_set: usize) -> Result<f64, SalError> {
        let _ = (query, target_set);
        Err(SalError::missing_capability("logpdf"))
    }

    /// Draws `n_samples` over the target points.
    ///
    /// Whether the rows are jointly correlated or independent per location
    /// depends on the model's capability class; see
    /// [`models_correlations`](SpatialModel::models_correlations).
    fn sample(
        &self,
        query: Query<'_>,
        n_samples: usize,
        rng: &mut RngHandle,
    ) -> Result<Vec<Vec<f64>>, SalError> {
        let _ = (query, n_samples, rng);
        Err(SalError::missing_capability("sample"))
    }

    /// Whether predictions are jointly correlated given context.
    ///
    /// Models whose predictions are conditionally independent given context
    /// return `false`; the autoregressive infill pass then uses the mean
    /// instead of a joint draw.
    fn models_correlations(&self) -> bool {
        true
    }

    /// Native sequential/joint sampling primitive over the primary target set.
    ///
    /// The provided implementation runs the generic one-point-at-a-time chain:
    /// each target location is drawn from its marginal predictive distribution
    /// with all previously drawn points appended to context set 0, so spatial
    /// correlation is preserved through the conditioning alone. Models with a
    /// cheaper native joint sampler should override this. The chain supports
    /// scalar-valued observations on context set 0.
    fn ar_sample(
        &self,
        task: &ObservationTask,
        n_samples: usize,
        rng: &mut RngHandle,
    ) -> Result<ArModelOutput, SalError> {
        let target = task.target(0)?.locations.clone();
        let mean = self.mean(Query::Task(task), 0)?;
        let variance = self.variance(Query::Task(task), 0)?;
        let mut samples = Vec::with_capacity(n_samples);
        for _ in 0..n_samples {
            let mut conditioned = task.clone();
            let mut path = Vec::with_capacity(target.cols());
            for idx in 0..target.cols() {
                let point = Matrix::from_point(target.col(idx));
                let step = conditioned.with_sole_target(point.clone());
                let step_query = Query::Task(&step);
                let mu = self.mean(step_query, 0)?;
                let sigma = self.stddev(step_query, 0)?;
                let draw = mu[0] + sigma[0] * rng.standard_normal();
                let value = Matrix::from_point(&[draw]);
                conditioned = conditioned.with_appended_context(0, &point, &value)?;
                path.push(draw);
            }
            samples.push(path);
        }
        Ok(ArModelOutput {
            samples,
            mean,
            variance,
        })
    }
}
