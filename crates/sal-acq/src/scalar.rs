//! Scalar acquisition functions: one informativeness value per task.

use sal_core::{ErrorInfo, ObservationTask, Query, SalError, SpatialModel};

use crate::AcquisitionFunction;

fn require_points(stddev: &[f64], function: &str) -> Result<(), SalError> {
    if stddev.is_empty() {
        return Err(SalError::Task(
            ErrorInfo::new("empty-target", "target set has no points to aggregate over")
                .with_context("function", function),
        ));
    }
    Ok(())
}

/// Mean of the marginal standard deviations over one target set.
pub struct MeanStddev<'a> {
    model: &'a dyn SpatialModel,
    target_set: usize,
}

impl<'a> MeanStddev<'a> {
    /// Creates the function over target set 0.
    pub fn new(model: &'a dyn SpatialModel) -> Self {
        Self {
            model,
            target_set: 0,
        }
    }

    /// Selects a different target set to aggregate over.
    pub fn with_target_set(mut self, target_set: usize) -> Self {
        self.target_set = target_set;
        self
    }
}

impl AcquisitionFunction for MeanStddev<'_> {
    fn score(&mut self, task: &ObservationTask) -> Result<f64, SalError> {
        let stddev = self.model.stddev(Query::Task(task), self.target_set)?;
        require_points(&stddev, "mean-stddev")?;
        Ok(stddev.iter().sum::<f64>() / stddev.len() as f64)
    }
}

/// Mean of the marginal variances over one target set.
pub struct MeanVariance<'a> {
    model: &'a dyn SpatialModel,
    target_set: usize,
}

impl<'a> MeanVariance<'a> {
    /// Creates the function over target set 0.
    pub fn new(model: &'a dyn SpatialModel) -> Self {
        Self {
            model,
            target_set: 0,
        }
    }

    /// Selects a different target set to aggregate over.
    pub fn with_target_set(mut self, target_set: usize) -> Self {
        self.target_set = target_set;
        self
    }
}

impl AcquisitionFunction for MeanVariance<'_> {
    fn score(&mut self, task: &ObservationTask) -> Result<f64, SalError> {
        let variance = self.model.variance(Query::Task(task), self.target_set)?;
        require_points(&variance, "mean-variance")?;
        Ok(variance.iter().sum::<f64>() / variance.len() as f64)
    }
}

/// p-norm of the flattened marginal standard deviations over one target set.
///
/// `p = 1` sums the stddevs (mean scaled by the point count), larger `p`
/// weights the largest entries more, and `p = f64::INFINITY` is the maximum.
pub struct PNormStddev<'a> {
    model: &'a dyn SpatialModel,
    target_set: usize,
    p: f64,
}

impl<'a> PNormStddev<'a> {
    /// Creates the function with the default order `p = 1` over target set 0.
    pub fn new(model: &'a dyn SpatialModel) -> Self {
        Self {
            model,
            target_set: 0,
            p: 1.0,
        }
    }

    /// Sets the norm order. Must be finite and at least 1, or `f64::INFINITY`.
    pub fn with_order(mut self, p: f64) -> Result<Self, SalError> {
        if p.is_nan() || p < 1.0 {
            return Err(SalError::Config(
                ErrorInfo::new("norm-order", "norm order must be >= 1 or infinite")
                    .with_context("p", p.to_string()),
            ));
        }
        self.p = p;
        Ok(self)
    }

    /// Selects a different target set to aggregate over.
    pub fn with_target_set(mut self, target_set: usize) -> Self {
        self.target_set = target_set;
        self
    }
}

impl AcquisitionFunction for PNormStddev<'_> {
    fn score(&mut self, task: &ObservationTask) -> Result<f64, SalError> {
        let stddev = self.model.stddev(Query::Task(task), self.target_set)?;
        require_points(&stddev, "p-norm-stddev")?;
        Ok(p_norm(&stddev, self.p))
    }
}

pub(crate) fn p_norm(values: &[f64], p: f64) -> f64 {
    if p.is_infinite() {
        values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    } else if (p - 1.0).abs() < f64::EPSILON {
        values.iter().map(|v| v.abs()).sum()
    } else {
        values
            .iter()
            .map(|v| v.abs().powf(p))
            .sum::<f64>()
            .powf(1.0 / p)
    }
}

/// Average entropy of the marginal predictive distributions.
pub struct MeanMarginalEntropy<'a> {
    model: &'a dyn SpatialModel,
}

impl<'a> MeanMarginalEntropy<'a> {
    /// Creates the function.
    pub fn new(model: &'a dyn SpatialModel) -> Self {
        Self { model }
    }
}

impl AcquisitionFunction for MeanMarginalEntropy<'_> {
    fn score(&mut self, task: &ObservationTask) -> Result<f64, SalError> {
        self.model.mean_marginal_entropy(Query::Task(task))
    }
}

/// Entropy of the full joint predictive distribution.
pub struct JointEntropy<'a> {
    model: &'a dyn SpatialModel,
}

impl<'a> JointEntropy<'a> {
    /// Creates the function.
    pub fn new(model: &'a dyn SpatialModel) -> Self {
        Self { model }
    }
}

impl AcquisitionFunction for JointEntropy<'_> {
    fn score(&mut self, task: &ObservationTask) -> Result<f64, SalError> {
        self.model.joint_entropy(Query::Task(task))
    }
}
