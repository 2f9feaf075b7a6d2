//! Exact Gaussian-process implementation of the [`SpatialModel`] contract.

use std::any::Any;

use sal_core::{
    ArModelOutput, ErrorInfo, ObservationTask, PosteriorState, Query, RngHandle, SalError,
    SpatialModel,
};

use crate::kernel::Kernel;
use crate::linalg;

/// Modification tag claimed by this model family.
pub const GP_TAG: &str = "gp";

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Exact GP regression model with closed-form conditioning.
///
/// Conditions on the union of all context sets and predicts over the
/// concatenation of all target sets. Observations are scalar (one value row
/// per point).
#[derive(Debug, Clone)]
pub struct GpModel {
    kernel: Kernel,
    noise_variance: f64,
    prior_mean: f64,
    correlated: bool,
}

/// Cached predictive distribution produced by [`GpModel::infer`].
#[derive(Debug, Clone)]
pub struct GpPosterior {
    mean: Vec<f64>,
    cov: Vec<f64>,
    chol: Vec<f64>,
    marginal_variance: Vec<f64>,
    sets: Vec<(usize, usize)>,
    observed: Vec<Option<Vec<f64>>>,
}

impl PosteriorState for GpPosterior {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl GpPosterior {
    fn total_points(&self) -> usize {
        self.mean.len()
    }

    fn set_range(&self, target_set: usize) -> Result<(usize, usize), SalError> {
        self.sets.get(target_set).copied().ok_or_else(|| {
            SalError::Task(
                ErrorInfo::new("target-index", "target set index out of range")
                    .with_context("index", target_set.to_string())
                    .with_context("available", self.sets.len().to_string()),
            )
        })
    }
}

enum PosteriorRef<'a> {
    Owned(GpPosterior),
    Borrowed(&'a GpPosterior),
}

impl PosteriorRef<'_> {
    fn get(&self) -> &GpPosterior {
        match self {
            PosteriorRef::Owned(post) => post,
            PosteriorRef::Borrowed(post) => post,
        }
    }
}

impl GpModel {
    /// Creates a model, validating kernel and noise hyperparameters.
    pub fn new(kernel: Kernel, noise_variance: f64, prior_mean: f64) -> Result<Self, SalError> {
        kernel.validate()?;
        if !(noise_variance.is_finite() && noise_variance >= 0.0) {
            return Err(SalError::Config(
                ErrorInfo::new("noise-variance", "noise variance must be non-negative and finite")
                    .with_context("noise_variance", noise_variance.to_string()),
            ));
        }
        if !prior_mean.is_finite() {
            return Err(SalError::Config(
                ErrorInfo::new("prior-mean", "prior mean must be finite")
                    .with_context("prior_mean", prior_mean.to_string()),
            ));
        }
        Ok(Self {
            kernel,
            noise_variance,
            prior_mean,
            correlated: true,
        })
    }

    /// Switches `sample` to independent per-location draws from the marginals.
    ///
    /// Marginal means and variances are unchanged; only the joint structure of
    /// direct draws is dropped, modelling the conditionally-independent
    /// capability class.
    pub fn mean_field(mut self) -> Self {
        self.correlated = false;
        self
    }

    fn jitter(&self) -> f64 {
        1e-9 * self.kernel.variance() + 1e-12
    }

    fn check_task(&self, task: &ObservationTask) -> Result<(), SalError> {
        if let Some(tag) = &task.modified {
            if tag != GP_TAG {
                return Err(SalError::Task(
                    ErrorInfo::new("tag-conflict", "task was transformed for another model family")
                        .with_context("tag", tag.clone()),
                ));
            }
        }
        Ok(())
    }

    /// Computes the exact posterior over all target points of the task.
    pub fn posterior(&self, task: &ObservationTask) -> Result<GpPosterior, SalError> {
        self.check_task(task)?;

        let mut dims: Option<usize> = None;
        let mut check_dims = |rows: usize, cols: usize| -> Result<(), SalError> {
            if cols == 0 {
                return Ok(());
            }
            match dims {
                None => {
                    dims = Some(rows);
                    Ok(())
                }
                Some(expected) if expected == rows => Ok(()),
                Some(expected) => Err(SalError::Task(
                    ErrorInfo::new("dims-mismatch", "coordinate dimensions disagree across sets")
                        .with_context("expected", expected.to_string())
                        .with_context("found", rows.to_string()),
                )),
            }
        };

        let mut context_points: Vec<&[f64]> = Vec::new();
        let mut context_values: Vec<f64> = Vec::new();
        for set in &task.contexts {
            check_dims(set.locations.rows(), set.locations.cols())?;
            if !set.is_empty() && set.values.rows() != 1 {
                return Err(SalError::Task(
                    ErrorInfo::new("scalar-values-only", "context values must have one row")
                        .with_context("rows", set.values.rows().to_string()),
                ));
            }
            for idx in 0..set.len() {
                context_points.push(set.locations.col(idx));
                context_values.push(set.values.get(0, idx));
            }
        }

        let mut target_points: Vec<&[f64]> = Vec::new();
        let mut sets = Vec::with_capacity(task.targets.len());
        let mut observed = Vec::with_capacity(task.targets.len());
        for set in &task.targets {
            check_dims(set.locations.rows(), set.locations.cols())?;
            let start = target_points.len();
            for idx in 0..set.len() {
                target_points.push(set.locations.col(idx));
            }
            sets.push((start, set.len()));
            observed.push(match &set.values {
                Some(values) if values.rows() == 1 => {
                    Some((0..set.len()).map(|idx| values.get(0, idx)).collect())
                }
                Some(_) => {
                    return Err(SalError::Task(ErrorInfo::new(
                        "scalar-values-only",
                        "target values must have one row",
                    )))
                }
                None => None,
            });
        }

        let m = context_points.len();
        let n = target_points.len();
        let jitter = self.jitter();

        // Cross-covariance solves against the context factor. With an empty
        // context the posterior is the prior.
        let (mean, solved): (Vec<f64>, Vec<Vec<f64>>) = if m > 0 {
            let mut k_cc = vec![0.0; m * m];
            for i in 0..m {
                for j in 0..m {
                    k_cc[i * m + j] = self.kernel.eval(context_points[i], context_points[j]);
                }
                k_cc[i * m + i] += self.noise_variance;
            }
            let chol_c = linalg::cholesky(&k_cc, m, jitter)?;
            let resid: Vec<f64> = context_values
                .iter()
                .map(|y| y - self.prior_mean)
                .collect();
            let w = linalg::solve_lower(&chol_c, m, &resid);
            let alpha = linalg::solve_lower_transpose(&chol_c, m, &w);

            let mut mean = Vec::with_capacity(n);
            let mut solved = Vec::with_capacity(n);
            for &t in &target_points {
                let k_tc: Vec<f64> = context_points
                    .iter()
                    .map(|&c| self.kernel.eval(t, c))
                    .collect();
                let mu = self.prior_mean
                    + k_tc.iter().zip(&alpha).map(|(k, a)| k * a).sum::<f64>();
                mean.push(mu);
                solved.push(linalg::solve_lower(&chol_c, m, &k_tc));
            }
            (mean, solved)
        } else {
            (vec![self.prior_mean; n], vec![Vec::new(); n])
        };

        let mut cov = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..=i {
                let prior = self.kernel.eval(target_points[i], target_points[j]);
                let explained: f64 = solved[i].iter().zip(&solved[j]).map(|(a, b)| a * b).sum();
                let mut value = prior - explained;
                if i == j {
                    value += self.noise_variance;
                }
                cov[i * n + j] = value;
                cov[j * n + i] = value;
            }
        }
        let marginal_variance: Vec<f64> = (0..n).map(|i| cov[i * n + i]).collect();
        let chol = linalg::cholesky(&cov, n, jitter)?;

        Ok(GpPosterior {
            mean,
            cov,
            chol,
            marginal_variance,
            sets,
            observed,
        })
    }

    fn resolve<'a>(&self, query: Query<'a>) -> Result<PosteriorRef<'a>, SalError> {
        match query {
            Query::Task(task) => Ok(PosteriorRef::Owned(self.posterior(task)?)),
            Query::Posterior(state) => state
                .as_any()
                .downcast_ref::<GpPosterior>()
                .map(PosteriorRef::Borrowed)
                .ok_or_else(|| {
                    SalError::Config(ErrorInfo::new(
                        "foreign-posterior",
                        "posterior was produced by a different model family",
                    ))
                }),
        }
    }
}

impl SpatialModel for GpModel {
    fn infer(&self, task: &ObservationTask) -> Result<Box<dyn PosteriorState>, SalError> {
        Ok(Box::new(self.posterior(task)?))
    }

    fn mean(&self, query: Query<'_>, target_set: usize) -> Result<Vec<f64>, SalError> {
        let post = self.resolve(query)?;
        let post = post.get();
        let (start, len) = post.set_range(target_set)?;
        Ok(post.mean[start..start + len].to_vec())
    }

    fn variance(&self, query: Query<'_>, target_set: usize) -> Result<Vec<f64>, SalError> {
        let post = self.resolve(query)?;
        let post = post.get();
        let (start, len) = post.set_range(target_set)?;
        Ok(post.marginal_variance[start..start + len].to_vec())
    }

    fn mean_marginal_entropy(&self, query: Query<'_>) -> Result<f64, SalError> {
        let post = self.resolve(query)?;
        let post = post.get();
        let n = post.total_points();
        if n == 0 {
            return Err(SalError::task("empty-target", "task has no target points"));
        }
        let sum: f64 = post
            .marginal_variance
            .iter()
            .map(|&v| 0.5 * (1.0 + LN_2PI + v.max(f64::MIN_POSITIVE).ln()))
            .sum();
        Ok(sum / n as f64)
    }

    fn joint_entropy(&self, query: Query<'_>) -> Result<f64, SalError> {
        let post = self.resolve(query)?;
        let post = post.get();
        let n = post.total_points();
        if n == 0 {
            return Err(SalError::task("empty-target", "task has no target points"));
        }
        let log_det = linalg::log_det_from_cholesky(&post.chol, n);
        Ok(0.5 * (n as f64) * (1.0 + LN_2PI) + 0.5 * log_det)
    }

    fn logpdf(&self, query: Query<'_>, target_set: usize) -> Result<f64, SalError> {
        let post = self.resolve(query)?;
        let post = post.get();
        let (start, len) = post.set_range(target_set)?;
        let values = post
            .observed
            .get(target_set)
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                SalError::Task(
                    ErrorInfo::new("missing-target-values", "target set carries no observed values")
                        .with_context("target_set", target_set.to_string()),
                )
            })?;
        if len == 0 {
            return Err(SalError::task("empty-target", "target set has no points"));
        }
        let n = post.total_points();
        let mut block = vec![0.0; len * len];
        for i in 0..len {
            for j in 0..len {
                block[i * len + j] = post.cov[(start + i) * n + (start + j)];
            }
        }
        let chol = linalg::cholesky(&block, len, self.jitter())?;
        let resid: Vec<f64> = values
            .iter()
            .zip(&post.mean[start..start + len])
            .map(|(y, mu)| y - mu)
            .collect();
        let w = linalg::solve_lower(&chol, len, &resid);
        let quad: f64 = w.iter().map(|x| x * x).sum();
        let log_det = linalg::log_det_from_cholesky(&chol, len);
        Ok(-0.5 * (quad + log_det + len as f64 * LN_2PI))
    }

    fn sample(
        &self,
        query: Query<'_>,
        n_samples: usize,
        rng: &mut RngHandle,
    ) -> Result<Vec<Vec<f64>>, SalError> {
        let post = self.resolve(query)?;
        let post = post.get();
        let n = post.total_points();
        let mut samples = Vec::with_capacity(n_samples);
        for _ in 0..n_samples {
            let z: Vec<f64> = (0..n).map(|_| rng.standard_normal()).collect();
            let mut row = Vec::with_capacity(n);
            if self.correlated {
                for i in 0..n {
                    let mut value = post.mean[i];
                    for j in 0..=i {
                        value += post.chol[i * n + j] * z[j];
                    }
                    row.push(value);
                }
            } else {
                for i in 0..n {
                    row.push(post.mean[i] + post.marginal_variance[i].max(0.0).sqrt() * z[i]);
                }
            }
            samples.push(row);
        }
        Ok(samples)
    }

    fn models_correlations(&self) -> bool {
        self.correlated
    }

    fn ar_sample(
        &self,
        task: &ObservationTask,
        n_samples: usize,
        rng: &mut RngHandle,
    ) -> Result<ArModelOutput, SalError> {
        // The sequential chain is exact for a GP, so the joint posterior draw
        // over the primary target set gives the same distribution in one
        // factorization.
        let sole = task.with_sole_target(task.target(0)?.locations.clone());
        let post = self.posterior(&sole)?;
        let n = post.total_points();
        let mut samples = Vec::with_capacity(n_samples);
        for _ in 0..n_samples {
            let z: Vec<f64> = (0..n).map(|_| rng.standard_normal()).collect();
            let mut row = Vec::with_capacity(n);
            for i in 0..n {
                let mut value = post.mean[i];
                for j in 0..=i {
                    value += post.chol[i * n + j] * z[j];
                }
                row.push(value);
            }
            samples.push(row);
        }
        Ok(ArModelOutput {
            samples,
            mean: post.mean,
            variance: post.marginal_variance,
        })
    }
}
