//! YAML run specification shared by the `place` and `sample` subcommands.

use sal_core::{ErrorInfo, Matrix, SalError};
use sal_gp::Kernel;
use serde::{Deserialize, Serialize};

/// Gaussian-process field the run simulates and models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Covariance kernel of the latent field.
    pub kernel: Kernel,
    /// Observation noise variance.
    pub noise_variance: f64,
    /// Constant prior mean.
    #[serde(default)]
    pub prior_mean: f64,
}

/// Row-major square grid of cell centres over the unit square.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridSpec {
    /// Points per axis.
    pub side: usize,
}

impl GridSpec {
    /// Grid locations as a `2 x side^2` coordinate matrix, row-major order.
    pub fn locations(&self) -> Result<Matrix, SalError> {
        let mut data = Vec::with_capacity(2 * self.side * self.side);
        for row in 0..self.side {
            for col in 0..self.side {
                data.push((row as f64 + 0.5) / self.side as f64);
                data.push((col as f64 + 0.5) / self.side as f64);
            }
        }
        Matrix::new(2, self.side * self.side, data)
    }
}

/// Acquisition function driving the greedy placement loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AcquisitionSpec {
    /// Mean predictive standard deviation over the target grid.
    MeanStddev,
    /// Mean predictive variance over the target grid.
    MeanVariance,
    /// p-norm of the predictive standard deviations.
    PNormStddev {
        /// Norm order, `p >= 1` (infinity allowed).
        order: f64,
    },
    /// Mean entropy of the marginal predictive distributions.
    MeanMarginalEntropy,
    /// Entropy of the joint predictive distribution.
    JointEntropy,
    /// Uniform random scores, for baselines.
    Random,
    /// Distance to the nearest existing sensor.
    ContextDist,
    /// Predictive standard deviation at each candidate.
    Stddev,
    /// Expected improvement over the best observed value.
    ExpectedImprovement,
}

impl AcquisitionSpec {
    /// Stable name used in summary artefacts.
    pub fn name(&self) -> &'static str {
        match self {
            AcquisitionSpec::MeanStddev => "mean-stddev",
            AcquisitionSpec::MeanVariance => "mean-variance",
            AcquisitionSpec::PNormStddev { .. } => "p-norm-stddev",
            AcquisitionSpec::MeanMarginalEntropy => "mean-marginal-entropy",
            AcquisitionSpec::JointEntropy => "joint-entropy",
            AcquisitionSpec::Random => "random",
            AcquisitionSpec::ContextDist => "context-dist",
            AcquisitionSpec::Stddev => "stddev",
            AcquisitionSpec::ExpectedImprovement => "expected-improvement",
        }
    }

    /// Whether the function scores candidates directly (per-candidate batch)
    /// rather than scoring the task after a hypothetical placement.
    pub fn is_parallel(&self) -> bool {
        matches!(
            self,
            AcquisitionSpec::Random
                | AcquisitionSpec::ContextDist
                | AcquisitionSpec::Stddev
                | AcquisitionSpec::ExpectedImprovement
        )
    }

    /// Whether the greedy loop picks the highest score. Task-level
    /// uncertainty measures are minimized after the hypothetical placement.
    pub fn maximizes(&self) -> bool {
        self.is_parallel()
    }
}

/// Greedy sensor-placement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSpec {
    /// Acquisition function to greedily optimize.
    pub acquisition: AcquisitionSpec,
    /// Number of sensors to place.
    pub n_sensors: usize,
}

/// Standalone autoregressive sample dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSpec {
    /// Number of sample paths to draw.
    pub n_samples: usize,
    /// Grid-axis subsampling factor for the AR pass.
    #[serde(default = "default_subsample_factor")]
    pub subsample_factor: usize,
    /// Leading grid points observed from the truth draw and used as context.
    #[serde(default = "default_context_points")]
    pub context_points: usize,
}

fn default_subsample_factor() -> usize {
    1
}

fn default_context_points() -> usize {
    4
}

/// Top-level YAML run specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    /// The simulated field and its model.
    pub field: FieldSpec,
    /// Target grid; also the candidate set for placement.
    pub grid: GridSpec,
    /// Master seed. Truth draw, acquisition randomness, and sampling use
    /// separate substreams so they stay independent.
    pub seed: u64,
    /// Placement run, required by `place`.
    #[serde(default)]
    pub place: Option<PlaceSpec>,
    /// Sampling run, required by `sample`.
    #[serde(default)]
    pub sample: Option<SampleSpec>,
}

impl RunSpec {
    /// Parses a run specification from YAML.
    pub fn from_yaml(contents: &str) -> Result<Self, SalError> {
        let spec: RunSpec = serde_yaml::from_str(contents).map_err(|err| {
            SalError::Serde(
                ErrorInfo::new("run-spec-yaml", "failed to parse run specification")
                    .with_context("error", err.to_string()),
            )
        })?;
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<(), SalError> {
        if self.grid.side == 0 {
            return Err(SalError::config("grid-side", "grid side must be positive"));
        }
        if let Some(place) = &self.place {
            if place.n_sensors == 0 {
                return Err(SalError::config(
                    "n-sensors",
                    "at least one sensor must be placed",
                ));
            }
            if place.n_sensors > self.grid.side * self.grid.side {
                return Err(SalError::Config(
                    ErrorInfo::new("n-sensors", "more sensors requested than grid points")
                        .with_context("n_sensors", place.n_sensors.to_string())
                        .with_context("grid_points", (self.grid.side * self.grid.side).to_string()),
                ));
            }
        }
        Ok(())
    }
}

/// Substream identifiers for deriving per-concern seeds from the master seed.
pub mod substream {
    /// Ground-truth field draw.
    pub const TRUTH: u64 = 0;
    /// Acquisition-function randomness (the random baseline).
    pub const ACQUISITION: u64 = 1;
    /// Autoregressive sampling.
    pub const SAMPLING: u64 = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_spec_parses_with_defaults() {
        let spec = RunSpec::from_yaml(
            "field:\n  kernel:\n    type: squared-exponential\n    variance: 1.0\n    lengthscale: 0.3\n  noise_variance: 1.0e-4\ngrid:\n  side: 4\nseed: 7\nsample:\n  n_samples: 2\n",
        )
        .unwrap();
        assert_eq!(spec.seed, 7);
        let sample = spec.sample.unwrap();
        assert_eq!(sample.subsample_factor, 1);
        assert_eq!(sample.context_points, 4);
        assert!(spec.place.is_none());
    }

    #[test]
    fn grid_locations_are_row_major_cell_centres() {
        let grid = GridSpec { side: 2 };
        let locations = grid.locations().unwrap();
        assert_eq!(locations.cols(), 4);
        assert_eq!(locations.col(0), &[0.25, 0.25]);
        assert_eq!(locations.col(1), &[0.25, 0.75]);
        assert_eq!(locations.col(3), &[0.75, 0.75]);
    }

    #[test]
    fn oversubscribed_placement_is_rejected() {
        let err = RunSpec::from_yaml(
            "field:\n  kernel:\n    type: matern32\n    variance: 1.0\n    lengthscale: 0.3\n  noise_variance: 1.0e-4\ngrid:\n  side: 2\nseed: 7\nplace:\n  acquisition:\n    type: stddev\n  n_sensors: 5\n",
        )
        .unwrap_err();
        assert_eq!(err.info().code, "n-sensors");
    }
}
