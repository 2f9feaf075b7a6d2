//! Stationary covariance functions.

use sal_core::{ErrorInfo, SalError};
use serde::{Deserialize, Serialize};

/// Supported covariance functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Kernel {
    /// Infinitely smooth squared-exponential (RBF) covariance.
    SquaredExponential {
        /// Signal variance (kernel value at zero distance).
        variance: f64,
        /// Characteristic lengthscale.
        lengthscale: f64,
    },
    /// Matérn covariance with smoothness 3/2.
    Matern32 {
        /// Signal variance (kernel value at zero distance).
        variance: f64,
        /// Characteristic lengthscale.
        lengthscale: f64,
    },
}

impl Kernel {
    /// Signal variance of the kernel.
    pub fn variance(&self) -> f64 {
        match self {
            Kernel::SquaredExponential { variance, .. } | Kernel::Matern32 { variance, .. } => {
                *variance
            }
        }
    }

    /// Checks that the hyperparameters are strictly positive and finite.
    pub fn validate(&self) -> Result<(), SalError> {
        let (variance, lengthscale) = match self {
            Kernel::SquaredExponential {
                variance,
                lengthscale,
            }
            | Kernel::Matern32 {
                variance,
                lengthscale,
            } => (*variance, *lengthscale),
        };
        if !(variance.is_finite() && variance > 0.0) {
            return Err(SalError::Config(
                ErrorInfo::new("kernel-variance", "kernel variance must be positive and finite")
                    .with_context("variance", variance.to_string()),
            ));
        }
        if !(lengthscale.is_finite() && lengthscale > 0.0) {
            return Err(SalError::Config(
                ErrorInfo::new(
                    "kernel-lengthscale",
                    "kernel lengthscale must be positive and finite",
                )
                .with_context("lengthscale", lengthscale.to_string()),
            ));
        }
        Ok(())
    }

    /// Evaluates the covariance between two locations of equal dimension.
    pub fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        let sq_dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
        match self {
            Kernel::SquaredExponential {
                variance,
                lengthscale,
            } => variance * (-0.5 * sq_dist / (lengthscale * lengthscale)).exp(),
            Kernel::Matern32 {
                variance,
                lengthscale,
            } => {
                let scaled = (3.0 * sq_dist).sqrt() / lengthscale;
                variance * (1.0 + scaled) * (-scaled).exp()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernels_peak_at_zero_distance() {
        let kernels = [
            Kernel::SquaredExponential {
                variance: 2.0,
                lengthscale: 0.3,
            },
            Kernel::Matern32 {
                variance: 2.0,
                lengthscale: 0.3,
            },
        ];
        for kernel in kernels {
            let at_zero = kernel.eval(&[0.1, 0.2], &[0.1, 0.2]);
            let away = kernel.eval(&[0.1, 0.2], &[0.9, 0.9]);
            assert!((at_zero - 2.0).abs() < 1e-12);
            assert!(away < at_zero);
            assert!(away > 0.0);
        }
    }

    #[test]
    fn validation_rejects_bad_hyperparameters() {
        let kernel = Kernel::SquaredExponential {
            variance: -1.0,
            lengthscale: 0.5,
        };
        assert!(kernel.validate().is_err());
        let kernel = Kernel::Matern32 {
            variance: 1.0,
            lengthscale: 0.0,
        };
        assert!(kernel.validate().is_err());
    }
}
