//! Dense symmetric linear algebra for exact Gaussian conditioning.
//!
//! Matrices are stored row-major as `Vec<f64>` with explicit dimension `n`.
//! Sizes here are small (hundreds of points), so plain triple loops are fine.

use sal_core::{ErrorInfo, SalError};

/// Lower Cholesky factor of a symmetric positive-definite matrix.
///
/// `jitter` is added to every diagonal element before factorization to guard
/// against near-singular covariance. The upper triangle of the returned
/// factor is zeroed.
pub fn cholesky(matrix: &[f64], n: usize, jitter: f64) -> Result<Vec<f64>, SalError> {
    debug_assert_eq!(matrix.len(), n * n);
    let mut lower = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = matrix[i * n + j];
            if i == j {
                sum += jitter;
            }
            for k in 0..j {
                sum -= lower[i * n + k] * lower[j * n + k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(SalError::Numeric(
                        ErrorInfo::new("cholesky-not-pd", "covariance is not positive definite")
                            .with_context("row", i.to_string())
                            .with_context("pivot", sum.to_string())
                            .with_hint("increase noise variance or jitter"),
                    ));
                }
                lower[i * n + j] = sum.sqrt();
            } else {
                lower[i * n + j] = sum / lower[j * n + j];
            }
        }
    }
    Ok(lower)
}

/// Solves `L x = b` for lower-triangular `L` by forward substitution.
pub fn solve_lower(lower: &[f64], n: usize, b: &[f64]) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= lower[i * n + k] * x[k];
        }
        x[i] = sum / lower[i * n + i];
    }
    x
}

/// Solves `L^T x = b` for lower-triangular `L` by back substitution.
pub fn solve_lower_transpose(lower: &[f64], n: usize, b: &[f64]) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for k in i + 1..n {
            sum -= lower[k * n + i] * x[k];
        }
        x[i] = sum / lower[i * n + i];
    }
    x
}

/// Log-determinant of the factored matrix, from its lower Cholesky factor.
pub fn log_det_from_cholesky(lower: &[f64], n: usize) -> f64 {
    (0..n).map(|i| lower[i * n + i].ln()).sum::<f64>() * 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cholesky_reconstructs_the_input() {
        let n = 3;
        let a = vec![4.0, 2.0, 0.6, 2.0, 3.0, 0.4, 0.6, 0.4, 2.5];
        let lower = cholesky(&a, n, 0.0).unwrap();
        for i in 0..n {
            for j in 0..n {
                let mut rebuilt = 0.0;
                for k in 0..n {
                    rebuilt += lower[i * n + k] * lower[j * n + k];
                }
                assert!((rebuilt - a[i * n + j]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn triangular_solves_invert_the_factor() {
        let n = 3;
        let a = vec![4.0, 2.0, 0.6, 2.0, 3.0, 0.4, 0.6, 0.4, 2.5];
        let lower = cholesky(&a, n, 0.0).unwrap();
        let b = vec![1.0, -2.0, 0.5];
        // Solve A x = b through the two triangular systems.
        let w = solve_lower(&lower, n, &b);
        let x = solve_lower_transpose(&lower, n, &w);
        for i in 0..n {
            let mut ax = 0.0;
            for j in 0..n {
                ax += a[i * n + j] * x[j];
            }
            assert!((ax - b[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn non_positive_definite_input_is_a_numeric_error() {
        let a = vec![1.0, 2.0, 2.0, 1.0];
        let err = cholesky(&a, 2, 0.0).unwrap_err();
        assert_eq!(err.info().code, "cholesky-not-pd");
    }
}
