//! Standard-normal density helpers used by closed-form acquisition scores.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Standard normal probability density φ(x).
pub fn pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Standard normal cumulative distribution Φ(x) = (1 + erf(x/√2)) / 2.
pub fn cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x * FRAC_1_SQRT_2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdf_hits_known_points() {
        assert!((cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((cdf(-1.96) - 0.025).abs() < 1e-3);
        assert!(cdf(8.0) > 1.0 - 1e-12);
    }

    #[test]
    fn pdf_is_symmetric_and_peaks_at_zero() {
        assert!((pdf(0.0) - 0.398_942_280_401_432_7).abs() < 1e-12);
        assert_eq!(pdf(1.3), pdf(-1.3));
        assert!(pdf(0.0) > pdf(0.5));
    }
}
