//! Deterministic selection of the autoregressive location subset.
//!
//! No randomness enters here: for a given target set, restriction, and
//! subsample factor the selected subset is always the same, so repeated runs
//! differ only through the sampling step itself.

use sal_core::{ErrorInfo, Matrix, SalError};

/// Result of subset selection over a target location matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetSelection {
    /// Column indices into the target matrix, in sampling order.
    pub indices: Vec<usize>,
    /// The selected locations, one column per index.
    pub locations: Matrix,
    /// Whether the subset is exactly the full target set in column order, so
    /// raw sample paths already satisfy the output contract (no infill).
    pub full: bool,
}

/// Selects the locations to run autoregressive sampling over.
///
/// An explicit restriction takes priority; otherwise a subsample factor
/// greater than one strides the target set — along both axes when the point
/// count is a perfect square (row-major M x M grid), along the flattened
/// ordering otherwise, a coarser approximation kept for irregular layouts.
pub fn select_ar_subset(
    target: &Matrix,
    restriction: Option<&Matrix>,
    subsample_factor: usize,
) -> Result<SubsetSelection, SalError> {
    let n = target.cols();
    if let Some(restriction) = restriction {
        if restriction.rows() != target.rows() {
            return Err(SalError::Config(
                ErrorInfo::new(
                    "restriction-dims",
                    "restricted locations disagree with target dimensions",
                )
                .with_context("restriction", restriction.rows().to_string())
                .with_context("target", target.rows().to_string()),
            ));
        }
        if restriction.is_empty() {
            return Err(SalError::config(
                "restriction-empty",
                "restricted location set has no points",
            ));
        }
        let mut indices = Vec::with_capacity(restriction.cols());
        for idx in 0..restriction.cols() {
            let point = restriction.col(idx);
            let found = target.find_col(point).ok_or_else(|| {
                SalError::Config(
                    ErrorInfo::new(
                        "restriction-not-subset",
                        "restricted location is not a target location",
                    )
                    .with_context("restriction_col", idx.to_string()),
                )
            })?;
            indices.push(found);
        }
        // Only the identity selection may skip the infill pass: a permuted or
        // duplicated restriction still covers the targets, but its raw sample
        // paths are in restriction order, not target order.
        let full = indices.len() == n && indices.iter().copied().eq(0..n);
        let locations = target.select_cols(&indices);
        return Ok(SubsetSelection {
            indices,
            locations,
            full,
        });
    }

    let indices: Vec<usize> = if subsample_factor > 1 {
        let side = (n as f64).sqrt().round() as usize;
        if side * side == n {
            let mut indices = Vec::new();
            for row in (0..side).step_by(subsample_factor) {
                for col in (0..side).step_by(subsample_factor) {
                    indices.push(row * side + col);
                }
            }
            indices
        } else {
            (0..n).step_by(subsample_factor).collect()
        }
    } else {
        (0..n).collect()
    };
    let full = indices.len() == n;
    let locations = target.select_cols(&indices);
    Ok(SubsetSelection {
        indices,
        locations,
        full,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_target(n: usize) -> Matrix {
        let mut data = Vec::with_capacity(2 * n);
        for idx in 0..n {
            data.push(idx as f64);
            data.push(0.0);
        }
        Matrix::new(2, n, data).unwrap()
    }

    #[test]
    fn factor_one_selects_everything() {
        let target = line_target(5);
        let subset = select_ar_subset(&target, None, 1).unwrap();
        assert_eq!(subset.indices, vec![0, 1, 2, 3, 4]);
        assert!(subset.full);
    }

    #[test]
    fn square_grids_are_strided_along_both_axes() {
        // 9 points read as a row-major 3x3 grid.
        let target = line_target(9);
        let subset = select_ar_subset(&target, None, 2).unwrap();
        assert_eq!(subset.indices, vec![0, 2, 6, 8]);
        assert!(!subset.full);
    }

    #[test]
    fn irregular_layouts_fall_back_to_flat_strides() {
        let target = line_target(5);
        let subset = select_ar_subset(&target, None, 2).unwrap();
        assert_eq!(subset.indices, vec![0, 2, 4]);
        assert!(!subset.full);
    }

    #[test]
    fn restriction_order_is_preserved() {
        let target = line_target(4);
        let restriction = Matrix::new(2, 2, vec![3.0, 0.0, 1.0, 0.0]).unwrap();
        let subset = select_ar_subset(&target, Some(&restriction), 1).unwrap();
        assert_eq!(subset.indices, vec![3, 1]);
        assert_eq!(subset.locations, restriction);
        assert!(!subset.full);
    }

    #[test]
    fn only_identity_order_restrictions_count_as_full() {
        let target = line_target(3);
        let identity = Matrix::new(2, 3, vec![0.0, 0.0, 1.0, 0.0, 2.0, 0.0]).unwrap();
        assert!(select_ar_subset(&target, Some(&identity), 1).unwrap().full);
        // Covers every target, but in the wrong order.
        let permuted = Matrix::new(2, 3, vec![2.0, 0.0, 0.0, 0.0, 1.0, 0.0]).unwrap();
        assert!(!select_ar_subset(&target, Some(&permuted), 1).unwrap().full);
        // Covers every target, but with a duplicate column.
        let duplicated =
            Matrix::new(2, 4, vec![0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 2.0, 0.0]).unwrap();
        assert!(!select_ar_subset(&target, Some(&duplicated), 1).unwrap().full);
    }

    #[test]
    fn foreign_restriction_points_are_rejected() {
        let target = line_target(3);
        let restriction = Matrix::new(2, 1, vec![0.5, 0.0]).unwrap();
        let err = select_ar_subset(&target, Some(&restriction), 1).unwrap_err();
        assert_eq!(err.info().code, "restriction-not-subset");
    }
}
