use proptest::prelude::*;

use sal_gp::linalg::{cholesky, solve_lower, solve_lower_transpose};

fn spd_from_entries(entries: &[f64], n: usize) -> Vec<f64> {
    // A * A^T plus a diagonal boost is symmetric positive definite.
    let mut matrix = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            let mut value = 0.0;
            for k in 0..n {
                value += entries[i * n + k] * entries[j * n + k];
            }
            if i == j {
                value += n as f64;
            }
            matrix[i * n + j] = value;
        }
    }
    matrix
}

proptest! {
    #[test]
    fn cholesky_reconstructs_spd_matrices(
        n in 1usize..6,
        raw in prop::collection::vec(-1.0f64..1.0, 36),
    ) {
        let matrix = spd_from_entries(&raw[..n * n], n);
        let lower = cholesky(&matrix, n, 0.0).unwrap();
        for i in 0..n {
            for j in 0..n {
                let mut rebuilt = 0.0;
                for k in 0..=i.min(j) {
                    rebuilt += lower[i * n + k] * lower[j * n + k];
                }
                prop_assert!((rebuilt - matrix[i * n + j]).abs() < 1e-8);
            }
        }
        // Strictly lower-triangular storage.
        for i in 0..n {
            for j in i + 1..n {
                prop_assert_eq!(lower[i * n + j], 0.0);
            }
        }
    }

    #[test]
    fn triangular_solves_invert_the_factor(
        n in 1usize..6,
        raw in prop::collection::vec(-1.0f64..1.0, 36),
        rhs in prop::collection::vec(-2.0f64..2.0, 6),
    ) {
        let matrix = spd_from_entries(&raw[..n * n], n);
        let lower = cholesky(&matrix, n, 0.0).unwrap();
        let b = &rhs[..n];

        let w = solve_lower(&lower, n, b);
        for i in 0..n {
            let mut lw = 0.0;
            for j in 0..=i {
                lw += lower[i * n + j] * w[j];
            }
            prop_assert!((lw - b[i]).abs() < 1e-9);
        }

        let x = solve_lower_transpose(&lower, n, &w);
        // L L^T x = b, so x solves the full SPD system.
        for i in 0..n {
            let mut ax = 0.0;
            for j in 0..n {
                ax += matrix[i * n + j] * x[j];
            }
            prop_assert!((ax - b[i]).abs() < 1e-7);
        }
    }
}
