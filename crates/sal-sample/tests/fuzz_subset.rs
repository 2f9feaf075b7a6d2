use proptest::prelude::*;

use sal_core::Matrix;
use sal_sample::select_ar_subset;

fn grid(side: usize) -> Matrix {
    let mut data = Vec::with_capacity(2 * side * side);
    for row in 0..side {
        for col in 0..side {
            data.push(row as f64);
            data.push(col as f64);
        }
    }
    Matrix::new(2, side * side, data).unwrap()
}

proptest! {
    #[test]
    fn stride_subsets_stay_in_bounds_and_ordered(side in 1usize..8, factor in 1usize..5) {
        let target = grid(side);
        let subset = select_ar_subset(&target, None, factor).unwrap();

        prop_assert!(!subset.indices.is_empty());
        prop_assert!(subset.indices.iter().all(|&idx| idx < target.cols()));
        prop_assert!(subset.indices.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(subset.locations.cols(), subset.indices.len());
        for (pos, &idx) in subset.indices.iter().enumerate() {
            prop_assert_eq!(subset.locations.col(pos), target.col(idx));
        }
        prop_assert_eq!(subset.full, subset.indices.len() == target.cols());
    }

    #[test]
    fn factor_one_is_the_identity(side in 1usize..8) {
        let target = grid(side);
        let subset = select_ar_subset(&target, None, 1).unwrap();

        prop_assert!(subset.full);
        prop_assert_eq!(subset.indices, (0..target.cols()).collect::<Vec<_>>());
        prop_assert_eq!(&subset.locations, &target);
    }

    #[test]
    fn selection_is_deterministic(side in 1usize..8, factor in 1usize..5) {
        let target = grid(side);
        let a = select_ar_subset(&target, None, factor).unwrap();
        let b = select_ar_subset(&target, None, factor).unwrap();
        prop_assert_eq!(a.indices, b.indices);
        prop_assert_eq!(a.locations, b.locations);
    }

    #[test]
    fn restrictions_preserve_caller_order(side in 2usize..6, take in 1usize..4) {
        let target = grid(side);
        let take = take.min(target.cols());
        // Pick columns back-to-front so order preservation is observable.
        let picked: Vec<usize> = (0..take).map(|i| target.cols() - 1 - i).collect();
        let restriction = target.select_cols(&picked);

        let subset = select_ar_subset(&target, Some(&restriction), 1).unwrap();
        prop_assert_eq!(&subset.indices, &picked);
        prop_assert_eq!(&subset.locations, &restriction);
    }
}
