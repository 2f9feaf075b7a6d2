use sal_core::{ContextSet, Matrix, ObservationTask, Query, RngHandle, SpatialModel, TargetSet};
use sal_gp::{GpModel, Kernel};

fn model() -> GpModel {
    GpModel::new(
        Kernel::SquaredExponential {
            variance: 1.0,
            lengthscale: 0.4,
        },
        1e-6,
        0.0,
    )
    .unwrap()
}

fn task_with_context(context: &[([f64; 2], f64)], targets: &[[f64; 2]]) -> ObservationTask {
    let mut locations = Vec::new();
    let mut values = Vec::new();
    for (point, value) in context {
        locations.extend_from_slice(point);
        values.push(*value);
    }
    let context = ContextSet::new(
        Matrix::new(2, context.len(), locations).unwrap(),
        Matrix::from_row(&values),
    )
    .unwrap();
    let mut target_data = Vec::new();
    for point in targets {
        target_data.extend_from_slice(point);
    }
    let target = TargetSet::new(Matrix::new(2, targets.len(), target_data).unwrap());
    ObservationTask::new(vec![context], vec![target])
}

#[test]
fn posterior_tracks_observations() {
    let model = model();
    let task = task_with_context(
        &[([0.2, 0.2], 1.3), ([0.8, 0.4], -0.7)],
        &[[0.2, 0.2], [0.8, 0.4]],
    );
    let mean = model.mean(Query::Task(&task), 0).unwrap();
    let variance = model.variance(Query::Task(&task), 0).unwrap();
    assert!((mean[0] - 1.3).abs() < 1e-3);
    assert!((mean[1] + 0.7).abs() < 1e-3);
    assert!(variance.iter().all(|&v| v < 1e-3));
}

#[test]
fn prior_is_returned_for_empty_context() {
    let model = model();
    let task = task_with_context(&[], &[[0.1, 0.1], [0.9, 0.9]]);
    let mean = model.mean(Query::Task(&task), 0).unwrap();
    let variance = model.variance(Query::Task(&task), 0).unwrap();
    assert!(mean.iter().all(|&m| m == 0.0));
    for v in variance {
        assert!((v - (1.0 + 1e-6)).abs() < 1e-9);
    }
}

#[test]
fn variance_shrinks_with_more_context() {
    let model = model();
    let target = [[0.5, 0.5]];
    let sparse = task_with_context(&[([0.1, 0.1], 0.4)], &target);
    let dense = task_with_context(&[([0.1, 0.1], 0.4), ([0.45, 0.5], 0.2)], &target);
    let sparse_var = model.variance(Query::Task(&sparse), 0).unwrap()[0];
    let dense_var = model.variance(Query::Task(&dense), 0).unwrap()[0];
    assert!(dense_var < sparse_var);
}

#[test]
fn seeded_sampling_is_reproducible() {
    let model = model();
    let task = task_with_context(&[([0.3, 0.3], 0.5)], &[[0.1, 0.9], [0.5, 0.5], [0.9, 0.1]]);
    let mut rng_a = RngHandle::from_seed(11);
    let mut rng_b = RngHandle::from_seed(11);
    let a = model.sample(Query::Task(&task), 4, &mut rng_a).unwrap();
    let b = model.sample(Query::Task(&task), 4, &mut rng_b).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 4);
    assert!(a.iter().all(|row| row.len() == 3));
}

#[test]
fn cached_posterior_matches_fresh_queries() {
    let model = model();
    let task = task_with_context(&[([0.3, 0.6], -0.1)], &[[0.2, 0.2], [0.7, 0.7]]);
    let posterior = model.infer(&task).unwrap();
    let from_task = model.mean(Query::Task(&task), 0).unwrap();
    let from_posterior = model.mean(Query::Posterior(posterior.as_ref()), 0).unwrap();
    assert_eq!(from_task, from_posterior);
    let entropy_task = model.joint_entropy(Query::Task(&task)).unwrap();
    let entropy_cached = model
        .joint_entropy(Query::Posterior(posterior.as_ref()))
        .unwrap();
    assert_eq!(entropy_task, entropy_cached);
}

#[test]
fn joint_entropy_is_bounded_by_marginals() {
    let model = model();
    let task = task_with_context(
        &[([0.4, 0.4], 0.3)],
        &[[0.1, 0.1], [0.15, 0.1], [0.8, 0.9]],
    );
    let joint = model.joint_entropy(Query::Task(&task)).unwrap();
    let marginal = model.mean_marginal_entropy(Query::Task(&task)).unwrap();
    assert!(joint <= marginal * 3.0 + 1e-9);
    assert!(joint.is_finite());
}

#[test]
fn logpdf_prefers_the_observed_field() {
    let model = model();
    let mut task = task_with_context(&[([0.2, 0.2], 1.0), ([0.6, 0.6], 0.8)], &[[0.4, 0.4]]);
    let locations = task.target(0).unwrap().locations.clone();
    task.targets[0] = TargetSet::observed(locations.clone(), Matrix::from_row(&[0.9])).unwrap();
    let close = model.logpdf(Query::Task(&task), 0).unwrap();
    task.targets[0] = TargetSet::observed(locations, Matrix::from_row(&[25.0])).unwrap();
    let far = model.logpdf(Query::Task(&task), 0).unwrap();
    assert!(close.is_finite() && far.is_finite());
    assert!(close > far);
}

#[test]
fn queries_do_not_mutate_the_task() {
    let model = model();
    let task = task_with_context(&[([0.2, 0.8], 0.1)], &[[0.5, 0.5], [0.6, 0.6]]);
    let before = task.clone();
    let mut rng = RngHandle::from_seed(3);
    model.mean(Query::Task(&task), 0).unwrap();
    model.stddev(Query::Task(&task), 0).unwrap();
    model.sample(Query::Task(&task), 2, &mut rng).unwrap();
    model.ar_sample(&task, 2, &mut rng).unwrap();
    assert_eq!(task, before);
}

#[test]
fn mean_field_sampling_keeps_marginals_but_not_correlations() {
    let correlated = model();
    let independent = model().mean_field();
    let task = task_with_context(&[([0.5, 0.5], 0.2)], &[[0.1, 0.1], [0.12, 0.1]]);
    assert!(correlated.models_correlations());
    assert!(!independent.models_correlations());
    assert_eq!(
        correlated.variance(Query::Task(&task), 0).unwrap(),
        independent.variance(Query::Task(&task), 0).unwrap()
    );
}
