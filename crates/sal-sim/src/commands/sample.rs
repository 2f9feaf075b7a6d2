//! Standalone autoregressive sample dump over a simulated field.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use sal_core::{
    derive_substream_seed, ContextSet, Matrix, ObservationTask, Query, RngHandle, SpatialModel,
    TargetSet,
};
use sal_gp::GpModel;
use sal_sample::{ar_sample, ArOptions};
use serde::Serialize;

use super::write_json;
use crate::spec::{substream, RunSpec};

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// YAML run specification with a `sample` section.
    #[arg(long)]
    pub config: PathBuf,
    /// Output directory for run artefacts.
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Serialize)]
struct SampleSummary {
    seed: u64,
    grid_side: usize,
    n_samples: usize,
    subsample_factor: usize,
    context: Vec<[f64; 2]>,
    locations: Vec<[f64; 2]>,
    samples: Vec<Vec<f64>>,
}

pub fn run(args: &SampleArgs) -> Result<(), Box<dyn Error>> {
    let spec = RunSpec::from_yaml(&fs::read_to_string(&args.config)?)?;
    let Some(sample) = spec.sample.clone() else {
        return Err("run specification has no `sample` section".into());
    };
    fs::create_dir_all(&args.out)?;

    let model = GpModel::new(
        spec.field.kernel.clone(),
        spec.field.noise_variance,
        spec.field.prior_mean,
    )?;
    let locations = spec.grid.locations()?;

    // Observe the leading grid points from a seeded prior draw.
    let prior_task = ObservationTask::new(
        vec![ContextSet::empty(2, 1)],
        vec![TargetSet::new(locations.clone())],
    );
    let mut truth_rng = RngHandle::from_seed(derive_substream_seed(spec.seed, substream::TRUTH));
    let mut draws = model.sample(Query::Task(&prior_task), 1, &mut truth_rng)?;
    let truth = draws
        .pop()
        .ok_or_else(|| Box::<dyn Error>::from("truth draw returned no sample path"))?;

    let n_context = sample.context_points.min(locations.cols());
    let context_indices: Vec<usize> = (0..n_context).collect();
    let context_locations = locations.select_cols(&context_indices);
    let context_values = Matrix::from_row(&truth[..n_context]);
    let task = ObservationTask::new(
        vec![ContextSet::new(context_locations.clone(), context_values)?],
        vec![TargetSet::new(locations.clone())],
    );

    let options = ArOptions {
        n_samples: sample.n_samples,
        restriction: None,
        subsample_factor: sample.subsample_factor,
    };
    let mut rng = RngHandle::from_seed(derive_substream_seed(spec.seed, substream::SAMPLING));
    let samples = ar_sample(&model, &task, &options, &mut rng)?;

    let summary = SampleSummary {
        seed: spec.seed,
        grid_side: spec.grid.side,
        n_samples: sample.n_samples,
        subsample_factor: sample.subsample_factor,
        context: point_list(&context_locations),
        locations: point_list(&locations),
        samples,
    };
    write_json(args.out.join("samples.json"), &summary)?;

    fs::copy(&args.config, args.out.join("config.yaml")).ok();

    Ok(())
}

fn point_list(matrix: &Matrix) -> Vec<[f64; 2]> {
    (0..matrix.cols())
        .map(|idx| [matrix.get(0, idx), matrix.get(1, idx)])
        .collect()
}
