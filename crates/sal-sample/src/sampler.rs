//! Autoregressive joint sampling with subsampling and infill.

use sal_core::{ErrorInfo, Matrix, ObservationTask, Query, RngHandle, SalError, SpatialModel};
use serde::{Deserialize, Serialize};

use crate::subset;

/// Options for one autoregressive sampling call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArOptions {
    /// Number of independent joint sample paths to draw. Must be at least 1.
    pub n_samples: usize,
    /// Explicit locations to run the autoregressive chain over. Must be a
    /// subset of the task's primary target locations. Takes priority over
    /// `subsample_factor`.
    #[serde(default)]
    pub restriction: Option<Matrix>,
    /// Stride applied to the target set when no restriction is given. Must be
    /// at least 1; 1 selects the full target set.
    #[serde(default = "default_subsample_factor")]
    pub subsample_factor: usize,
}

fn default_subsample_factor() -> usize {
    1
}

impl Default for ArOptions {
    fn default() -> Self {
        Self {
            n_samples: 1,
            restriction: None,
            subsample_factor: 1,
        }
    }
}

impl ArOptions {
    /// Creates options drawing `n_samples` paths over the full target set.
    pub fn paths(n_samples: usize) -> Self {
        Self {
            n_samples,
            ..Self::default()
        }
    }

    /// Checks the scalar options. Restriction alignment is checked against
    /// the concrete task by [`ar_sample`].
    pub fn validate(&self) -> Result<(), SalError> {
        if self.n_samples == 0 {
            return Err(SalError::config(
                "n-samples",
                "at least one sample path must be requested",
            ));
        }
        if self.subsample_factor == 0 {
            return Err(SalError::config(
                "subsample-factor",
                "subsample factor must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Draws joint samples over the task's primary target set.
///
/// The autoregressive chain runs over a deterministic location subset
/// (explicit restriction, strided subsample, or the full set). When the
/// subset is strict, each path's values are appended to context set 0 as if
/// they had been observed, and the model fills in the remaining target
/// locations conditioned on them — through a joint draw when the model
/// represents correlations, through the mean otherwise.
///
/// The caller's task is never mutated; every conditioning step works on a
/// copy. The returned rows are in sample-draw order, one per path, each
/// covering the full primary target set in column order.
pub fn ar_sample(
    model: &dyn SpatialModel,
    task: &ObservationTask,
    options: &ArOptions,
    rng: &mut RngHandle,
) -> Result<Vec<Vec<f64>>, SalError> {
    options.validate()?;
    let target = task.target(0)?.locations.clone();
    let subset =
        subset::select_ar_subset(&target, options.restriction.as_ref(), options.subsample_factor)?;

    let ar_task = task.with_target(0, subset.locations.clone())?;
    let output = model.ar_sample(&ar_task, options.n_samples, rng)?;
    if output.samples.len() != options.n_samples
        || output
            .samples
            .iter()
            .any(|path| path.len() != subset.locations.cols())
    {
        return Err(SalError::Numeric(
            ErrorInfo::new("ar-output-shape", "model returned misshapen sample paths")
                .with_context("expected_paths", options.n_samples.to_string())
                .with_context("expected_points", subset.locations.cols().to_string()),
        ));
    }

    if subset.full {
        return Ok(output.samples);
    }

    let mut infilled = Vec::with_capacity(output.samples.len());
    for path in &output.samples {
        let values = Matrix::from_row(path);
        let extended = task.with_appended_context(0, &subset.locations, &values)?;
        let infill_task = extended.with_sole_target(target.clone());
        let row = if model.models_correlations() {
            let mut draws = model.sample(Query::Task(&infill_task), 1, rng)?;
            draws.pop().ok_or_else(|| {
                SalError::Numeric(ErrorInfo::new(
                    "empty-sample",
                    "model returned no sample rows for infill",
                ))
            })?
        } else {
            model.mean(Query::Task(&infill_task), 0)?
        };
        infilled.push(row);
    }
    Ok(infilled)
}
