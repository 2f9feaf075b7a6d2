//! Observation tasks and the dense matrices they are built from.
//!
//! Tasks are immutable value objects: every "mutation" helper returns a fresh
//! deep copy and leaves the receiver untouched, so scoring and sampling code
//! can freely derive conditioned variants without aliasing the caller's task.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, SalError};

/// Small dense `f64` matrix stored column-major.
///
/// Coordinate matrices hold one location per column (`dims x n_points`);
/// value matrices hold one observation per column (`dim_y x n_points`).
/// Column-major storage makes per-point access and horizontal concatenation
/// contiguous, which is all the task layer ever needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a matrix from column-major data.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, SalError> {
        if data.len() != rows * cols {
            return Err(SalError::Task(
                ErrorInfo::new("matrix-shape", "data length does not match matrix shape")
                    .with_context("rows", rows.to_string())
                    .with_context("cols", cols.to_string())
                    .with_context("len", data.len().to_string()),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates an empty matrix with the given row count and zero columns.
    pub fn empty(rows: usize) -> Self {
        Self {
            rows,
            cols: 0,
            data: Vec::new(),
        }
    }

    /// Creates a single-column matrix from one point.
    pub fn from_point(point: &[f64]) -> Self {
        Self {
            rows: point.len(),
            cols: 1,
            data: point.to_vec(),
        }
    }

    /// Creates a single-row matrix, one scalar value per column.
    pub fn from_row(values: &[f64]) -> Self {
        Self {
            rows: 1,
            cols: values.len(),
            data: values.to_vec(),
        }
    }

    /// Number of rows (coordinate or value dimensions).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (points).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the matrix has zero columns.
    pub fn is_empty(&self) -> bool {
        self.cols == 0
    }

    /// Returns one column as a contiguous slice.
    pub fn col(&self, idx: usize) -> &[f64] {
        &self.data[idx * self.rows..(idx + 1) * self.rows]
    }

    /// Returns the element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[col * self.rows + row]
    }

    /// Flat column-major view of the data.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Returns a new matrix containing the selected columns, in the given order.
    pub fn select_cols(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.rows);
        for &idx in indices {
            data.extend_from_slice(self.col(idx));
        }
        Self {
            rows: self.rows,
            cols: indices.len(),
            data,
        }
    }

    /// Concatenates two matrices along the column axis.
    pub fn hstack(&self, other: &Matrix) -> Result<Matrix, SalError> {
        if self.rows != other.rows {
            return Err(SalError::Task(
                ErrorInfo::new("hstack-rows", "matrices disagree on row count")
                    .with_context("left_rows", self.rows.to_string())
                    .with_context("right_rows", other.rows.to_string()),
            ));
        }
        let mut data = self.data.clone();
        data.extend_from_slice(&other.data);
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols + other.cols,
            data,
        })
    }

    /// Index of the first column bitwise-equal to `point`, if any.
    pub fn find_col(&self, point: &[f64]) -> Option<usize> {
        if point.len() != self.rows {
            return None;
        }
        (0..self.cols).find(|&idx| {
            self.col(idx)
                .iter()
                .zip(point)
                .all(|(a, b)| a.to_bits() == b.to_bits())
        })
    }
}

/// One context set: locations with their observed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSet {
    /// Coordinate matrix, `dims x n_points`. Zero points is a valid empty set.
    pub locations: Matrix,
    /// Value matrix, `dim_y x n_points`.
    pub values: Matrix,
}

impl ContextSet {
    /// Creates a context set, checking that locations and values agree on point count.
    pub fn new(locations: Matrix, values: Matrix) -> Result<Self, SalError> {
        if locations.cols() != values.cols() {
            return Err(SalError::Task(
                ErrorInfo::new("context-misaligned", "locations and values disagree on points")
                    .with_context("locations", locations.cols().to_string())
                    .with_context("values", values.cols().to_string()),
            ));
        }
        Ok(Self { locations, values })
    }

    /// Creates an empty context set with the given coordinate and value dims.
    pub fn empty(dims: usize, dim_y: usize) -> Self {
        Self {
            locations: Matrix::empty(dims),
            values: Matrix::empty(dim_y),
        }
    }

    /// Number of observed points in the set.
    pub fn len(&self) -> usize {
        self.locations.cols()
    }

    /// Whether the set holds no observations yet.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// One target set: locations to predict at, optionally with held-out values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSet {
    /// Coordinate matrix, `dims x n_points`.
    pub locations: Matrix,
    /// Held-out value matrix when the targets were observed (needed for logpdf).
    pub values: Option<Matrix>,
}

impl TargetSet {
    /// Creates an unobserved target set.
    pub fn new(locations: Matrix) -> Self {
        Self {
            locations,
            values: None,
        }
    }

    /// Creates a target set carrying held-out observed values.
    pub fn observed(locations: Matrix, values: Matrix) -> Result<Self, SalError> {
        if locations.cols() != values.cols() {
            return Err(SalError::Task(
                ErrorInfo::new("target-misaligned", "locations and values disagree on points")
                    .with_context("locations", locations.cols().to_string())
                    .with_context("values", values.cols().to_string()),
            ));
        }
        Ok(Self {
            locations,
            values: Some(values),
        })
    }

    /// Number of target points in the set.
    pub fn len(&self) -> usize {
        self.locations.cols()
    }

    /// Whether the set has no target points.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// One prediction problem instance: context sets, target sets, metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationTask {
    /// Ordered context sets (for example one per sensor type).
    pub contexts: Vec<ContextSet>,
    /// Ordered target sets where predictions or samples are wanted.
    pub targets: Vec<TargetSet>,
    /// Optional time label carried through from the data source.
    pub time: Option<String>,
    /// Modification tag set once the task has been transformed into a
    /// model-native form. A task carries at most one tag.
    pub modified: Option<String>,
}

impl ObservationTask {
    /// Creates a task from context and target sets.
    pub fn new(contexts: Vec<ContextSet>, targets: Vec<TargetSet>) -> Self {
        Self {
            contexts,
            targets,
            time: None,
            modified: None,
        }
    }

    /// Returns the context set at `idx`.
    pub fn context(&self, idx: usize) -> Result<&ContextSet, SalError> {
        self.contexts.get(idx).ok_or_else(|| {
            SalError::Task(
                ErrorInfo::new("context-index", "context set index out of range")
                    .with_context("index", idx.to_string())
                    .with_context("available", self.contexts.len().to_string()),
            )
        })
    }

    /// Returns the target set at `idx`.
    pub fn target(&self, idx: usize) -> Result<&TargetSet, SalError> {
        self.targets.get(idx).ok_or_else(|| {
            SalError::Task(
                ErrorInfo::new("target-index", "target set index out of range")
                    .with_context("index", idx.to_string())
                    .with_context("available", self.targets.len().to_string()),
            )
        })
    }

    /// Total number of target points across all target sets.
    pub fn n_target_points(&self) -> usize {
        self.targets.iter().map(TargetSet::len).sum()
    }

    /// Returns a copy with the locations of target set `set_idx` replaced.
    ///
    /// Any held-out values on that set are dropped, since they no longer
    /// correspond to the new locations.
    pub fn with_target(&self, set_idx: usize, locations: Matrix) -> Result<Self, SalError> {
        self.target(set_idx)?;
        let mut task = self.clone();
        task.targets[set_idx] = TargetSet::new(locations);
        Ok(task)
    }

    /// Returns a copy whose target list is a single unobserved set.
    pub fn with_sole_target(&self, locations: Matrix) -> Self {
        let mut task = self.clone();
        task.targets = vec![TargetSet::new(locations)];
        task
    }

    /// Returns a copy with extra observations appended to context set `set_idx`.
    pub fn with_appended_context(
        &self,
        set_idx: usize,
        locations: &Matrix,
        values: &Matrix,
    ) -> Result<Self, SalError> {
        let existing = self.context(set_idx)?;
        if locations.cols() != values.cols() {
            return Err(SalError::Task(
                ErrorInfo::new("append-misaligned", "locations and values disagree on points")
                    .with_context("locations", locations.cols().to_string())
                    .with_context("values", values.cols().to_string()),
            ));
        }
        let merged = ContextSet::new(
            existing.locations.hstack(locations)?,
            existing.values.hstack(values)?,
        )?;
        let mut task = self.clone();
        task.contexts[set_idx] = merged;
        Ok(task)
    }

    /// Returns a copy marked as transformed into the named model-native form.
    ///
    /// Re-tagging with the same tag is a plain copy; a different tag is an
    /// error, because two incompatible transformations cannot be stacked.
    pub fn tagged(&self, tag: &str) -> Result<Self, SalError> {
        match &self.modified {
            Some(existing) if existing != tag => Err(SalError::Task(
                ErrorInfo::new("tag-conflict", "task already carries a modification tag")
                    .with_context("existing", existing.clone())
                    .with_context("requested", tag)
                    .with_hint("rebuild the task from its source instead of re-tagging"),
            )),
            _ => {
                let mut task = self.clone();
                task.modified = Some(tag.to_string());
                Ok(task)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_task() -> ObservationTask {
        let ctx = ContextSet::new(
            Matrix::new(2, 2, vec![0.0, 0.0, 1.0, 1.0]).unwrap(),
            Matrix::new(1, 2, vec![0.5, -0.5]).unwrap(),
        )
        .unwrap();
        let tgt = TargetSet::new(Matrix::new(2, 1, vec![0.5, 0.5]).unwrap());
        ObservationTask::new(vec![ctx], vec![tgt])
    }

    #[test]
    fn helpers_copy_instead_of_mutating() {
        let task = toy_task();
        let before = task.clone();
        let replaced = task
            .with_target(0, Matrix::new(2, 1, vec![9.0, 9.0]).unwrap())
            .unwrap();
        let appended = task
            .with_appended_context(
                0,
                &Matrix::new(2, 1, vec![2.0, 2.0]).unwrap(),
                &Matrix::new(1, 1, vec![1.0]).unwrap(),
            )
            .unwrap();
        assert_eq!(task, before);
        assert_ne!(replaced.targets, task.targets);
        assert_eq!(appended.context(0).unwrap().len(), 3);
        assert_eq!(task.context(0).unwrap().len(), 2);
    }

    #[test]
    fn conflicting_tags_are_rejected() {
        let task = toy_task();
        let tagged = task.tagged("gp").unwrap();
        assert!(tagged.tagged("gp").is_ok());
        let err = tagged.tagged("nps").unwrap_err();
        assert_eq!(err.info().code, "tag-conflict");
    }

    #[test]
    fn hstack_rejects_row_mismatch() {
        let a = Matrix::new(2, 1, vec![0.0, 0.0]).unwrap();
        let b = Matrix::new(3, 1, vec![0.0, 0.0, 0.0]).unwrap();
        assert!(a.hstack(&b).is_err());
    }

    #[test]
    fn find_col_matches_bitwise() {
        let m = Matrix::new(2, 3, vec![0.0, 0.0, 0.25, 0.5, 1.0, 1.0]).unwrap();
        assert_eq!(m.find_col(&[0.25, 0.5]), Some(1));
        assert_eq!(m.find_col(&[0.25, 0.6]), None);
        assert_eq!(m.find_col(&[0.25]), None);
    }
}
