//! The feature contract and row selection masks.

use std::any::Any;

use nalgebra::{DMatrix, DVector};

use talus_core::error::TaskError;
use talus_core::model::Model;

/// Error/Jacobian pair produced by a feature for one model snapshot.
#[derive(Debug, Clone)]
pub struct FeatureOutput {
    /// Signed error (equality features) or raw tracked value (inequality
    /// features). Length equals the feature dimension.
    pub error: DVector<f64>,
    /// Jacobian of the tracked quantity, `dim × n`.
    pub jacobian: DMatrix<f64>,
}

/// Computes an error/Jacobian pair from model quantities.
///
/// Evaluation must be pure with respect to the model snapshot passed in;
/// features hold no cross-cycle state. Anything that can fail for a fixed
/// robot (unknown frame, bad reference length) fails in the feature
/// constructor, not here.
pub trait Feature: Send + Sync {
    /// Output dimension after row selection.
    fn dim(&self) -> usize;

    /// Evaluate against the given model snapshot.
    fn evaluate(&self, model: &dyn Model) -> Result<FeatureOutput, TaskError>;

    /// Downcast support, for re-targeting a feature through its task.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Row selection over a feature's full output.
///
/// Mirrors per-axis selection flags: a balance CoM task tracks xy only,
/// a waist task may track orientation rows only. Rows that are masked
/// out never reach the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    flags: Vec<bool>,
}

impl Mask {
    /// Select all `len` rows.
    pub fn all(len: usize) -> Self {
        Self {
            flags: vec![true; len],
        }
    }

    /// Select rows from explicit flags.
    pub fn from_flags(flags: &[bool]) -> Self {
        Self {
            flags: flags.to_vec(),
        }
    }

    /// Full (unmasked) length.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Number of selected rows.
    pub fn selected(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Indices of the selected rows, in order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
    }

    /// Check that this mask fits a feature of dimension `dim` and selects
    /// at least one row; `name` is used for error reporting.
    pub fn validate(&self, dim: usize, name: &str) -> Result<(), TaskError> {
        if self.flags.len() != dim {
            return Err(TaskError::MaskLenMismatch {
                mask_len: self.flags.len(),
                dim,
            });
        }
        if self.selected() == 0 {
            return Err(TaskError::EmptySelection(name.into()));
        }
        Ok(())
    }

    /// Extract the selected rows of a vector.
    pub fn select_rows(&self, v: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(self.selected(), self.indices().map(|i| v[i]))
    }

    /// Extract the selected rows of a matrix.
    pub fn select_matrix_rows(&self, m: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(self.selected(), m.ncols());
        for (row, i) in self.indices().enumerate() {
            out.row_mut(row).copy_from(&m.row(i));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mask_all_selects_everything() {
        let mask = Mask::all(6);
        assert_eq!(mask.len(), 6);
        assert_eq!(mask.selected(), 6);
        assert!(mask.validate(6, "t").is_ok());
    }

    #[test]
    fn mask_xy_selection() {
        let mask = Mask::from_flags(&[true, true, false]);
        assert_eq!(mask.selected(), 2);
        let idx: Vec<_> = mask.indices().collect();
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn mask_validate_rejects_wrong_length() {
        let mask = Mask::from_flags(&[true, false]);
        assert!(matches!(
            mask.validate(3, "com").unwrap_err(),
            TaskError::MaskLenMismatch { mask_len: 2, dim: 3 }
        ));
    }

    #[test]
    fn mask_validate_rejects_empty_selection() {
        let mask = Mask::from_flags(&[false, false, false]);
        assert!(matches!(
            mask.validate(3, "com").unwrap_err(),
            TaskError::EmptySelection(_)
        ));
    }

    #[test]
    fn select_rows_of_vector() {
        let mask = Mask::from_flags(&[false, true, true]);
        let v = DVector::from_column_slice(&[1.0, 2.0, 3.0]);
        let out = mask.select_rows(&v);
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0], 2.0);
        assert_relative_eq!(out[1], 3.0);
    }

    #[test]
    fn select_rows_of_matrix() {
        let mask = Mask::from_flags(&[true, false, true]);
        let m = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let out = mask.select_matrix_rows(&m);
        assert_eq!(out.nrows(), 2);
        assert_relative_eq!(out[(0, 1)], 2.0);
        assert_relative_eq!(out[(1, 0)], 5.0);
    }
}
