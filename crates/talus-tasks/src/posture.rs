//! Posture feature: track a reference configuration.

use std::any::Any;

use nalgebra::{DMatrix, DVector};

use talus_core::error::TaskError;
use talus_core::model::Model;

use crate::feature::{Feature, FeatureOutput, Mask};

/// Equality feature driving selected joints toward a reference posture
/// (typically the half-sitting configuration).
///
/// The Jacobian is the identity restricted to the selected rows, so the
/// posture task absorbs whatever null-space freedom the higher tasks
/// leave.
#[derive(Debug, Clone)]
pub struct PostureFeature {
    reference: DVector<f64>,
    mask: Mask,
}

impl PostureFeature {
    /// Track all joints toward `reference`. Fails if the reference length
    /// does not match the model's configuration dimension.
    pub fn new(model: &dyn Model, reference: DVector<f64>) -> Result<Self, TaskError> {
        if reference.len() != model.dof() {
            return Err(TaskError::ReferenceLenMismatch {
                expected: model.dof(),
                got: reference.len(),
            });
        }
        let mask = Mask::all(reference.len());
        Ok(Self { reference, mask })
    }

    /// Track a subset of joints, e.g. everything but the floating base.
    pub fn with_mask(mut self, mask: Mask) -> Result<Self, TaskError> {
        mask.validate(self.reference.len(), "posture")?;
        self.mask = mask;
        Ok(self)
    }

    /// Hold the model's current configuration.
    pub fn hold(model: &dyn Model) -> Self {
        let reference = model.position();
        let mask = Mask::all(reference.len());
        Self { reference, mask }
    }

    pub fn set_reference(&mut self, reference: DVector<f64>) -> Result<(), TaskError> {
        if reference.len() != self.reference.len() {
            return Err(TaskError::ReferenceLenMismatch {
                expected: self.reference.len(),
                got: reference.len(),
            });
        }
        self.reference = reference;
        Ok(())
    }
}

impl Feature for PostureFeature {
    fn dim(&self) -> usize {
        self.mask.selected()
    }

    fn evaluate(&self, model: &dyn Model) -> Result<FeatureOutput, TaskError> {
        let q = model.position();
        let error_full = &self.reference - &q;

        let mut jacobian = DMatrix::zeros(self.mask.selected(), q.len());
        for (row, i) in self.mask.indices().enumerate() {
            jacobian[(row, i)] = 1.0;
        }

        Ok(FeatureOutput {
            error: self.mask.select_rows(&error_full),
            jacobian,
        })
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use talus_test_utils::StubModel;

    #[test]
    fn posture_error_toward_reference() {
        let mut model = StubModel::new(3);
        model.set_position(&[0.1, 0.0, -0.2]);
        let reference = DVector::from_column_slice(&[0.0, 0.5, 0.0]);
        let feature = PostureFeature::new(&model, reference).unwrap();

        let out = feature.evaluate(&model).unwrap();
        assert_relative_eq!(out.error[0], -0.1);
        assert_relative_eq!(out.error[1], 0.5);
        assert_relative_eq!(out.error[2], 0.2);
        // Identity Jacobian
        for i in 0..3 {
            assert_relative_eq!(out.jacobian[(i, i)], 1.0);
        }
    }

    #[test]
    fn wrong_reference_length_rejected() {
        let model = StubModel::new(3);
        let err = PostureFeature::new(&model, DVector::zeros(4)).unwrap_err();
        assert!(matches!(
            err,
            TaskError::ReferenceLenMismatch {
                expected: 3,
                got: 4
            }
        ));
    }

    #[test]
    fn masked_posture_rows() {
        let mut model = StubModel::new(4);
        model.set_position(&[1.0, 2.0, 3.0, 4.0]);
        let feature = PostureFeature::new(&model, DVector::zeros(4))
            .unwrap()
            .with_mask(Mask::from_flags(&[false, true, false, true]))
            .unwrap();

        assert_eq!(feature.dim(), 2);
        let out = feature.evaluate(&model).unwrap();
        assert_relative_eq!(out.error[0], -2.0);
        assert_relative_eq!(out.error[1], -4.0);
        assert_relative_eq!(out.jacobian[(0, 1)], 1.0);
        assert_relative_eq!(out.jacobian[(1, 3)], 1.0);
        assert_relative_eq!(out.jacobian[(0, 0)], 0.0);
    }

    #[test]
    fn hold_matches_current_position() {
        let mut model = StubModel::new(2);
        model.set_position(&[0.3, -0.7]);
        let feature = PostureFeature::hold(&model);
        let out = feature.evaluate(&model).unwrap();
        assert_relative_eq!(out.error.norm(), 0.0);
    }

    #[test]
    fn set_reference_validates_length() {
        let model = StubModel::new(2);
        let mut feature = PostureFeature::hold(&model);
        assert!(feature.set_reference(DVector::zeros(3)).is_err());
        assert!(feature
            .set_reference(DVector::from_column_slice(&[0.1, 0.2]))
            .is_ok());
    }
}
