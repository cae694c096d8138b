//! 6-dof pose feature for named operational-point frames.

use std::any::Any;

use nalgebra::{DVector, Isometry3, UnitQuaternion, Vector3};

use talus_core::error::{ModelError, TaskError};
use talus_core::model::Model;

use crate::feature::{Feature, FeatureOutput, Mask};

/// Equality feature tracking the world pose of a named frame.
///
/// Rows are [linear x, y, z, angular x, y, z]: position difference plus
/// axis-angle orientation error, both in the world frame, matching the
/// model's Jacobian convention. Maskable, e.g. orientation-only for a
/// waist task.
#[derive(Debug, Clone)]
pub struct FramePoseFeature {
    frame: String,
    desired: Isometry3<f64>,
    mask: Mask,
}

impl FramePoseFeature {
    /// Track `frame` toward `desired`. Fails if the model does not know
    /// the frame.
    pub fn new(
        model: &dyn Model,
        frame: impl Into<String>,
        desired: Isometry3<f64>,
    ) -> Result<Self, TaskError> {
        let frame = frame.into();
        if !model.has_frame(&frame) {
            return Err(ModelError::UnknownFrame(frame).into());
        }
        Ok(Self {
            frame,
            desired,
            mask: Mask::all(6),
        })
    }

    /// Track `frame` toward its current pose (zero initial error).
    pub fn hold(model: &dyn Model, frame: impl Into<String>) -> Result<Self, TaskError> {
        let frame = frame.into();
        let desired = model.frame_pose(&frame)?;
        Ok(Self {
            frame,
            desired,
            mask: Mask::all(6),
        })
    }

    pub fn with_mask(mut self, mask: Mask) -> Result<Self, TaskError> {
        mask.validate(6, &self.frame)?;
        self.mask = mask;
        Ok(self)
    }

    pub fn set_desired(&mut self, desired: Isometry3<f64>) {
        self.desired = desired;
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }
}

/// Orientation error as axis * angle, zero for identity.
fn orientation_error(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    match q.axis() {
        Some(axis) => axis.into_inner() * q.angle(),
        None => Vector3::zeros(),
    }
}

impl Feature for FramePoseFeature {
    fn dim(&self) -> usize {
        self.mask.selected()
    }

    fn evaluate(&self, model: &dyn Model) -> Result<FeatureOutput, TaskError> {
        let pose = model.frame_pose(&self.frame)?;

        let pos_err = self.desired.translation.vector - pose.translation.vector;
        let rot_err = orientation_error(&(self.desired.rotation * pose.rotation.inverse()));

        let error_full = DVector::from_column_slice(&[
            pos_err.x, pos_err.y, pos_err.z, rot_err.x, rot_err.y, rot_err.z,
        ]);
        let jacobian_full = model.frame_jacobian(&self.frame)?;

        Ok(FeatureOutput {
            error: self.mask.select_rows(&error_full),
            jacobian: self.mask.select_matrix_rows(&jacobian_full),
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
    use nalgebra::{DMatrix, Translation3};
    use talus_test_utils::StubModel;

    fn model_with_wrist() -> StubModel {
        let mut model = StubModel::new(3);
        let mut jac = DMatrix::zeros(6, 3);
        for i in 0..3 {
            jac[(i, i)] = 1.0;
        }
        model.set_frame(
            "right-wrist",
            Isometry3::from_parts(Translation3::new(0.3, -0.2, 1.0), UnitQuaternion::identity()),
            jac,
        );
        model
    }

    #[test]
    fn unknown_frame_fails_at_construction() {
        let model = model_with_wrist();
        let err = FramePoseFeature::new(&model, "left-wrist", Isometry3::identity()).unwrap_err();
        assert!(matches!(
            err,
            TaskError::Model(ModelError::UnknownFrame(_))
        ));
    }

    #[test]
    fn position_error_points_toward_target() {
        let model = model_with_wrist();
        let desired = Isometry3::from_parts(
            Translation3::new(0.4, -0.2, 1.0),
            UnitQuaternion::identity(),
        );
        let feature = FramePoseFeature::new(&model, "right-wrist", desired).unwrap();
        let out = feature.evaluate(&model).unwrap();
        assert_eq!(out.error.len(), 6);
        assert_relative_eq!(out.error[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(out.error[1], 0.0);
        assert_relative_eq!(out.error.rows(3, 3).norm(), 0.0);
    }

    #[test]
    fn orientation_error_is_axis_angle() {
        let model = model_with_wrist();
        let desired = Isometry3::from_parts(
            Translation3::new(0.3, -0.2, 1.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5),
        );
        let feature = FramePoseFeature::new(&model, "right-wrist", desired).unwrap();
        let out = feature.evaluate(&model).unwrap();
        assert_relative_eq!(out.error[5], 0.5, epsilon = 1e-12);
        assert_relative_eq!(out.error.rows(0, 3).norm(), 0.0);
    }

    #[test]
    fn hold_has_zero_error() {
        let model = model_with_wrist();
        let feature = FramePoseFeature::hold(&model, "right-wrist").unwrap();
        let out = feature.evaluate(&model).unwrap();
        assert_relative_eq!(out.error.norm(), 0.0);
    }

    #[test]
    fn orientation_only_mask() {
        let model = model_with_wrist();
        let feature = FramePoseFeature::hold(&model, "right-wrist")
            .unwrap()
            .with_mask(Mask::from_flags(&[false, false, false, true, true, true]))
            .unwrap();
        assert_eq!(feature.dim(), 3);
        let out = feature.evaluate(&model).unwrap();
        assert_eq!(out.jacobian.nrows(), 3);
    }
}
