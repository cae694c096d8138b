//! Center-of-mass features.

use std::any::Any;

use nalgebra::Vector3;

use talus_core::error::TaskError;
use talus_core::model::Model;

use crate::feature::{Feature, FeatureOutput, Mask};

/// Equality feature tracking the center of mass against a desired point.
///
/// Error is `desired - com`, maskable per axis. Balance stacks typically
/// track xy only and leave the height to an inequality bound.
#[derive(Debug, Clone)]
pub struct ComFeature {
    desired: Vector3<f64>,
    mask: Mask,
}

impl ComFeature {
    pub fn new(desired: Vector3<f64>) -> Self {
        Self {
            desired,
            mask: Mask::all(3),
        }
    }

    pub fn with_mask(desired: Vector3<f64>, mask: Mask) -> Result<Self, TaskError> {
        mask.validate(3, "com")?;
        Ok(Self { desired, mask })
    }

    /// Horizontal-only tracking (x and y selected, z free).
    pub fn xy(desired: Vector3<f64>) -> Self {
        Self {
            desired,
            mask: Mask::from_flags(&[true, true, false]),
        }
    }

    /// Hold the model's current CoM.
    pub fn hold(model: &dyn Model) -> Self {
        Self::new(model.com())
    }

    pub fn set_desired(&mut self, desired: Vector3<f64>) {
        self.desired = desired;
    }

    pub fn desired(&self) -> Vector3<f64> {
        self.desired
    }
}

impl Feature for ComFeature {
    fn dim(&self) -> usize {
        self.mask.selected()
    }

    fn evaluate(&self, model: &dyn Model) -> Result<FeatureOutput, TaskError> {
        let com = model.com();
        let error_full = nalgebra::DVector::from_column_slice(&[
            self.desired.x - com.x,
            self.desired.y - com.y,
            self.desired.z - com.z,
        ]);
        Ok(FeatureOutput {
            error: self.mask.select_rows(&error_full),
            jacobian: self.mask.select_matrix_rows(&model.com_jacobian()),
        })
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Value feature reporting the CoM height (one row), for the height bound.
#[derive(Debug, Clone, Default)]
pub struct ComHeightFeature;

impl ComHeightFeature {
    pub fn new() -> Self {
        Self
    }
}

impl Feature for ComHeightFeature {
    fn dim(&self) -> usize {
        1
    }

    fn evaluate(&self, model: &dyn Model) -> Result<FeatureOutput, TaskError> {
        let mask = Mask::from_flags(&[false, false, true]);
        Ok(FeatureOutput {
            error: nalgebra::DVector::from_element(1, model.com().z),
            jacobian: mask.select_matrix_rows(&model.com_jacobian()),
        })
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
