//! Joint-limit features and prebuilt limit tasks.

use std::any::Any;

use nalgebra::DMatrix;

use talus_core::config::ActivationConfig;
use talus_core::error::TaskError;
use talus_core::gain::Gain;
use talus_core::model::Model;

use crate::feature::{Feature, FeatureOutput, Mask};
use crate::task::{Bounds, Task};

/// Value feature reporting raw joint positions (identity Jacobian).
///
/// Used by inequality tasks bounding the configuration, typically with
/// the model's position limits.
#[derive(Debug, Clone)]
pub struct JointPositionFeature {
    mask: Mask,
}

impl JointPositionFeature {
    pub fn new(model: &dyn Model) -> Self {
        Self {
            mask: Mask::all(model.dof()),
        }
    }

    /// Bound a subset of joints, e.g. excluding floating-base rows.
    pub fn with_mask(model: &dyn Model, mask: Mask) -> Result<Self, TaskError> {
        mask.validate(model.dof(), "joint-limits")?;
        Ok(Self { mask })
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }
}

impl Feature for JointPositionFeature {
    fn dim(&self) -> usize {
        self.mask.selected()
    }

    fn evaluate(&self, model: &dyn Model) -> Result<FeatureOutput, TaskError> {
        let q = model.position();
        let mut jacobian = DMatrix::zeros(self.mask.selected(), q.len());
        for (row, i) in self.mask.indices().enumerate() {
            jacobian[(row, i)] = 1.0;
        }
        Ok(FeatureOutput {
            error: self.mask.select_rows(&q),
            jacobian,
        })
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Build the standard joint-limits inequality task from the model's
/// position bounds.
pub fn joint_limits_task(
    model: &dyn Model,
    name: impl Into<String>,
    gain: Gain,
    activation: ActivationConfig,
) -> Result<Task, TaskError> {
    let feature = JointPositionFeature::new(model);
    let bounds = Bounds::new(
        model.lower_position_limits(),
        model.upper_position_limits(),
    );
    Task::inequality(name, Box::new(feature), gain, bounds, activation)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
