//! Bilateral contact constraints.

use nalgebra::{DMatrix, DVector};

use talus_core::error::{ModelError, TaskError};
use talus_core::model::Model;
use talus_core::types::SupportPolygon;

/// Rigid bilateral contact pinning all six degrees of freedom of a named
/// support frame.
///
/// Solved at rank 0 with a zero target: the frame must not move, subject
/// only to damping. The support polygon is informational (for an
/// external balance/ZMP consumer); the solver never reads it.
#[derive(Debug, Clone)]
pub struct ContactConstraint {
    name: String,
    frame: String,
    support: Option<SupportPolygon>,
    jacobian: DMatrix<f64>,
}

impl ContactConstraint {
    /// Rows pinned by one contact.
    pub const DIM: usize = 6;

    /// Pin `frame`. Fails if the model does not know the frame.
    pub fn new(
        model: &dyn Model,
        name: impl Into<String>,
        frame: impl Into<String>,
    ) -> Result<Self, TaskError> {
        let frame = frame.into();
        if !model.has_frame(&frame) {
            return Err(ModelError::UnknownFrame(frame).into());
        }
        Ok(Self {
            name: name.into(),
            frame,
            support: None,
            jacobian: DMatrix::zeros(Self::DIM, model.dof()),
        })
    }

    pub fn with_support(mut self, support: SupportPolygon) -> Self {
        self.support = Some(support);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }

    pub fn support(&self) -> Option<&SupportPolygon> {
        self.support.as_ref()
    }

    /// Refresh the contact Jacobian from the model snapshot.
    pub fn update(&mut self, model: &dyn Model) -> Result<(), TaskError> {
        self.jacobian = model.frame_jacobian(&self.frame)?;
        Ok(())
    }

    pub fn jacobian(&self) -> &DMatrix<f64> {
        &self.jacobian
    }

    /// Zero-motion target for this contact.
    pub fn target(&self) -> DVector<f64> {
        DVector::zeros(Self::DIM)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
