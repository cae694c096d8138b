//! A settable [`Model`] implementation.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector, Isometry3, Vector3};

use talus_core::error::ModelError;
use talus_core::model::Model;

/// Kinematic model stub with directly settable quantities.
///
/// Defaults: zero position/velocity, zero CoM with a zero 3×n Jacobian,
/// and effectively unbounded joint limits.
#[derive(Debug, Clone)]
pub struct StubModel {
    position: DVector<f64>,
    velocity: DVector<f64>,
    frames: HashMap<String, (Isometry3<f64>, DMatrix<f64>)>,
    com: Vector3<f64>,
    com_jacobian: DMatrix<f64>,
    lower: DVector<f64>,
    upper: DVector<f64>,
    velocity_bounds: DVector<f64>,
}

impl StubModel {
    pub fn new(dof: usize) -> Self {
        Self {
            position: DVector::zeros(dof),
            velocity: DVector::zeros(dof),
            frames: HashMap::new(),
            com: Vector3::zeros(),
            com_jacobian: DMatrix::zeros(3, dof),
            lower: DVector::from_element(dof, -1e9),
            upper: DVector::from_element(dof, 1e9),
            velocity_bounds: DVector::from_element(dof, 1e9),
        }
    }

    pub fn set_position(&mut self, q: &[f64]) -> &mut Self {
        assert_eq!(q.len(), self.position.len());
        self.position = DVector::from_column_slice(q);
        self
    }

    pub fn set_velocity(&mut self, v: &[f64]) -> &mut Self {
        assert_eq!(v.len(), self.velocity.len());
        self.velocity = DVector::from_column_slice(v);
        self
    }

    /// Install (or replace) a named frame with its pose and 6×n Jacobian.
    pub fn set_frame(
        &mut self,
        name: impl Into<String>,
        pose: Isometry3<f64>,
        jacobian: DMatrix<f64>,
    ) -> &mut Self {
        assert_eq!(jacobian.nrows(), 6);
        assert_eq!(jacobian.ncols(), self.position.len());
        self.frames.insert(name.into(), (pose, jacobian));
        self
    }

    pub fn set_com(&mut self, com: Vector3<f64>, jacobian: DMatrix<f64>) -> &mut Self {
        assert_eq!(jacobian.nrows(), 3);
        assert_eq!(jacobian.ncols(), self.position.len());
        self.com = com;
        self.com_jacobian = jacobian;
        self
    }

    pub fn set_position_limits(&mut self, lower: &[f64], upper: &[f64]) -> &mut Self {
        assert_eq!(lower.len(), self.position.len());
        assert_eq!(upper.len(), self.position.len());
        self.lower = DVector::from_column_slice(lower);
        self.upper = DVector::from_column_slice(upper);
        self
    }

    pub fn set_velocity_limits(&mut self, bounds: &[f64]) -> &mut Self {
        assert_eq!(bounds.len(), self.position.len());
        self.velocity_bounds = DVector::from_column_slice(bounds);
        self
    }
}

impl Model for StubModel {
    fn dof(&self) -> usize {
        self.position.len()
    }

    fn position(&self) -> DVector<f64> {
        self.position.clone()
    }

    fn velocity(&self) -> DVector<f64> {
        self.velocity.clone()
    }

    fn has_frame(&self, name: &str) -> bool {
        self.frames.contains_key(name)
    }

    fn frame_pose(&self, name: &str) -> Result<Isometry3<f64>, ModelError> {
        self.frames
            .get(name)
            .map(|(pose, _)| *pose)
            .ok_or_else(|| ModelError::UnknownFrame(name.into()))
    }

    fn frame_jacobian(&self, name: &str) -> Result<DMatrix<f64>, ModelError> {
        self.frames
            .get(name)
            .map(|(_, jacobian)| jacobian.clone())
            .ok_or_else(|| ModelError::UnknownFrame(name.into()))
    }

    fn com(&self) -> Vector3<f64> {
        self.com
    }

    fn com_jacobian(&self) -> DMatrix<f64> {
        self.com_jacobian.clone()
    }

    fn lower_position_limits(&self) -> DVector<f64> {
        self.lower.clone()
    }

    fn upper_position_limits(&self) -> DVector<f64> {
        self.upper.clone()
    }

    fn velocity_limits(&self) -> DVector<f64> {
        self.velocity_bounds.clone()
    }
}
