//! External collaborator traits: the kinematic/dynamic model and the
//! actuation device.
//!
//! The control stack never computes kinematics itself; it consumes
//! positions, velocities, Jacobians and bounds from a [`Model`]
//! implementation, and hands the finished command to a [`Device`].
//!
//! Implementors must guarantee that all quantities returned within one
//! control cycle are computed against the same configuration snapshot.

use nalgebra::{DMatrix, DVector, Isometry3, Vector3};

use crate::error::ModelError;

/// Kinematic/dynamic model of the robot, queried once per control cycle.
///
/// Frame Jacobians are 6×n (three linear rows, then three angular rows),
/// expressed in the world frame. The CoM Jacobian is 3×n.
pub trait Model {
    /// Configuration dimension n (including base dofs, if floating).
    fn dof(&self) -> usize;

    /// Current configuration position vector, length n.
    fn position(&self) -> DVector<f64>;

    /// Current configuration velocity vector, length n.
    fn velocity(&self) -> DVector<f64>;

    /// Whether `name` is a known operational-point frame.
    fn has_frame(&self, name: &str) -> bool;

    /// World pose of a named operational-point frame.
    fn frame_pose(&self, name: &str) -> Result<Isometry3<f64>, ModelError>;

    /// 6×n world-frame Jacobian of a named frame (linear rows, then angular).
    fn frame_jacobian(&self, name: &str) -> Result<DMatrix<f64>, ModelError>;

    /// Center-of-mass position in the world frame.
    fn com(&self) -> Vector3<f64>;

    /// 3×n Jacobian of the center of mass.
    fn com_jacobian(&self) -> DMatrix<f64>;

    /// Per-joint lower position bounds, length n.
    fn lower_position_limits(&self) -> DVector<f64>;

    /// Per-joint upper position bounds, length n.
    fn upper_position_limits(&self) -> DVector<f64>;

    /// Per-joint velocity magnitude bounds, length n.
    fn velocity_limits(&self) -> DVector<f64>;
}

/// Actuation device: accepts one command per cycle and reports the
/// measured configuration velocity used for second-order feed-forward.
pub trait Device {
    /// Send a configuration-space velocity or acceleration command.
    fn send(&mut self, command: &DVector<f64>);

    /// Measured configuration velocity from the last cycle.
    fn measured_velocity(&self) -> DVector<f64>;
}
