//! Tasks and features for the Talus control stack.
//!
//! A [`Feature`] turns model quantities into an error/Jacobian pair; a
//! [`Task`] wraps a feature with a name, a gain law and (for inequality
//! tasks) bounds plus per-row activation state. Tasks are registered with
//! the solver facade and refreshed once per control cycle.
//!
//! Equality features report `desired - current` so that driving the error
//! to zero drives the tracked quantity to its target. Inequality features
//! report the raw tracked value, which the owning task keeps inside its
//! `[lo, hi]` bounds.

pub mod activation;
pub mod com;
pub mod feature;
pub mod limits;
pub mod position;
pub mod posture;
pub mod task;

pub use activation::{ActivationState, RowState};
pub use com::{ComFeature, ComHeightFeature};
pub use feature::{Feature, FeatureOutput, Mask};
pub use limits::{joint_limits_task, JointPositionFeature};
pub use position::FramePoseFeature;
pub use posture::PostureFeature;
pub use task::{Bounds, Task, TaskKind};
