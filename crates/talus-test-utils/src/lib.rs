//! Test doubles for the Talus control stack.
//!
//! [`StubModel`] implements [`Model`](talus_core::model::Model) with fully
//! settable state: frames, Jacobians, CoM and bounds are whatever the test
//! installs. [`RecordingDevice`] captures the last command sent.

pub mod device;
pub mod model;

pub use device::RecordingDevice;
pub use model::StubModel;
