// talus-core: Traits, types, gains, config and errors for the Talus control stack.

pub mod config;
pub mod error;
pub mod gain;
pub mod model;
pub mod types;

pub mod prelude {
    //! Convenience re-exports for downstream crates.
    pub use crate::config::{ActivationConfig, GainConfig, SolverConfig};
    pub use crate::error::{ConfigError, ModelError, StackError, TalusError, TaskError};
    pub use crate::gain::Gain;
    pub use crate::model::{Device, Model};
    pub use crate::types::{ControlMode, SupportPolygon};
}
