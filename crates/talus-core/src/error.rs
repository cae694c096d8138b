use thiserror::Error;

/// Top-level error type for the Talus control stack.
#[derive(Debug, Error)]
pub enum TalusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Stack error: {0}")]
    Stack(#[from] StackError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid damping: {0} (must be > 0)")]
    InvalidDamping(f64),

    #[error("Invalid dt: {0} (must be > 0)")]
    InvalidDt(f64),

    #[error("Invalid gain: {message}")]
    InvalidGain { message: String },

    #[error("Invalid activation band: {0} (must be > 0)")]
    InvalidActivationBand(f64),

    #[error("Invalid activation hysteresis: {0} (must be >= 0)")]
    InvalidActivationHysteresis(f64),
}

/// Errors reported by a model implementation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A referenced operational-point frame is not known to the model.
    #[error("unknown frame: {0}")]
    UnknownFrame(String),
}

/// Task and feature construction/update errors.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Dimension mismatch in task '{task}': error has {error_dim} rows, Jacobian has {jacobian_rows}")]
    DimensionMismatch {
        task: String,
        error_dim: usize,
        jacobian_rows: usize,
    },

    #[error("Bounds dimension mismatch in task '{task}': task dimension {dim}, bounds dimension {bounds_dim}")]
    BoundsDimMismatch {
        task: String,
        dim: usize,
        bounds_dim: usize,
    },

    #[error("Selection mask of '{0}' selects no rows")]
    EmptySelection(String),

    #[error("Selection mask length {mask_len} does not match feature dimension {dim}")]
    MaskLenMismatch { mask_len: usize, dim: usize },

    #[error("Reference vector has {got} rows, expected {expected}")]
    ReferenceLenMismatch { expected: usize, got: usize },

    #[error("Invalid activation config: {0}")]
    InvalidActivation(#[source] ConfigError),
}

/// Stack mutation and solve errors.
///
/// Numerical degeneracy is never an error: the damped pseudo-inverse
/// bounds the solution for any Jacobian, including all zeros.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("Task '{0}' is not registered")]
    UnknownTask(String),

    #[error("Task '{0}' is already ranked in the stack")]
    AlreadyRanked(String),

    #[error("Rank {rank} out of range for stack of {len}")]
    RankOutOfRange { rank: usize, len: usize },

    #[error("Task '{task}' Jacobian has {got} columns, solver configured for {expected}")]
    ConfigurationDimMismatch {
        task: String,
        expected: usize,
        got: usize,
    },

    #[error("Model has {got} dofs, solver configured for {expected}")]
    ModelDimMismatch { expected: usize, got: usize },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
