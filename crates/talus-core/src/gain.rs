//! Control gain laws.
//!
//! A gain scales a task's error before projection, bounding the
//! convergence rate of the resulting command.

use crate::error::ConfigError;

/// Gain law mapping the current error norm to a scalar gain.
#[derive(Debug, Clone, PartialEq)]
pub enum Gain {
    /// Fixed gain, independent of the error.
    Constant(f64),
    /// Saturating adaptive law: small gain near convergence, approaching
    /// `high` for large errors.
    ///
    /// `gain(e) = low + (high - low) * (1 - exp(-||e|| / threshold))`
    Adaptive { low: f64, high: f64, threshold: f64 },
}

impl Gain {
    /// Build a constant gain. Fails on negative values.
    pub fn constant(value: f64) -> Result<Self, ConfigError> {
        if value < 0.0 || !value.is_finite() {
            return Err(ConfigError::InvalidGain {
                message: format!("constant gain must be finite and >= 0, got {value}"),
            });
        }
        Ok(Self::Constant(value))
    }

    /// Build an adaptive gain. Requires `0 <= low <= high` and `threshold > 0`.
    pub fn adaptive(low: f64, high: f64, threshold: f64) -> Result<Self, ConfigError> {
        if low < 0.0 || high < low {
            return Err(ConfigError::InvalidGain {
                message: format!("adaptive gain requires 0 <= low <= high, got low={low}, high={high}"),
            });
        }
        if threshold <= 0.0 || !threshold.is_finite() {
            return Err(ConfigError::InvalidGain {
                message: format!("adaptive gain threshold must be > 0, got {threshold}"),
            });
        }
        Ok(Self::Adaptive {
            low,
            high,
            threshold,
        })
    }

    /// Evaluate the gain for the given error norm.
    pub fn value(&self, error_norm: f64) -> f64 {
        match *self {
            Self::Constant(k) => k,
            Self::Adaptive {
                low,
                high,
                threshold,
            } => low + (high - low) * (1.0 - (-error_norm / threshold).exp()),
        }
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::Constant(1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
