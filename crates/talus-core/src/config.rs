use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gain::Gain;
use crate::types::ControlMode;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_damping() -> f64 {
    1e-6
}
const fn default_dt() -> f64 {
    0.005
}
const fn default_band() -> f64 {
    0.05
}
const fn default_hysteresis() -> f64 {
    0.02
}

// ---------------------------------------------------------------------------
// SolverConfig
// ---------------------------------------------------------------------------

/// Solver-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Tikhonov damping for every pseudo-inverse (default: 1e-6).
    /// Strictly positive, so the solve stays well-posed under rank loss.
    #[serde(default = "default_damping")]
    pub damping: f64,

    /// Control timestep in seconds (default: 0.005 = 200 Hz).
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Command mode: velocity, or acceleration with velocity feed-forward.
    #[serde(default)]
    pub mode: ControlMode,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            dt: default_dt(),
            mode: ControlMode::default(),
        }
    }
}

impl SolverConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.damping <= 0.0 || !self.damping.is_finite() {
            return Err(ConfigError::InvalidDamping(self.damping));
        }
        if self.dt <= 0.0 || !self.dt.is_finite() {
            return Err(ConfigError::InvalidDt(self.dt));
        }
        Ok(())
    }

    /// Control rate in Hz.
    pub fn rate_hz(&self) -> f64 {
        1.0 / self.dt
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// GainConfig
// ---------------------------------------------------------------------------

/// Serializable per-task gain specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainConfig {
    Constant(f64),
    Adaptive { low: f64, high: f64, threshold: f64 },
}

impl GainConfig {
    /// Validate and convert into a [`Gain`] law.
    pub fn build(&self) -> Result<Gain, ConfigError> {
        match *self {
            Self::Constant(k) => Gain::constant(k),
            Self::Adaptive {
                low,
                high,
                threshold,
            } => Gain::adaptive(low, high, threshold),
        }
    }
}

impl Default for GainConfig {
    fn default() -> Self {
        Self::Constant(1.0)
    }
}

// ---------------------------------------------------------------------------
// ActivationConfig
// ---------------------------------------------------------------------------

/// Inequality-row activation tuning.
///
/// A row activates when its predicted margin to a bound falls inside
/// `band`, and deactivates only once the margin exceeds
/// `band + hysteresis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivationConfig {
    #[serde(default = "default_band")]
    pub band: f64,

    #[serde(default = "default_hysteresis")]
    pub hysteresis: f64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            band: default_band(),
            hysteresis: default_hysteresis(),
        }
    }
}

impl ActivationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.band <= 0.0 || !self.band.is_finite() {
            return Err(ConfigError::InvalidActivationBand(self.band));
        }
        if self.hysteresis < 0.0 || !self.hysteresis.is_finite() {
            return Err(ConfigError::InvalidActivationHysteresis(self.hysteresis));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- SolverConfig ----

    #[test]
    fn solver_config_default_values() {
        let cfg = SolverConfig::default();
        assert!((cfg.damping - 1e-6).abs() < f64::EPSILON);
        assert!((cfg.dt - 0.005).abs() < f64::EPSILON);
        assert_eq!(cfg.mode, ControlMode::Velocity);
    }

    #[test]
    fn solver_config_validate_ok() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn solver_config_rejects_zero_damping() {
        let cfg = SolverConfig {
            damping: 0.0,
            ..SolverConfig::default()
        };
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidDamping(_)
        ));
    }

    #[test]
    fn solver_config_rejects_negative_dt() {
        let cfg = SolverConfig {
            dt: -0.01,
            ..SolverConfig::default()
        };
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidDt(_)
        ));
    }

    #[test]
    fn solver_config_rate_hz() {
        let cfg = SolverConfig::default();
        assert!((cfg.rate_hz() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn solver_config_toml_deserialization() {
        let toml_str = r#"
            damping = 1e-4
            dt = 0.01
            mode = "acceleration"
        "#;
        let cfg: SolverConfig = toml::from_str(toml_str).unwrap();
        assert!((cfg.damping - 1e-4).abs() < f64::EPSILON);
        assert!((cfg.dt - 0.01).abs() < f64::EPSILON);
        assert_eq!(cfg.mode, ControlMode::Acceleration);
    }

    #[test]
    fn solver_config_toml_defaults() {
        let cfg: SolverConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, SolverConfig::default());
    }

    #[test]
    fn solver_config_from_file() {
        let dir = std::env::temp_dir().join("talus_test_solver_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solver.toml");
        std::fs::write(&path, "damping = 1e-5\ndt = 0.002\n").unwrap();

        let cfg = SolverConfig::from_file(&path).unwrap();
        assert!((cfg.damping - 1e-5).abs() < f64::EPSILON);
        assert!((cfg.dt - 0.002).abs() < f64::EPSILON);

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn solver_config_from_file_invalid_damping() {
        let dir = std::env::temp_dir().join("talus_test_solver_config_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solver.toml");
        std::fs::write(&path, "damping = 0.0\n").unwrap();

        assert!(SolverConfig::from_file(&path).is_err());

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn solver_config_from_file_not_found() {
        assert!(SolverConfig::from_file("/nonexistent/solver.toml").is_err());
    }

    // ---- GainConfig ----

    #[test]
    fn gain_config_constant_builds() {
        let gain = GainConfig::Constant(10.0).build().unwrap();
        assert_eq!(gain, Gain::Constant(10.0));
    }

    #[test]
    fn gain_config_adaptive_builds() {
        let gain = GainConfig::Adaptive {
            low: 1.0,
            high: 5.0,
            threshold: 0.1,
        }
        .build()
        .unwrap();
        assert!(matches!(gain, Gain::Adaptive { .. }));
    }

    #[test]
    fn gain_config_adaptive_invalid_rejected() {
        let cfg = GainConfig::Adaptive {
            low: 5.0,
            high: 1.0,
            threshold: 0.1,
        };
        assert!(cfg.build().is_err());
    }

    #[test]
    fn gain_config_toml_round_trip() {
        let cfg = GainConfig::Adaptive {
            low: 0.5,
            high: 10.0,
            threshold: 0.2,
        };
        let s = toml::to_string(&cfg).unwrap();
        let back: GainConfig = toml::from_str(&s).unwrap();
        assert_eq!(back, cfg);
    }

    // ---- ActivationConfig ----

    #[test]
    fn activation_config_defaults() {
        let cfg = ActivationConfig::default();
        assert!((cfg.band - 0.05).abs() < f64::EPSILON);
        assert!((cfg.hysteresis - 0.02).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn activation_config_rejects_zero_band() {
        let cfg = ActivationConfig {
            band: 0.0,
            hysteresis: 0.01,
        };
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidActivationBand(_)
        ));
    }

    #[test]
    fn activation_config_allows_zero_hysteresis() {
        let cfg = ActivationConfig {
            band: 0.05,
            hysteresis: 0.0,
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn activation_config_rejects_negative_hysteresis() {
        let cfg = ActivationConfig {
            band: 0.05,
            hysteresis: -0.01,
        };
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidActivationHysteresis(_)
        ));
    }

    #[test]
    fn activation_config_json_round_trip() {
        let cfg = ActivationConfig {
            band: 0.1,
            hysteresis: 0.03,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ActivationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
