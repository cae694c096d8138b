//! The task type: a named, ranked objective over a feature.

use nalgebra::{DMatrix, DVector};

use talus_core::config::ActivationConfig;
use talus_core::error::TaskError;
use talus_core::gain::Gain;
use talus_core::model::Model;

use crate::activation::ActivationState;
use crate::feature::Feature;

/// Whether a task is an equality objective or a bounded inequality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Equality,
    Inequality,
}

/// Lower/upper bounds of an inequality task, one pair per row.
#[derive(Debug, Clone)]
pub struct Bounds {
    pub lo: DVector<f64>,
    pub hi: DVector<f64>,
}

impl Bounds {
    pub fn new(lo: DVector<f64>, hi: DVector<f64>) -> Self {
        Self { lo, hi }
    }

    pub fn dim(&self) -> usize {
        self.lo.len()
    }
}

struct InequalityData {
    bounds: Bounds,
    activation: ActivationState,
}

/// A ranked objective: feature + gain law, equality or inequality.
///
/// The stack references tasks by name; the error and Jacobian are
/// refreshed from the model once per cycle via [`update`](Task::update),
/// always from the same snapshot. For inequality tasks the cached
/// "error" is the raw tracked value that the bounds apply to.
pub struct Task {
    name: String,
    feature: Box<dyn Feature>,
    gain: Gain,
    posture: bool,
    inequality: Option<InequalityData>,
    error: DVector<f64>,
    jacobian: DMatrix<f64>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("posture", &self.posture)
            .field("inequality", &self.inequality.is_some())
            .field("dim", &self.error.len())
            .finish()
    }
}

impl Task {
    /// Build an equality task.
    pub fn equality(name: impl Into<String>, feature: Box<dyn Feature>, gain: Gain) -> Self {
        let dim = feature.dim();
        Self {
            name: name.into(),
            feature,
            gain,
            posture: false,
            inequality: None,
            error: DVector::zeros(dim),
            jacobian: DMatrix::zeros(dim, 0),
        }
    }

    /// Build the distinguished posture task: an equality task the stack
    /// keeps at the lowest rank.
    pub fn posture(name: impl Into<String>, feature: Box<dyn Feature>, gain: Gain) -> Self {
        let mut task = Self::equality(name, feature, gain);
        task.posture = true;
        task
    }

    /// Build an inequality task bounding the feature's value rows.
    ///
    /// Bounds must match the feature dimension. An inverted pair
    /// (`lo > hi`) is accepted here and surfaced as a warning at solve
    /// time, so a mis-tuned bound can never cost a control cycle.
    pub fn inequality(
        name: impl Into<String>,
        feature: Box<dyn Feature>,
        gain: Gain,
        bounds: Bounds,
        activation: ActivationConfig,
    ) -> Result<Self, TaskError> {
        let name = name.into();
        let dim = feature.dim();
        if bounds.dim() != dim || bounds.hi.len() != dim {
            return Err(TaskError::BoundsDimMismatch {
                task: name,
                dim,
                bounds_dim: bounds.dim().max(bounds.hi.len()),
            });
        }
        activation
            .validate()
            .map_err(TaskError::InvalidActivation)?;

        Ok(Self {
            name,
            feature,
            gain,
            posture: false,
            inequality: Some(InequalityData {
                bounds,
                activation: ActivationState::new(dim, activation),
            }),
            error: DVector::zeros(dim),
            jacobian: DMatrix::zeros(dim, 0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dim(&self) -> usize {
        self.feature.dim()
    }

    pub fn kind(&self) -> TaskKind {
        if self.inequality.is_some() {
            TaskKind::Inequality
        } else {
            TaskKind::Equality
        }
    }

    pub fn is_posture(&self) -> bool {
        self.posture
    }

    pub fn gain(&self) -> &Gain {
        &self.gain
    }

    pub fn set_gain(&mut self, gain: Gain) {
        self.gain = gain;
    }

    /// Cached error (equality) or tracked value (inequality) from the
    /// last [`update`](Task::update).
    pub fn error(&self) -> &DVector<f64> {
        &self.error
    }

    /// Cached Jacobian from the last [`update`](Task::update).
    pub fn jacobian(&self) -> &DMatrix<f64> {
        &self.jacobian
    }

    pub fn bounds(&self) -> Option<&Bounds> {
        self.inequality.as_ref().map(|d| &d.bounds)
    }

    pub fn activation(&self) -> Option<&ActivationState> {
        self.inequality.as_ref().map(|d| &d.activation)
    }

    /// Reset activation rows to inactive (solver restart).
    pub fn reset_activation(&mut self) {
        if let Some(data) = self.inequality.as_mut() {
            data.activation.reset();
        }
    }

    /// Downcast access to the concrete feature, for re-targeting between
    /// cycles.
    pub fn feature_mut<F: Feature + 'static>(&mut self) -> Option<&mut F> {
        self.feature.as_any_mut().downcast_mut()
    }

    /// Refresh error and Jacobian from the model snapshot.
    pub fn update(&mut self, model: &dyn Model) -> Result<(), TaskError> {
        let out = self.feature.evaluate(model)?;
        if out.error.len() != out.jacobian.nrows() {
            return Err(TaskError::DimensionMismatch {
                task: self.name.clone(),
                error_dim: out.error.len(),
                jacobian_rows: out.jacobian.nrows(),
            });
        }
        self.error = out.error;
        self.jacobian = out.jacobian;
        Ok(())
    }

    /// Advance inequality activation using the look-ahead prediction
    /// `value + dt * J * velocity`. No-op for equality tasks. Must run
    /// after [`update`](Task::update) within the same cycle.
    pub fn refresh_activation(&mut self, dt: f64, velocity: &DVector<f64>) -> usize {
        let Some(data) = self.inequality.as_mut() else {
            return 0;
        };
        let predicted = &self.error + (&self.jacobian * velocity) * dt;
        data.activation
            .update(&predicted, &data.bounds.lo, &data.bounds.hi)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use talus_test_utils::StubModel;

    use crate::com::{ComFeature, ComHeightFeature};

    fn model() -> StubModel {
        let mut model = StubModel::new(2);
        let mut jac = DMatrix::zeros(3, 2);
        jac[(0, 0)] = 1.0;
        jac[(1, 1)] = 1.0;
        jac[(2, 0)] = 1.0;
        model.set_com(Vector3::new(0.0, 0.0, 0.9), jac);
        model
    }

    #[test]
    fn equality_task_caches_update() {
        let model = model();
        let mut task = Task::equality(
            "com",
            Box::new(ComFeature::new(Vector3::new(0.1, 0.0, 0.9))),
            Gain::Constant(1.0),
        );
        assert_eq!(task.kind(), TaskKind::Equality);
        assert_eq!(task.dim(), 3);

        task.update(&model).unwrap();
        assert_relative_eq!(task.error()[0], 0.1);
        assert_eq!(task.jacobian().ncols(), 2);
    }

    #[test]
    fn posture_flag_is_set() {
        let model = model();
        let task = Task::posture(
            "posture",
            Box::new(crate::posture::PostureFeature::hold(&model)),
            Gain::Constant(1.0),
        );
        assert!(task.is_posture());
        assert_eq!(task.kind(), TaskKind::Equality);
    }

    #[test]
    fn inequality_bounds_must_match_dim() {
        let err = Task::inequality(
            "height",
            Box::new(ComHeightFeature::new()),
            Gain::Constant(1.0),
            Bounds::new(DVector::zeros(3), DVector::zeros(3)),
            ActivationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TaskError::BoundsDimMismatch { .. }));
    }

    #[test]
    fn inequality_rejects_invalid_activation() {
        let err = Task::inequality(
            "height",
            Box::new(ComHeightFeature::new()),
            Gain::Constant(1.0),
            Bounds::new(DVector::from_element(1, 0.0), DVector::from_element(1, 1.0)),
            ActivationConfig {
                band: -1.0,
                hysteresis: 0.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, TaskError::InvalidActivation(_)));
    }

    #[test]
    fn activation_look_ahead_uses_velocity() {
        let model = model();
        // CoM height 0.9, bound hi 1.0, band 0.05: margin 0.1, inactive
        // at rest, but a fast upward rate crosses into the band.
        let mut task = Task::inequality(
            "height",
            Box::new(ComHeightFeature::new()),
            Gain::Constant(1.0),
            Bounds::new(
                DVector::from_element(1, 0.0),
                DVector::from_element(1, 1.0),
            ),
            ActivationConfig {
                band: 0.05,
                hysteresis: 0.02,
            },
        )
        .unwrap();

        task.update(&model).unwrap();
        let at_rest = DVector::zeros(2);
        assert_eq!(task.refresh_activation(0.1, &at_rest), 0);

        // Height row Jacobian is [1, 0]; qdot[0] = 0.8 over dt 0.1
        // predicts 0.98 -> margin 0.02 inside the band.
        let rising = DVector::from_column_slice(&[0.8, 0.0]);
        assert_eq!(task.refresh_activation(0.1, &rising), 1);
        assert!(task.activation().unwrap().is_active(0));
    }

    #[test]
    fn reset_activation_clears_state() {
        let model = model();
        let mut task = Task::inequality(
            "height",
            Box::new(ComHeightFeature::new()),
            Gain::Constant(1.0),
            Bounds::new(
                DVector::from_element(1, 0.0),
                DVector::from_element(1, 0.91),
            ),
            ActivationConfig::default(),
        )
        .unwrap();
        task.update(&model).unwrap();
        task.refresh_activation(0.0, &DVector::zeros(2));
        assert!(task.activation().unwrap().is_active(0));

        task.reset_activation();
        assert!(!task.activation().unwrap().is_active(0));
    }

    #[test]
    fn feature_downcast_retargets() {
        let model = model();
        let mut task = Task::equality(
            "com",
            Box::new(ComFeature::hold(&model)),
            Gain::Constant(1.0),
        );
        task.update(&model).unwrap();
        assert_relative_eq!(task.error().norm(), 0.0);

        task.feature_mut::<ComFeature>()
            .unwrap()
            .set_desired(Vector3::new(0.2, 0.0, 0.9));
        task.update(&model).unwrap();
        assert_relative_eq!(task.error()[0], 0.2);

        // Wrong concrete type yields None
        assert!(task.feature_mut::<ComHeightFeature>().is_none());
    }
}
