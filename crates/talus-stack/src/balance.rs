//! Prebuilt balance stack: double-support contacts, joint limits, CoM,
//! posture.

use nalgebra::DVector;

use talus_core::config::{ActivationConfig, SolverConfig};
use talus_core::error::TalusError;
use talus_core::gain::Gain;
use talus_core::model::Model;
use talus_core::types::SupportPolygon;
use talus_tasks::com::ComFeature;
use talus_tasks::limits::joint_limits_task;
use talus_tasks::posture::PostureFeature;
use talus_tasks::task::Task;

use crate::contact::ContactConstraint;
use crate::solver::StackSolver;

/// Task names installed by [`balance_stack`].
pub const CONTACT_LEFT: &str = "contact-left";
pub const CONTACT_RIGHT: &str = "contact-right";
pub const TASK_JOINT_LIMITS: &str = "joint-limits";
pub const TASK_COM: &str = "com";
pub const TASK_POSTURE: &str = "posture";

/// Tuning for the prebuilt balance stack.
#[derive(Debug, Clone)]
pub struct BalanceConfig {
    pub solver: SolverConfig,
    pub com_gain: f64,
    pub posture_gain: f64,
    pub limits_gain: f64,
    pub activation: ActivationConfig,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            com_gain: 10.0,
            posture_gain: 5.0,
            limits_gain: 0.3,
            activation: ActivationConfig::default(),
        }
    }
}

/// Configure the standard double-support balance stack.
///
/// Rank order after construction: both foot contacts at rank 0, then
/// joint limits, then the CoM task (xy, held at the model's current
/// CoM), then the posture task (held at the current configuration,
/// pinned last). The two support frames must be known to the model.
pub fn balance_stack(
    model: &dyn Model,
    left_frame: &str,
    right_frame: &str,
    left_support: SupportPolygon,
    right_support: SupportPolygon,
    posture_reference: Option<DVector<f64>>,
    config: BalanceConfig,
) -> Result<StackSolver, TalusError> {
    let mut solver = StackSolver::new(model.dof(), config.solver)?;

    solver.add_contact(
        ContactConstraint::new(model, CONTACT_LEFT, left_frame)?.with_support(left_support),
    )?;
    solver.add_contact(
        ContactConstraint::new(model, CONTACT_RIGHT, right_frame)?.with_support(right_support),
    )?;

    solver.add_task(joint_limits_task(
        model,
        TASK_JOINT_LIMITS,
        Gain::constant(config.limits_gain)?,
        config.activation,
    )?)?;
    solver.push(TASK_JOINT_LIMITS)?;

    solver.add_task(Task::equality(
        TASK_COM,
        Box::new(ComFeature::xy(model.com())),
        Gain::constant(config.com_gain)?,
    ))?;
    solver.push(TASK_COM)?;

    let posture = match posture_reference {
        Some(reference) => PostureFeature::new(model, reference)?,
        None => PostureFeature::hold(model),
    };
    solver.add_task(Task::posture(
        TASK_POSTURE,
        Box::new(posture),
        Gain::constant(config.posture_gain)?,
    ))?;
    solver.push(TASK_POSTURE)?;

    Ok(solver)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, Isometry3, Vector3};
    use talus_test_utils::StubModel;

    fn sole() -> SupportPolygon {
        SupportPolygon::new(vec![
            [0.11, -0.045],
            [-0.08, -0.045],
            [-0.08, 0.07],
            [0.11, 0.07],
        ])
    }

    fn biped_model() -> StubModel {
        let n = 6;
        let mut model = StubModel::new(n);
        // Feet pinned through the first two dofs
        let mut left = DMatrix::zeros(6, n);
        left[(0, 0)] = 1.0;
        let mut right = DMatrix::zeros(6, n);
        right[(0, 1)] = 1.0;
        model.set_frame("left-ankle", Isometry3::identity(), left);
        model.set_frame("right-ankle", Isometry3::identity(), right);

        let mut com_jac = DMatrix::zeros(3, n);
        com_jac[(0, 2)] = 1.0;
        com_jac[(1, 3)] = 1.0;
        com_jac[(2, 4)] = 1.0;
        model.set_com(Vector3::new(0.0, 0.0, 0.8), com_jac);
        model.set_position_limits(&[-2.0; 6], &[2.0; 6]);
        model
    }

    #[test]
    fn builds_expected_rank_order() {
        let model = biped_model();
        let solver = balance_stack(
            &model,
            "left-ankle",
            "right-ankle",
            sole(),
            sole(),
            None,
            BalanceConfig::default(),
        )
        .unwrap();

        assert_eq!(
            solver.list(),
            vec![TASK_JOINT_LIMITS, TASK_COM, TASK_POSTURE]
        );
        assert_eq!(solver.contacts().len(), 2);
        assert_eq!(solver.contacts()[0].support().unwrap().len(), 4);
    }

    #[test]
    fn unknown_foot_frame_fails() {
        let model = biped_model();
        let err = balance_stack(
            &model,
            "left-ankle",
            "missing-foot",
            sole(),
            sole(),
            None,
            BalanceConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TalusError::Task(_)));
    }

    #[test]
    fn holds_current_state_at_rest() {
        let model = biped_model();
        let mut solver = balance_stack(
            &model,
            "left-ankle",
            "right-ankle",
            sole(),
            sole(),
            None,
            BalanceConfig::default(),
        )
        .unwrap();

        // Every task already at its reference: nothing should move
        let solution = solver.solve(&model).unwrap();
        assert_relative_eq!(solution.command.norm(), 0.0, epsilon = 1e-9);
        assert!(solution.warnings.is_empty());
    }

    #[test]
    fn com_offset_recovers_without_moving_feet() {
        let mut model = biped_model();
        let mut solver = balance_stack(
            &model,
            "left-ankle",
            "right-ankle",
            sole(),
            sole(),
            None,
            BalanceConfig {
                com_gain: 1.0,
                posture_gain: 0.0,
                ..BalanceConfig::default()
            },
        )
        .unwrap();

        // Push the CoM off target (task desired stays at the build-time CoM)
        let mut com_jac = DMatrix::zeros(3, 6);
        com_jac[(0, 2)] = 1.0;
        com_jac[(1, 3)] = 1.0;
        com_jac[(2, 4)] = 1.0;
        model.set_com(Vector3::new(0.05, 0.0, 0.8), com_jac);

        let solution = solver.solve(&model).unwrap();
        // CoM x is driven back through dof 2; pinned dofs stay put
        assert_relative_eq!(solution.command[2], -0.05, epsilon = 1e-5);
        assert_relative_eq!(solution.command[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(solution.command[1], 0.0, epsilon = 1e-6);
    }
}
