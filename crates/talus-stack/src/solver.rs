//! Solver facade: task registry, ranked stack, contacts, one solve per
//! control cycle.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};

use talus_core::config::SolverConfig;
use talus_core::error::{ConfigError, StackError, TalusError};
use talus_core::model::Model;
use talus_core::types::ControlMode;
use talus_tasks::task::{Task, TaskKind};

use crate::contact::ContactConstraint;
use crate::limiter::clamp_command;
use crate::projection::Projection;
use crate::stack::PriorityStack;

/// An active inequality row whose requested rate deviates by more than
/// this (relative) tolerance under the final command is reported as
/// unresolved.
const UNRESOLVED_TOL: f64 = 1e-4;

/// Stack-consistency warnings accumulated during one solve.
///
/// Warnings never fail the cycle: a best-effort command is always
/// produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StackWarning {
    /// An inequality row has `lo > hi`; the row is driven toward the
    /// bound midpoint.
    InfeasibleBounds { task: String, row: usize },
    /// An active inequality row could not be satisfied under the final
    /// command (conflicting constraints or exhausted null space).
    UnresolvedInequality {
        task: String,
        row: usize,
        residual: f64,
    },
}

/// Achieved residual of one ranked task under the solved command.
#[derive(Debug, Clone)]
pub struct TaskResidual {
    pub task: String,
    pub residual: f64,
}

/// Result of one control cycle.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Composite configuration-space command (velocity or acceleration,
    /// per [`mode`](Self::mode)).
    pub command: DVector<f64>,
    pub mode: ControlMode,
    /// Residual norm `‖r − J q̇‖` per ranked task, in stack order,
    /// measured before command limiting.
    pub residuals: Vec<TaskResidual>,
    pub warnings: Vec<StackWarning>,
}

impl Solution {
    pub fn residual_of(&self, task: &str) -> Option<f64> {
        self.residuals
            .iter()
            .find(|r| r.task == task)
            .map(|r| r.residual)
    }
}

/// One objective as handed to the projection, kept for residual
/// reporting.
struct Level {
    task: String,
    jacobian: DMatrix<f64>,
    target: DVector<f64>,
    /// Original row indices for active inequality rows; empty for
    /// equality levels.
    inequality_rows: Vec<usize>,
}

/// Owner of the whole control stack.
///
/// Holds the task registry (name → task), the ranked stack, the contact
/// set and the solver configuration. Structural mutation happens between
/// cycles; `solve` takes `&mut self`, so mutation during a solve is
/// unrepresentable.
pub struct StackSolver {
    n: usize,
    config: SolverConfig,
    registry: HashMap<String, Task>,
    stack: PriorityStack,
    contacts: Vec<ContactConstraint>,
    limit_commands: bool,
}

impl std::fmt::Debug for StackSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackSolver")
            .field("n", &self.n)
            .field("config", &self.config)
            .field("tasks", &self.registry.len())
            .field("contacts", &self.contacts.len())
            .field("limit_commands", &self.limit_commands)
            .finish()
    }
}

impl StackSolver {
    /// Build a solver for an n-dimensional configuration.
    pub fn new(n: usize, config: SolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            n,
            config,
            registry: HashMap::new(),
            stack: PriorityStack::new(),
            contacts: Vec::new(),
            limit_commands: false,
        })
    }

    pub fn with_defaults(n: usize) -> Self {
        Self {
            n,
            config: SolverConfig::default(),
            registry: HashMap::new(),
            stack: PriorityStack::new(),
            contacts: Vec::new(),
            limit_commands: false,
        }
    }

    pub fn dof(&self) -> usize {
        self.n
    }

    pub fn damping(&self) -> f64 {
        self.config.damping
    }

    /// Replace the damping scalar. Must stay strictly positive.
    pub fn set_damping(&mut self, damping: f64) -> Result<(), ConfigError> {
        if damping <= 0.0 || !damping.is_finite() {
            return Err(ConfigError::InvalidDamping(damping));
        }
        self.config.damping = damping;
        Ok(())
    }

    pub fn mode(&self) -> ControlMode {
        self.config.mode
    }

    /// Switch between velocity and acceleration (second-order) solving.
    pub fn set_mode(&mut self, mode: ControlMode) {
        self.config.mode = mode;
    }

    pub fn dt(&self) -> f64 {
        self.config.dt
    }

    /// Route outgoing velocity commands through the joint-bound limiter.
    pub fn set_command_limiting(&mut self, enabled: bool) {
        self.limit_commands = enabled;
    }

    // -- registry ----------------------------------------------------------

    /// Register a task. Does not rank it; call [`push`](Self::push) next.
    pub fn add_task(&mut self, task: Task) -> Result<(), StackError> {
        let name = task.name().to_string();
        if self.registry.contains_key(&name) {
            return Err(StackError::DuplicateTask(name));
        }
        self.registry.insert(name, task);
        Ok(())
    }

    /// Unregister a task, dropping its rank entry as well.
    pub fn remove_task(&mut self, name: &str) -> Option<Task> {
        self.stack.remove(name);
        self.registry.remove(name)
    }

    pub fn has_task(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.registry.get(name)
    }

    /// Mutable task access, for re-targeting between cycles.
    pub fn task_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.registry.get_mut(name)
    }

    // -- ranking -----------------------------------------------------------

    /// Rank a registered task at the lowest priority. The posture task,
    /// if ranked, stays last.
    pub fn push(&mut self, name: &str) -> Result<(), StackError> {
        let task = self
            .registry
            .get(name)
            .ok_or_else(|| StackError::UnknownTask(name.into()))?;
        self.stack.push(name, task.is_posture())
    }

    /// Rank a registered task at an explicit rank (0 = highest).
    pub fn insert(&mut self, rank: usize, name: &str) -> Result<(), StackError> {
        let task = self
            .registry
            .get(name)
            .ok_or_else(|| StackError::UnknownTask(name.into()))?;
        self.stack.insert(rank, name, task.is_posture())
    }

    /// Drop a rank entry. Silent no-op when the name is not ranked; the
    /// task stays registered.
    pub fn remove(&mut self, name: &str) -> bool {
        self.stack.remove(name)
    }

    /// Drop and return the lowest-priority rank entry.
    pub fn pop(&mut self) -> Option<String> {
        self.stack.pop()
    }

    /// Ranked task names, highest priority first.
    pub fn list(&self) -> Vec<&str> {
        self.stack.list()
    }

    pub fn move_up(&mut self, name: &str) -> bool {
        self.stack.move_up(name)
    }

    pub fn move_down(&mut self, name: &str) -> bool {
        self.stack.move_down(name)
    }

    /// Empty the stack and reset inequality activation (solver restart).
    /// Contacts are a separate set, cleared via
    /// [`clear_contacts`](Self::clear_contacts).
    pub fn clear(&mut self) {
        self.stack.clear();
        for task in self.registry.values_mut() {
            task.reset_activation();
        }
    }

    // -- contacts ----------------------------------------------------------

    pub fn add_contact(&mut self, contact: ContactConstraint) -> Result<(), StackError> {
        if self.contacts.iter().any(|c| c.name() == contact.name()) {
            return Err(StackError::DuplicateTask(contact.name().into()));
        }
        self.contacts.push(contact);
        Ok(())
    }

    pub fn remove_contact(&mut self, name: &str) -> bool {
        let before = self.contacts.len();
        self.contacts.retain(|c| c.name() != name);
        self.contacts.len() != before
    }

    pub fn clear_contacts(&mut self) {
        self.contacts.clear();
    }

    pub fn contacts(&self) -> &[ContactConstraint] {
        &self.contacts
    }

    // -- solve -------------------------------------------------------------

    /// Run one control cycle against the given model snapshot.
    ///
    /// Contacts are held exactly (rank 0), then every ranked task is
    /// absorbed in priority order, lower tasks restricted to the null
    /// space of everything above. Numerical degeneracy never fails the
    /// cycle; structural mismatches (unknown frame, wrong dimensions) do.
    pub fn solve(&mut self, model: &dyn Model) -> Result<Solution, TalusError> {
        if model.dof() != self.n {
            return Err(StackError::ModelDimMismatch {
                expected: self.n,
                got: model.dof(),
            }
            .into());
        }

        let velocity = model.velocity();
        let damping = self.config.damping;
        let mode = self.config.mode;
        let mut warnings = Vec::new();

        // Refresh every constraint and task from the same snapshot.
        for contact in &mut self.contacts {
            contact.update(model)?;
            if contact.jacobian().ncols() != self.n {
                return Err(StackError::ConfigurationDimMismatch {
                    task: contact.name().into(),
                    expected: self.n,
                    got: contact.jacobian().ncols(),
                }
                .into());
            }
        }

        let order: Vec<String> = self.stack.list().iter().map(|s| (*s).into()).collect();
        for name in &order {
            let task = self
                .registry
                .get_mut(name)
                .ok_or_else(|| StackError::UnknownTask(name.clone()))?;
            task.update(model)?;
            if task.jacobian().ncols() != self.n {
                return Err(StackError::ConfigurationDimMismatch {
                    task: name.clone(),
                    expected: self.n,
                    got: task.jacobian().ncols(),
                }
                .into());
            }
            task.refresh_activation(self.config.dt, &velocity);
        }

        // Contacts first: non-negotiable zero-motion equalities.
        let mut projection = Projection::new(self.n);
        for contact in &self.contacts {
            let target = match mode {
                ControlMode::Velocity => contact.target(),
                ControlMode::Acceleration => -(contact.jacobian() * &velocity),
            };
            projection.step(contact.jacobian(), &target, damping);
        }

        // Ranked tasks in priority order.
        let mut levels: Vec<Level> = Vec::new();
        for name in &order {
            let task = &self.registry[name];
            let level = match task.kind() {
                TaskKind::Equality => equality_level(name, task, mode, &velocity),
                TaskKind::Inequality => {
                    inequality_level(name, task, mode, &velocity, &mut warnings)
                }
            };
            let Some(level) = level else { continue };
            projection.step(&level.jacobian, &level.target, damping);
            levels.push(level);
        }

        // Residuals and inequality feasibility against the solver output.
        let solver_command = projection.command();
        let mut residuals = Vec::with_capacity(levels.len());
        for level in &levels {
            let diff = &level.target - &level.jacobian * solver_command;
            residuals.push(TaskResidual {
                task: level.task.clone(),
                residual: diff.norm(),
            });
            for (k, &row) in level.inequality_rows.iter().enumerate() {
                let residual = diff[k].abs();
                if residual > UNRESOLVED_TOL * (1.0 + level.target[k].abs()) {
                    warnings.push(StackWarning::UnresolvedInequality {
                        task: level.task.clone(),
                        row,
                        residual,
                    });
                }
            }
        }

        let mut command = solver_command.clone();
        if self.limit_commands && mode == ControlMode::Velocity {
            command = clamp_command(model, self.config.dt, &command);
        }

        Ok(Solution {
            command,
            mode,
            residuals,
            warnings,
        })
    }
}

/// Objective of an equality task: `r = gain(‖e‖) · e`, with velocity
/// feed-forward in second-order mode.
fn equality_level(
    name: &str,
    task: &Task,
    mode: ControlMode,
    velocity: &DVector<f64>,
) -> Option<Level> {
    let error = task.error();
    let gain = task.gain().value(error.norm());
    let mut target = error * gain;
    if mode == ControlMode::Acceleration {
        target -= task.jacobian() * velocity;
    }
    Some(Level {
        task: name.into(),
        jacobian: task.jacobian().clone(),
        target,
        inequality_rows: Vec::new(),
    })
}

/// Objective of an inequality task: only active rows participate, each
/// driven to rest at its nearest (or violated) bound. Inverted bounds
/// are warned about and driven to the midpoint.
fn inequality_level(
    name: &str,
    task: &Task,
    mode: ControlMode,
    velocity: &DVector<f64>,
    warnings: &mut Vec<StackWarning>,
) -> Option<Level> {
    let activation = task.activation()?;
    let bounds = task.bounds()?;
    let active = activation.active_rows();
    if active.is_empty() {
        return None;
    }

    let value = task.error();
    let mut violation = DVector::zeros(active.len());
    let mut jacobian = DMatrix::zeros(active.len(), task.jacobian().ncols());

    for (k, &row) in active.iter().enumerate() {
        let (lo, hi) = (bounds.lo[row], bounds.hi[row]);
        let bound = if lo > hi {
            warnings.push(StackWarning::InfeasibleBounds {
                task: name.into(),
                row,
            });
            0.5 * (lo + hi)
        } else if value[row] > hi {
            hi
        } else if value[row] < lo {
            lo
        } else if hi - value[row] <= value[row] - lo {
            hi
        } else {
            lo
        };
        violation[k] = bound - value[row];
        jacobian.row_mut(k).copy_from(&task.jacobian().row(row));
    }

    let gain = task.gain().value(violation.norm());
    let mut target = violation * gain;
    if mode == ControlMode::Acceleration {
        target -= &jacobian * velocity;
    }

    Some(Level {
        task: name.into(),
        jacobian,
        target,
        inequality_rows: active,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
