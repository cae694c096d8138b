//! Hierarchical task-priority solver for whole-body control.
//!
//! Converts a ranked stack of kinematic objectives into one joint-space
//! command per control cycle:
//!
//! 1. **Contacts** are bilateral zero-motion equalities, held exactly
//!    (rank 0).
//! 2. **Ranked tasks** are absorbed in strict priority order by
//!    recursive null-space projection: a lower task may only use motion
//!    that leaves every higher task's achievement unchanged.
//! 3. **Inequality tasks** contribute only their active rows, toggled
//!    per cycle by a look-ahead/hysteresis activation machine.
//!
//! Every pseudo-inverse is Tikhonov-damped, so rank loss degrades
//! tracking instead of failing the cycle.
//!
//! # Architecture
//!
//! ```text
//! Model ──► Task/Contact update ──► activation filter ──► Projection ──► command ──► Device
//!                  (per cycle, same snapshot)      (contacts, then ranked tasks)
//! ```
//!
//! [`StackSolver`] owns the task registry, the ranked [`PriorityStack`],
//! the contact set and the damping scalar, and drives exactly one
//! [`solve`](StackSolver::solve) per cycle.

pub mod balance;
pub mod contact;
pub mod limiter;
pub mod projection;
pub mod solver;
pub mod stack;

pub use balance::{balance_stack, BalanceConfig};
pub use contact::ContactConstraint;
pub use limiter::clamp_command;
pub use projection::{damped_pinv, Projection};
pub use solver::{Solution, StackSolver, StackWarning, TaskResidual};
pub use stack::PriorityStack;
