//! Per-row inequality activation with look-ahead and hysteresis.

use nalgebra::DVector;

use talus_core::config::ActivationConfig;

/// Activation state of one inequality row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Inactive,
    Active,
}

/// Two-state machine per row of an inequality task.
///
/// A row activates when the predicted value comes within `band` of a
/// bound, before any violation occurs, so the solved command is feasible
/// at the bound. It deactivates only once the margin exceeds
/// `band + hysteresis`; inside the dead zone the previous state holds,
/// which keeps rows from chattering at the boundary.
#[derive(Debug, Clone)]
pub struct ActivationState {
    rows: Vec<RowState>,
    config: ActivationConfig,
}

impl ActivationState {
    /// All rows start inactive.
    pub fn new(dim: usize, config: ActivationConfig) -> Self {
        Self {
            rows: vec![RowState::Inactive; dim],
            config,
        }
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    pub fn config(&self) -> ActivationConfig {
        self.config
    }

    /// Reset every row to inactive.
    pub fn reset(&mut self) {
        self.rows.fill(RowState::Inactive);
    }

    pub fn is_active(&self, row: usize) -> bool {
        self.rows[row] == RowState::Active
    }

    pub fn states(&self) -> &[RowState] {
        &self.rows
    }

    /// Indices of the currently active rows.
    pub fn active_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| (s == RowState::Active).then_some(i))
            .collect()
    }

    /// Advance every row given the predicted values and the bounds.
    ///
    /// The margin of a row is the smaller of its distances to `lo` and
    /// `hi`; negative when the predicted value is already outside.
    /// Returns the number of active rows after the update.
    pub fn update(
        &mut self,
        predicted: &DVector<f64>,
        lo: &DVector<f64>,
        hi: &DVector<f64>,
    ) -> usize {
        debug_assert_eq!(predicted.len(), self.rows.len());

        for (i, state) in self.rows.iter_mut().enumerate() {
            let margin = (hi[i] - predicted[i]).min(predicted[i] - lo[i]);
            *state = match *state {
                RowState::Inactive if margin <= self.config.band => RowState::Active,
                RowState::Active if margin >= self.config.band + self.config.hysteresis => {
                    RowState::Inactive
                }
                s => s,
            };
        }
        self.rows.iter().filter(|&&s| s == RowState::Active).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
