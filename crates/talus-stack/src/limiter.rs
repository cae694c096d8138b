//! Post-solve command limiter.
//!
//! Clamps a velocity command per joint so that the position predicted
//! over one timestep stays inside the model's position bounds, and the
//! rate stays inside the velocity bounds. The facade routes every
//! outgoing velocity command through this filter when it is enabled;
//! nothing is sent around it.

use nalgebra::DVector;

use talus_core::model::Model;

/// Clamp `command` against the model's velocity and position bounds.
pub fn clamp_command(model: &dyn Model, dt: f64, command: &DVector<f64>) -> DVector<f64> {
    let q = model.position();
    let lower = model.lower_position_limits();
    let upper = model.upper_position_limits();
    let vmax = model.velocity_limits();

    let mut out = command.clone();
    for i in 0..out.len() {
        let limit = vmax[i].abs();
        out[i] = out[i].clamp(-limit, limit);

        // Largest rate that keeps q + dt * v inside [lower, upper]
        if dt > 0.0 {
            let min_rate = (lower[i] - q[i]) / dt;
            let max_rate = (upper[i] - q[i]) / dt;
            // An already out-of-bounds joint may only move back inside
            out[i] = out[i].clamp(min_rate.min(0.0), max_rate.max(0.0));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
