//! Damped pseudo-inversion and recursive null-space projection.
//!
//! Each priority level absorbs one stacked objective `J q̇ = r` into the
//! running solution, restricted to the directions left free by every
//! level above it. The damped pseudo-inverse keeps the solve bounded
//! under rank loss: with `λ > 0` the normal matrix `A Aᵀ + λ²I` is
//! positive definite for any `A`, including all zeros.

use nalgebra::{DMatrix, DVector};

/// Tikhonov-damped pseudo-inverse: `A⁺ = Aᵀ (A Aᵀ + λ² I)⁻¹`.
pub fn damped_pinv(a: &DMatrix<f64>, damping: f64) -> DMatrix<f64> {
    let m = a.nrows();
    if m == 0 {
        return DMatrix::zeros(a.ncols(), 0);
    }
    let damped = a * a.transpose() + DMatrix::identity(m, m) * (damping * damping);
    match damped.try_inverse() {
        Some(inv) => a.transpose() * inv,
        // Unreachable for damping > 0 in exact arithmetic; a zero update
        // keeps the cycle alive if inversion ever fails numerically.
        None => DMatrix::zeros(a.ncols(), m),
    }
}

/// Running state of one projected solve: the partial command and the
/// projector onto the remaining free directions.
#[derive(Debug, Clone)]
pub struct Projection {
    command: DVector<f64>,
    projector: DMatrix<f64>,
}

impl Projection {
    /// Fresh solve over an n-dimensional configuration: zero command,
    /// identity projector.
    pub fn new(n: usize) -> Self {
        Self {
            command: DVector::zeros(n),
            projector: DMatrix::identity(n, n),
        }
    }

    /// Absorb one priority level with objective `jacobian · q̇ = target`.
    ///
    /// `q̇ᵢ = q̇ᵢ₋₁ + (J P)⁺ (r − J q̇ᵢ₋₁)`, then the projector shrinks by
    /// `(J P)⁺ (J P)` so lower levels can no longer disturb this one.
    pub fn step(&mut self, jacobian: &DMatrix<f64>, target: &DVector<f64>, damping: f64) {
        if jacobian.nrows() == 0 {
            return;
        }
        let jp = jacobian * &self.projector;
        let pinv = damped_pinv(&jp, damping);
        self.command += &pinv * (target - jacobian * &self.command);
        self.projector -= &pinv * jp;
    }

    /// The composite command accumulated so far.
    pub fn command(&self) -> &DVector<f64> {
        &self.command
    }

    /// Projector onto the directions still free for lower levels.
    pub fn projector(&self) -> &DMatrix<f64> {
        &self.projector
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
