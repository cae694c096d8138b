//! Talus control stack demo CLI.
//!
//! Two modes of operation:
//! - `balance`: close the loop on a built-in planar standing model and
//!   print per-cycle convergence of the balance stack
//! - `info`: print workspace crate versions and defaults

use clap::{Parser, Subcommand};
use nalgebra::{DMatrix, DVector, Isometry3, Vector3};

use talus_core::prelude::*;
use talus_stack::balance::{balance_stack, BalanceConfig, TASK_COM};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Talus whole-body control stack.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the balance stack on the built-in planar model.
    Balance {
        /// Number of control cycles.
        #[arg(short = 'n', long, default_value_t = 500)]
        cycles: u32,

        /// Control timestep in seconds.
        #[arg(long, default_value_t = 0.005)]
        dt: f64,

        /// Initial hip-joint perturbation in radians.
        #[arg(long, default_value_t = 0.15)]
        offset: f64,

        /// Print every k-th cycle.
        #[arg(long, default_value_t = 50)]
        stride: u32,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// PlanarBiped
// ---------------------------------------------------------------------------

/// Fixed-base planar three-link standing model (ankle, knee, hip joints
/// rotating about y), with an analytic CoM and CoM Jacobian.
///
/// The ankle frames coincide with the fixed base, so the contact
/// constraints are trivially held; the interesting dynamics are the CoM
/// and posture tasks competing over three joints. Doubles as the
/// [`Device`]: a sent velocity command integrates the configuration over
/// one timestep.
struct PlanarBiped {
    q: DVector<f64>,
    v: DVector<f64>,
    dt: f64,
    lengths: [f64; 3],
    masses: [f64; 3],
}

impl PlanarBiped {
    fn new(dt: f64) -> Self {
        Self {
            q: DVector::zeros(3),
            v: DVector::zeros(3),
            dt,
            lengths: [0.45, 0.45, 0.5],
            masses: [5.0, 5.0, 20.0],
        }
    }

    /// Cumulative joint origins and per-link midpoints in the xz plane.
    fn link_frames(&self) -> ([Vector3<f64>; 3], [Vector3<f64>; 3]) {
        let mut origins = [Vector3::zeros(); 3];
        let mut midpoints = [Vector3::zeros(); 3];
        let mut tip = Vector3::zeros();
        let mut angle = 0.0;
        for i in 0..3 {
            origins[i] = tip;
            angle += self.q[i];
            let dir = Vector3::new(angle.sin(), 0.0, angle.cos());
            midpoints[i] = tip + dir * (self.lengths[i] * 0.5);
            tip += dir * self.lengths[i];
        }
        (origins, midpoints)
    }

    fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }
}

impl Model for PlanarBiped {
    fn dof(&self) -> usize {
        3
    }

    fn position(&self) -> DVector<f64> {
        self.q.clone()
    }

    fn velocity(&self) -> DVector<f64> {
        self.v.clone()
    }

    fn has_frame(&self, name: &str) -> bool {
        matches!(name, "left-ankle" | "right-ankle")
    }

    fn frame_pose(&self, name: &str) -> Result<Isometry3<f64>, ModelError> {
        if self.has_frame(name) {
            Ok(Isometry3::identity())
        } else {
            Err(ModelError::UnknownFrame(name.into()))
        }
    }

    fn frame_jacobian(&self, name: &str) -> Result<DMatrix<f64>, ModelError> {
        if self.has_frame(name) {
            // Ankle frames ride the fixed base: they cannot move.
            Ok(DMatrix::zeros(6, 3))
        } else {
            Err(ModelError::UnknownFrame(name.into()))
        }
    }

    fn com(&self) -> Vector3<f64> {
        let (_, midpoints) = self.link_frames();
        let mut com = Vector3::zeros();
        for i in 0..3 {
            com += midpoints[i] * self.masses[i];
        }
        com / self.total_mass()
    }

    fn com_jacobian(&self) -> DMatrix<f64> {
        let (origins, midpoints) = self.link_frames();
        let total = self.total_mass();
        let mut jac = DMatrix::zeros(3, 3);
        for j in 0..3 {
            // Joint j (axis +y) moves every link at or beyond it
            let mut col = Vector3::zeros();
            for i in j..3 {
                let r = midpoints[i] - origins[j];
                col += Vector3::new(r.z, 0.0, -r.x) * (self.masses[i] / total);
            }
            jac[(0, j)] = col.x;
            jac[(1, j)] = col.y;
            jac[(2, j)] = col.z;
        }
        jac
    }

    fn lower_position_limits(&self) -> DVector<f64> {
        DVector::from_element(3, -1.5)
    }

    fn upper_position_limits(&self) -> DVector<f64> {
        DVector::from_element(3, 1.5)
    }

    fn velocity_limits(&self) -> DVector<f64> {
        DVector::from_element(3, 4.0)
    }
}

impl Device for PlanarBiped {
    fn send(&mut self, command: &DVector<f64>) {
        self.v = command.clone();
        self.q += command * self.dt;
    }

    fn measured_velocity(&self) -> DVector<f64> {
        self.v.clone()
    }
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn sole() -> SupportPolygon {
    SupportPolygon::new(vec![
        [0.11, -0.045],
        [-0.08, -0.045],
        [-0.08, 0.07],
        [0.11, 0.07],
    ])
}

fn run_balance(cycles: u32, dt: f64, offset: f64, stride: u32) {
    let mut model = PlanarBiped::new(dt);

    // Reference posture: upright; the stack is built against it, then
    // the hip is perturbed and the loop has to recover.
    let config = BalanceConfig {
        solver: SolverConfig {
            dt,
            ..SolverConfig::default()
        },
        ..BalanceConfig::default()
    };
    let mut solver = match balance_stack(
        &model,
        "left-ankle",
        "right-ankle",
        sole(),
        sole(),
        None,
        config,
    ) {
        Ok(solver) => solver,
        Err(err) => {
            eprintln!("failed to build balance stack: {err}");
            std::process::exit(1);
        }
    };
    solver.set_command_limiting(true);

    model.q[2] = offset;
    let com_start = model.com();
    println!(
        "balance: {} dofs, {} cycles at {:.0} Hz, initial CoM x = {:+.4}",
        model.dof(),
        cycles,
        1.0 / dt,
        com_start.x
    );

    for cycle in 0..cycles {
        let solution = match solver.solve(&model) {
            Ok(solution) => solution,
            Err(err) => {
                eprintln!("cycle {cycle}: solve failed: {err}");
                std::process::exit(1);
            }
        };
        for warning in &solution.warnings {
            eprintln!("cycle {cycle}: warning: {warning:?}");
        }
        model.send(&solution.command);

        if cycle % stride == 0 {
            let com_err = solution.residual_of(TASK_COM).unwrap_or(0.0);
            println!(
                "cycle {cycle:>5}  com_residual {com_err:>10.3e}  |command| {:>10.3e}",
                solution.command.norm()
            );
        }
    }

    let com_end = model.com();
    println!(
        "done: CoM x {:+.4} -> {:+.4}, posture q = [{:+.3}, {:+.3}, {:+.3}]",
        com_start.x, com_end.x, model.q[0], model.q[1], model.q[2]
    );
}

fn run_info() {
    println!("talus {}", env!("CARGO_PKG_VERSION"));
    println!("  default damping     1e-6");
    println!("  default dt          0.005 s (200 Hz)");
    println!("  default activation  band 0.05, hysteresis 0.02");
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Balance {
            cycles,
            dt,
            offset,
            stride,
        } => run_balance(cycles, dt, offset, stride.max(1)),
        Commands::Info => run_info(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
