//! A [`Device`] that records commands.

use nalgebra::DVector;

use talus_core::model::Device;

/// Device stub storing the last command and a settable measured velocity.
#[derive(Debug, Clone)]
pub struct RecordingDevice {
    commands: Vec<DVector<f64>>,
    measured: DVector<f64>,
}

impl RecordingDevice {
    pub fn new(dof: usize) -> Self {
        Self {
            commands: Vec::new(),
            measured: DVector::zeros(dof),
        }
    }

    pub fn set_measured_velocity(&mut self, v: &[f64]) {
        self.measured = DVector::from_column_slice(v);
    }

    pub fn last_command(&self) -> Option<&DVector<f64>> {
        self.commands.last()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

impl Device for RecordingDevice {
    fn send(&mut self, command: &DVector<f64>) {
        self.commands.push(command.clone());
    }

    fn measured_velocity(&self) -> DVector<f64> {
        self.measured.clone()
    }
}
