use ndarray::ArrayView1;

use crate::error::{Result, SimError};


/// Records Ez and Hy at a fixed cell once per step.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub position: usize,
    pub max_time: usize,
    pub e: Vec<f64>,
    pub h: Vec<f64>,
}

impl Probe {
    pub fn new(position: usize, max_time: usize) -> Self {
        Self {
            position,
            max_time,
            e: Vec::with_capacity(max_time),
            h: Vec::with_capacity(max_time),
        }
    }

    /// Appends the field values at the probe cell. Hy is one sample shorter
    /// than Ez, so a probe on the last cell reads the nearest Hy sample.
    pub fn add_data(&mut self, ez: ArrayView1<f64>, hy: ArrayView1<f64>) -> Result<()> {
        if self.is_complete() {
            return Err(SimError::Domain(format!(
                "probe at cell {} already holds {} samples",
                self.position, self.max_time
            )));
        }
        if self.position >= ez.len() || hy.is_empty() {
            return Err(SimError::Domain(format!(
                "probe at cell {} is outside a grid of {} cells",
                self.position,
                ez.len()
            )));
        }

        self.e.push(ez[self.position]);
        self.h.push(hy[self.position.min(hy.len() - 1)]);
        Ok(())
    }

    /// True once `max_time` samples have been recorded.
    pub fn is_complete(&self) -> bool {
        self.e.len() >= self.max_time
    }
}
