//! Leapfrog update of the staggered Ez/Hy grid.
//!
//! Each step runs a fixed sequence: H update, TFSF correction on H, edge
//! condition, E update, TFSF correction on E, probe sampling. The Hy update
//! finishes before the Ez update reads it, and a step never starts before
//! the previous one has sampled its probes.

use log::debug;
use ndarray::{s, Array1, Zip};

use crate::boundary::{Boundary, BoundaryKind};
use crate::config::W0;
use crate::error::{Result, SimError};
use crate::medium::Medium;
use crate::probe::Probe;
use crate::source::Ricker;


/// Lifecycle of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    /// `step` is the index of the last completed step.
    Running { step: usize },
    Completed,
}

/// Owns the field arrays and advances them one step at a time.
#[derive(Debug, Clone)]
pub struct Engine {
    ez: Array1<f64>,
    hy: Array1<f64>,
    /// Sc * W0 / eps on the Ez nodes.
    ce: Array1<f64>,
    /// Sc / (W0 * mu) on the Hy nodes.
    ch: Array1<f64>,
    /// Sc / sqrt(eps * mu) at the source cell.
    source_coef: f64,
    medium: Medium,
    source: Ricker,
    source_pos: usize,
    sc: f64,
    max_time: usize,
    step: usize,
    boundary: Boundary,
    probes: Vec<Probe>,
}

impl Engine {
    /// Validates the setup and allocates zeroed fields.
    pub fn new(
        medium: Medium,
        source: Ricker,
        source_pos: usize,
        sc: f64,
        max_time: usize,
        boundary: BoundaryKind,
        probe_positions: &[usize],
    ) -> Result<Self> {
        let max_size = medium.num_cells();
        if max_size < 3 || medium.mu.len() + 1 != max_size {
            return Err(SimError::Configuration(format!(
                "medium needs at least 3 Ez cells and one fewer Hy cell, got {} and {}",
                max_size,
                medium.mu.len()
            )));
        }
        if max_time == 0 {
            return Err(SimError::Domain("number of steps must be positive".into()));
        }
        if sc.is_nan() || sc <= 0.0 {
            return Err(SimError::Configuration(format!(
                "Courant number must be positive, got {}",
                sc
            )));
        }
        if sc > 1.0 {
            return Err(SimError::NumericalInstability { courant: sc });
        }
        if source_pos < 1 || source_pos + 2 > max_size {
            return Err(SimError::Domain(format!(
                "source cell {} must lie within [1, {}]",
                source_pos,
                max_size - 2
            )));
        }
        if let Some(&pos) = probe_positions.iter().find(|&&p| p >= max_size) {
            return Err(SimError::Domain(format!(
                "probe cell {} is outside a grid of {} cells",
                pos, max_size
            )));
        }

        let ce = medium.eps.mapv(|eps| sc * W0 / eps);
        let ch = medium.mu.mapv(|mu| sc / (W0 * mu));
        let source_coef = sc / (medium.eps[source_pos] * medium.mu[source_pos]).sqrt();
        let boundary = Boundary::new(boundary, sc, &medium);
        let probes = probe_positions
            .iter()
            .map(|&pos| Probe::new(pos, max_time))
            .collect();

        debug!(
            "engine: {} cells, {} steps, source at {}, Sc = {}",
            max_size, max_time, source_pos, sc
        );

        Ok(Self {
            ez: Array1::zeros(max_size),
            hy: Array1::zeros(max_size - 1),
            ce,
            ch,
            source_coef,
            medium,
            source,
            source_pos,
            sc,
            max_time,
            step: 0,
            boundary,
            probes,
        })
    }

    /// Advances the fields by one time step.
    pub fn step(&mut self) -> Result<()> {
        if self.step >= self.max_time {
            return Err(SimError::Domain(format!(
                "simulation already completed {} steps",
                self.max_time
            )));
        }
        let q = self.step;
        let src = self.source_pos;
        let n = self.ez.len();

        Zip::from(&mut self.hy)
            .and(&self.ch)
            .and(self.ez.slice(s![1..]))
            .and(self.ez.slice(s![..-1]))
            .for_each(|h, &c, &e_next, &e| *h += (e_next - e) * c);

        self.hy[src - 1] -= self.ch[src - 1] * self.source.h_phase(q);

        self.boundary.before_update(&mut self.ez);

        Zip::from(self.ez.slice_mut(s![1..n - 1]))
            .and(self.ce.slice(s![1..n - 1]))
            .and(self.hy.slice(s![1..]))
            .and(self.hy.slice(s![..-1]))
            .for_each(|e, &c, &h, &h_prev| *e += (h - h_prev) * c);

        self.boundary.after_update(&mut self.ez);

        self.ez[src] += self.source_coef * self.source.e_phase(q);

        for probe in self.probes.iter_mut() {
            probe.add_data(self.ez.view(), self.hy.view())?;
        }

        self.step += 1;
        Ok(())
    }

    /// Runs all remaining steps.
    pub fn run(&mut self) -> Result<()> {
        self.run_with(|_| {})
    }

    /// Runs all remaining steps, handing the engine to `observer` after each.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<()>
    where
        F: FnMut(&Engine),
    {
        while self.step < self.max_time {
            self.step()?;
            observer(self);
        }
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        match self.step {
            0 => EngineState::Uninitialized,
            s if s >= self.max_time => EngineState::Completed,
            s => EngineState::Running { step: s - 1 },
        }
    }

    /// Number of completed steps.
    pub fn step_count(&self) -> usize {
        self.step
    }

    /// Current Ez snapshot.
    pub fn ez(&self) -> &Array1<f64> {
        &self.ez
    }

    pub fn hy(&self) -> &Array1<f64> {
        &self.hy
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    pub fn into_probes(self) -> Vec<Probe> {
        self.probes
    }

    pub fn medium(&self) -> &Medium {
        &self.medium
    }

    pub fn source(&self) -> &Ricker {
        &self.source
    }

    pub fn source_pos(&self) -> usize {
        self.source_pos
    }

    pub fn courant(&self) -> f64 {
        self.sc
    }

    pub fn max_time(&self) -> usize {
        self.max_time
    }
}
