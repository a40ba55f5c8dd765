//! Drives a complete run: medium, source, stepping, then spectral analysis.

use std::path::Path;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use ndarray::Array1;

use crate::engine::{Engine, EngineState};
use crate::error::{Result, SimError};
use crate::medium::Medium;
use crate::output;
use crate::result::Results;
use crate::settings::Settings;
use crate::source::Ricker;
use crate::spectrum::SpectralAnalyzer;

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut settings = crate::settings::load_default_config().unwrap();
        settings.max_time = 400;
        settings.spectrum.size = 1 << 12;
        settings
    }

    #[test]
    fn snapshots_every_interval() {
        let mut simulation = Simulation::new(settings()).unwrap();
        simulation.run().unwrap();
        assert_eq!(simulation.snapshots.len(), 80);
        assert_eq!(simulation.snapshots[0].step, 0);
        assert_eq!(simulation.snapshots[1].step, 5);
        assert_eq!(simulation.snapshots[0].ez.len(), 600);
    }

    #[test]
    fn analyze_needs_completed_run() {
        let simulation = Simulation::new(settings()).unwrap();
        assert!(matches!(simulation.analyze(), Err(SimError::Domain(_))));
    }

    #[test]
    fn source_takes_local_medium() {
        let mut settings = settings();
        settings.layer_start = Some(50);
        settings.layers[0].thickness = Some(1.0);
        let simulation = Simulation::new(settings).unwrap();
        assert_eq!(simulation.engine.source().eps, 5.5);
        assert_eq!(simulation.engine.source().mu, 1.0);
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut settings = settings();
        settings.courant = 1.01;
        assert!(matches!(
            Simulation::new(settings),
            Err(SimError::NumericalInstability { .. })
        ));
    }
}

/// Ez over the whole grid after a given step.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub step: usize,
    pub ez: Array1<f64>,
}

/// A configured run together with what it has recorded so far.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub settings: Settings,
    pub engine: Engine,
    pub snapshots: Vec<Snapshot>,
}

impl Simulation {
    /// Validates `settings` and builds the medium, source and engine.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let medium = Medium::from_layers(
            settings.max_size(),
            settings.dx,
            settings.layer_start(),
            &settings.layers,
        )?;

        let pos = settings.source_pos;
        let source = Ricker::new(
            settings.source.np,
            settings.source.md,
            medium.eps[pos],
            medium.mu[pos],
            settings.courant,
            settings.source.magnitude,
        );

        let engine = Engine::new(
            medium,
            source,
            pos,
            settings.courant,
            settings.max_time,
            settings.boundary,
            &settings.probes,
        )?;

        info!(
            "{} cells, layer interfaces at {:?}",
            settings.max_size(),
            engine.medium().interfaces
        );

        Ok(Self {
            settings,
            engine,
            snapshots: Vec::new(),
        })
    }

    /// Steps the engine to completion, keeping snapshots along the way.
    pub fn run(&mut self) -> Result<()> {
        let start = Instant::now();

        let pb = ProgressBar::new(self.settings.max_time as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg} ETA: {eta_precise}",
        ) {
            pb.set_style(style.progress_chars("█▇▆▅▄▃▂▁"));
        }
        pb.set_message("step".to_string());

        let interval = self.settings.snapshot_interval;
        let snapshots = &mut self.snapshots;
        self.engine.run_with(|engine| {
            let step = engine.step_count() - 1;
            if interval > 0 && step % interval == 0 {
                snapshots.push(Snapshot {
                    step,
                    ez: engine.ez().clone(),
                });
            }
            pb.inc(1);
        })?;
        pb.finish_and_clear();

        info!(
            "Time taken: {:.2?} for {} steps",
            start.elapsed(),
            self.engine.step_count()
        );
        Ok(())
    }

    /// Spectra of the incident and reflected probes and the reflection
    /// coefficient over the configured band.
    pub fn analyze(&self) -> Result<Results> {
        if self.engine.state() != EngineState::Completed {
            return Err(SimError::Domain(format!(
                "analysis needs all {} steps, {} done",
                self.settings.max_time,
                self.engine.step_count()
            )));
        }

        let spectrum = &self.settings.spectrum;
        let dt = self.settings.dt();
        let analyzer = SpectralAnalyzer::new(spectrum.size, dt, spectrum.incident_window)?;

        let probes = self.engine.probes();
        let analysis = analyzer.analyze(
            &probes[spectrum.incident_probe].e,
            &probes[spectrum.reflected_probe].e,
            spectrum.fmin,
            spectrum.fmax,
        )?;

        Ok(Results::new(
            analysis,
            self.engine.source().dominant_frequency(dt),
        ))
    }

    /// Writes probe records, snapshots, spectra and a summary to the output
    /// directory.
    pub fn writeup(&self, results: &Results) -> anyhow::Result<()> {
        let dir = Path::new(&self.settings.directory);
        std::fs::create_dir_all(dir)?;

        let dt = self.settings.dt();
        for probe in self.engine.probes() {
            output::write_probe(probe, dt, dir)?;
        }
        if !self.snapshots.is_empty() {
            output::write_snapshots(&self.snapshots, dir)?;
        }
        output::write_spectra(results, self.settings.spectrum.display_fmax, dir)?;
        output::write_reflection(results, dir)?;
        output::write_summary(&self.settings, results, self.engine.probes(), dir)?;

        info!("Results written to {:?}", dir);
        Ok(())
    }
}
