use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;

use crate::probe::Probe;
use crate::result::Results;
use crate::settings::Settings;
use crate::simulation::Snapshot;


/// Writes the time, Ez and Hy records of a probe to `probe_<position>`.
pub fn write_probe(probe: &Probe, dt: f64, dir: &Path) -> Result<()> {
    let file = File::create(dir.join(format!("probe_{}", probe.position)))?;
    let mut writer = BufWriter::new(file);

    for (step, (e, h)) in probe.e.iter().zip(probe.h.iter()).enumerate() {
        writeln!(writer, "{} {} {}", step as f64 * dt, e, h)?;
    }

    Ok(())
}

/// One row per snapshot: the step followed by Ez over the grid.
pub fn write_snapshots(snapshots: &[Snapshot], dir: &Path) -> Result<()> {
    let file = File::create(dir.join("snapshots"))?;
    let mut writer = BufWriter::new(file);

    for snapshot in snapshots {
        writeln!(writer, "{} {}", snapshot.step, snapshot.ez.iter().join(" "))?;
    }

    Ok(())
}

/// Raw and normalized spectra for `0 <= f <= fmax`:
/// `f incident reflected incident/max reflected/max`.
pub fn write_spectra(results: &Results, fmax: f64, dir: &Path) -> Result<()> {
    let file = File::create(dir.join("spectra"))?;
    let mut writer = BufWriter::new(file);

    let incident = results.analysis.incident.band(0.0, fmax);
    let reflected = results.analysis.reflected.band(0.0, fmax);
    let normalized = results.normalized_spectra(fmax);

    for ((f, inc), ((_, refl), (_, inc_norm, refl_norm))) in incident
        .into_iter()
        .zip(reflected.into_iter().zip(normalized))
    {
        writeln!(writer, "{} {} {} {} {}", f, inc, refl, inc_norm, refl_norm)?;
    }

    Ok(())
}

/// Reflection coefficient over the analysis band: `f |Γ|`.
pub fn write_reflection(results: &Results, dir: &Path) -> Result<()> {
    let file = File::create(dir.join("reflection"))?;
    let mut writer = BufWriter::new(file);

    for (f, gamma) in results.analysis.coefficient.iter() {
        writeln!(writer, "{} {}", f, gamma)?;
    }

    Ok(())
}

#[derive(Serialize)]
struct ProbeSummary {
    position: usize,
    peak_ez: f64,
    peak_step: usize,
}

#[derive(Serialize)]
struct Summary<'a> {
    settings: &'a Settings,
    dt: f64,
    dominant_frequency: f64,
    incident_peak_frequency: Option<f64>,
    mean_reflection: Option<f64>,
    max_reflection: Option<f64>,
    probes: Vec<ProbeSummary>,
}

/// Run parameters and headline numbers as `summary.json`.
pub fn write_summary(
    settings: &Settings,
    results: &Results,
    probes: &[Probe],
    dir: &Path,
) -> Result<()> {
    let probes = probes
        .iter()
        .map(|probe| {
            let (peak_step, peak_ez) = probe
                .e
                .iter()
                .copied()
                .enumerate()
                .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
                .unwrap_or((0, 0.0));
            ProbeSummary {
                position: probe.position,
                peak_ez,
                peak_step,
            }
        })
        .collect();

    let summary = Summary {
        settings,
        dt: settings.dt(),
        dominant_frequency: results.dominant_frequency,
        incident_peak_frequency: results.incident_peak.map(|(f, _)| f),
        mean_reflection: results.mean_coefficient(),
        max_reflection: results.max_coefficient(),
        probes,
    };

    let file = File::create(dir.join("summary.json"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &summary)?;

    Ok(())
}
