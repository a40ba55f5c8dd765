use std::env;
use std::fmt;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::info;
use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryKind;
use crate::config::{DEFAULT_FFT_SIZE, DEFAULT_INCIDENT_WINDOW, SPEED_OF_LIGHT};
use crate::error::SimError;
use crate::medium::Layer;

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        domain_length = 1.0
        dx = 0.01
        courant = 1.0
        max_time = 300
        source_pos = 20
        probes = [10, 40]

        [[layers]]
        permittivity = 4.0

        [source]
        np = 20.0
        md = 1.5

        [spectrum]
        size = 1024
        incident_probe = 1
        reflected_probe = 0
        fmin = 1e9
        fmax = 2e9
    "#;

    fn minimal() -> Settings {
        toml::from_str(MINIMAL).unwrap()
    }

    #[test]
    fn defaults() {
        let settings = minimal();
        assert_eq!(settings.max_size(), 100);
        assert_eq!(settings.layer_start(), 50);
        assert_eq!(settings.boundary, BoundaryKind::SimpleCopy);
        assert_eq!(settings.source.magnitude, 1.0);
        assert_eq!(settings.spectrum.incident_window, DEFAULT_INCIDENT_WINDOW);
        assert_eq!(settings.snapshot_interval, 0);
        assert_eq!(settings.layers[0].permeability, 1.0);
        assert!(settings.layers[0].thickness.is_none());
        assert!((settings.dt() - 0.01 / SPEED_OF_LIGHT).abs() < 1e-24);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn default_file() {
        let settings = load_default_config().unwrap();
        assert_eq!(settings.max_size(), 600);
        assert_eq!(settings.max_time, 1700);
        assert_eq!(settings.source_pos, 100);
        assert_eq!(settings.probes, vec![50, 150]);
        assert_eq!(settings.layers.len(), 3);
        assert_eq!(settings.spectrum.size, DEFAULT_FFT_SIZE);
    }

    #[test]
    fn rejects_unstable_courant() {
        let mut settings = minimal();
        settings.courant = 1.2;
        assert_eq!(
            settings.validate(),
            Err(SimError::NumericalInstability { courant: 1.2 })
        );
    }

    #[test]
    fn rejects_bad_positions() {
        let mut settings = minimal();
        settings.source_pos = 99;
        assert!(matches!(settings.validate(), Err(SimError::Domain(_))));

        let mut settings = minimal();
        settings.probes = vec![10, 100];
        assert!(matches!(settings.validate(), Err(SimError::Domain(_))));

        let mut settings = minimal();
        settings.spectrum.incident_probe = 2;
        assert!(matches!(settings.validate(), Err(SimError::Configuration(_))));
    }

    #[test]
    fn rejects_short_transform() {
        let mut settings = minimal();
        settings.spectrum.size = 256;
        assert!(matches!(settings.validate(), Err(SimError::Configuration(_))));

        settings.spectrum.size = 1000;
        assert!(matches!(settings.validate(), Err(SimError::Configuration(_))));
    }

    #[test]
    fn rejects_zero_steps() {
        let mut settings = minimal();
        settings.max_time = 0;
        assert!(matches!(settings.validate(), Err(SimError::Domain(_))));
    }
}

/// Ricker pulse shape. The local `eps` and `mu` come from the source cell.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct SourceSettings {
    pub np: f64,
    pub md: f64,
    #[serde(default = "default_magnitude")]
    pub magnitude: f64,
}

/// Post-processing of the probe records.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct SpectrumSettings {
    #[serde(default = "default_fft_size")]
    pub size: usize,
    /// Index into `probes` of the probe that sees the outgoing pulse.
    pub incident_probe: usize,
    /// Index into `probes` of the probe that sees the reflection.
    pub reflected_probe: usize,
    #[serde(default = "default_incident_window")]
    pub incident_window: usize,
    pub fmin: f64,
    pub fmax: f64,
    /// Upper frequency of the written spectra.
    #[serde(default = "default_display_fmax")]
    pub display_fmax: f64,
}

/// Runtime configuration for a simulation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    /// Domain length in metres.
    pub domain_length: f64,
    /// Cell size in metres.
    pub dx: f64,
    pub courant: f64,
    pub max_time: usize,
    pub source_pos: usize,
    pub probes: Vec<usize>,
    /// First cell of the layer stack, the middle of the domain if unset.
    #[serde(default)]
    pub layer_start: Option<usize>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    pub source: SourceSettings,
    #[serde(default)]
    pub boundary: BoundaryKind,
    pub spectrum: SpectrumSettings,
    /// Keep an Ez snapshot every this many steps, 0 keeps none.
    #[serde(default)]
    pub snapshot_interval: usize,
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

fn default_magnitude() -> f64 {
    1.0
}

fn default_fft_size() -> usize {
    DEFAULT_FFT_SIZE
}

fn default_incident_window() -> usize {
    DEFAULT_INCIDENT_WINDOW
}

fn default_display_fmax() -> f64 {
    6e9
}

fn default_directory() -> PathBuf {
    PathBuf::from("output")
}

impl Settings {
    /// Number of Ez cells.
    pub fn max_size(&self) -> usize {
        (self.domain_length / self.dx).round() as usize
    }

    /// Time step in seconds.
    pub fn dt(&self) -> f64 {
        self.courant * self.dx / SPEED_OF_LIGHT
    }

    pub fn layer_start(&self) -> usize {
        self.layer_start.unwrap_or(self.max_size() / 2)
    }

    /// Checks everything that can be checked before the first step.
    pub fn validate(&self) -> std::result::Result<(), SimError> {
        if !self.dx.is_finite() || self.dx <= 0.0 {
            return Err(SimError::Configuration(format!(
                "cell size must be positive, got {}",
                self.dx
            )));
        }
        if !self.domain_length.is_finite() || self.domain_length <= 0.0 {
            return Err(SimError::Configuration(format!(
                "domain length must be positive, got {}",
                self.domain_length
            )));
        }
        if self.courant.is_nan() || self.courant <= 0.0 {
            return Err(SimError::Configuration(format!(
                "Courant number must be positive, got {}",
                self.courant
            )));
        }
        if self.courant > 1.0 {
            return Err(SimError::NumericalInstability {
                courant: self.courant,
            });
        }
        if self.max_time == 0 {
            return Err(SimError::Domain("number of steps must be positive".into()));
        }

        let max_size = self.max_size();
        if max_size < 3 {
            return Err(SimError::Domain(format!(
                "domain needs at least 3 cells, got {}",
                max_size
            )));
        }
        if self.source_pos < 1 || self.source_pos + 2 > max_size {
            return Err(SimError::Domain(format!(
                "source cell {} must lie within [1, {}]",
                self.source_pos,
                max_size - 2
            )));
        }
        if let Some(&pos) = self.probes.iter().find(|&&p| p >= max_size) {
            return Err(SimError::Domain(format!(
                "probe cell {} is outside a grid of {} cells",
                pos, max_size
            )));
        }
        if self.source.np.is_nan() || self.source.np <= 0.0 {
            return Err(SimError::Configuration(format!(
                "samples per wavelength must be positive, got {}",
                self.source.np
            )));
        }

        let spectrum = &self.spectrum;
        for (name, index) in [
            ("incident", spectrum.incident_probe),
            ("reflected", spectrum.reflected_probe),
        ] {
            if index >= self.probes.len() {
                return Err(SimError::Configuration(format!(
                    "{} probe index {} but only {} probes are defined",
                    name,
                    index,
                    self.probes.len()
                )));
            }
        }
        if !spectrum.size.is_power_of_two() {
            return Err(SimError::Configuration(format!(
                "transform size must be a power of two, got {}",
                spectrum.size
            )));
        }
        if spectrum.size < self.max_time {
            return Err(SimError::Configuration(format!(
                "transform size {} is shorter than the {} recorded steps",
                spectrum.size, self.max_time
            )));
        }
        if spectrum.fmin.is_nan() || spectrum.fmax.is_nan() || spectrum.fmin >= spectrum.fmax {
            return Err(SimError::Configuration(format!(
                "empty frequency band [{}, {}]",
                spectrum.fmin, spectrum.fmax
            )));
        }

        Ok(())
    }
}

/// Loads `config/default.toml` without environment or command-line overrides.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let settings: Settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("Error loading configuration")?
        .try_deserialize()
        .context("Error deserializing configuration")?;

    settings.validate()?;

    Ok(settings)
}

/// Loads the configuration file, then applies `FDTD_*` environment variables
/// and command-line flags on top.
pub fn load_config() -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    let config_file = if local_config.exists() {
        info!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        info!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let mut config: Settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("fdtd"))
        .build()
        .context("Error loading configuration")?
        .try_deserialize()
        .context("Error deserializing configuration")?;

    let args = CliArgs::parse();

    if let Some(dx) = args.dx {
        config.dx = dx;
    }
    if let Some(length) = args.length {
        config.domain_length = length;
    }
    if let Some(courant) = args.courant {
        config.courant = courant;
    }
    if let Some(steps) = args.steps {
        config.max_time = steps;
    }
    if let Some(source) = args.source {
        config.source_pos = source;
    }
    if let Some(probes) = args.probes {
        config.probes = probes;
    }
    if let Some(boundary) = args.boundary {
        config.boundary = boundary;
    }
    if let Some(size) = args.size {
        config.spectrum.size = size;
    }
    if let Some(fmin) = args.fmin {
        config.spectrum.fmin = fmin;
    }
    if let Some(fmax) = args.fmax {
        config.spectrum.fmax = fmax;
    }
    if let Some(interval) = args.snapshots {
        config.snapshot_interval = interval;
    }
    if let Some(dir) = args.dir {
        config.directory = dir;
    }

    config.validate()?;

    info!("{}", config);

    Ok(config)
}

/// Finds the directory holding `config/`.
/// 1. `CARGO_MANIFEST_DIR` when run through cargo.
/// 2. `FDTD_ROOT_DIR` if set.
/// 3. The nearest ancestor of the executable with a `config` subdirectory.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("FDTD_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe().context("Failed to get current executable path")?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(|dir| dir.to_path_buf())
        .ok_or_else(|| anyhow!("Could not find project root directory"))
}

#[derive(Parser, Debug)]
#[command(version, about = "1D FDTD reflection from a layered dielectric")]
pub struct CliArgs {
    /// Cell size in metres.
    #[arg(long)]
    dx: Option<f64>,

    /// Domain length in metres.
    #[arg(short, long)]
    length: Option<f64>,

    /// Courant number. Must not exceed 1.
    #[arg(short, long)]
    courant: Option<f64>,

    /// Number of time steps.
    #[arg(short = 'n', long)]
    steps: Option<usize>,

    /// Source cell.
    #[arg(short, long)]
    source: Option<usize>,

    /// Probe cells, separated by spaces.
    #[arg(short, long, num_args = 1.., value_delimiter = ' ')]
    probes: Option<Vec<usize>>,

    /// Boundary condition at both ends of the grid.
    #[arg(short, long, value_enum)]
    boundary: Option<BoundaryKind>,

    /// Zero-padded transform length, a power of two.
    #[arg(long)]
    size: Option<usize>,

    /// Lower edge of the reflection coefficient band in Hz.
    #[arg(long)]
    fmin: Option<f64>,

    /// Upper edge of the reflection coefficient band in Hz.
    #[arg(long)]
    fmax: Option<f64>,

    /// Keep an Ez snapshot every n steps, 0 keeps none.
    #[arg(long)]
    snapshots: Option<usize>,

    /// Output directory.
    #[arg(short, long)]
    dir: Option<PathBuf>,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Cells: {} (dx = {:.3e} m)
  - Courant: {:.3}
  - Steps: {} (dt = {:.3e} s)
  - Source: cell {} (Np = {}, Md = {})
  - Probes: {:?}
  - Layers: {} from cell {}
  - Boundary: {:?}
  - Transform size: {}
  - Band: [{:.3e}, {:.3e}] Hz
  ",
            self.max_size(),
            self.dx,
            self.courant,
            self.max_time,
            self.dt(),
            self.source_pos,
            self.source.np,
            self.source.md,
            self.probes,
            self.layers.len(),
            self.layer_start(),
            self.boundary,
            self.spectrum.size,
            self.spectrum.fmin,
            self.spectrum.fmax,
        )
    }
}
