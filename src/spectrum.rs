//! Spectra of recorded probe signals and the reflection coefficient.
//!
//! Signals are zero-padded to a power-of-two length, transformed, and shifted
//! so the zero-frequency bin sits in the middle of the axis. Index `k` of a
//! shifted spectrum of length `n` is at frequency `(k - n/2) * df` with
//! `df = 1 / (n * dt)`.

use log::{debug, warn};
use ndarray::{s, Array1};
use ndarray_stats::QuantileExt;
use num_complex::Complex64;
use rustfft::FftPlanner;

use crate::error::{Result, SimError};


/// Frequency axis matching a shifted spectrum of length `size`.
pub fn frequency_axis(size: usize, dt: f64) -> Array1<f64> {
    let df = 1.0 / (size as f64 * dt);
    let half = (size / 2) as f64;
    Array1::from_iter((0..size).map(|k| (k as f64 - half) * df))
}

/// Moves the zero-frequency bin to the centre, as `numpy.fft.fftshift` does.
pub fn fft_shift(x: &Array1<f64>) -> Array1<f64> {
    let n = x.len();
    let half = n / 2;
    Array1::from_iter((0..n).map(|i| x[(i + n - half) % n]))
}

/// Magnitude spectrum on a shifted frequency axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub frequencies: Array1<f64>,
    pub magnitudes: Array1<f64>,
}

impl Spectrum {
    /// Zero-pads `signal` to `size` samples and returns the shifted magnitude
    /// of its discrete Fourier transform.
    pub fn from_signal(signal: &[f64], size: usize, dt: f64) -> Result<Self> {
        check_size(size)?;
        if signal.len() > size {
            return Err(SimError::Configuration(format!(
                "transform size {} is shorter than the {} recorded samples",
                size,
                signal.len()
            )));
        }

        let mut buffer: Vec<Complex64> = signal
            .iter()
            .map(|&x| Complex64::new(x, 0.0))
            .chain(std::iter::repeat(Complex64::new(0.0, 0.0)))
            .take(size)
            .collect();
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(size);
        fft.process(&mut buffer);

        let magnitudes = Array1::from_iter(buffer.iter().map(|c| c.norm()));
        Ok(Self {
            frequencies: frequency_axis(size, dt),
            magnitudes: fft_shift(&magnitudes),
        })
    }

    /// Bin width.
    pub fn df(&self) -> f64 {
        let n = self.frequencies.len();
        if n < 2 {
            return 0.0;
        }
        self.frequencies[1] - self.frequencies[0]
    }

    /// Index of the bin closest to `f`, clamped to the axis. `None` for an
    /// empty spectrum.
    pub fn bin(&self, f: f64) -> Option<usize> {
        let n = self.frequencies.len();
        if n == 0 {
            return None;
        }
        if n == 1 {
            return Some(0);
        }
        let k = (f / self.df()).round() + (n / 2) as f64;
        Some(k.clamp(0.0, (n - 1) as f64) as usize)
    }

    /// Largest magnitude over all bins.
    pub fn max(&self) -> f64 {
        self.magnitudes.iter().fold(0.0, |m, &v| m.max(v))
    }

    /// Frequency and magnitude of the largest non-negative frequency bin.
    pub fn peak(&self) -> Option<(f64, f64)> {
        let half = self.magnitudes.len() / 2;
        let k = self.magnitudes.slice(s![half..]).argmax().ok()? + half;
        Some((self.frequencies[k], self.magnitudes[k]))
    }

    /// Same spectrum divided by `norm`.
    pub fn normalized(&self, norm: f64) -> Spectrum {
        Spectrum {
            frequencies: self.frequencies.clone(),
            magnitudes: &self.magnitudes / norm,
        }
    }

    /// `(frequency, magnitude)` pairs with `fmin <= f <= fmax`.
    pub fn band(&self, fmin: f64, fmax: f64) -> Vec<(f64, f64)> {
        self.frequencies
            .iter()
            .zip(self.magnitudes.iter())
            .filter(|(&f, _)| f >= fmin && f <= fmax)
            .map(|(&f, &m)| (f, m))
            .collect()
    }
}

fn check_size(size: usize) -> Result<()> {
    if size < 2 || !size.is_power_of_two() {
        return Err(SimError::Configuration(format!(
            "transform size must be a power of two, got {}",
            size
        )));
    }
    Ok(())
}

/// Incident and reflected spectra plus their ratio over a frequency band.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionAnalysis {
    pub incident: Spectrum,
    pub reflected: Spectrum,
    /// `(f, |reflected| / |incident|)` for `fmin <= f <= fmax`.
    pub coefficient: Vec<(f64, f64)>,
}

/// Turns completed probe series into a reflection coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralAnalyzer {
    pub size: usize,
    pub dt: f64,
    /// Leading samples of the incident series that hold the outgoing pulse.
    pub incident_window: usize,
}

impl SpectralAnalyzer {
    pub fn new(size: usize, dt: f64, incident_window: usize) -> Result<Self> {
        check_size(size)?;
        if dt.is_nan() || dt <= 0.0 {
            return Err(SimError::Configuration(format!(
                "time step must be positive, got {}",
                dt
            )));
        }
        if incident_window == 0 {
            return Err(SimError::Configuration(
                "incident window must hold at least one sample".into(),
            ));
        }
        Ok(Self {
            size,
            dt,
            incident_window,
        })
    }

    /// Spectrum of the incident window, the rest of the series treated as zero.
    pub fn incident_spectrum(&self, incident: &[f64]) -> Result<Spectrum> {
        if incident.len() > self.size {
            return Err(SimError::Configuration(format!(
                "transform size {} is shorter than the {} incident samples",
                self.size,
                incident.len()
            )));
        }
        let window = self.incident_window.min(incident.len());
        Spectrum::from_signal(&incident[..window], self.size, self.dt)
    }

    /// Spectrum of the full reflected series.
    pub fn reflected_spectrum(&self, reflected: &[f64]) -> Result<Spectrum> {
        Spectrum::from_signal(reflected, self.size, self.dt)
    }

    /// Computes both spectra and `|reflected| / |incident|` over
    /// `[fmin, fmax]`. Bins where the incident spectrum vanishes give large
    /// or non-finite ratios; restricting the band is up to the caller.
    pub fn analyze(
        &self,
        incident: &[f64],
        reflected: &[f64],
        fmin: f64,
        fmax: f64,
    ) -> Result<ReflectionAnalysis> {
        if fmin.is_nan() || fmax.is_nan() || fmin >= fmax {
            return Err(SimError::Configuration(format!(
                "empty frequency band [{}, {}]",
                fmin, fmax
            )));
        }

        let (incident, reflected) = rayon::join(
            || self.incident_spectrum(incident),
            || self.reflected_spectrum(reflected),
        );
        let (incident, reflected) = (incident?, reflected?);

        let coefficient: Vec<(f64, f64)> = incident
            .frequencies
            .iter()
            .zip(incident.magnitudes.iter().zip(reflected.magnitudes.iter()))
            .filter(|(&f, _)| f >= fmin && f <= fmax)
            .map(|(&f, (&inc, &refl))| (f, refl / inc))
            .collect();

        if coefficient.iter().any(|(_, g)| !g.is_finite()) {
            warn!("reflection coefficient is not finite somewhere in [{}, {}]", fmin, fmax);
        }
        debug!(
            "reflection coefficient over {} bins, df = {:.3e} Hz",
            coefficient.len(),
            incident.df()
        );

        Ok(ReflectionAnalysis {
            incident,
            reflected,
            coefficient,
        })
    }
}
