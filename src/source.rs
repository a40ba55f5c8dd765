//! Ricker wavelet excitation.
//!
//! The second derivative of a Gaussian, with near-zero DC content and a
//! single dominant frequency set by `np`. The delay `md` lets the pulse rise
//! from numerical zero at the first step.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests {
    use super::*;

    fn ricker() -> Ricker {
        Ricker::new(30.0, 1.5, 1.0, 1.0, 1.0, 1.0)
    }

    #[test]
    fn peak_at_delay() {
        let source = ricker();
        // sc * q / np == md
        assert_eq!(source.evaluate(0.0, 45.0), 1.0);
        assert!(source.evaluate(0.0, 44.0) < 1.0);
        assert!(source.evaluate(0.0, 46.0) < 1.0);

        let scaled = Ricker::new(30.0, 1.5, 4.0, 1.0, 1.0, 2.5);
        // q - m * sqrt(eps * mu) == 45 with m = 10
        assert_eq!(scaled.evaluate(10.0, 65.0), 2.5);
    }

    #[test]
    fn zero_crossings() {
        let source = ricker();
        let offset = 30.0 * (0.5f64).sqrt() / PI;
        let before = 45.0 - offset;
        let after = 45.0 + offset;
        assert!(source.evaluate(0.0, before).abs() < 1e-12);
        assert!(source.evaluate(0.0, after).abs() < 1e-12);
        // positive lobe between the crossings, negative outside
        assert!(source.evaluate(0.0, before + 1.0) > 0.0);
        assert!(source.evaluate(0.0, before - 1.0) < 0.0);
        assert!(source.evaluate(0.0, after + 1.0) < 0.0);
    }

    #[test]
    fn decays() {
        let source = ricker();
        assert!(source.evaluate(0.0, 500.0).abs() < 1e-12);
        assert!(source.evaluate(0.0, 0.0).abs() < 1e-7);
    }

    #[test]
    fn pure() {
        let source = ricker();
        let a = source.evaluate(-0.5, 12.5);
        let _ = source.evaluate(3.0, 80.0);
        assert_eq!(a.to_bits(), source.evaluate(-0.5, 12.5).to_bits());
        assert_eq!(source.h_phase(7), source.evaluate(0.0, 7.0));
        assert_eq!(source.e_phase(7), source.evaluate(-0.5, 7.5));
    }

    #[test]
    fn dominant_frequency() {
        let dt = 5e-3 / 3e8;
        let f = ricker().dominant_frequency(dt);
        assert!((f - 2e9).abs() < 1.0, "f: {}", f);
    }
}

/// Ricker pulse parameters. Evaluating it never mutates anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ricker {
    /// Samples per characteristic wavelength.
    pub np: f64,
    /// Delay in characteristic wavelengths.
    pub md: f64,
    pub eps: f64,
    pub mu: f64,
    pub sc: f64,
    pub magnitude: f64,
}

impl Ricker {
    pub fn new(np: f64, md: f64, eps: f64, mu: f64, sc: f64, magnitude: f64) -> Self {
        Self {
            np,
            md,
            eps,
            mu,
            sc,
            magnitude,
        }
    }

    /// Value of the pulse at spatial offset `m` and step `q`, both in grid
    /// units and possibly fractional.
    pub fn evaluate(&self, m: f64, q: f64) -> f64 {
        let arg = self.sc * (q - m * (self.eps * self.mu).sqrt()) / self.np - self.md;
        let t = PI * PI * arg * arg;
        self.magnitude * (1.0 - 2.0 * t) * (-t).exp()
    }

    /// Correction subtracted from Hy just left of the source cell at step `q`.
    pub fn h_phase(&self, q: usize) -> f64 {
        self.evaluate(0.0, q as f64)
    }

    /// Correction added to Ez at the source cell at step `q`, half a cell and
    /// half a step behind the magnetic one.
    pub fn e_phase(&self, q: usize) -> f64 {
        self.evaluate(-0.5, q as f64 + 0.5)
    }

    /// Frequency of the spectral maximum for a time step `dt`.
    pub fn dominant_frequency(&self, dt: f64) -> f64 {
        self.sc / (self.np * dt)
    }
}
