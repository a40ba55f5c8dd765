//! Absorbing boundaries at the two ends of the Ez grid.
//!
//! `SimpleCopy` copies the neighbouring interior value before the E update,
//! which is exact for a vacuum edge at a Courant number of one.
//! `Mur1` is the first-order Mur condition, which uses the local wave speed
//! and so also absorbs in dielectric edges or at smaller Courant numbers.

use clap::ValueEnum;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::medium::Medium;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_copy() {
        let medium = Medium::vacuum(5).unwrap();
        let mut boundary = Boundary::new(BoundaryKind::SimpleCopy, 1.0, &medium);
        let mut ez = Array1::from(vec![9.0, 1.0, 2.0, 3.0, 9.0]);
        boundary.before_update(&mut ez);
        assert_eq!(ez, Array1::from(vec![1.0, 1.0, 2.0, 3.0, 3.0]));
        boundary.after_update(&mut ez);
        assert_eq!(ez, Array1::from(vec![1.0, 1.0, 2.0, 3.0, 3.0]));
    }

    #[test]
    fn mur_matches_copy_in_vacuum() {
        let medium = Medium::vacuum(5).unwrap();
        let mut boundary = Boundary::new(BoundaryKind::Mur1, 1.0, &medium);
        let mut ez = Array1::from(vec![9.0, 1.0, 2.0, 3.0, 9.0]);
        boundary.before_update(&mut ez);
        // interior update
        ez[1] = 4.0;
        ez[3] = 5.0;
        boundary.after_update(&mut ez);
        assert_eq!(ez[0], 1.0);
        assert_eq!(ez[4], 3.0);
    }

    #[test]
    fn mur_coefficients() {
        let mut medium = Medium::vacuum(5).unwrap();
        medium.eps[4] = 4.0;
        let mut boundary = Boundary::new(BoundaryKind::Mur1, 0.5, &medium);
        match boundary {
            Boundary::Mur1 {
                coef_left,
                coef_right,
                ..
            } => {
                assert!((coef_left - (-1.0 / 3.0)).abs() < 1e-12);
                assert!((coef_right - (-0.6)).abs() < 1e-12);
            }
            _ => panic!("expected a Mur boundary"),
        }

        let mut ez = Array1::from(vec![1.0, 2.0, 0.0, 2.0, 1.0]);
        boundary.before_update(&mut ez);
        ez[1] = 3.0;
        boundary.after_update(&mut ez);
        // 2 + (-1/3) * (3 - 1)
        assert!((ez[0] - 4.0 / 3.0).abs() < 1e-12);
        // 2 + (-0.6) * (2 - 1)
        assert!((ez[4] - 1.4).abs() < 1e-12);
    }
}

/// Boundary condition selected in the settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    #[default]
    SimpleCopy,
    Mur1,
}

/// Boundary condition together with the state it carries between phases.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    SimpleCopy,
    Mur1 {
        coef_left: f64,
        coef_right: f64,
        old_left: f64,
        old_right: f64,
    },
}

impl Boundary {
    pub fn new(kind: BoundaryKind, sc: f64, medium: &Medium) -> Self {
        match kind {
            BoundaryKind::SimpleCopy => Boundary::SimpleCopy,
            BoundaryKind::Mur1 => {
                let last = medium.eps.len() - 1;
                let coef = |eps: f64, mu: f64| {
                    let local = sc / (eps * mu).sqrt();
                    (local - 1.0) / (local + 1.0)
                };
                Boundary::Mur1 {
                    coef_left: coef(medium.eps[0], medium.mu[0]),
                    coef_right: coef(medium.eps[last], medium.mu[last - 1]),
                    old_left: 0.0,
                    old_right: 0.0,
                }
            }
        }
    }

    /// Runs between the H update and the E update.
    pub fn before_update(&mut self, ez: &mut Array1<f64>) {
        let last = ez.len() - 1;
        match self {
            Boundary::SimpleCopy => {
                ez[0] = ez[1];
                ez[last] = ez[last - 1];
            }
            Boundary::Mur1 {
                old_left,
                old_right,
                ..
            } => {
                *old_left = ez[1];
                *old_right = ez[last - 1];
            }
        }
    }

    /// Runs once the interior Ez cells hold the new step.
    pub fn after_update(&mut self, ez: &mut Array1<f64>) {
        if let Boundary::Mur1 {
            coef_left,
            coef_right,
            old_left,
            old_right,
        } = self
        {
            let last = ez.len() - 1;
            ez[0] = *old_left + *coef_left * (ez[1] - ez[0]);
            ez[last] = *old_right + *coef_right * (ez[last - 1] - ez[last]);
        }
    }
}
