//! Per-cell material parameters built from a layer stack.
//!
//! The domain is vacuum up to a start index, then each layer fills a
//! contiguous run of cells whose length is its thickness rounded to whole
//! cells. The final layer always extends to the end of the domain.

use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PERMEABILITY;
use crate::error::{Result, SimError};

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> Vec<Layer> {
        vec![
            Layer::new(5.5, Some(0.3)),
            Layer::new(2.3, Some(0.2)),
            Layer::new(1.0, None),
        ]
    }

    #[test]
    fn layered_scenario() {
        let medium = Medium::from_layers(600, 5e-3, 300, &stack()).unwrap();
        assert_eq!(medium.eps.len(), 600);
        assert_eq!(medium.mu.len(), 599);
        assert_eq!(medium.interfaces, vec![300, 360, 400]);
        assert_eq!(medium.eps[299], 1.0);
        assert_eq!(medium.eps[300], 5.5);
        assert_eq!(medium.eps[359], 5.5);
        assert_eq!(medium.eps[360], 2.3);
        assert_eq!(medium.eps[399], 2.3);
        assert_eq!(medium.eps[400], 1.0);
        assert_eq!(medium.eps[599], 1.0);
        assert!(medium.mu.iter().all(|&m| m == 1.0));
    }

    #[test]
    fn construction_is_pure() {
        let a = Medium::from_layers(600, 5e-3, 300, &stack()).unwrap();
        let b = Medium::from_layers(600, 5e-3, 300, &stack()).unwrap();
        assert_eq!(a, b);
        let bits = |x: &Array1<f64>| x.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.eps), bits(&b.eps));
        assert_eq!(bits(&a.mu), bits(&b.mu));
    }

    #[test]
    fn stack_too_thick() {
        let layers = vec![Layer::new(4.0, Some(2.0)), Layer::new(1.0, None)];
        let err = Medium::from_layers(600, 5e-3, 300, &layers).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }

    #[test]
    fn huge_thickness_is_rejected() {
        let layers = vec![Layer::new(4.0, Some(1e30)), Layer::new(1.0, None)];
        let err = Medium::from_layers(600, 5e-3, 300, &layers).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));

        let layers = vec![Layer::new(4.0, Some(f64::INFINITY)), Layer::new(1.0, None)];
        let err = Medium::from_layers(600, 5e-3, 300, &layers).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));

        let layers = vec![Layer::new(4.0, Some(f64::NAN)), Layer::new(1.0, None)];
        let err = Medium::from_layers(600, 5e-3, 300, &layers).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }

    #[test]
    fn last_layer_thickness_counts() {
        let layers = vec![Layer::new(4.0, Some(1.0)), Layer::new(2.0, Some(0.6))];
        let err = Medium::from_layers(600, 5e-3, 300, &layers).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }

    #[test]
    fn non_positive_parameters() {
        let layers = vec![Layer::new(0.0, None)];
        assert!(Medium::from_layers(600, 5e-3, 300, &layers).is_err());

        let mut magnetic = Layer::new(2.0, None);
        magnetic.permeability = -1.0;
        assert!(Medium::from_layers(600, 5e-3, 300, &[magnetic]).is_err());
    }

    #[test]
    fn missing_inner_thickness() {
        let layers = vec![Layer::new(2.0, None), Layer::new(1.0, None)];
        assert!(Medium::from_layers(600, 5e-3, 300, &layers).is_err());
    }

    #[test]
    fn magnetic_layer() {
        let mut layer = Layer::new(2.0, None);
        layer.permeability = 3.0;
        let medium = Medium::from_layers(10, 1.0, 5, &[layer]).unwrap();
        assert_eq!(medium.mu.slice(s![..5]).sum(), 5.0);
        assert!(medium.mu.slice(s![5..]).iter().all(|&m| m == 3.0));
        assert_eq!(medium.mu.len(), 9);
    }

    #[test]
    fn empty_stack_is_vacuum() {
        let medium = Medium::from_layers(50, 1e-3, 25, &[]).unwrap();
        assert_eq!(medium, Medium::vacuum(50).unwrap());
    }
}

fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn default_permeability() -> f64 {
    DEFAULT_PERMEABILITY
}

/// A homogeneous slab in the layer stack.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Layer {
    pub permittivity: f64,
    /// Thickness in metres. Only the last layer may omit it.
    #[serde(default)]
    pub thickness: Option<f64>,
    #[serde(default = "default_permeability")]
    pub permeability: f64,
}

impl Layer {
    pub fn new(permittivity: f64, thickness: Option<f64>) -> Self {
        Self {
            permittivity,
            thickness,
            permeability: DEFAULT_PERMEABILITY,
        }
    }
}

/// Relative permittivity on the Ez nodes and permeability on the Hy nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Medium {
    pub eps: Array1<f64>,
    pub mu: Array1<f64>,
    /// Cell indices where a layer begins.
    pub interfaces: Vec<usize>,
}

impl Medium {
    /// Uniform vacuum over `max_size` cells.
    pub fn vacuum(max_size: usize) -> Result<Self> {
        if max_size < 3 {
            return Err(SimError::Domain(format!(
                "domain needs at least 3 cells, got {}",
                max_size
            )));
        }
        Ok(Self {
            eps: Array1::ones(max_size),
            mu: Array1::ones(max_size - 1),
            interfaces: Vec::new(),
        })
    }

    /// Builds the medium for `layers` stacked from cell `start` onwards.
    pub fn from_layers(max_size: usize, dx: f64, start: usize, layers: &[Layer]) -> Result<Self> {
        let mut medium = Self::vacuum(max_size)?;
        if dx.is_nan() || dx <= 0.0 {
            return Err(SimError::Configuration(format!(
                "cell size must be positive, got {}",
                dx
            )));
        }
        if layers.is_empty() {
            return Ok(medium);
        }
        if start >= max_size {
            return Err(SimError::Configuration(format!(
                "layer stack starts at cell {} outside a domain of {} cells",
                start, max_size
            )));
        }

        let mu_len = medium.mu.len();
        let mut cursor = start;
        for (i, layer) in layers.iter().enumerate() {
            if !is_positive(layer.permittivity) || !is_positive(layer.permeability) {
                return Err(SimError::Configuration(format!(
                    "layer {} has non-positive parameters: eps = {}, mu = {}",
                    i, layer.permittivity, layer.permeability
                )));
            }

            let last = i + 1 == layers.len();
            let cells = match layer.thickness {
                Some(t) if t.is_finite() && t >= 0.0 => Some((t / dx).round() as usize),
                Some(t) => {
                    return Err(SimError::Configuration(format!(
                        "layer {} has invalid thickness {}",
                        i, t
                    )))
                }
                None if last => None,
                None => {
                    return Err(SimError::Configuration(format!(
                        "layer {} needs a thickness, only the last layer may omit it",
                        i
                    )))
                }
            };
            if let Some(cells) = cells {
                if cells > max_size - cursor {
                    return Err(SimError::Configuration(format!(
                        "layer {} spans {} cells from cell {}, beyond the domain of {} cells",
                        i, cells, cursor, max_size
                    )));
                }
            }

            let end = if last {
                max_size
            } else {
                cursor + cells.unwrap_or(0)
            };

            medium.interfaces.push(cursor);
            medium
                .eps
                .slice_mut(s![cursor..end])
                .fill(layer.permittivity);
            medium
                .mu
                .slice_mut(s![cursor.min(mu_len)..end.min(mu_len)])
                .fill(layer.permeability);

            cursor = end;
        }

        Ok(medium)
    }

    /// Number of Ez cells.
    pub fn num_cells(&self) -> usize {
        self.eps.len()
    }
}
