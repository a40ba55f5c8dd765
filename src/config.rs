use std::f64::consts::PI;

/// Speed of light in vacuum used to derive the time step, in m/s.
pub const SPEED_OF_LIGHT: f64 = 3e8;
/// Free-space wave impedance.
pub const W0: f64 = 120.0 * PI;
/// Default zero-padded transform length for the spectral analysis.
pub const DEFAULT_FFT_SIZE: usize = 1 << 18;
/// Default number of leading samples of the incident probe that hold the
/// outgoing pulse before it meets the layered medium.
pub const DEFAULT_INCIDENT_WINDOW: usize = 200;
/// Relative permeability of the medium unless a layer says otherwise.
pub const DEFAULT_PERMEABILITY: f64 = 1.0;
