//! Post-processed outcome of a run.

use std::fmt;

use crate::spectrum::ReflectionAnalysis;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::SpectralAnalyzer;

    fn results() -> Results {
        let incident: Vec<f64> = (0..32)
            .map(|i| {
                let t = (i as f64 - 10.0) / 3.0;
                (1.0 - 2.0 * t * t) * (-t * t).exp()
            })
            .collect();
        let reflected: Vec<f64> = incident.iter().map(|x| 0.25 * x).collect();
        let analyzer = SpectralAnalyzer::new(64, 1.0, 32).unwrap();
        let analysis = analyzer.analyze(&incident, &reflected, 0.05, 0.25).unwrap();
        Results::new(analysis, 0.1)
    }

    #[test]
    fn coefficient_stats() {
        let results = results();
        assert!((results.mean_coefficient().unwrap() - 0.25).abs() < 1e-9);
        assert!((results.max_coefficient().unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn normalized_spectra() {
        let results = results();
        let rows = results.normalized_spectra(0.5);
        assert_eq!(rows.first().unwrap().0, 0.0);
        assert!(rows.iter().all(|r| r.0 >= 0.0 && r.0 <= 0.5));
        let top = rows.iter().fold(0.0f64, |m, r| m.max(r.1));
        assert!((top - 1.0).abs() < 1e-12);
        assert!(rows.iter().all(|r| (r.2 - 0.25 * r.1).abs() < 1e-9));
    }
}

/// Spectra and reflection coefficient of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct Results {
    pub analysis: ReflectionAnalysis,
    /// Dominant frequency of the injected pulse.
    pub dominant_frequency: f64,
    /// Frequency and magnitude of the incident spectral maximum.
    pub incident_peak: Option<(f64, f64)>,
}

impl Results {
    pub fn new(analysis: ReflectionAnalysis, dominant_frequency: f64) -> Self {
        let incident_peak = analysis.incident.peak();
        Self {
            analysis,
            dominant_frequency,
            incident_peak,
        }
    }

    /// Both spectra divided by the incident maximum, as
    /// `(f, incident, reflected)` for `0 <= f <= fmax`.
    pub fn normalized_spectra(&self, fmax: f64) -> Vec<(f64, f64, f64)> {
        let norm = self.analysis.incident.max();
        let incident = self.analysis.incident.normalized(norm).band(0.0, fmax);
        let reflected = self.analysis.reflected.normalized(norm).band(0.0, fmax);
        incident
            .into_iter()
            .zip(reflected)
            .map(|((f, i), (_, r))| (f, i, r))
            .collect()
    }

    pub fn mean_coefficient(&self) -> Option<f64> {
        let gamma = &self.analysis.coefficient;
        if gamma.is_empty() {
            return None;
        }
        Some(gamma.iter().map(|(_, g)| g).sum::<f64>() / gamma.len() as f64)
    }

    pub fn max_coefficient(&self) -> Option<f64> {
        self.analysis
            .coefficient
            .iter()
            .map(|&(_, g)| g)
            .reduce(f64::max)
    }

    pub fn print(&self) {
        println!("{}", self);
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results:")?;
        writeln!(f, "  Pulse frequency:     {:.4e} Hz", self.dominant_frequency)?;
        if let Some((freq, value)) = self.incident_peak {
            writeln!(f, "  Incident peak:       {:.4e} Hz ({:.4})", freq, value)?;
        }
        writeln!(f, "  Bin width:           {:.4e} Hz", self.analysis.incident.df())?;
        writeln!(f, "  Band bins:           {}", self.analysis.coefficient.len())?;
        if let Some(mean) = self.mean_coefficient() {
            writeln!(f, "  Mean |Γ|:            {:.4}", mean)?;
        }
        if let Some(max) = self.max_coefficient() {
            writeln!(f, "  Max |Γ|:             {:.4}", max)?;
        }
        Ok(())
    }
}
