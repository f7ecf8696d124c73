//! Deterministic synthetic arterial pressure waveforms.

use crate::error::{Result, WaveformError};
use crate::signal::WaveformSeries;
use crate::waveforms::TabularSource;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Column name used when a synthetic recording is exposed as a table.
pub const PRESSURE_COLUMN: &str = "pressure";

/// Generate `n_beats_target` cycles of an arterial-pressure-like waveform.
///
/// Every full cycle starts at the diastolic trough, rises to the systolic
/// pressure a quarter of the way through and runs off back towards diastolic.
/// A fractional beat count truncates the last cycle.
pub fn synthetic_arterial_pressure(
    systolic_pressure: f64,
    diastolic_pressure: f64,
    heart_rate: f64,
    n_beats_target: f64,
    hertz: f64,
) -> Result<WaveformSeries> {
    let params = [
        ("systolic_pressure", systolic_pressure),
        ("diastolic_pressure", diastolic_pressure),
        ("heart_rate", heart_rate),
        ("n_beats_target", n_beats_target),
        ("hertz", hertz),
    ];
    if let Some((name, value)) = params.iter().find(|(_, v)| !v.is_finite()) {
        return Err(WaveformError::invalid(format!(
            "{} must be finite, got {}",
            name, value
        )));
    }
    if diastolic_pressure <= 0.0 {
        return Err(WaveformError::invalid(format!(
            "diastolic_pressure must be positive, got {}",
            diastolic_pressure
        )));
    }
    if systolic_pressure <= diastolic_pressure {
        return Err(WaveformError::invalid(format!(
            "systolic_pressure ({}) must exceed diastolic_pressure ({})",
            systolic_pressure, diastolic_pressure
        )));
    }
    if heart_rate <= 0.0 {
        return Err(WaveformError::invalid(format!(
            "heart_rate must be positive, got {}",
            heart_rate
        )));
    }
    if n_beats_target < 0.0 {
        return Err(WaveformError::invalid(format!(
            "n_beats_target must not be negative, got {}",
            n_beats_target
        )));
    }
    if hertz <= 0.0 {
        return Err(WaveformError::invalid(format!(
            "hertz must be positive, got {}",
            hertz
        )));
    }

    let beats_per_second = heart_rate / 60.0;
    let duration = n_beats_target / beats_per_second;
    let samples = (duration * hertz).round() as usize;
    let pulse_pressure = systolic_pressure - diastolic_pressure;
    let data = (0..samples)
        .map(|i| {
            let phase = (i as f64 / hertz * beats_per_second).fract();
            diastolic_pressure + pulse_pressure * pulse_shape(phase)
        })
        .collect();
    Ok(WaveformSeries::new(data))
}

/// Normalized single-cycle pulse on `[0, 1)`: zero at phase 0, one at phase 0.25.
fn pulse_shape(phase: f64) -> f64 {
    (PI * phase.sqrt()).sin().powi(2)
}

/// Overlay seeded uniform noise in `[-amplitude, amplitude]`.
pub fn add_uniform_noise(
    series: &WaveformSeries,
    amplitude: f64,
    seed: u64,
) -> Result<WaveformSeries> {
    if !amplitude.is_finite() || amplitude < 0.0 {
        return Err(WaveformError::invalid(format!(
            "noise amplitude must be a non-negative number, got {}",
            amplitude
        )));
    }
    if amplitude == 0.0 {
        return Ok(series.clone());
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let data = series
        .data
        .iter()
        .map(|&x| x + rng.gen_range(-amplitude..=amplitude))
        .collect();
    Ok(WaveformSeries::new(data))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    pub amplitude: f64,
    #[serde(default)]
    pub seed: u64,
}

/// Generator parameters, e.g. loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub systolic_pressure: f64,
    pub diastolic_pressure: f64,
    pub heart_rate: f64,
    pub n_beats_target: f64,
    pub hertz: f64,
    #[serde(default)]
    pub noise: Option<NoiseParams>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            systolic_pressure: 120.0,
            diastolic_pressure: 80.0,
            heart_rate: 60.0,
            n_beats_target: 10.0,
            hertz: 100.0,
            noise: None,
        }
    }
}

impl GeneratorParams {
    pub fn generate(&self) -> Result<WaveformSeries> {
        let clean = synthetic_arterial_pressure(
            self.systolic_pressure,
            self.diastolic_pressure,
            self.heart_rate,
            self.n_beats_target,
            self.hertz,
        )?;
        match self.noise {
            Some(noise) => add_uniform_noise(&clean, noise.amplitude, noise.seed),
            None => Ok(clean),
        }
    }

    /// Samples per cycle implied by the heart rate and sample rate.
    pub fn expected_cycle_samples(&self) -> f64 {
        self.hertz * 60.0 / self.heart_rate
    }

    pub fn recording(&self) -> Result<SyntheticRecording> {
        Ok(SyntheticRecording {
            hertz: self.hertz,
            pressure: self.generate()?,
        })
    }
}

/// Generator output shaped as a single-column table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticRecording {
    pub hertz: f64,
    pub pressure: WaveformSeries,
}

impl TabularSource for SyntheticRecording {
    fn numeric_columns(&self) -> anyhow::Result<Vec<(String, Vec<f64>)>> {
        Ok(vec![(PRESSURE_COLUMN.to_string(), self.pressure.data.clone())])
    }
}
