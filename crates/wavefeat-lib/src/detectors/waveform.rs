use crate::detectors::extrema::{detect_extrema, ExtremaConfig, Extremum};
use crate::error::Result;
use crate::signal::{CycleSpan, FeatureValue};
use crate::waveforms::Waveforms;
use log::debug;

pub const TROUGHS: &str = "troughs";
pub const PEAKS: &str = "peaks";
pub const CYCLES: &str = "cycles";

/// Locate the diastolic trough of every cycle and store it under [`TROUGHS`].
pub fn find_troughs<'a>(waveforms: &'a mut Waveforms, name: &str) -> Result<&'a mut Waveforms> {
    find_troughs_with_config(waveforms, name, &ExtremaConfig::default())
}

pub fn find_troughs_with_config<'a>(
    waveforms: &'a mut Waveforms,
    name: &str,
    cfg: &ExtremaConfig,
) -> Result<&'a mut Waveforms> {
    store_extrema(waveforms, name, Extremum::Min, TROUGHS, cfg)
}

/// Locate the systolic peak of every cycle and store it under [`PEAKS`].
pub fn find_peaks<'a>(waveforms: &'a mut Waveforms, name: &str) -> Result<&'a mut Waveforms> {
    find_peaks_with_config(waveforms, name, &ExtremaConfig::default())
}

pub fn find_peaks_with_config<'a>(
    waveforms: &'a mut Waveforms,
    name: &str,
    cfg: &ExtremaConfig,
) -> Result<&'a mut Waveforms> {
    store_extrema(waveforms, name, Extremum::Max, PEAKS, cfg)
}

/// Split a waveform into trough-to-trough cycles, stored under [`CYCLES`].
///
/// Reads the troughs feature, which must already be computed.
pub fn segment_cycles<'a>(waveforms: &'a mut Waveforms, name: &str) -> Result<&'a mut Waveforms> {
    let spans: Vec<CycleSpan> = waveforms
        .get_indices(name, TROUGHS)?
        .windows(2)
        .map(|w| CycleSpan {
            start: w[0],
            end: w[1],
        })
        .collect();
    debug!("{}: {} cycles", name, spans.len());
    waveforms.set_feature(name, CYCLES, FeatureValue::Spans(spans))?;
    Ok(waveforms)
}

fn store_extrema<'a>(
    waveforms: &'a mut Waveforms,
    name: &str,
    kind: Extremum,
    feature: &str,
    cfg: &ExtremaConfig,
) -> Result<&'a mut Waveforms> {
    let series = waveforms.get_series(name)?;
    let indices = detect_extrema(&series.data, kind, cfg)?;
    debug!(
        "{}: {} {} over {} samples",
        name,
        indices.len(),
        feature,
        series.len()
    );
    waveforms.set_feature(name, feature, FeatureValue::Indices(indices))?;
    Ok(waveforms)
}
