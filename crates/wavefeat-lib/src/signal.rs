use serde::{Deserialize, Serialize};

/// Uniformly sampled waveform. Sample rate is carried by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformSeries {
    /// Samples, implicitly indexed from 0.
    pub data: Vec<f64>,
}

impl WaveformSeries {
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    /// Duration in seconds at the given sample rate.
    pub fn duration(&self, fs: f64) -> f64 {
        self.data.len() as f64 / fs
    }
}

impl From<Vec<f64>> for WaveformSeries {
    fn from(data: Vec<f64>) -> Self {
        Self { data }
    }
}

/// Half-open sample range `[start, end)` covering one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSpan {
    pub start: usize,
    pub end: usize,
}

impl CycleSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Payload stored for one feature kind of one waveform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Ascending, deduplicated sample indices (troughs, peaks).
    Indices(Vec<usize>),
    /// Consecutive cycle spans.
    Spans(Vec<CycleSpan>),
}

impl FeatureValue {
    pub fn as_indices(&self) -> Option<&[usize]> {
        match self {
            FeatureValue::Indices(indices) => Some(indices),
            FeatureValue::Spans(_) => None,
        }
    }

    pub fn as_spans(&self) -> Option<&[CycleSpan]> {
        match self {
            FeatureValue::Spans(spans) => Some(spans),
            FeatureValue::Indices(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FeatureValue::Indices(indices) => indices.len(),
            FeatureValue::Spans(spans) => spans.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
