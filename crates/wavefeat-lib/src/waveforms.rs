//! Named waveform container with per-waveform feature annotations.
//!
//! The container owns its series and the features derived from them. It does
//! no locking: mutation needs `&mut Waveforms`, so two writers can never touch
//! the same `(name, kind)` slot at once. Callers that parallelize across names
//! compute on borrowed series and write the results back one name at a time.

use crate::error::{Result, WaveformError};
use crate::signal::{FeatureValue, WaveformSeries};
use serde::Serialize;
use std::collections::BTreeMap;

/// Anything that can hand out named numeric columns.
pub trait TabularSource {
    /// Every numeric column as `(name, values)`.
    fn numeric_columns(&self) -> anyhow::Result<Vec<(String, Vec<f64>)>>;
}

impl TabularSource for BTreeMap<String, Vec<f64>> {
    fn numeric_columns(&self) -> anyhow::Result<Vec<(String, Vec<f64>)>> {
        Ok(self
            .iter()
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect())
    }
}

impl TabularSource for Vec<(String, Vec<f64>)> {
    fn numeric_columns(&self) -> anyhow::Result<Vec<(String, Vec<f64>)>> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Waveforms {
    series: BTreeMap<String, WaveformSeries>,
    features: BTreeMap<String, BTreeMap<String, FeatureValue>>,
}

impl Waveforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_series<I, S>(series: I) -> Self
    where
        I: IntoIterator<Item = (S, WaveformSeries)>,
        S: Into<String>,
    {
        Self {
            series: series
                .into_iter()
                .map(|(name, s)| (name.into(), s))
                .collect(),
            features: BTreeMap::new(),
        }
    }

    /// Wrap every numeric column of `table` as one waveform.
    pub fn from_table<T: TabularSource + ?Sized>(table: &T) -> Result<Self> {
        let columns = table.numeric_columns().map_err(WaveformError::Tabular)?;
        Ok(Self::from_series(
            columns
                .into_iter()
                .map(|(name, data)| (name, WaveformSeries::new(data))),
        ))
    }

    /// Add or replace a waveform. Replacing drops the features derived from the old data.
    pub fn insert_series(&mut self, name: impl Into<String>, series: WaveformSeries) {
        let name = name.into();
        self.features.remove(&name);
        self.series.insert(name, series);
    }

    pub fn get_series(&self, name: &str) -> Result<&WaveformSeries> {
        self.series
            .get(name)
            .ok_or_else(|| WaveformError::waveform(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Store a feature, overwriting any previous value of the same kind.
    ///
    /// Index features must be strictly ascending and inside the series.
    pub fn set_feature(
        &mut self,
        name: &str,
        kind: impl Into<String>,
        value: FeatureValue,
    ) -> Result<()> {
        let series = self.get_series(name)?;
        validate_feature(series.len(), &value)?;
        self.features
            .entry(name.to_string())
            .or_default()
            .insert(kind.into(), value);
        Ok(())
    }

    pub fn get_feature(&self, name: &str, kind: &str) -> Result<&FeatureValue> {
        self.features
            .get(name)
            .and_then(|kinds| kinds.get(kind))
            .ok_or_else(|| WaveformError::feature(name, kind))
    }

    /// Shorthand for index-valued features such as troughs and peaks.
    pub fn get_indices(&self, name: &str, kind: &str) -> Result<&[usize]> {
        self.get_feature(name, kind)?.as_indices().ok_or_else(|| {
            WaveformError::invalid(format!(
                "feature '{}' of waveform '{}' is not an index sequence",
                kind, name
            ))
        })
    }

    /// All computed features of one waveform, keyed by kind.
    pub fn features_of(&self, name: &str) -> Result<Option<&BTreeMap<String, FeatureValue>>> {
        self.get_series(name)?;
        Ok(self.features.get(name))
    }

    pub fn features(&self) -> &BTreeMap<String, BTreeMap<String, FeatureValue>> {
        &self.features
    }
}

fn validate_feature(len: usize, value: &FeatureValue) -> Result<()> {
    match value {
        FeatureValue::Indices(indices) => {
            if indices.windows(2).any(|w| w[0] >= w[1]) {
                return Err(WaveformError::invalid(
                    "feature indices must be strictly ascending",
                ));
            }
            if let Some(&last) = indices.last() {
                if last >= len {
                    return Err(WaveformError::invalid(format!(
                        "feature index {} out of range for {} samples",
                        last, len
                    )));
                }
            }
        }
        FeatureValue::Spans(spans) => {
            let mut prev_end = 0;
            for span in spans {
                if span.start < prev_end || span.end <= span.start || span.end > len {
                    return Err(WaveformError::invalid(format!(
                        "cycle span {}..{} is malformed for {} samples",
                        span.start, span.end, len
                    )));
                }
                prev_end = span.end;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::CycleSpan;

    fn single(name: &str, data: Vec<f64>) -> Waveforms {
        Waveforms::from_series([(name, WaveformSeries::new(data))])
    }

    #[test]
    fn get_series_reports_missing_name() {
        let w = single("pressure", vec![1.0, 2.0]);
        assert_eq!(w.get_series("pressure").unwrap().len(), 2);
        assert!(matches!(
            w.get_series("flow"),
            Err(WaveformError::NotFound { .. })
        ));
    }

    #[test]
    fn feature_missing_until_set() {
        let mut w = single("pressure", vec![3.0, 1.0, 3.0]);
        assert!(matches!(
            w.get_feature("pressure", "troughs"),
            Err(WaveformError::NotFound { .. })
        ));
        w.set_feature("pressure", "troughs", FeatureValue::Indices(vec![1]))
            .unwrap();
        assert_eq!(w.get_indices("pressure", "troughs").unwrap(), &[1]);
    }

    #[test]
    fn set_feature_requires_known_waveform() {
        let mut w = Waveforms::new();
        let err = w
            .set_feature("pressure", "troughs", FeatureValue::Indices(vec![]))
            .unwrap_err();
        assert!(matches!(err, WaveformError::NotFound { .. }));
        assert!(w.features().is_empty());
    }

    #[test]
    fn set_feature_rejects_malformed_indices() {
        let mut w = single("pressure", vec![0.0; 4]);
        for bad in [vec![2, 1], vec![1, 1], vec![4]] {
            let err = w
                .set_feature("pressure", "troughs", FeatureValue::Indices(bad))
                .unwrap_err();
            assert!(matches!(err, WaveformError::InvalidInput(_)));
        }
        assert!(w.get_feature("pressure", "troughs").is_err());
    }

    #[test]
    fn set_feature_rejects_overlapping_spans() {
        let mut w = single("pressure", vec![0.0; 10]);
        let spans = vec![
            CycleSpan { start: 0, end: 5 },
            CycleSpan { start: 4, end: 8 },
        ];
        assert!(w
            .set_feature("pressure", "cycles", FeatureValue::Spans(spans))
            .is_err());
    }

    #[test]
    fn replacing_series_drops_stale_features() {
        let mut w = single("pressure", vec![3.0, 1.0, 3.0]);
        w.set_feature("pressure", "troughs", FeatureValue::Indices(vec![1]))
            .unwrap();
        w.insert_series("pressure", WaveformSeries::new(vec![1.0]));
        assert!(w.get_feature("pressure", "troughs").is_err());
        assert_eq!(w.features_of("pressure").unwrap(), None);
    }

    #[test]
    fn from_table_wraps_each_column() {
        let mut table = BTreeMap::new();
        table.insert("pressure".to_string(), vec![80.0, 120.0]);
        table.insert("flow".to_string(), vec![0.0, 1.0, 0.5]);
        let w = Waveforms::from_table(&table).unwrap();
        assert_eq!(w.names().collect::<Vec<_>>(), vec!["flow", "pressure"]);
        assert_eq!(w.get_series("flow").unwrap().len(), 3);

        let rows = vec![("pressure".to_string(), vec![80.0, 120.0, 80.0])];
        let w = Waveforms::from_table(&rows).unwrap();
        assert!(w.contains("pressure"));
        assert!(!w.is_empty());
    }

    struct Broken;

    impl TabularSource for Broken {
        fn numeric_columns(&self) -> anyhow::Result<Vec<(String, Vec<f64>)>> {
            anyhow::bail!("device unplugged")
        }
    }

    #[test]
    fn from_table_surfaces_source_failures() {
        let err = Waveforms::from_table(&Broken).unwrap_err();
        assert!(matches!(err, WaveformError::Tabular(_)));
        assert!(err.to_string().contains("tabular"));
    }

    #[test]
    fn serializes_features_as_plain_json() {
        let mut w = single("pressure", vec![3.0, 1.0, 3.0, 1.0, 3.0]);
        w.set_feature("pressure", "troughs", FeatureValue::Indices(vec![1, 3]))
            .unwrap();
        w.set_feature(
            "pressure",
            "cycles",
            FeatureValue::Spans(vec![CycleSpan { start: 1, end: 3 }]),
        )
        .unwrap();
        let js = serde_json::to_value(w.features()).unwrap();
        assert_eq!(js["pressure"]["troughs"], serde_json::json!([1, 3]));
        assert_eq!(
            js["pressure"]["cycles"],
            serde_json::json!([{ "start": 1, "end": 3 }])
        );
    }
}
