//! Cycle-level extremum detection shared by every landmark detector.
//!
//! Candidates are sign changes of the first difference. Candidates closer
//! than the merge window compete and only the most extreme one survives, so a
//! noisy or flat extremum is reported once per cycle. The first and last
//! samples only qualify when the series moves away from them, they sit at the
//! depth of a real extremum, and the series completes at least one swing in
//! the opposite direction. The last sample must also close a full cycle after
//! the previous extremum, so a truncated final cycle reports nothing.

use crate::detectors::cycle::estimate_cycle_samples;
use crate::error::{Result, WaveformError};
use log::debug;

/// Direction of the extremum to detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

impl Extremum {
    /// Map a sample so that the requested extremum becomes a minimum.
    fn orient(self, x: f64) -> f64 {
        match self {
            Extremum::Min => x,
            Extremum::Max => -x,
        }
    }
}

/// Tunables for [`detect_extrema`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremaConfig {
    /// Expected cycle length in samples. Estimated from the data when `None`.
    pub cycle_samples: Option<f64>,
    /// Merge window as a fraction of the cycle length.
    pub merge_fraction: f64,
    /// How close to the series floor (as a fraction of its range) an edge sample must be.
    pub edge_depth_fraction: f64,
    /// Drop candidates whose prominence is below this fraction of the series range.
    pub min_prominence_fraction: Option<f64>,
}

impl Default for ExtremaConfig {
    fn default() -> Self {
        Self {
            cycle_samples: None,
            merge_fraction: 0.5,
            edge_depth_fraction: 0.1,
            min_prominence_fraction: None,
        }
    }
}

impl ExtremaConfig {
    /// Config with the cycle length implied by a sample rate and heart rate.
    pub fn for_rate(fs: f64, heart_rate: f64) -> Self {
        Self {
            cycle_samples: Some(fs * 60.0 / heart_rate),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(cycle) = self.cycle_samples {
            if !cycle.is_finite() || cycle <= 0.0 {
                return Err(WaveformError::invalid(format!(
                    "cycle length must be positive, got {}",
                    cycle
                )));
            }
        }
        if !self.merge_fraction.is_finite() || self.merge_fraction < 0.0 {
            return Err(WaveformError::invalid(format!(
                "merge fraction must be non-negative, got {}",
                self.merge_fraction
            )));
        }
        if !self.edge_depth_fraction.is_finite() || self.edge_depth_fraction < 0.0 {
            return Err(WaveformError::invalid(format!(
                "edge depth fraction must be non-negative, got {}",
                self.edge_depth_fraction
            )));
        }
        if let Some(p) = self.min_prominence_fraction {
            if !p.is_finite() || p < 0.0 {
                return Err(WaveformError::invalid(format!(
                    "prominence fraction must be non-negative, got {}",
                    p
                )));
            }
        }
        Ok(())
    }

    fn cycle_length(&self, data: &[f64]) -> Option<f64> {
        self.cycle_samples
            .or_else(|| estimate_cycle_samples(data))
    }

    fn merge_window(&self, cycle: Option<f64>) -> usize {
        cycle
            .map(|c| (c * self.merge_fraction).floor() as usize)
            .unwrap_or(1)
            .max(1)
    }
}

/// Detect one extremum per cycle. Indices are strictly ascending and in range.
pub fn detect_extrema(data: &[f64], kind: Extremum, cfg: &ExtremaConfig) -> Result<Vec<usize>> {
    if data.len() < 2 {
        return Err(WaveformError::invalid(format!(
            "need at least 2 samples to locate extrema, got {}",
            data.len()
        )));
    }
    if let Some(i) = data.iter().position(|x| !x.is_finite()) {
        return Err(WaveformError::invalid(format!(
            "sample {} is not finite ({})",
            i, data[i]
        )));
    }
    cfg.validate()?;

    let y: Vec<f64> = data.iter().map(|&x| kind.orient(x)).collect();
    let (mut candidates, mut trailing) = sign_change_candidates(&y, cfg.edge_depth_fraction);
    let found = candidates.len() + usize::from(trailing.is_some());

    if let Some(fraction) = cfg.min_prominence_fraction {
        let threshold = fraction * range(&y);
        candidates.retain(|&i| prominence(&y, i) >= threshold);
        trailing = trailing.filter(|&i| prominence(&y, i) >= threshold);
    }

    let cycle = cfg.cycle_length(data);
    let window = cfg.merge_window(cycle);
    let mut merged = merge_within_window(&y, &candidates, window);
    if let Some(edge) = trailing {
        settle_trailing_edge(&y, &mut merged, edge, window, cycle);
    }
    debug!(
        "{:?}: {} candidates, {} after prominence, {} after merge (window {} samples)",
        kind,
        found,
        candidates.len() + usize::from(trailing.is_some()),
        merged.len(),
        window
    );
    Ok(merged)
}

/// Interior minima of `y` plus a qualifying first sample, ascending, and the
/// last sample when it is deep enough to be a trough.
fn sign_change_candidates(y: &[f64], edge_depth_fraction: f64) -> (Vec<usize>, Option<usize>) {
    let mut candidates = Vec::new();
    let mut first_sign = 0i8;
    let mut prev_sign = 0i8;
    let mut has_interior_max = false;
    // first index of the current flat run
    let mut run_start = 0usize;

    for i in 1..y.len() {
        let d = y[i] - y[i - 1];
        let sign = if d > 0.0 {
            1
        } else if d < 0.0 {
            -1
        } else {
            continue;
        };
        if first_sign == 0 {
            first_sign = sign;
        }
        if prev_sign < 0 && sign > 0 {
            candidates.push(run_start);
        } else if prev_sign > 0 && sign < 0 {
            has_interior_max = true;
        }
        prev_sign = sign;
        run_start = i;
    }

    if !has_interior_max {
        return (candidates, None);
    }
    let floor = y.iter().copied().fold(f64::INFINITY, f64::min);
    let tolerance = edge_depth_fraction * range(y);
    if first_sign > 0 && y[0] - floor <= tolerance {
        candidates.insert(0, 0);
    }
    let trailing = (prev_sign < 0 && y[run_start] - floor <= tolerance).then_some(run_start);
    (candidates, trailing)
}

/// Decide whether the last sample closes a cycle.
///
/// Inside the merge window it competes with the previous extremum. Further out
/// it is kept only when it sits at least one cycle (less one sample) after the
/// previous extremum, measured by the mean spacing of those already kept, or by
/// `cycle` when fewer than two are known.
fn settle_trailing_edge(
    y: &[f64],
    kept: &mut Vec<usize>,
    edge: usize,
    window: usize,
    cycle: Option<f64>,
) {
    let (first, last) = match (kept.first(), kept.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            kept.push(edge);
            return;
        }
    };
    let gap = edge - last;
    if gap < window {
        if y[edge] < y[last] {
            if let Some(slot) = kept.last_mut() {
                *slot = edge;
            }
        }
        return;
    }
    let spacing = if kept.len() >= 2 {
        Some((last - first) as f64 / (kept.len() - 1) as f64)
    } else {
        cycle
    };
    match spacing {
        Some(spacing) if (gap as f64) < spacing.round() - 1.0 => {
            debug!(
                "dropping trailing sample {}: {} samples after {}, cycle is {:.1}",
                edge, gap, last, spacing
            );
        }
        _ => kept.push(edge),
    }
}

fn merge_within_window(y: &[f64], candidates: &[usize], window: usize) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(candidates.len());
    for &c in candidates {
        match kept.last_mut() {
            Some(last) if c - *last < window => {
                if y[c] < y[*last] {
                    *last = c;
                }
            }
            _ => kept.push(c),
        }
    }
    kept
}

fn range(y: &[f64]) -> f64 {
    let (lo, hi) = y
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    hi - lo
}

/// Height a minimum must climb before reaching lower ground, on the lower side.
fn prominence(y: &[f64], i: usize) -> f64 {
    let level = y[i];
    let left = side_max(y[..i].iter().rev(), level);
    let right = side_max(y[i + 1..].iter(), level);
    let reference = match (left, right) {
        (Some(l), Some(r)) => l.min(r),
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => level,
    };
    reference - level
}

fn side_max<'a>(samples: impl Iterator<Item = &'a f64>, level: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for &v in samples {
        if v < level {
            break;
        }
        best = Some(best.map_or(v, |b| b.max(v)));
    }
    best
}
