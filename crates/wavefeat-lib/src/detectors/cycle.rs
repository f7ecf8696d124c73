use realfft::RealFftPlanner;

/// Estimate the dominant cycle length in samples from the periodogram.
///
/// The mean-removed series is zero-padded to at least four times its length
/// before the transform so short recordings still resolve their period. Only
/// periods between two samples and the full series length are considered.
/// Returns `None` when there is nothing periodic to measure.
pub fn estimate_cycle_samples(data: &[f64]) -> Option<f64> {
    let n = data.len();
    if n < 4 {
        return None;
    }
    let mean = data.iter().sum::<f64>() / n as f64;
    let padded = (4 * n).next_power_of_two();

    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(padded);
    let mut buffer = vec![0.0; padded];
    for (dst, &x) in buffer.iter_mut().zip(data) {
        *dst = x - mean;
    }
    let mut spectrum = fft.make_output_vec();
    fft.process(&mut buffer, &mut spectrum).ok()?;

    let lowest_bin = ((padded as f64 / n as f64).ceil() as usize).max(1);
    let (bin, power) = spectrum
        .iter()
        .enumerate()
        .skip(lowest_bin)
        .map(|(k, c)| (k, c.norm_sqr()))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
    if bin == 0 || power <= 0.0 {
        return None;
    }
    Some(padded as f64 / bin as f64)
}
