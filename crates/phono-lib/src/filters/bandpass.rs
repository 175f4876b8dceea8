use crate::{error::AnalysisError, signal::FrequencyBand};
use realfft::RealFftPlanner;

/// Center frequency of real-spectrum bin `k` for a transform of length `n`.
pub fn bin_frequency(k: usize, n: usize, fs: f64) -> f64 {
    k as f64 * fs / n as f64
}

/// Which of the `n / 2 + 1` real-spectrum bins fall inside `band`.
pub fn band_mask(n: usize, fs: f64, band: FrequencyBand) -> Vec<bool> {
    (0..n / 2 + 1)
        .map(|k| band.contains(bin_frequency(k, n, fs)))
        .collect()
}

/// Brick-wall band-pass in the frequency domain.
///
/// The output always has exactly `data.len()` samples, whatever the parity of
/// the input length.
pub fn bandpass(data: &[f64], fs: f64, band: FrequencyBand) -> Result<Vec<f64>, AnalysisError> {
    let n = data.len();
    if n == 0 {
        return Err(AnalysisError::EmptyWaveform);
    }
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n);
    let c2r = planner.plan_fft_inverse(n);

    let mut frame = data.to_vec();
    let mut spectrum = r2c.make_output_vec();
    r2c.process(&mut frame, &mut spectrum)
        .map_err(|e| AnalysisError::Transform(e.to_string()))?;

    for (bin, keep) in spectrum.iter_mut().zip(band_mask(n, fs, band)) {
        if !keep {
            bin.re = 0.0;
            bin.im = 0.0;
        }
    }
    // c2r rejects imaginary parts on the purely real DC/Nyquist bins.
    spectrum[0].im = 0.0;
    if n % 2 == 0 {
        if let Some(nyquist) = spectrum.last_mut() {
            nyquist.im = 0.0;
        }
    }

    let mut filtered = c2r.make_output_vec();
    c2r.process(&mut spectrum, &mut filtered)
        .map_err(|e| AnalysisError::Transform(e.to_string()))?;
    filtered.resize(n, 0.0);
    let scale = 1.0 / n as f64;
    for x in filtered.iter_mut() {
        *x *= scale;
    }
    Ok(filtered)
}
