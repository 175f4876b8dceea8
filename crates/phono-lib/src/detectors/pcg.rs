use crate::{filters::savgol::SavitzkyGolay, signal::PeakSet};
use log::debug;

/// Smoothing window length (seconds) for the beat envelope.
pub const ENVELOPE_WINDOW_S: f64 = 0.050;
/// Polynomial order of the envelope smoother.
pub const ENVELOPE_POLY_ORDER: usize = 3;
/// Shortest window a cubic fit can use.
pub const MIN_ENVELOPE_WINDOW: usize = 5;
/// Peak height threshold as a fraction of the envelope maximum.
pub const PEAK_HEIGHT_RATIO: f64 = 0.4;
/// Minimum spacing between accepted beats (seconds).
pub const MIN_BEAT_SPACING_S: f64 = 0.25;
/// Envelope maxima at or below this are transform rounding noise, not sound.
/// One 16-bit quantization step is about 3e-5.
pub const ENVELOPE_NOISE_FLOOR: f64 = 1e-9;

/// Odd smoothing window for a sample rate, never below [`MIN_ENVELOPE_WINDOW`].
pub fn envelope_window(fs: f64) -> usize {
    let mut window = (ENVELOPE_WINDOW_S * fs).round().max(1.0) as usize;
    if window % 2 == 0 {
        window += 1;
    }
    window.max(MIN_ENVELOPE_WINDOW)
}

/// Smoother for a signal of `len` samples at `fs`.
///
/// The window shrinks to fit short signals; `None` means the signal is too
/// short for a cubic fit and should be used as-is.
pub fn envelope_smoother(len: usize, fs: f64) -> Option<SavitzkyGolay> {
    let mut window = envelope_window(fs);
    if window > len {
        window = if len % 2 == 0 { len.saturating_sub(1) } else { len };
    }
    if window < MIN_ENVELOPE_WINDOW {
        return None;
    }
    SavitzkyGolay::new(window, ENVELOPE_POLY_ORDER)
}

pub fn rectify(data: &[f64]) -> Vec<f64> {
    data.iter().map(|x| x.abs()).collect()
}

/// Rectify and smooth a band-passed signal into a non-negative beat envelope.
pub fn extract_envelope(filtered: &[f64], fs: f64) -> Vec<f64> {
    let rectified = rectify(filtered);
    let mut envelope = match envelope_smoother(rectified.len(), fs) {
        Some(sg) => {
            debug!("envelope: savgol window {} over {} samples", sg.window(), rectified.len());
            sg.smooth(&rectified)
        }
        None => rectified,
    };
    clamp_non_negative(&mut envelope);
    envelope
}

/// Polynomial overshoot around sharp transients can dip below zero.
pub fn clamp_non_negative(envelope: &mut [f64]) {
    for x in envelope.iter_mut() {
        if *x < 0.0 {
            *x = 0.0;
        }
    }
}

pub fn min_peak_distance(fs: f64) -> usize {
    ((MIN_BEAT_SPACING_S * fs).round() as usize).max(1)
}

/// Locate beats in an envelope with the fixed height/spacing rules.
pub fn detect_beats(envelope: &[f64], fs: f64) -> PeakSet {
    let max = envelope.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() || max <= ENVELOPE_NOISE_FLOOR {
        debug!("peaks: zero-energy envelope, no beats");
        return PeakSet::default();
    }
    let height = PEAK_HEIGHT_RATIO * max;
    let distance = min_peak_distance(fs);
    let peaks = pick_peaks(envelope, height, distance);
    debug!(
        "peaks: {} beats (height >= {:.6}, spacing >= {} samples)",
        peaks.len(),
        height,
        distance
    );
    peaks
}

/// Strict local maxima; flat tops resolve to their middle sample. The first
/// and last samples are never maxima.
pub fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if data.len() < 3 {
        return maxima;
    }
    let last = data.len() - 1;
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    maxima
}

/// Height + distance peak picking.
///
/// Candidates at or above `height` are visited from tallest to shortest (ties
/// by position); each accepted peak suppresses every remaining candidate
/// closer than `distance` samples.
pub fn pick_peaks(data: &[f64], height: f64, distance: usize) -> PeakSet {
    let candidates: Vec<usize> = local_maxima(data)
        .into_iter()
        .filter(|&i| data[i] >= height)
        .collect();
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        data[candidates[b]]
            .total_cmp(&data[candidates[a]])
            .then(a.cmp(&b))
    });

    let mut keep = vec![true; candidates.len()];
    for &j in &order {
        if !keep[j] {
            continue;
        }
        let peak = candidates[j];
        for k in (0..j).rev() {
            if peak - candidates[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..candidates.len() {
            if candidates[k] - peak >= distance {
                break;
            }
            keep[k] = false;
        }
    }

    let indices = candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(idx, kept)| kept.then_some(idx))
        .collect();
    PeakSet::from_indices(indices)
}
