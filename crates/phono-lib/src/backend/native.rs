use super::{AnalysisBackend, BackendKind};
use crate::{
    detectors::pcg::{clamp_non_negative, detect_beats, envelope_smoother, rectify},
    error::{AnalysisError, BackendError},
    filters::{bandpass::bin_frequency, savgol::SavitzkyGolay},
    metrics::rhythm::{analyze_rhythm, AnalysisResult},
    signal::{FrequencyBand, Waveform, HEART_SOUND_BAND},
};
use log::debug;
use realfft::RealFftPlanner;
use rustfft::{num_complex::Complex, FftPlanner};

const NAME: &str = "native";

/// Accelerated pipeline: a single complex transform for the band-pass and
/// FFT convolution for the envelope smoother. Same stages and constants as
/// the reference backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl NativeBackend {
    fn run(&self, waveform: &Waveform) -> Result<AnalysisResult, BackendError> {
        let fs = waveform.fs();
        let filtered = bandpass_complex(waveform.samples(), fs, HEART_SOUND_BAND);
        ensure_finite(&filtered, "band-pass output")?;
        debug!("native: filtered {} samples", filtered.len());

        let rectified = rectify(&filtered);
        let mut envelope = match envelope_smoother(rectified.len(), fs) {
            Some(sg) => smooth_fft(&sg, &rectified)?,
            None => rectified,
        };
        clamp_non_negative(&mut envelope);
        ensure_finite(&envelope, "envelope")?;

        let peaks = detect_beats(&envelope, fs);
        Ok(analyze_rhythm(&peaks, fs))
    }
}

impl AnalysisBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn analyze(&self, waveform: &Waveform) -> Result<AnalysisResult, BackendError> {
        self.run(waveform)
    }
}

fn ensure_finite(data: &[f64], stage: &'static str) -> Result<(), BackendError> {
    if data.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(BackendError::NonFinite {
            backend: NAME,
            stage,
        })
    }
}

/// Full complex transform with a mask mirrored onto the negative frequencies.
fn bandpass_complex(data: &[f64], fs: f64, band: FrequencyBand) -> Vec<f64> {
    let n = data.len();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let mut buffer: Vec<Complex<f64>> = data.iter().map(|&x| Complex::new(x, 0.0)).collect();
    forward.process(&mut buffer);
    for (k, bin) in buffer.iter_mut().enumerate() {
        let mirrored = k.min(n - k);
        if !band.contains(bin_frequency(mirrored, n, fs)) {
            *bin = Complex::new(0.0, 0.0);
        }
    }
    inverse.process(&mut buffer);

    let scale = 1.0 / n as f64;
    let mut filtered: Vec<f64> = buffer.iter().map(|c| c.re * scale).collect();
    filtered.resize(n, 0.0);
    filtered
}

/// Savitzky–Golay smoothing with the interior computed as one linear
/// convolution through the real FFT; edges use the direct polynomial fit.
fn smooth_fft(sg: &SavitzkyGolay, data: &[f64]) -> Result<Vec<f64>, BackendError> {
    let n = data.len();
    let window = sg.window();
    if n < window {
        return Ok(data.to_vec());
    }
    let half = window / 2;
    let size = (n + window - 1).next_power_of_two();

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(size);
    let c2r = planner.plan_fft_inverse(size);

    let mut signal = r2c.make_input_vec();
    signal[..n].copy_from_slice(data);
    let mut kernel = r2c.make_input_vec();
    for (slot, w) in kernel.iter_mut().zip(sg.weights_at(0).iter().rev()) {
        *slot = *w;
    }

    let mut signal_spec = r2c.make_output_vec();
    let mut kernel_spec = r2c.make_output_vec();
    r2c.process(&mut signal, &mut signal_spec)
        .map_err(transform_error)?;
    r2c.process(&mut kernel, &mut kernel_spec)
        .map_err(transform_error)?;
    for (s, k) in signal_spec.iter_mut().zip(&kernel_spec) {
        *s = *s * *k;
    }
    signal_spec[0].im = 0.0;
    if let Some(nyquist) = signal_spec.last_mut() {
        nyquist.im = 0.0;
    }

    let mut convolved = c2r.make_output_vec();
    c2r.process(&mut signal_spec, &mut convolved)
        .map_err(transform_error)?;

    let scale = 1.0 / size as f64;
    let mut out = vec![0.0; n];
    for i in half..n - half {
        out[i] = convolved[i + half] * scale;
    }
    sg.fill_edges(data, &mut out);
    Ok(out)
}

fn transform_error(err: realfft::FftError) -> BackendError {
    BackendError::Analysis(AnalysisError::Transform(err.to_string()))
}
