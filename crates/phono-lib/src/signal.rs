use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Full-scale value of signed 16-bit PCM.
pub const PCM16_FULL_SCALE: f64 = 32768.0;

/// Frequency range (Hz, inclusive) kept by the band-pass stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FrequencyBand {
    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

/// Band carrying the first and second heart sounds.
pub const HEART_SOUND_BAND: FrequencyBand = FrequencyBand {
    low_hz: 20.0,
    high_hz: 200.0,
};

/// Decoded integer PCM as handed over by the WAV layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmRecording {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl PcmRecording {
    /// Scale to a floating point waveform.
    pub fn normalize(&self) -> Result<Waveform, AnalysisError> {
        Waveform::from_pcm(self.sample_rate, &self.samples)
    }
}

/// Scale raw PCM into `[-1, 1)`.
pub fn normalize_pcm(raw: &[i16]) -> Vec<f64> {
    raw.iter()
        .map(|&sample| f64::from(sample) / PCM16_FULL_SCALE)
        .collect()
}

/// Mono waveform with a uniform sample rate.
///
/// Construction validates the samples once, so every stage downstream can rely
/// on a positive rate and a non-empty, finite buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
    sample_rate: u32,
    samples: Vec<f64>,
}

impl Waveform {
    pub fn new(sample_rate: u32, samples: Vec<f64>) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::ZeroSampleRate);
        }
        if samples.is_empty() {
            return Err(AnalysisError::EmptyWaveform);
        }
        if let Some(index) = samples.iter().position(|x| !x.is_finite()) {
            return Err(AnalysisError::NonFiniteSample { index });
        }
        Ok(Self {
            sample_rate,
            samples,
        })
    }

    pub fn from_pcm(sample_rate: u32, raw: &[i16]) -> Result<Self, AnalysisError> {
        Self::new(sample_rate, normalize_pcm(raw))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Sample rate as a float, for time/frequency arithmetic.
    pub fn fs(&self) -> f64 {
        f64::from(self.sample_rate)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.fs()
    }
}

/// Detected beats as strictly increasing sample indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakSet {
    pub indices: Vec<usize>,
}

impl PeakSet {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// RR intervals (seconds)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RRIntervals {
    pub rr: Vec<f64>,
}

impl RRIntervals {
    pub fn from_peaks(peaks: &PeakSet, fs: f64) -> Self {
        let rr = peaks
            .indices
            .windows(2)
            .map(|w| (w[1] - w[0]) as f64 / fs)
            .collect();
        Self { rr }
    }

    pub fn len(&self) -> usize {
        self.rr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }
}
