use std::path::PathBuf;
use thiserror::Error;

/// Rejections raised while decoding a recording, before anything reaches the analysis core.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{} is not a .wav file", path.display())]
    UnsupportedExtension { path: PathBuf },
    #[error("failed to read WAV data")]
    Decode(#[from] hound::Error),
    #[error("audio must be mono, found {0} channels")]
    NotMono(u16),
    #[error("audio must be 16-bit integer PCM, found {bits}-bit {format}")]
    NotPcm16 { bits: u16, format: &'static str },
    #[error("WAV file contains no samples")]
    Empty,
}

/// Fatal failures of the analysis core. Low-peak outcomes are not errors.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("waveform has no samples")]
    EmptyWaveform,
    #[error("sample rate must be positive")]
    ZeroSampleRate,
    #[error("waveform sample {index} is not finite")]
    NonFiniteSample { index: usize },
    #[error("spectral transform failed: {0}")]
    Transform(String),
}

/// Failures of an individual backend; the selector recovers from these.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{backend} backend panicked: {message}")]
    Panicked {
        backend: &'static str,
        message: String,
    },
    #[error("{backend} backend produced a non-finite {stage}")]
    NonFinite {
        backend: &'static str,
        stage: &'static str,
    },
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
