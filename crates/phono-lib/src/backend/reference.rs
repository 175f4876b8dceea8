use super::{AnalysisBackend, BackendKind};
use crate::{
    detectors::pcg::{detect_beats, extract_envelope},
    error::{AnalysisError, BackendError},
    filters::bandpass::bandpass,
    metrics::rhythm::{analyze_rhythm, AnalysisResult},
    signal::{PeakSet, Waveform, HEART_SOUND_BAND},
};
use log::debug;
use serde::Serialize;

/// Intermediate signals of one reference run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineTrace {
    pub sample_rate: u32,
    pub filtered: Vec<f64>,
    pub envelope: Vec<f64>,
    pub peaks: PeakSet,
}

/// Straightforward implementation of every stage; the baseline the native
/// backend is checked against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceBackend;

impl ReferenceBackend {
    /// Band-pass, envelope and beat detection, keeping every intermediate.
    pub fn trace(&self, waveform: &Waveform) -> Result<PipelineTrace, AnalysisError> {
        let fs = waveform.fs();
        let filtered = bandpass(waveform.samples(), fs, HEART_SOUND_BAND)?;
        debug!(
            "reference: filtered {} samples at {} Hz",
            filtered.len(),
            waveform.sample_rate()
        );
        let envelope = extract_envelope(&filtered, fs);
        let peaks = detect_beats(&envelope, fs);
        Ok(PipelineTrace {
            sample_rate: waveform.sample_rate(),
            filtered,
            envelope,
            peaks,
        })
    }

    pub fn run(&self, waveform: &Waveform) -> Result<AnalysisResult, AnalysisError> {
        let trace = self.trace(waveform)?;
        Ok(analyze_rhythm(&trace.peaks, waveform.fs()))
    }
}

impl AnalysisBackend for ReferenceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Reference
    }

    fn analyze(&self, waveform: &Waveform) -> Result<AnalysisResult, BackendError> {
        Ok(self.run(waveform)?)
    }
}
