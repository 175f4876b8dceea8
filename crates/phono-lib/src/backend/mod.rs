//! Backend strategy and the native → reference fallback selector.

#[cfg(feature = "native")]
pub mod native;
pub mod reference;

use crate::{
    error::{AnalysisError, BackendError},
    metrics::rhythm::AnalysisResult,
    signal::Waveform,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::OnceLock,
};

#[cfg(feature = "native")]
pub use native::NativeBackend;
pub use reference::{PipelineTrace, ReferenceBackend};

/// Environment switch that pins a process to the reference backend.
pub const FORCE_REFERENCE_ENV: &str = "PHONO_FORCE_REFERENCE";

/// One implementation of the full band-pass → envelope → peaks → rhythm chain.
pub trait AnalysisBackend: Send + Sync {
    fn kind(&self) -> BackendKind;
    fn analyze(&self, waveform: &Waveform) -> Result<AnalysisResult, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Native,
    Reference,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Native => "native",
            BackendKind::Reference => "reference",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Requested backend policy, from the config file or command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Native when available, reference otherwise.
    #[default]
    Auto,
    Native,
    Reference,
}

/// Whether the native backend may be used. Decided once, never re-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeAvailability {
    Available,
    Unavailable(&'static str),
}

impl NativeAvailability {
    /// Resolve availability from the build, the environment and `mode`.
    pub fn detect(mode: BackendMode) -> Self {
        if mode == BackendMode::Reference {
            return Self::Unavailable("reference backend requested");
        }
        if force_reference_from_env() {
            return Self::Unavailable("disabled by PHONO_FORCE_REFERENCE");
        }
        Self::compiled()
    }

    /// Availability for callers that never configure anything, fixed at first use.
    pub fn process_default() -> Self {
        static DEFAULT: OnceLock<NativeAvailability> = OnceLock::new();
        *DEFAULT.get_or_init(|| Self::detect(BackendMode::Auto))
    }

    #[cfg(feature = "native")]
    fn compiled() -> Self {
        Self::Available
    }

    #[cfg(not(feature = "native"))]
    fn compiled() -> Self {
        Self::Unavailable("built without the `native` feature")
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

fn force_reference_from_env() -> bool {
    std::env::var(FORCE_REFERENCE_ENV)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Tries the primary backend and re-runs the whole analysis on the
/// reference backend if it fails. Results are never mixed.
pub struct BackendSelector {
    primary: Option<Box<dyn AnalysisBackend>>,
    reference: ReferenceBackend,
}

impl BackendSelector {
    pub fn new(availability: NativeAvailability) -> Self {
        let primary = match availability {
            NativeAvailability::Available => native_backend(),
            NativeAvailability::Unavailable(reason) => {
                info!("native backend disabled: {reason}");
                None
            }
        };
        Self {
            primary,
            reference: ReferenceBackend,
        }
    }

    /// Use a custom primary backend in front of the reference fallback.
    pub fn with_primary(primary: Box<dyn AnalysisBackend>) -> Self {
        Self {
            primary: Some(primary),
            reference: ReferenceBackend,
        }
    }

    /// Backend tried first.
    pub fn preferred(&self) -> BackendKind {
        self.primary
            .as_ref()
            .map(|backend| backend.kind())
            .unwrap_or(BackendKind::Reference)
    }

    pub fn analyze(&self, waveform: &Waveform) -> Result<AnalysisResult, AnalysisError> {
        self.run(waveform).map(|(result, _)| result)
    }

    /// Like [`analyze`](Self::analyze), also reporting which backend answered.
    pub fn run(&self, waveform: &Waveform) -> Result<(AnalysisResult, BackendKind), AnalysisError> {
        if let Some(primary) = &self.primary {
            match guarded(primary.as_ref(), waveform) {
                Ok(result) => return Ok((result, primary.kind())),
                Err(err) => warn!(
                    "{} backend failed, falling back to reference: {err}",
                    primary.kind()
                ),
            }
        }
        let result = self.reference.run(waveform)?;
        Ok((result, BackendKind::Reference))
    }
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self::new(NativeAvailability::process_default())
    }
}

impl fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSelector")
            .field("preferred", &self.preferred())
            .finish()
    }
}

#[cfg(feature = "native")]
fn native_backend() -> Option<Box<dyn AnalysisBackend>> {
    info!("native backend enabled");
    Some(Box::new(NativeBackend))
}

#[cfg(not(feature = "native"))]
fn native_backend() -> Option<Box<dyn AnalysisBackend>> {
    info!("native backend not compiled in");
    None
}

/// Run a backend, turning a panic into a recoverable error.
fn guarded(
    backend: &dyn AnalysisBackend,
    waveform: &Waveform,
) -> Result<AnalysisResult, BackendError> {
    match panic::catch_unwind(AssertUnwindSafe(|| backend.analyze(waveform))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(BackendError::Panicked {
                backend: backend.kind().name(),
                message,
            })
        }
    }
}

/// Analyze with the process-default backend selection.
pub fn analyze(waveform: &Waveform) -> Result<AnalysisResult, AnalysisError> {
    BackendSelector::default().analyze(waveform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::rhythm::Alert;

    struct FailingBackend;

    impl AnalysisBackend for FailingBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Native
        }

        fn analyze(&self, _waveform: &Waveform) -> Result<AnalysisResult, BackendError> {
            Err(BackendError::NonFinite {
                backend: "native",
                stage: "envelope",
            })
        }
    }

    struct PanickingBackend;

    impl AnalysisBackend for PanickingBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Native
        }

        fn analyze(&self, _waveform: &Waveform) -> Result<AnalysisResult, BackendError> {
            panic!("simulated native crash");
        }
    }

    fn impulse_train(fs: u32, spacing: usize, seconds: usize) -> Waveform {
        let n = fs as usize * seconds;
        let mut pcm = vec![0i16; n];
        let mut i = spacing / 2;
        while i < n {
            pcm[i] = 30_000;
            i += spacing;
        }
        Waveform::from_pcm(fs, &pcm).unwrap()
    }

    #[test]
    fn reference_mode_never_builds_native() {
        let selector = BackendSelector::new(NativeAvailability::detect(BackendMode::Reference));
        assert_eq!(selector.preferred(), BackendKind::Reference);
    }

    #[test]
    fn failure_falls_back_to_reference() {
        let wf = impulse_train(2000, 800, 10);
        let selector = BackendSelector::with_primary(Box::new(FailingBackend));
        let (result, used) = selector.run(&wf).unwrap();
        assert_eq!(used, BackendKind::Reference);
        assert_eq!(result, ReferenceBackend.run(&wf).unwrap());
    }

    #[test]
    fn panic_falls_back_to_reference() {
        let wf = impulse_train(2000, 800, 4);
        let selector = BackendSelector::with_primary(Box::new(PanickingBackend));
        let (result, used) = selector.run(&wf).unwrap();
        assert_eq!(used, BackendKind::Reference);
        assert!(result.peak_count > 0);
    }

    #[test]
    fn guarded_reports_panic_message() {
        let wf = impulse_train(1000, 400, 1);
        match guarded(&PanickingBackend, &wf) {
            Err(BackendError::Panicked { backend, message }) => {
                assert_eq!(backend, "native");
                assert!(message.contains("simulated native crash"));
            }
            other => panic!("expected panic error, got {other:?}"),
        }
    }

    #[test]
    fn silence_through_selector() {
        let wf = Waveform::from_pcm(2000, &vec![0i16; 8000]).unwrap();
        let result = BackendSelector::default().analyze(&wf).unwrap();
        assert_eq!(result.peak_count, 0);
        assert_eq!(result.bpm, 0.0);
        assert_eq!(result.alerts, vec![Alert::InsufficientData]);
    }

    #[cfg(feature = "native")]
    #[test]
    fn native_is_preferred_when_available() {
        let selector = BackendSelector::new(NativeAvailability::Available);
        assert_eq!(selector.preferred(), BackendKind::Native);
    }

    #[cfg(not(feature = "native"))]
    #[test]
    fn native_unavailable_without_feature() {
        assert!(!NativeAvailability::detect(BackendMode::Native).is_available());
    }
}
