//! Heart-sound (phonocardiogram) analysis: band-pass isolation of the 20–200 Hz
//! band, envelope beat detection, RR/BPM computation and rhythm classification,
//! run on an accelerated backend with a reference fallback.

pub mod backend;
pub mod config;
pub mod detectors;
pub mod error;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod signal;

pub use backend::{analyze, BackendKind, BackendMode, BackendSelector, NativeAvailability};
pub use error::{AnalysisError, BackendError, InputError};
pub use metrics::rhythm::{Alert, AnalysisResult};
pub use signal::*;
