use crate::signal::{PeakSet, RRIntervals};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Heart rate below which bradycardia is flagged (bpm).
pub const BRADYCARDIA_BPM: f64 = 60.0;
/// Heart rate above which tachycardia is flagged (bpm).
pub const TACHYCARDIA_BPM: f64 = 100.0;
/// SDNN below this (seconds) is flagged as abnormally low variability.
pub const SDNN_LOW_S: f64 = 0.020;
/// SDNN above this (seconds) is flagged as abnormally high variability.
pub const SDNN_HIGH_S: f64 = 0.200;

/// Human-readable findings attached to every result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Alert {
    InsufficientData,
    Bradycardia,
    Tachycardia,
    LowVariability,
    HighVariability,
    NormalRhythm,
}

impl Alert {
    pub const ALL: [Alert; 6] = [
        Alert::InsufficientData,
        Alert::Bradycardia,
        Alert::Tachycardia,
        Alert::LowVariability,
        Alert::HighVariability,
        Alert::NormalRhythm,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            Alert::InsufficientData => "insufficient data",
            Alert::Bradycardia => "bradycardia detected (bpm<60)",
            Alert::Tachycardia => "tachycardia detected (bpm>100)",
            Alert::LowVariability => "very low variability (SDNN<20ms) – possible rigidity",
            Alert::HighVariability => "very high variability (SDNN>200ms) – possible arrhythmia",
            Alert::NormalRhythm => "rhythm within normal parameters",
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl From<Alert> for String {
    fn from(alert: Alert) -> Self {
        alert.message().to_string()
    }
}

impl TryFrom<String> for Alert {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Alert::ALL
            .into_iter()
            .find(|alert| alert.message() == value)
            .ok_or_else(|| format!("unknown alert: {value}"))
    }
}

/// Outcome of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub bpm: f64,
    pub peak_count: usize,
    pub bradycardia: bool,
    pub tachycardia: bool,
    pub irregularity: bool,
    pub rr_intervals: Vec<f64>,
    pub alerts: Vec<Alert>,
}

impl AnalysisResult {
    /// Equal flags, counts and alerts; `bpm` and RR intervals within `eps`.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.peak_count == other.peak_count
            && self.bradycardia == other.bradycardia
            && self.tachycardia == other.tachycardia
            && self.irregularity == other.irregularity
            && self.alerts == other.alerts
            && (self.bpm - other.bpm).abs() <= eps
            && self.rr_intervals.len() == other.rr_intervals.len()
            && self
                .rr_intervals
                .iter()
                .zip(&other.rr_intervals)
                .all(|(a, b)| (a - b).abs() <= eps)
    }
}

/// Summary statistics of an RR series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RrStats {
    pub n: usize,
    pub mean_rr: f64,
    /// Population standard deviation (ddof = 0).
    pub sdnn: f64,
}

pub fn rr_stats(rr: &RRIntervals) -> RrStats {
    let n = rr.rr.len();
    let mean_rr = if n > 0 {
        rr.rr.iter().sum::<f64>() / n as f64
    } else {
        0.0
    };
    let sdnn = if n > 0 {
        (rr.rr.iter().map(|x| (x - mean_rr).powi(2)).sum::<f64>() / n as f64).sqrt()
    } else {
        0.0
    };
    RrStats { n, mean_rr, sdnn }
}

/// Mean heart rate over the series; zero when there is nothing to average.
pub fn bpm_from_rr(rr: &RRIntervals) -> f64 {
    let stats = rr_stats(rr);
    if stats.mean_rr > 0.0 {
        60.0 / stats.mean_rr
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Findings {
    bradycardia: bool,
    tachycardia: bool,
    irregularity: bool,
    alerts: Vec<Alert>,
}

fn classify(bpm: f64, rr: &RRIntervals) -> Findings {
    let mut findings = Findings::default();
    if bpm == 0.0 || rr.len() < 2 {
        findings.alerts.push(Alert::InsufficientData);
        return findings;
    }
    if bpm < BRADYCARDIA_BPM {
        findings.bradycardia = true;
        findings.alerts.push(Alert::Bradycardia);
    }
    if bpm > TACHYCARDIA_BPM {
        findings.tachycardia = true;
        findings.alerts.push(Alert::Tachycardia);
    }
    let sdnn = rr_stats(rr).sdnn;
    if sdnn < SDNN_LOW_S {
        findings.irregularity = true;
        findings.alerts.push(Alert::LowVariability);
    } else if sdnn > SDNN_HIGH_S {
        findings.irregularity = true;
        findings.alerts.push(Alert::HighVariability);
    }
    if findings.alerts.is_empty() {
        findings.alerts.push(Alert::NormalRhythm);
    }
    findings
}

fn build_result(peak_count: usize, rr: RRIntervals) -> AnalysisResult {
    let bpm = bpm_from_rr(&rr);
    let findings = classify(bpm, &rr);
    AnalysisResult {
        bpm,
        peak_count,
        bradycardia: findings.bradycardia,
        tachycardia: findings.tachycardia,
        irregularity: findings.irregularity,
        rr_intervals: rr.rr,
        alerts: findings.alerts,
    }
}

/// Turn detected beats into RR intervals, heart rate and anomaly flags.
pub fn analyze_rhythm(peaks: &PeakSet, fs: f64) -> AnalysisResult {
    build_result(peaks.len(), RRIntervals::from_peaks(peaks, fs))
}

/// Classify an RR series obtained elsewhere (e.g. annotated beats).
pub fn classify_rr(rr: RRIntervals) -> AnalysisResult {
    let peak_count = if rr.is_empty() { 0 } else { rr.len() + 1 };
    build_result(peak_count, rr)
}
