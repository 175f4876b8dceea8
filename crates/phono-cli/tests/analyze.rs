use assert_cmd::cargo::cargo_bin_cmd;
use hound::{SampleFormat, WavSpec, WavWriter};
use serde::Deserialize;
use std::{error::Error, fs, path::Path};
use tempfile::tempdir;

#[derive(Debug, Deserialize)]
struct AnalyzeOutput {
    bpm: f64,
    peak_count: usize,
    bradycardia: bool,
    tachycardia: bool,
    irregularity: bool,
    rr_intervals: Vec<f64>,
    alerts: Vec<String>,
}

#[derive(Deserialize)]
struct PeaksOutput {
    sample_rate: u32,
    min_distance: usize,
    indices: Vec<usize>,
}

fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("create wav");
    for &s in samples {
        writer.write_sample(s).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

fn impulse_train(n: usize, spacing: usize) -> Vec<i16> {
    let mut pcm = vec![0i16; n];
    let mut i = spacing / 2;
    while i < n {
        pcm[i] = 30_000;
        i += spacing;
    }
    pcm
}

fn analyze(path: &Path, extra: &[&str]) -> Result<AnalyzeOutput, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("phono");
    cmd.arg("analyze")
        .arg("--input")
        .arg(path)
        .args(extra);
    let output = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&output)?)
}

#[test]
fn analyze_reports_tachycardia_for_fast_train() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let wav = dir.path().join("fast.wav");
    write_wav(&wav, 2000, 1, &impulse_train(20_000, 800));

    let out = analyze(&wav, &[])?;
    assert!((out.bpm - 150.0).abs() <= 2.0, "bpm {}", out.bpm);
    assert!(out.tachycardia);
    assert!(!out.bradycardia);
    assert!(out.irregularity);
    assert_eq!(out.rr_intervals.len(), out.peak_count - 1);
    assert_eq!(
        out.alerts,
        vec![
            "tachycardia detected (bpm>100)".to_string(),
            "very low variability (SDNN<20ms) – possible rigidity".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn backends_agree_through_cli() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let wav = dir.path().join("regular.wav");
    write_wav(&wav, 2000, 1, &impulse_train(40_001, 1714));

    let reference = analyze(&wav, &["--backend", "reference"])?;
    let auto = analyze(&wav, &["--backend", "auto"])?;
    assert_eq!(reference.peak_count, auto.peak_count);
    assert!((reference.bpm - auto.bpm).abs() < 1e-6);
    assert_eq!(reference.alerts, auto.alerts);
    for (a, b) in reference.rr_intervals.iter().zip(&auto.rr_intervals) {
        assert!((a - b).abs() < 1e-6);
    }
    Ok(())
}

#[test]
fn forced_reference_still_answers() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let wav = dir.path().join("silence.wav");
    write_wav(&wav, 2000, 1, &vec![0i16; 10_000]);

    let mut cmd = cargo_bin_cmd!("phono");
    cmd.env("PHONO_FORCE_REFERENCE", "1")
        .arg("analyze")
        .arg("--input")
        .arg(&wav);
    let output = cmd.assert().success().get_output().stdout.clone();
    let out: AnalyzeOutput = serde_json::from_slice(&output)?;
    assert_eq!(out.peak_count, 0);
    assert_eq!(out.bpm, 0.0);
    assert_eq!(out.alerts, vec!["insufficient data".to_string()]);
    Ok(())
}

#[test]
fn config_file_selects_backend_and_pretty_output() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let wav = dir.path().join("fast.wav");
    write_wav(&wav, 2000, 1, &impulse_train(20_000, 800));
    let config = dir.path().join("phono.toml");
    fs::write(&config, "[backend]\nmode = \"reference\"\n\n[output]\npretty = true\n")?;

    let mut cmd = cargo_bin_cmd!("phono");
    cmd.arg("--config")
        .arg(&config)
        .arg("analyze")
        .arg("--input")
        .arg(&wav);
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output)?;
    assert!(text.contains("\n  \"bpm\""), "expected pretty JSON: {text}");
    let out: AnalyzeOutput = serde_json::from_str(&text)?;
    assert!(out.tachycardia);
    Ok(())
}

#[test]
fn peaks_command_lists_beats() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let wav = dir.path().join("fast.wav");
    write_wav(&wav, 2000, 1, &impulse_train(20_000, 800));

    let mut cmd = cargo_bin_cmd!("phono");
    cmd.arg("peaks").arg("--input").arg(&wav);
    let output = cmd.assert().success().get_output().stdout.clone();
    let raw: serde_json::Value = serde_json::from_slice(&output)?;
    assert!(raw.get("peaks").is_none(), "indices must be top-level: {raw}");
    let out: PeaksOutput = serde_json::from_value(raw)?;
    assert_eq!(out.sample_rate, 2000);
    assert_eq!(out.min_distance, 500);
    assert!(out.indices.len() >= 23);
    for w in out.indices.windows(2) {
        assert!(w[1] - w[0] >= out.min_distance);
    }
    Ok(())
}

#[test]
fn rejects_stereo_and_non_wav_inputs() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let stereo = dir.path().join("stereo.wav");
    write_wav(&stereo, 2000, 2, &vec![0i16; 2_000]);
    let mut cmd = cargo_bin_cmd!("phono");
    cmd.arg("analyze").arg("--input").arg(&stereo);
    let stderr = cmd.assert().failure().get_output().stderr.clone();
    assert!(String::from_utf8(stderr)?.contains("mono"));

    let mp3 = dir.path().join("beat.mp3");
    fs::write(&mp3, b"ID3")?;
    let mut cmd = cargo_bin_cmd!("phono");
    cmd.arg("analyze").arg("--input").arg(&mp3);
    let stderr = cmd.assert().failure().get_output().stderr.clone();
    assert!(String::from_utf8(stderr)?.contains("not a .wav file"));
    Ok(())
}

#[test]
fn rejects_empty_recording() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let empty = dir.path().join("empty.wav");
    write_wav(&empty, 2000, 1, &[]);
    let mut cmd = cargo_bin_cmd!("phono");
    cmd.arg("analyze").arg("--input").arg(&empty);
    let stderr = cmd.assert().failure().get_output().stderr.clone();
    assert!(String::from_utf8(stderr)?.contains("no samples"));
    Ok(())
}
