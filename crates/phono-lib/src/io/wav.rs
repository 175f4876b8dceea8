use crate::{error::InputError, signal::PcmRecording};
use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Decode a mono 16-bit PCM WAV file.
pub fn read_wav(path: &Path) -> Result<PcmRecording, InputError> {
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if !is_wav {
        return Err(InputError::UnsupportedExtension {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(hound::Error::IoError)?;
    decode_wav(BufReader::new(file))
}

/// Decode WAV data from any reader (e.g. an in-memory upload).
pub fn decode_wav<R: Read>(reader: R) -> Result<PcmRecording, InputError> {
    let reader = WavReader::new(reader)?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(InputError::NotMono(spec.channels));
    }
    if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
        let format = match spec.sample_format {
            SampleFormat::Int => "integer",
            SampleFormat::Float => "float",
        };
        return Err(InputError::NotPcm16 {
            bits: spec.bits_per_sample,
            format,
        });
    }
    if reader.len() == 0 {
        return Err(InputError::Empty);
    }
    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()?;
    if samples.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(PcmRecording {
        sample_rate: spec.sample_rate,
        samples,
    })
}
