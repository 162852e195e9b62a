//! WAV loading and saving.
//!
//! Integer PCM is scaled into `[-1, 1]` by the largest positive code of its
//! bit depth and float PCM is taken as-is. Multi-channel frames are averaged
//! to mono. Output is always 16-bit mono, peak-normalized to full scale.

use crate::math::stats::StatsHelper;
use crate::prelude::{StageError, StageResult};
use crate::signal::Waveform;
use log::info;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const OUTPUT_FULL_SCALE: f32 = i16::MAX as f32;

fn io_error(path: &Path, source: hound::Error) -> StageError {
    StageError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub fn load_waveform<P: AsRef<Path>>(path: P) -> StageResult<Waveform> {
    let path = path.as_ref();
    let mut reader = hound::WavReader::open(path).map_err(|e| io_error(path, e))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels);
    if channels == 0 {
        return Err(StageError::InvalidInput(format!(
            "{} declares zero channels",
            path.display()
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let full_scale = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|value| value as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|e| io_error(path, e))?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| io_error(path, e))?,
    };

    let samples = downmix(&interleaved, channels);
    info!(
        "loaded {}: {} samples at {} Hz ({} channel(s), {}-bit {:?})",
        path.display(),
        samples.len(),
        spec.sample_rate,
        channels,
        spec.bits_per_sample,
        spec.sample_format
    );
    Ok(Waveform::new(samples, spec.sample_rate))
}

/// Arithmetic mean across channels for each frame.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

pub fn save_waveform<P: AsRef<Path>>(path: P, waveform: &Waveform) -> StageResult<()> {
    let path = path.as_ref();
    let peak = StatsHelper::peak_abs(&waveform.samples).ok_or_else(|| {
        StageError::DegenerateSignal(format!(
            "cannot normalize {} samples for {}: empty or non-finite",
            waveform.len(),
            path.display()
        ))
    })?;
    if peak == 0.0 {
        return Err(StageError::DegenerateSignal(format!(
            "cannot normalize silent output for {}",
            path.display()
        )));
    }

    // Samples land in a sibling file that only replaces `path` once complete.
    let partial = partial_path(path);
    let written = write_pcm16(&partial, waveform, peak)
        .and_then(|()| fs::rename(&partial, path).map_err(hound::Error::IoError));
    if let Err(source) = written {
        let _ = fs::remove_file(&partial);
        return Err(io_error(path, source));
    }

    info!(
        "saved {}: {} samples at {} Hz (peak {:.4})",
        path.display(),
        waveform.len(),
        waveform.sample_rate,
        peak
    );
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn write_pcm16(path: &Path, waveform: &Waveform, peak: f32) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &waveform.samples {
        writer.write_sample((sample / peak * OUTPUT_FULL_SCALE) as i16)?;
    }
    writer.finalize()
}
