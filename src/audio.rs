use std::{path::Path, time::Duration};

use log::info;

use crate::error::AudioError;

/// Interleaved 16-bit PCM frames plus the rate they were recorded at.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn from_interleaved(
        samples: Vec<i16>,
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self, AudioError> {
        if channels == 0 {
            return Err(AudioError::Malformed("header declares zero channels".into()));
        }
        if sample_rate == 0 {
            return Err(AudioError::Malformed("header declares a zero sample rate".into()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioError::Malformed(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }

        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn frame(&self, index: usize) -> Option<&[i16]> {
        let width = self.channels as usize;
        self.samples.get(index * width..(index + 1) * width)
    }

    /// One channel pulled out of the interleaved data.
    pub fn channel(&self, channel: u16) -> Vec<i16> {
        if channel >= self.channels {
            return Vec::new();
        }
        self.samples
            .chunks_exact(self.channels as usize)
            .map(|frame| frame[channel as usize])
            .collect()
    }

    /// Interleaved tail starting at `frame`; past the end this is empty.
    pub fn from_frame(&self, frame: usize) -> &[i16] {
        let start = frame.min(self.frames()) * self.channels as usize;
        &self.samples[start..]
    }
}

pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<SampleBuffer, AudioError> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(AudioError::Decode(format!(
            "expected 16-bit integer PCM, found {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()?;
    let buffer = SampleBuffer::from_interleaved(samples, spec.channels, spec.sample_rate)?;

    info!(
        "loaded {}: {} frames, {} channel(s) at {} Hz",
        path.display(),
        buffer.frames(),
        buffer.channels(),
        buffer.sample_rate()
    );
    Ok(buffer)
}

/// Clip mono samples to the `[s1, s2)` second range.
pub fn zoom(samples: &[i16], s1: f64, s2: f64, sample_rate: u32) -> &[i16] {
    let start = ((s1 * sample_rate as f64).floor().max(0.0) as usize).min(samples.len());
    let end = ((s2 * sample_rate as f64).floor().max(0.0) as usize).min(samples.len());
    if end <= start {
        return &[];
    }
    &samples[start..end]
}

/// Scale samples in place, saturating at the i16 range.
pub fn change_volume(samples: &mut [i16], multiplier: f32) {
    for sample in samples.iter_mut() {
        let scaled = (*sample as f32 * multiplier).round();
        *sample = scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    }
}
