use cpal::traits::{DeviceTrait, HostTrait};
use log::{info, warn};
use rodio::{buffer::SamplesBuffer, OutputStream, OutputStreamHandle, Sink};

use crate::{
    audio::{change_volume, SampleBuffer},
    error::PlaybackError,
};

pub trait Playback {
    /// Start audio at `start_frame`, replacing whatever is playing.
    fn play(&mut self, buffer: &SampleBuffer, start_frame: usize) -> Result<(), PlaybackError>;

    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}

pub struct Track(Sink);

impl Track {
    pub fn try_new(
        stream_handle: &OutputStreamHandle,
        source: SamplesBuffer<i16>,
    ) -> Result<Track, PlaybackError> {
        let sink = Sink::try_new(stream_handle)?;
        sink.append(source);
        Ok(Track(sink))
    }

    pub fn stop(&self) {
        self.0.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.0.empty()
    }
}

pub struct RodioPlayback {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    track: Option<Track>,
    gain: f32,
}

impl RodioPlayback {
    /// Open `device` by name, or the host default.
    pub fn try_new(device: Option<&str>, gain: f32) -> Result<RodioPlayback, PlaybackError> {
        let (stream, stream_handle) = match device {
            Some(name) => {
                let device = find_output_device(name)?;
                OutputStream::try_from_device(&device)?
            }
            None => OutputStream::try_default()?,
        };

        Ok(RodioPlayback {
            _stream: stream,
            stream_handle,
            track: None,
            gain,
        })
    }
}

impl Playback for RodioPlayback {
    fn play(&mut self, buffer: &SampleBuffer, start_frame: usize) -> Result<(), PlaybackError> {
        self.stop();

        let mut samples = buffer.from_frame(start_frame).to_vec();
        if (self.gain - 1.0).abs() > f32::EPSILON {
            change_volume(&mut samples, self.gain);
        }
        let source = SamplesBuffer::new(buffer.channels(), buffer.sample_rate(), samples);

        self.track = Some(Track::try_new(&self.stream_handle, source)?);
        info!(
            "playing from frame {} of {}",
            start_frame.min(buffer.frames()),
            buffer.frames()
        );
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(track) = self.track.take() {
            track.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.track.as_ref().map_or(false, |track| !track.is_finished())
    }
}

pub fn output_device_names() -> Result<Vec<String>, PlaybackError> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| PlaybackError::NoDevice(e.to_string()))?;

    Ok(devices
        .filter_map(|device| match device.name() {
            Ok(name) => Some(name),
            Err(err) => {
                warn!("skipping unnamed output device: {}", err);
                None
            }
        })
        .collect())
}

fn find_output_device(name: &str) -> Result<cpal::Device, PlaybackError> {
    let host = cpal::default_host();
    let mut devices = host
        .output_devices()
        .map_err(|e| PlaybackError::NoDevice(e.to_string()))?;

    devices
        .find(|device| device.name().map_or(false, |n| n == name))
        .ok_or_else(|| PlaybackError::NoDevice(name.to_string()))
}
