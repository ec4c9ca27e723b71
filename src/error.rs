use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Malformed audio: {0}")]
    Malformed(String),
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AudioError::Io(e),
            // data chunk ends mid-sample or mid-frame
            hound::Error::FormatError(msg) if msg.contains("data chunk length") => {
                AudioError::Malformed(msg.to_string())
            }
            other => AudioError::Decode(other.to_string()),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("canvas has no pixels ({width}x{height})")]
    EmptyCanvas { width: usize, height: usize },

    #[error("visible window holds fewer frames than columns")]
    EmptyWindow,
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("no audio output device: {0}")]
    NoDevice(String),

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("playback error: {0}")]
    Play(String),
}

impl From<rodio::StreamError> for PlaybackError {
    fn from(err: rodio::StreamError) -> Self {
        PlaybackError::Stream(err.to_string())
    }
}

impl From<rodio::PlayError> for PlaybackError {
    fn from(err: rodio::PlayError) -> Self {
        PlaybackError::Play(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_frames_are_malformed() {
        let err = AudioError::from(hound::Error::FormatError("invalid data chunk length"));
        assert!(matches!(err, AudioError::Malformed(_)));

        let err = AudioError::from(hound::Error::FormatError(
            "data chunk length is not a multiple of sample size",
        ));
        assert!(matches!(err, AudioError::Malformed(_)));
    }

    #[test]
    fn other_format_errors_are_decode_errors() {
        let err = AudioError::from(hound::Error::FormatError("no RIFF tag found"));
        assert!(matches!(err, AudioError::Decode(_)));
    }
}
