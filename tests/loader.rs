use std::{fs, path::Path};

use tempfile::tempdir;
use wavemark::{audio::load_wav, error::AudioError};

fn write_wav(path: &Path, channels: u16, bits: u16, samples: &[i32]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: 22050,
        bits_per_sample: bits,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn loads_stereo_pcm() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    write_wav(&path, 2, 16, &[100, -100, 200, -200, 32767, -32768]);

    let buffer = load_wav(&path).unwrap();
    assert_eq!(buffer.channels(), 2);
    assert_eq!(buffer.sample_rate(), 22050);
    assert_eq!(buffer.frames(), 3);
    assert_eq!(buffer.channel(0), vec![100, 200, 32767]);
    assert_eq!(buffer.channel(1), vec![-100, -200, -32768]);
}

#[test]
fn loads_mono_pcm() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mono.wav");
    write_wav(&path, 1, 16, &[1, 2, 3, 4]);

    let buffer = load_wav(&path).unwrap();
    assert_eq!(buffer.frames(), 4);
    assert_eq!(buffer.channel(0), vec![1, 2, 3, 4]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_wav(dir.path().join("nope.wav")).unwrap_err();
    assert!(matches!(err, AudioError::Io(_)), "{err:?}");
}

#[test]
fn garbage_is_a_decode_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.wav");
    fs::write(&path, b"these are not the bytes you are looking for").unwrap();

    let err = load_wav(&path).unwrap_err();
    assert!(matches!(err, AudioError::Decode(_)), "{err:?}");
}

/// Stereo 16-bit header whose data chunk holds three samples.
fn half_frame_wav() -> Vec<u8> {
    let data: [i16; 3] = [100, -100, 200];
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36u32 + 6).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&2u16.to_le_bytes()); // channels
    bytes.extend_from_slice(&44100u32.to_le_bytes());
    bytes.extend_from_slice(&(44100u32 * 4).to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&6u32.to_le_bytes());
    for sample in data {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

#[test]
fn partial_frame_is_malformed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("half.wav");
    fs::write(&path, half_frame_wav()).unwrap();

    let err = load_wav(&path).unwrap_err();
    assert!(matches!(err, AudioError::Malformed(_)), "{err:?}");
}

#[test]
fn eight_bit_pcm_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("eight.wav");
    write_wav(&path, 1, 8, &[1, -1, 2, -2]);

    let err = load_wav(&path).unwrap_err();
    assert!(matches!(err, AudioError::Decode(_)), "{err:?}");
}
