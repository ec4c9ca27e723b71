//! Toolkit-independent viewer state: the loaded file, the canvas, playback and
//! the marker, driven by click and open requests from whatever window hosts it.

use std::path::Path;

use log::{debug, info, warn};

use crate::{
    audio::{load_wav, SampleBuffer},
    canvas::{Canvas, SharedCanvas},
    config::{MarkerSpeed, ViewerConfig},
    error::SessionError,
    marker::{MarkerEngine, MarkerTiming, RedrawHook},
    player::Playback,
    waveform::{draw_waveform, WaveformGeometry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickStart {
    pub column: usize,
    pub start_frame: usize,
}

pub struct Session<P: Playback> {
    config: ViewerConfig,
    canvas: SharedCanvas,
    buffer: Option<SampleBuffer>,
    geometry: Option<WaveformGeometry>,
    first_timing: Option<MarkerTiming>,
    marker: MarkerEngine,
    playback: P,
    redraw: RedrawHook,
}

impl<P: Playback> Session<P> {
    pub fn new(config: ViewerConfig, playback: P, redraw: RedrawHook) -> Self {
        let canvas = Canvas::shared(config.width, config.height);
        // Placeholder until a file sets real geometry; nothing ticks before then.
        let timing = MarkerTiming {
            frames_per_sample: 0,
            sample_rate: 0,
            columns_per_tick: config.columns_per_tick,
        };
        let marker = MarkerEngine::new(canvas.clone(), timing, redraw.clone());

        Self {
            config,
            canvas,
            buffer: None,
            geometry: None,
            first_timing: None,
            marker,
            playback,
            redraw,
        }
    }

    pub fn canvas(&self) -> &SharedCanvas {
        &self.canvas
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn buffer(&self) -> Option<&SampleBuffer> {
        self.buffer.as_ref()
    }

    pub fn geometry(&self) -> Option<&WaveformGeometry> {
        self.geometry.as_ref()
    }

    pub fn marker(&self) -> &MarkerEngine {
        &self.marker
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    /// Load `path` and show it. On error the current file stays on screen.
    pub fn open<A: AsRef<Path>>(&mut self, path: A) -> Result<(), SessionError> {
        let buffer = load_wav(path.as_ref())?;
        self.show(buffer)
    }

    /// Replace the loaded audio and redraw the waveform from channel 0.
    pub fn show(&mut self, buffer: SampleBuffer) -> Result<(), SessionError> {
        let mut canvas = Canvas::new(self.config.width, self.config.height);
        let geometry = draw_waveform(
            &buffer.channel(0),
            &mut canvas,
            buffer.sample_rate(),
            self.config.layout,
            self.config.window,
        )?;

        self.stop();
        *self.canvas.lock() = canvas;

        let timing = geometry.timing(self.config.columns_per_tick);
        let timing = match self.config.marker_speed {
            MarkerSpeed::PerFile => timing,
            MarkerSpeed::FirstFile => *self.first_timing.get_or_insert(timing),
        };
        self.marker.set_timing(timing);
        info!(
            "marker advances every {:.1} ms",
            timing.draw_interval().as_secs_f64() * 1000.0
        );

        self.buffer = Some(buffer);
        self.geometry = Some(geometry);
        (self.redraw)();
        Ok(())
    }

    /// Frame where playback starts for a click at canvas column `x`.
    pub fn start_frame_for(&self, x: usize) -> usize {
        let frames = self.buffer.as_ref().map_or(0, SampleBuffer::frames);
        let width = self.config.width.max(1);
        let x = x.min(width - 1);
        (frames as u128 * x as u128 / width as u128) as usize
    }

    /// Play from the clicked column and start the marker there.
    /// Returns `None` when no file is loaded.
    pub fn on_click(&mut self, x: f64, _y: f64) -> Result<Option<ClickStart>, SessionError> {
        let Some(buffer) = self.buffer.as_ref() else {
            return Ok(None);
        };

        let column = if x.is_finite() {
            (x.max(0.0) as usize).min(self.config.width.saturating_sub(1))
        } else {
            0
        };
        let start_frame = self.start_frame_for(column);

        self.marker.stop();
        self.playback.stop();
        if let Err(err) = self.playback.play(buffer, start_frame) {
            warn!("playback failed, marker stays idle: {}", err);
            self.playback.stop();
            return Err(err.into());
        }
        self.marker.start(column);

        Ok(Some(ClickStart {
            column,
            start_frame,
        }))
    }

    /// Retire the marker once playback has run out of audio.
    /// Returns true when the marker was stopped.
    pub fn sync_with_playback(&mut self) -> bool {
        if !self.marker.is_tracking() || self.playback.is_playing() {
            return false;
        }
        debug!("playback finished, stopping the marker");
        self.marker.stop()
    }

    pub fn stop(&mut self) {
        self.marker.stop();
        self.playback.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use std::sync::Arc;

    #[derive(Default)]
    struct MockPlayback {
        pub started: Vec<usize>,
        pub stops: usize,
        pub playing: bool,
        pub fail: bool,
    }

    impl Playback for MockPlayback {
        fn play(&mut self, _buffer: &SampleBuffer, start_frame: usize) -> Result<(), PlaybackError> {
            if self.fail {
                return Err(PlaybackError::Stream("device unplugged".into()));
            }
            self.stop();
            self.started.push(start_frame);
            self.playing = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.playing = false;
        }

        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    fn slow_config() -> ViewerConfig {
        // a 60 s window keeps ticks far apart
        ViewerConfig {
            window: crate::waveform::TimeWindow {
                start: 0.0,
                end: 60.0,
            },
            ..ViewerConfig::default()
        }
    }

    fn tone(frames: usize) -> SampleBuffer {
        let samples = (0..frames)
            .flat_map(|i| {
                let s = ((i % 100) as i16 - 50) * 300;
                [s, -s]
            })
            .collect();
        SampleBuffer::from_interleaved(samples, 2, 44100).unwrap()
    }

    fn session(playback: MockPlayback) -> Session<MockPlayback> {
        Session::new(slow_config(), playback, Arc::new(|| {}))
    }

    #[test]
    fn click_before_open_is_ignored() {
        let mut session = session(MockPlayback::default());
        assert_eq!(session.on_click(10.0, 10.0).unwrap(), None);
        assert!(session.playback().started.is_empty());
        assert!(!session.marker().is_tracking());
    }

    #[test]
    fn mid_canvas_click_plays_from_the_middle() {
        let mut session = session(MockPlayback::default());
        session.show(tone(441_001)).unwrap();

        let start = session.on_click(425.0, 100.0).unwrap().unwrap();
        assert_eq!(start.column, 425);
        assert_eq!(start.start_frame, 441_001 / 2);
        assert_eq!(session.playback().started, vec![220_500]);
        assert_eq!(session.marker().position(), Some(425));
        session.stop();
    }

    #[test]
    fn clicks_past_the_edge_are_clamped() {
        let mut session = session(MockPlayback::default());
        session.show(tone(85_000)).unwrap();

        let start = session.on_click(5_000.0, 0.0).unwrap().unwrap();
        assert_eq!(start.column, 849);
        assert_eq!(start.start_frame, 84_900);

        let start = session.on_click(-3.0, 0.0).unwrap().unwrap();
        assert_eq!(start.column, 0);
        assert_eq!(start.start_frame, 0);
        session.stop();
    }

    #[test]
    fn new_click_supersedes_the_old_session() {
        let mut session = session(MockPlayback::default());
        session.show(tone(100_000)).unwrap();
        let clean = session.canvas().lock().clone();

        session.on_click(100.0, 0.0).unwrap();
        session.on_click(300.0, 0.0).unwrap();
        assert_eq!(session.marker().position(), Some(300));
        assert_eq!(session.marker().armed_timers(), 1);
        assert_eq!(session.playback().started.len(), 2);

        session.stop();
        assert!(session.playback().stops >= 3);
        assert!(!session.playback().is_playing());
        assert_eq!(session.marker().armed_timers(), 0);
        assert_eq!(*session.canvas().lock(), clean);
    }

    #[test]
    fn marker_stops_when_the_audio_runs_out() {
        let mut session = session(MockPlayback::default());
        session.show(tone(100_000)).unwrap();
        let clean = session.canvas().lock().clone();
        session.on_click(200.0, 0.0).unwrap();

        assert!(!session.sync_with_playback());
        assert_eq!(session.marker().position(), Some(200));

        session.playback.playing = false;
        assert!(session.sync_with_playback());
        assert!(!session.marker().is_tracking());
        assert_eq!(session.marker().armed_timers(), 0);
        assert_eq!(*session.canvas().lock(), clean);

        assert!(!session.sync_with_playback());
    }

    #[test]
    fn playback_failure_leaves_marker_idle() {
        let mut session = session(MockPlayback::default());
        session.show(tone(100_000)).unwrap();
        let clean = session.canvas().lock().clone();
        session.on_click(200.0, 0.0).unwrap();

        session.playback.fail = true;
        assert!(matches!(
            session.on_click(400.0, 0.0),
            Err(SessionError::Playback(_))
        ));
        assert!(!session.marker().is_tracking());
        assert_eq!(session.marker().armed_timers(), 0);
        assert_eq!(*session.canvas().lock(), clean);
    }

    #[test]
    fn first_file_speed_keeps_the_first_period() {
        let mut config = slow_config();
        config.marker_speed = MarkerSpeed::FirstFile;
        let mut session = Session::new(config, MockPlayback::default(), Arc::new(|| {}));

        session.show(tone(50_000)).unwrap();
        let first = session.marker().timing();

        let slower = SampleBuffer::from_interleaved(vec![0; 2 * 50_000], 2, 22050).unwrap();
        session.show(slower).unwrap();
        assert_eq!(session.marker().timing(), first);
    }

    #[test]
    fn per_file_speed_rescales() {
        let mut session = session(MockPlayback::default());
        session.show(tone(50_000)).unwrap();
        let first = session.marker().timing();

        let slower = SampleBuffer::from_interleaved(vec![0; 2 * 50_000], 2, 22050).unwrap();
        session.show(slower).unwrap();
        assert_ne!(session.marker().timing(), first);
        assert_eq!(session.marker().timing().sample_rate, 22050);
    }

    #[test]
    fn failed_open_keeps_the_waveform() {
        let mut session = session(MockPlayback::default());
        session.show(tone(100_000)).unwrap();
        let before = session.canvas().lock().clone();

        assert!(matches!(
            session.open("/definitely/not/here.wav"),
            Err(SessionError::Audio(crate::error::AudioError::Io(_)))
        ));
        assert_eq!(*session.canvas().lock(), before);
        assert_eq!(session.buffer().map(SampleBuffer::frames), Some(100_000));
    }
}
