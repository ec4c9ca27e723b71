//! Playback-position marker.
//!
//! The marker is a one-pixel ink column drawn over the waveform. A ticker thread
//! moves it right by one column every `draw_interval`. Before the marker leaves a
//! column, the column is wiped and the waveform ink captured on arrival is put back.
//! Every step happens under the marker state lock and then the canvas lock, so a
//! reader of the canvas never sees a half-restored column.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::canvas::{InkExtent, SharedCanvas};

/// Called after every change the marker makes to the canvas.
pub type RedrawHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerTiming {
    pub frames_per_sample: usize,
    pub sample_rate: u32,
    pub columns_per_tick: u32,
}

impl MarkerTiming {
    /// `columns_per_tick` drawn columns' worth of audio. Zero when the
    /// period is undefined or does not fit a `Duration`; a zero interval
    /// never arms the ticker.
    pub fn draw_interval(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(
            self.columns_per_tick as f64 * self.frames_per_sample as f64
                / self.sample_rate as f64,
        )
        .unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerSession {
    pub x: usize,
    pub extent: Option<InkExtent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced(usize),
    /// Ran off the right edge; the marker is gone.
    Finished,
    /// Stopped or superseded since this tick was scheduled.
    Stale,
}

#[derive(Default)]
struct MarkerState {
    epoch: u64,
    session: Option<MarkerSession>,
}

struct Ticker {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn cancel(self) {
        // The ticker may already have exited and dropped its receiver.
        let _ = self.cancel.send(());
        if self.handle.join().is_err() {
            warn!("marker ticker panicked");
        }
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MarkerEngine {
    canvas: SharedCanvas,
    state: Arc<Mutex<MarkerState>>,
    timing: MarkerTiming,
    redraw: RedrawHook,
    ticker: Option<Ticker>,
    live: Arc<AtomicUsize>,
}

impl MarkerEngine {
    pub fn new(canvas: SharedCanvas, timing: MarkerTiming, redraw: RedrawHook) -> Self {
        Self {
            canvas,
            state: Arc::new(Mutex::new(MarkerState::default())),
            timing,
            redraw,
            ticker: None,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn timing(&self) -> MarkerTiming {
        self.timing
    }

    /// Takes effect on the next `start`.
    pub fn set_timing(&mut self, timing: MarkerTiming) {
        self.timing = timing;
    }

    pub fn is_tracking(&self) -> bool {
        self.state.lock().session.is_some()
    }

    pub fn position(&self) -> Option<usize> {
        self.state.lock().session.map(|s| s.x)
    }

    pub fn extent(&self) -> Option<InkExtent> {
        self.state.lock().session.and_then(|s| s.extent)
    }

    /// Ticker threads still running.
    pub fn armed_timers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Draw the marker at `x` and start moving it. Any running session is
    /// stopped first. Must not be called while holding the canvas lock.
    pub fn start(&mut self, x: usize) {
        self.stop();

        let epoch = {
            let mut state = self.state.lock();
            let mut canvas = self.canvas.lock();
            if canvas.width() == 0 || canvas.height() == 0 {
                return;
            }
            let x = x.min(canvas.width() - 1);

            state.epoch += 1;
            let extent = canvas.ink_extent(x);
            canvas.draw_marker(x);
            state.session = Some(MarkerSession { x, extent });
            debug!("marker started at column {x}, extent {extent:?}");
            state.epoch
        };
        (self.redraw)();

        let interval = self.timing.draw_interval();
        if interval.is_zero() {
            warn!("marker interval is zero, not arming the ticker");
            return;
        }
        self.ticker = Some(self.spawn_ticker(epoch, interval));
    }

    /// Erase the marker and cancel the ticker. No-op when idle.
    pub fn stop(&mut self) -> bool {
        let stopped = {
            let mut state = self.state.lock();
            state.epoch += 1;
            match state.session.take() {
                Some(session) => {
                    self.canvas.lock().restore_column(session.x, session.extent);
                    debug!("marker stopped at column {}", session.x);
                    true
                }
                None => false,
            }
        };

        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        if stopped {
            (self.redraw)();
        }
        stopped
    }

    /// Move the marker one column right, as a tick would.
    pub fn advance(&self) -> TickOutcome {
        let epoch = self.state.lock().epoch;
        let outcome = step(&self.state, &self.canvas, epoch);
        if outcome != TickOutcome::Stale {
            (self.redraw)();
        }
        outcome
    }

    fn spawn_ticker(&self, epoch: u64, interval: Duration) -> Ticker {
        let (cancel, cancelled) = bounded::<()>(1);
        let state = Arc::clone(&self.state);
        let canvas = Arc::clone(&self.canvas);
        let redraw = Arc::clone(&self.redraw);

        self.live.fetch_add(1, Ordering::SeqCst);
        let guard = LiveGuard(Arc::clone(&self.live));

        let handle = thread::spawn(move || {
            let _guard = guard;
            loop {
                match cancelled.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                match step(&state, &canvas, epoch) {
                    TickOutcome::Advanced(x) => {
                        trace!("marker tick to column {x}");
                        redraw();
                    }
                    TickOutcome::Finished => {
                        debug!("marker reached the right edge");
                        redraw();
                        break;
                    }
                    TickOutcome::Stale => break,
                }
            }
        });

        Ticker { cancel, handle }
    }
}

impl Drop for MarkerEngine {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

fn step(state: &Mutex<MarkerState>, canvas: &SharedCanvas, epoch: u64) -> TickOutcome {
    let mut state = state.lock();
    if state.epoch != epoch {
        return TickOutcome::Stale;
    }
    let Some(session) = state.session else {
        return TickOutcome::Stale;
    };

    let mut canvas = canvas.lock();
    canvas.restore_column(session.x, session.extent);

    let next = session.x + 1;
    if next >= canvas.width() {
        state.session = None;
        return TickOutcome::Finished;
    }

    let extent = canvas.ink_extent(next);
    canvas.draw_marker(next);
    state.session = Some(MarkerSession { x: next, extent });
    TickOutcome::Advanced(next)
}
