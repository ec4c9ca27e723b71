use log::debug;

use crate::{
    audio::zoom,
    canvas::Canvas,
    error::RenderError,
    marker::MarkerTiming,
};

/// Horizontal spacing of the drawn bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarLayout {
    pub padding: usize,
    pub bar_width: usize,
}

impl Default for BarLayout {
    fn default() -> Self {
        Self {
            padding: 2,
            bar_width: 3,
        }
    }
}

impl BarLayout {
    fn step(&self) -> usize {
        self.padding + self.bar_width
    }
}

/// Visible slice of the file, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 3.5,
        }
    }
}

impl TimeWindow {
    pub fn seconds(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformGeometry {
    pub layout: BarLayout,
    pub window: TimeWindow,
    pub sample_rate: u32,
    pub num_visible_samples: usize,
    /// Audio frames folded into one drawn column.
    pub frames_per_sample: usize,
    pub max_amplitude: i32,
}

impl WaveformGeometry {
    pub fn compute(
        width: usize,
        sample_rate: u32,
        layout: BarLayout,
        window: TimeWindow,
    ) -> Result<Self, RenderError> {
        let num_visible_samples = width / layout.step().max(1);
        if num_visible_samples == 0 {
            return Err(RenderError::EmptyWindow);
        }

        let frames = window.seconds() * sample_rate as f64 / num_visible_samples as f64;
        if !frames.is_finite() || frames < 1.0 {
            return Err(RenderError::EmptyWindow);
        }

        Ok(Self {
            layout,
            window,
            sample_rate,
            num_visible_samples,
            frames_per_sample: frames.floor() as usize,
            max_amplitude: 0,
        })
    }

    /// Left-to-right bar centre of column `i`.
    pub fn column_x(&self, i: usize) -> usize {
        i * self.layout.step() + self.layout.padding
    }

    pub fn timing(&self, columns_per_tick: u32) -> MarkerTiming {
        MarkerTiming {
            frames_per_sample: self.frames_per_sample,
            sample_rate: self.sample_rate,
            columns_per_tick,
        }
    }
}

fn column_magnitude(visible: &[i16], column: usize, frames_per_sample: usize) -> f64 {
    let start = (column * frames_per_sample).min(visible.len());
    let end = ((column + 1) * frames_per_sample).min(visible.len());
    let slice = &visible[start..end];
    if slice.is_empty() {
        return 0.0;
    }
    let total: i64 = slice.iter().map(|&s| (s as i64).abs()).sum();
    total as f64 / slice.len() as f64
}

/// Draw one bar per column of mono `samples` onto `canvas`.
pub fn draw_waveform(
    samples: &[i16],
    canvas: &mut Canvas,
    sample_rate: u32,
    layout: BarLayout,
    window: TimeWindow,
) -> Result<WaveformGeometry, RenderError> {
    let (width, height) = (canvas.width(), canvas.height());
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyCanvas { width, height });
    }

    let mut geometry = WaveformGeometry::compute(width, sample_rate, layout, window)?;
    let visible = zoom(samples, window.start, window.end, sample_rate);
    geometry.max_amplitude = visible.iter().map(|&s| (s as i32).abs()).max().unwrap_or(0);

    let center = height / 2;
    for i in 0..geometry.num_visible_samples {
        let half_height = if geometry.max_amplitude == 0 {
            0
        } else {
            let magnitude = column_magnitude(visible, i, geometry.frames_per_sample);
            (height as f64 * magnitude / geometry.max_amplitude as f64).floor() as usize
        };

        canvas.draw_bar(
            geometry.column_x(i),
            center.saturating_sub(half_height),
            center + half_height,
            layout.bar_width,
        );
    }

    debug!(
        "drew {} columns, {} frames per column, peak {}",
        geometry.num_visible_samples, geometry.frames_per_sample, geometry.max_amplitude
    );
    Ok(geometry)
}
