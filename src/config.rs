use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::ArgMatches;

use crate::waveform::{BarLayout, TimeWindow};

/// How the marker tick period follows newly opened files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerSpeed {
    /// Recompute from each file's geometry.
    #[default]
    PerFile,
    /// Keep the period from the first file drawn.
    FirstFile,
}

impl std::str::FromStr for MarkerSpeed {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "per-file" => Ok(MarkerSpeed::PerFile),
            "first-file" => Ok(MarkerSpeed::FirstFile),
            other => Err(format!("unknown marker speed '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub file: Option<PathBuf>,
    pub width: usize,
    pub height: usize,
    pub window: TimeWindow,
    pub layout: BarLayout,
    pub columns_per_tick: u32,
    pub marker_speed: MarkerSpeed,
    pub gain: f32,
    pub device: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            file: None,
            width: 850,
            height: 275,
            window: TimeWindow::default(),
            layout: BarLayout::default(),
            columns_per_tick: 5,
            marker_speed: MarkerSpeed::PerFile,
            gain: 1.0,
            device: None,
        }
    }
}

impl ViewerConfig {
    /// Build from the `view` subcommand matches.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            file: matches.get_one::<PathBuf>("FILE").cloned(),
            width: matches.get_one::<usize>("width").copied().unwrap_or(defaults.width),
            height: matches.get_one::<usize>("height").copied().unwrap_or(defaults.height),
            window: TimeWindow {
                start: matches
                    .get_one::<f64>("start")
                    .copied()
                    .unwrap_or(defaults.window.start),
                end: matches
                    .get_one::<f64>("end")
                    .copied()
                    .unwrap_or(defaults.window.end),
            },
            layout: BarLayout {
                padding: matches
                    .get_one::<usize>("padding")
                    .copied()
                    .unwrap_or(defaults.layout.padding),
                bar_width: matches
                    .get_one::<usize>("bar-width")
                    .copied()
                    .unwrap_or(defaults.layout.bar_width),
            },
            columns_per_tick: matches
                .get_one::<u32>("tick-columns")
                .copied()
                .unwrap_or(defaults.columns_per_tick),
            marker_speed: matches
                .get_one::<MarkerSpeed>("marker-speed")
                .copied()
                .unwrap_or(defaults.marker_speed),
            gain: matches.get_one::<f32>("gain").copied().unwrap_or(defaults.gain),
            device: matches.get_one::<String>("device").cloned(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("canvas must be at least 1x1, got {}x{}", self.width, self.height);
        }
        if !self.window.end.is_finite()
            || self.window.start < 0.0
            || self.window.end <= self.window.start
        {
            bail!(
                "visible window must satisfy 0 <= start < end, got {}..{}",
                self.window.start,
                self.window.end
            );
        }
        if self.layout.bar_width == 0 {
            bail!("bar width must be at least 1");
        }
        if self.columns_per_tick == 0 {
            bail!("tick columns must be at least 1");
        }
        if !(self.gain.is_finite() && self.gain > 0.0) {
            bail!("gain must be positive, got {}", self.gain);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ViewerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = ViewerConfig::default();
        config.window = TimeWindow {
            start: 2.0,
            end: 1.0,
        };
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.window.end = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.gain = 0.0;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_marker_speed() {
        assert_eq!("per-file".parse::<MarkerSpeed>(), Ok(MarkerSpeed::PerFile));
        assert_eq!("first-file".parse::<MarkerSpeed>(), Ok(MarkerSpeed::FirstFile));
        assert!("sometimes".parse::<MarkerSpeed>().is_err());
    }
}
