pub mod app;

pub mod audio;

pub mod canvas;

pub mod config;

pub mod error;

pub mod marker;

pub mod player;

pub mod renderer;

pub mod session;

pub mod waveform;
