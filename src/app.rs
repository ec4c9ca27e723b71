use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::{error, info, warn};
use parking_lot::Mutex;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    marker::RedrawHook,
    player::{Playback, RodioPlayback},
    renderer::{compose_frame, frame_size, CanvasRenderer},
    session::Session,
};

const IDLE_TITLE: &str = "wavemark - press O or click the bar below to open a WAV file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEvent {
    /// The canvas changed off the UI thread.
    CanvasChanged,
}

/// Where a pointer press landed, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Canvas { x: f64, y: f64 },
    OpenButton,
}

/// Map a physical cursor position to the frame, which is stretched over the window.
pub fn hit_test(
    cursor: PhysicalPosition<f64>,
    window_size: (u32, u32),
    canvas_size: (usize, usize),
) -> Hit {
    let (frame_width, frame_height) = frame_size(canvas_size.0, canvas_size.1);
    let scale_x = frame_width as f64 / window_size.0.max(1) as f64;
    let scale_y = frame_height as f64 / window_size.1.max(1) as f64;
    let (x, y) = (cursor.x * scale_x, cursor.y * scale_y);

    if y < canvas_size.1 as f64 {
        Hit::Canvas { x, y }
    } else {
        Hit::OpenButton
    }
}

pub struct App<P: Playback> {
    window: Option<Arc<Window>>,
    renderer: Option<CanvasRenderer>,
    session: Session<P>,
    pending_open: Option<PathBuf>,
    cursor: PhysicalPosition<f64>,
}

impl<P: Playback> App<P> {
    pub fn new(session: Session<P>, pending_open: Option<PathBuf>) -> Self {
        Self {
            window: None,
            renderer: None,
            session,
            pending_open,
            cursor: PhysicalPosition::new(0.0, 0.0),
        }
    }

    fn canvas_size(&self) -> (usize, usize) {
        let config = self.session.config();
        (config.width, config.height)
    }

    fn open(&mut self, path: PathBuf) {
        if let Err(err) = self.session.open(&path) {
            error!("could not open {}: {}", path.display(), err);
            report(&format!("Could not open {}", path.display()), &err.to_string());
            return;
        }
        if let Some(window) = &self.window {
            let name = path.file_name().map_or_else(
                || path.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            );
            window.set_title(&format!("wavemark - {name}"));
        }
    }

    fn pick_and_open(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Select a WAV File")
            .add_filter("WAV files", &["wav", "WAV"])
            .pick_file();
        match picked {
            Some(path) => self.open(path),
            None => info!("open cancelled"),
        }
    }

    fn click(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let size = window.inner_size();
        match hit_test(self.cursor, (size.width, size.height), self.canvas_size()) {
            Hit::OpenButton => self.pick_and_open(),
            Hit::Canvas { x, y } => {
                if let Err(err) = self.session.on_click(x, y) {
                    error!("playback failed: {}", err);
                    report("Playback failed", &err.to_string());
                }
            }
        }
    }

    fn present(&mut self) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        // Copy out under the lock; never present while holding it.
        let frame = compose_frame(&self.session.canvas().lock());
        renderer.upload(&frame);
        if let Err(err) = renderer.render() {
            warn!("dropped frame: {}", err);
        }
    }
}

impl<P: Playback> ApplicationHandler<UserEvent> for App<P> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (frame_width, frame_height) = frame_size(self.canvas_size().0, self.canvas_size().1);
        let attributes = Window::default_attributes()
            .with_title(IDLE_TITLE)
            .with_inner_size(LogicalSize::new(frame_width as u32, frame_height as u32));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                error!("could not create window: {}", err);
                event_loop.exit();
                return;
            }
        };
        let renderer = match pollster::block_on(CanvasRenderer::new(
            window.clone(),
            frame_width as u32,
            frame_height as u32,
        )) {
            Ok(renderer) => renderer,
            Err(err) => {
                error!("could not start the renderer: {:#}", err);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());
        self.renderer = Some(renderer);

        if let Some(path) = self.pending_open.take() {
            self.open(path);
        }

        window.request_redraw();
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::CanvasChanged => {
                self.session.sync_with_playback();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.session.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.present(),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.click(),
            WindowEvent::DroppedFile(path) => self.open(path),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::Space) => self.session.stop(),
                        PhysicalKey::Code(KeyCode::KeyO) => self.pick_and_open(),
                        PhysicalKey::Code(KeyCode::Escape) => {
                            self.session.stop();
                            event_loop.exit();
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

fn report(title: &str, description: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(title)
        .set_description(description)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

fn redraw_hook(proxy: EventLoopProxy<UserEvent>) -> RedrawHook {
    let proxy = Mutex::new(proxy);
    Arc::new(move || {
        // Fails only once the loop has exited.
        let _ = proxy.lock().send_event(UserEvent::CanvasChanged);
    })
}

/// Open the window and block until it is closed.
pub fn run(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .context("failed to create the event loop")?;
    let redraw = redraw_hook(event_loop.create_proxy());

    let playback = RodioPlayback::try_new(config.device.as_deref(), config.gain)
        .context("failed to open audio output")?;
    let pending_open = config.file.clone();
    let session = Session::new(config, playback, redraw);

    let mut app = App::new(session, pending_open);
    event_loop.run_app(&mut app)?;
    Ok(())
}
