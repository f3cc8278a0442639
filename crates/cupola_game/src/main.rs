//! ISS Cupola demo: main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. Each
//! `RedrawRequested` runs one variable-step frame:
//!
//!   1. `begin_frame()` measures the wall-clock delta and caps it
//!   2. the level file is hot-reloaded if it changed and the map allows it
//!   3. the session resolves this frame's input into commands and advances
//!   4. the view mirrors session state into the scene tree and builds the HUD
//!
//! The scene tree is what a renderer consumes; this binary reports the HUD
//! through the window title and prints editor dumps on stdout.

mod actions;
mod assets;
mod controller;
mod editor;
mod energy;
mod geometry;
mod level;
mod model;
mod orbit;
mod picking;
#[cfg(test)]
mod replay;
mod scene;
mod session;
mod sleep;
mod trigger;
mod view;
mod walls;

use std::path::PathBuf;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::TextureProbe;
use cupola_core::input::{InputState, Key, MouseBtn};
use cupola_core::time::FrameClock;
use cupola_platform::window::PlatformConfig;
use level::{load_level_from_path, load_level_or_default, LevelWatcher, DEFAULT_LEVEL_PATH};
use session::{GameSession, SessionEvent};
use view::{Hud, MapView};

/// Trackpads report pixels; this many make one wheel notch.
const PIXELS_PER_WHEEL_STEP: f64 = 50.0;
const TITLE_REFRESH_FRAMES: u64 = 30;

/// All mutable engine state. Constructed lazily in `ApplicationHandler::resumed`
/// once the window exists.
struct EngineState {
    window: Arc<Window>,
    base_title: String,
    clock: FrameClock,
    input: InputState,
    viewport: (u32, u32),
    wheel: WheelAccumulator,
    level_watcher: LevelWatcher,
    session: GameSession,
    view: MapView,
    last_status: String,
}

impl EngineState {
    fn new(window: Arc<Window>, base_title: String, level_path: PathBuf) -> Self {
        let level = load_level_or_default(&level_path);
        let mut session = GameSession::new(level);
        let size = window.inner_size();
        session.set_viewport(size.width, size.height);

        let mut probe = TextureProbe::new();
        let view = MapView::new(&mut session, &mut probe);
        log::info!(
            "Session ready: {} walls, energy {}",
            session.walls().len(),
            session.energy().level()
        );

        Self {
            window,
            base_title,
            clock: FrameClock::new(),
            input: InputState::new(),
            viewport: (size.width, size.height),
            wheel: WheelAccumulator::default(),
            level_watcher: LevelWatcher::new(level_path),
            session,
            view,
            last_status: String::new(),
        }
    }

    fn reload_level(&mut self, reason: &str) {
        match load_level_from_path(self.level_watcher.path()) {
            Ok(level) => {
                log::info!(
                    "Reloading level ({reason}): {}",
                    self.level_watcher.path().display()
                );
                self.session.apply_level_reload(level);
            }
            Err(err) => log::error!("Level reload failed ({reason}), keeping current: {err}"),
        }
    }

    /// Run one frame. Returns false once the session asked to quit.
    fn frame(&mut self) -> bool {
        let dt = self.clock.begin_frame();

        // Only poll while reloads are allowed, so a change made during an
        // editor session is picked up once the editor closes.
        if self.session.can_hot_reload() && self.level_watcher.should_reload() {
            self.reload_level("file watcher");
        }

        let pointer = self.input.pointer_ndc(self.viewport);
        self.session.frame(&self.input, dt, pointer);
        for event in self.session.drain_events() {
            report_event(event);
        }

        let hud = self.view.sync(&mut self.session);
        self.update_title(&hud);
        self.input.end_frame();
        !self.session.quit_requested()
    }

    fn update_title(&mut self, hud: &Hud) {
        let status = hud.status_line();
        if status == self.last_status && self.clock.frame_count % TITLE_REFRESH_FRAMES != 0 {
            return;
        }
        let title = if status.is_empty() {
            format!("{} | {:.0} fps", self.base_title, self.clock.smoothed_fps)
        } else {
            format!(
                "{} | {:.0} fps | {}",
                self.base_title, self.clock.smoothed_fps, status
            )
        };
        self.window.set_title(&title);
        self.last_status = status;
    }
}

fn report_event(event: SessionEvent) {
    match event {
        SessionEvent::Printed(text) => println!("{text}"),
        SessionEvent::EnergyChanged(level) => log::info!("Energy: {level}/10"),
        SessionEvent::InfoChanged(Some(info)) => log::info!("Info: {info}"),
        other => log::debug!("Session event: {other:?}"),
    }
}

struct App {
    config: PlatformConfig,
    level_path: PathBuf,
    state: Option<EngineState>,
}

impl App {
    fn new(level_path: PathBuf) -> Self {
        Self {
            config: PlatformConfig::default(),
            level_path,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = match cupola_platform::window::create_window(event_loop, &self.config) {
            Ok(window) => window,
            Err(err) => {
                log::error!("{err}");
                event_loop.exit();
                return;
            }
        };
        log::info!(
            "Window created: {}x{}",
            self.config.width,
            self.config.height
        );
        self.state = Some(EngineState::new(
            window,
            self.config.title.clone(),
            self.level_path.clone(),
        ));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.viewport = (w, h);
                    state.session.set_viewport(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => state.input.release_all(),

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(engine_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(engine_key),
                            ElementState::Released => state.input.key_up(engine_key),
                        }
                    }
                }
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                if let Some(btn) = map_mouse_button(button) {
                    match button_state {
                        ElementState::Pressed => state.input.mouse_down(btn),
                        ElementState::Released => state.input.mouse_up(btn),
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let steps = state.wheel.push(delta);
                if steps != 0 {
                    state.input.scroll(steps);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.mouse_position = (position.x, position.y);
                state.input.mouse_inside = true;
            }

            WindowEvent::CursorEntered { .. } => state.input.mouse_inside = true,
            WindowEvent::CursorLeft { .. } => state.input.mouse_inside = false,

            WindowEvent::RedrawRequested => {
                if state.viewport.0 == 0 || state.viewport.1 == 0 {
                    return;
                }
                if !state.frame() {
                    log::info!("Quit requested, exiting.");
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyB => Some(Key::B),
        KeyCode::KeyN => Some(Key::N),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyY => Some(Key::Y),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Key::Shift),
        KeyCode::Delete | KeyCode::Backspace => Some(Key::Delete),
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::BracketLeft => Some(Key::BracketLeft),
        KeyCode::BracketRight => Some(Key::BracketRight),
        KeyCode::Semicolon => Some(Key::Semicolon),
        KeyCode::Quote => Some(Key::Quote),
        KeyCode::F7 => Some(Key::F7),
        KeyCode::F8 => Some(Key::F8),
        KeyCode::F9 => Some(Key::F9),
        _ => None,
    }
}

fn map_mouse_button(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

/// Turns wheel deltas into whole notches, positive away from the user (zoom
/// in). Fractions carry over, so a run of small trackpad events adds up to a
/// notch instead of each counting as one.
#[derive(Debug, Default)]
struct WheelAccumulator {
    pending: f64,
}

impl WheelAccumulator {
    fn push(&mut self, delta: MouseScrollDelta) -> i32 {
        self.pending += match delta {
            MouseScrollDelta::LineDelta(_, y) => y as f64,
            MouseScrollDelta::PixelDelta(position) => position.y / PIXELS_PER_WHEEL_STEP,
        };
        let steps = self.pending.trunc();
        self.pending -= steps;
        steps as i32
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("ISS Cupola demo starting...");

    let level_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LEVEL_PATH));

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(level_path);
    event_loop.run_app(&mut app).expect("Event loop error");
}
