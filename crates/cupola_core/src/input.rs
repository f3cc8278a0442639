//! Input state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true every frame the key
//!   is physically down.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened. Cleared by `end_frame()`, which the main
//!   loop calls once the frame's intent resolution has consumed them.
//!
//! Mouse wheel notches accumulate between frames the same way and are cleared
//! by `end_frame()`.

use std::collections::HashSet;

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    Escape,
    Enter,
    Tab,
    Shift,
    Delete,
    Left,
    Right,
    Up,
    Down,
    BracketLeft,
    BracketRight,
    Semicolon,
    Quote,
    B,
    N,
    P,
    Y,
    F7,
    F8,
    F9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    mouse_held: HashSet<MouseBtn>,
    mouse_just_pressed: HashSet<MouseBtn>,
    mouse_just_released: HashSet<MouseBtn>,

    /// Cursor position in window pixels, origin top-left.
    pub mouse_position: (f64, f64),
    /// False while the cursor is outside the window.
    pub mouse_inside: bool,
    wheel_steps: i32,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            mouse_held: HashSet::new(),
            mouse_just_pressed: HashSet::new(),
            mouse_just_released: HashSet::new(),
            mouse_position: (0.0, 0.0),
            mouse_inside: false,
            wheel_steps: 0,
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn mouse_down(&mut self, btn: MouseBtn) {
        if self.mouse_held.insert(btn) {
            self.mouse_just_pressed.insert(btn);
        }
    }

    pub fn mouse_up(&mut self, btn: MouseBtn) {
        if self.mouse_held.remove(&btn) {
            self.mouse_just_released.insert(btn);
        }
    }

    /// Positive steps scroll away from the user (zoom in).
    pub fn scroll(&mut self, steps: i32) {
        self.wheel_steps += steps;
    }

    pub fn wheel_steps(&self) -> i32 {
        self.wheel_steps
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn is_mouse_held(&self, btn: MouseBtn) -> bool {
        self.mouse_held.contains(&btn)
    }

    pub fn is_mouse_just_pressed(&self, btn: MouseBtn) -> bool {
        self.mouse_just_pressed.contains(&btn)
    }

    pub fn is_mouse_just_released(&self, btn: MouseBtn) -> bool {
        self.mouse_just_released.contains(&btn)
    }

    /// Cursor in normalized device coordinates: x and y in [-1, 1], +y up.
    /// `None` when the cursor is outside the window or the viewport is empty.
    pub fn pointer_ndc(&self, viewport: (u32, u32)) -> Option<Vec2> {
        if !self.mouse_inside || viewport.0 == 0 || viewport.1 == 0 {
            return None;
        }
        let x = (self.mouse_position.0 / viewport.0 as f64) * 2.0 - 1.0;
        let y = 1.0 - (self.mouse_position.1 / viewport.1 as f64) * 2.0;
        Some(Vec2::new(x as f32, y as f32))
    }

    /// Drop every held key and button, e.g. when the window loses focus and
    /// release events will never arrive.
    pub fn release_all(&mut self) {
        for key in self.held.drain() {
            self.just_released.insert(key);
        }
        for btn in self.mouse_held.drain() {
            self.mouse_just_released.insert(btn);
        }
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.mouse_just_pressed.clear();
        self.mouse_just_released.clear();
        self.wheel_steps = 0;
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::W);
        assert!(input.is_held(Key::W));
        assert!(input.is_just_pressed(Key::W));
    }

    #[test]
    fn test_key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::W);
        input.key_up(Key::W);
        assert!(!input.is_held(Key::W));
        assert!(input.is_just_released(Key::W));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::A);
        assert!(!input.is_just_released(Key::A));
        assert!(!input.is_held(Key::A));
    }

    #[test]
    fn test_end_frame_clears_transient_state() {
        let mut input = InputState::new();
        input.key_down(Key::D);
        input.key_down(Key::Space);
        input.scroll(2);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::D));
        assert!(!input.is_just_pressed(Key::Space));
        assert_eq!(input.wheel_steps(), 0);
        // Held state persists across frames.
        assert!(input.is_held(Key::D));
        assert!(input.is_held(Key::Space));
    }

    #[test]
    fn test_mouse_down_up_cycle() {
        let mut input = InputState::new();
        input.mouse_down(MouseBtn::Right);
        assert!(input.is_mouse_held(MouseBtn::Right));
        assert!(input.is_mouse_just_pressed(MouseBtn::Right));
        input.end_frame();

        input.mouse_up(MouseBtn::Right);
        assert!(input.is_mouse_just_released(MouseBtn::Right));
        assert!(!input.is_mouse_held(MouseBtn::Right));
    }

    #[test]
    fn test_wheel_steps_accumulate_within_frame() {
        let mut input = InputState::new();
        input.scroll(1);
        input.scroll(1);
        input.scroll(-3);
        assert_eq!(input.wheel_steps(), -1);
    }

    #[test]
    fn test_pointer_ndc_maps_corners_and_center() {
        let mut input = InputState::new();
        assert!(input.pointer_ndc((800, 600)).is_none());

        input.mouse_inside = true;
        input.mouse_position = (400.0, 300.0);
        let center = input.pointer_ndc((800, 600)).expect("inside window");
        assert!(center.length() < 1e-6);

        input.mouse_position = (0.0, 0.0);
        let top_left = input.pointer_ndc((800, 600)).expect("inside window");
        assert!((top_left.x + 1.0).abs() < 1e-6);
        assert!((top_left.y - 1.0).abs() < 1e-6);

        assert!(input.pointer_ndc((0, 600)).is_none());
    }

    #[test]
    fn test_release_all_reports_releases() {
        let mut input = InputState::new();
        input.key_down(Key::W);
        input.mouse_down(MouseBtn::Middle);
        input.end_frame();

        input.release_all();
        assert!(!input.is_held(Key::W));
        assert!(input.is_just_released(Key::W));
        assert!(input.is_mouse_just_released(MouseBtn::Middle));
    }

    #[test]
    fn test_default_state_is_empty() {
        let input = InputState::default();
        assert!(!input.is_held(Key::W));
        assert!(!input.is_mouse_held(MouseBtn::Left));
        assert!(!input.mouse_inside);
        assert_eq!(input.wheel_steps(), 0);
    }
}
