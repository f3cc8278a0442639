//! Raw key and mouse state to game commands, resolved once per frame.
//!
//! What a key means depends on the context: an open dialog only answers
//! confirm/cancel, the cupola scene only drives the camera and picking, and
//! the map handles editor keys. Movement keys are not commands; they feed a
//! latch that the session can clear on any transition.

use cupola_core::input::{InputState, Key, MouseBtn};

use crate::controller::ControllerInput;
use crate::session::{Editor, Mode};

/// Step for every editor nudge and resize.
pub const EDIT_STEP: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Confirm,
    Cancel,
    Quit,
    BackToMap,
    BeginRotate,
    EndRotate,
    BeginPan,
    EndPan,
    ZoomIn,
    ZoomOut,
    Pick,
    ToggleWallEditor,
    ToggleWallVisibility,
    ToggleBedEditor,
    CycleWall(i32),
    AddWall,
    DeleteWall,
    Nudge(f32, f32),
    Resize(f32, f32),
    PrintWalls,
    PrintBed,
    PrintPlayer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputContext {
    pub mode: Mode,
    pub dialog_open: bool,
    pub sleeping: bool,
    pub editor: Option<Editor>,
}

impl InputContext {
    /// Movement key presses are ignored while this holds.
    pub fn movement_blocked(&self) -> bool {
        self.dialog_open || self.sleeping || self.editor.is_some()
    }
}

pub fn resolve_commands(input: &InputState, ctx: InputContext) -> Vec<Command> {
    let mut out = Vec::new();

    if ctx.dialog_open {
        if input.is_just_pressed(Key::Y) || input.is_just_pressed(Key::Enter) {
            out.push(Command::Confirm);
        } else if input.is_just_pressed(Key::N) || input.is_just_pressed(Key::Escape) {
            out.push(Command::Cancel);
        }
        return out;
    }
    if ctx.sleeping {
        return out;
    }

    match ctx.mode {
        Mode::Cupola3d => resolve_cupola(input, &mut out),
        Mode::Map2d => resolve_map(input, ctx.editor, &mut out),
    }
    out
}

fn resolve_cupola(input: &InputState, out: &mut Vec<Command>) {
    if input.is_just_pressed(Key::Escape) {
        out.push(Command::BackToMap);
        return;
    }
    if input.is_mouse_just_pressed(MouseBtn::Right) {
        out.push(Command::BeginRotate);
    }
    if input.is_mouse_just_released(MouseBtn::Right) {
        out.push(Command::EndRotate);
    }
    if input.is_mouse_just_pressed(MouseBtn::Middle) {
        out.push(Command::BeginPan);
    }
    if input.is_mouse_just_released(MouseBtn::Middle) {
        out.push(Command::EndPan);
    }
    let wheel = input.wheel_steps();
    let zoom = if wheel > 0 {
        Command::ZoomIn
    } else {
        Command::ZoomOut
    };
    for _ in 0..wheel.unsigned_abs() {
        out.push(zoom);
    }
    if input.is_mouse_just_pressed(MouseBtn::Left) {
        out.push(Command::Pick);
    }
}

fn resolve_map(input: &InputState, editor: Option<Editor>, out: &mut Vec<Command>) {
    if input.is_just_pressed(Key::Escape) {
        out.push(Command::Quit);
        return;
    }
    if input.is_just_pressed(Key::F8) {
        out.push(Command::ToggleWallEditor);
    }
    if input.is_just_pressed(Key::F9) {
        out.push(Command::ToggleBedEditor);
    }
    if input.is_just_pressed(Key::F7) {
        out.push(Command::ToggleWallVisibility);
    }
    if input.is_just_pressed(Key::P) {
        out.push(Command::PrintPlayer);
    }

    let Some(editor) = editor else {
        return;
    };
    push_edit_keys(input, out);
    match editor {
        Editor::Walls => {
            if input.is_just_pressed(Key::Tab) {
                let step = if input.is_held(Key::Shift) { -1 } else { 1 };
                out.push(Command::CycleWall(step));
            }
            if input.is_just_pressed(Key::N) {
                out.push(Command::AddWall);
            }
            if input.is_just_pressed(Key::Delete) {
                out.push(Command::DeleteWall);
            }
            if input.is_just_pressed(Key::Enter) {
                out.push(Command::PrintWalls);
            }
        }
        Editor::Bed => {
            if input.is_just_pressed(Key::B) {
                out.push(Command::PrintBed);
            }
        }
    }
}

/// Arrow nudges and bracket/semicolon resizes shared by both editors.
fn push_edit_keys(input: &InputState, out: &mut Vec<Command>) {
    let bindings: [(Key, Command); 8] = [
        (Key::Left, Command::Nudge(-EDIT_STEP, 0.0)),
        (Key::Right, Command::Nudge(EDIT_STEP, 0.0)),
        (Key::Up, Command::Nudge(0.0, EDIT_STEP)),
        (Key::Down, Command::Nudge(0.0, -EDIT_STEP)),
        (Key::BracketLeft, Command::Resize(-EDIT_STEP, 0.0)),
        (Key::BracketRight, Command::Resize(EDIT_STEP, 0.0)),
        (Key::Semicolon, Command::Resize(0.0, -EDIT_STEP)),
        (Key::Quote, Command::Resize(0.0, EDIT_STEP)),
    ];
    for (key, command) in bindings {
        if input.is_just_pressed(key) {
            out.push(command);
        }
    }
}

/// Latched W/A/S/D/Space state. A press only registers while movement is
/// unblocked; a release always clears.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementLatch {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub boost: bool,
}

impl MovementLatch {
    pub fn update(&mut self, input: &InputState, blocked: bool) {
        for (key, slot) in [
            (Key::W, &mut self.up),
            (Key::S, &mut self.down),
            (Key::A, &mut self.left),
            (Key::D, &mut self.right),
            (Key::Space, &mut self.boost),
        ] {
            if input.is_just_pressed(key) && !blocked {
                *slot = true;
            }
            if input.is_just_released(key) {
                *slot = false;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn controller_input(&self) -> ControllerInput {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        ControllerInput {
            move_x: axis(self.left, self.right),
            move_z: axis(self.down, self.up),
            boost: self.boost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_ctx() -> InputContext {
        InputContext {
            mode: Mode::Map2d,
            dialog_open: false,
            sleeping: false,
            editor: None,
        }
    }

    fn pressed(keys: &[Key]) -> InputState {
        let mut input = InputState::new();
        for &key in keys {
            input.key_down(key);
        }
        input
    }

    #[test]
    fn dialog_only_answers_confirm_and_cancel() {
        let ctx = InputContext {
            dialog_open: true,
            ..map_ctx()
        };
        assert_eq!(
            resolve_commands(&pressed(&[Key::Y, Key::F8]), ctx),
            vec![Command::Confirm]
        );
        assert_eq!(
            resolve_commands(&pressed(&[Key::Escape]), ctx),
            vec![Command::Cancel]
        );
    }

    #[test]
    fn sleeping_swallows_everything() {
        let ctx = InputContext {
            sleeping: true,
            ..map_ctx()
        };
        assert!(resolve_commands(&pressed(&[Key::Escape, Key::F8]), ctx).is_empty());
    }

    #[test]
    fn escape_depends_on_mode() {
        let cupola = InputContext {
            mode: Mode::Cupola3d,
            ..map_ctx()
        };
        assert_eq!(
            resolve_commands(&pressed(&[Key::Escape]), cupola),
            vec![Command::BackToMap]
        );
        assert_eq!(
            resolve_commands(&pressed(&[Key::Escape]), map_ctx()),
            vec![Command::Quit]
        );
    }

    #[test]
    fn editor_keys_need_an_active_editor() {
        let input = pressed(&[Key::Left, Key::N]);
        assert!(resolve_commands(&input, map_ctx()).is_empty());

        let walls = InputContext {
            editor: Some(Editor::Walls),
            ..map_ctx()
        };
        assert_eq!(
            resolve_commands(&input, walls),
            vec![Command::Nudge(-EDIT_STEP, 0.0), Command::AddWall]
        );
    }

    #[test]
    fn shift_tab_cycles_backwards() {
        let walls = InputContext {
            editor: Some(Editor::Walls),
            ..map_ctx()
        };
        let mut input = pressed(&[Key::Shift]);
        input.end_frame();
        input.key_down(Key::Tab);
        assert_eq!(resolve_commands(&input, walls), vec![Command::CycleWall(-1)]);
    }

    #[test]
    fn bed_editor_prints_on_b_only() {
        let bed = InputContext {
            editor: Some(Editor::Bed),
            ..map_ctx()
        };
        assert_eq!(
            resolve_commands(&pressed(&[Key::B, Key::Enter]), bed),
            vec![Command::PrintBed]
        );
    }

    #[test]
    fn wheel_notches_become_zoom_steps() {
        let cupola = InputContext {
            mode: Mode::Cupola3d,
            ..map_ctx()
        };
        let mut input = InputState::new();
        input.scroll(-2);
        assert_eq!(
            resolve_commands(&input, cupola),
            vec![Command::ZoomOut, Command::ZoomOut]
        );
    }

    #[test]
    fn mouse_buttons_drive_camera_and_pick() {
        let cupola = InputContext {
            mode: Mode::Cupola3d,
            ..map_ctx()
        };
        let mut input = InputState::new();
        input.mouse_down(MouseBtn::Right);
        input.mouse_down(MouseBtn::Left);
        assert_eq!(
            resolve_commands(&input, cupola),
            vec![Command::BeginRotate, Command::Pick]
        );
        input.end_frame();
        input.mouse_up(MouseBtn::Right);
        assert_eq!(resolve_commands(&input, cupola), vec![Command::EndRotate]);
    }

    #[test]
    fn latch_ignores_blocked_press_but_honors_release() {
        let mut latch = MovementLatch::default();
        latch.update(&pressed(&[Key::D]), true);
        assert!(!latch.right);

        latch.update(&pressed(&[Key::D]), false);
        assert!(latch.right);

        let mut input = pressed(&[Key::D]);
        input.end_frame();
        input.key_up(Key::D);
        latch.update(&input, true);
        assert!(!latch.right);
    }

    #[test]
    fn latch_maps_to_controller_axes() {
        let latch = MovementLatch {
            up: true,
            left: true,
            right: true,
            boost: true,
            ..MovementLatch::default()
        };
        let intent = latch.controller_input();
        assert_eq!(intent.move_x, 0.0);
        assert_eq!(intent.move_z, 1.0);
        assert!(intent.boost);
    }
}
