//! Game session: the mode state machine and everything it owns.
//!
//! One `GameSession` lives in the event-loop driver. Each frame the driver
//! hands it the input state, dt and the pointer; the session resolves
//! commands, advances the active mode and the sleep sequence, and queues
//! [`SessionEvent`]s for the driver to log or print.
//!
//! Overlays (dialog, sleep, editors) are only reachable from the map. While
//! any of them is up the map update does nothing, so the player can neither
//! move nor trip a trigger.

use std::path::Path;

use cupola_core::animation::{seconds_to_us, AnimationClip};
use cupola_core::input::InputState;
use glam::{Vec2, Vec3};

use crate::actions::{resolve_commands, Command, InputContext, MovementLatch};
use crate::controller::{ControllerConfig, PlayerController};
use crate::editor;
use crate::energy::Energy;
use crate::geometry::Aabb;
use crate::level::LevelFile;
use crate::model::{self, convert_hint_text, load_model_any, ModelSource};
use crate::orbit::OrbitCamera;
use crate::picking::{pick, ray_from_pointer, register_clickables, Lens};
use crate::scene::{NodeId, Scene, SceneTree};
use crate::sleep::{SleepSequence, SleepTick};
use crate::trigger::TriggerZone;
use crate::walls::WallRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Map2d,
    Cupola3d,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editor {
    Walls,
    Bed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    EnterCupola,
    Sleep,
}

impl DialogKind {
    pub fn prompt(self) -> &'static str {
        match self {
            DialogKind::EnterCupola => "Enter the Cupola?",
            DialogKind::Sleep => "Go to sleep?",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    DialogOpened(DialogKind),
    DialogClosed { kind: DialogKind, confirmed: bool },
    EnteredCupola { source: ModelSource, clickables: usize },
    ExitedCupola,
    SleepStarted,
    SleepFinished,
    EnergyChanged(u8),
    EditorChanged(Option<Editor>),
    InfoChanged(Option<String>),
    /// Text meant for stdout (editor dumps, player position).
    Printed(String),
    LevelReloaded,
    QuitRequested,
}

/// The three map layers under the 2D root.
#[derive(Debug, Clone, Copy)]
pub struct MapLayers {
    pub background: NodeId,
    pub game: NodeId,
    pub ui: NodeId,
}

#[derive(Debug, Clone)]
pub struct CupolaState {
    pub root: NodeId,
    pub model_root: NodeId,
    pub camera: OrbitCamera,
    pub info: Option<String>,
    pub source: ModelSource,
    pub load_hint: Option<String>,
}

pub struct GameSession {
    level: LevelFile,
    mode: Mode,
    dialog: Option<DialogKind>,
    sleep: Option<SleepSequence>,
    editor: Option<Editor>,
    energy: Energy,
    player: PlayerController,
    walk_clip: AnimationClip,
    walls: WallRegistry,
    cupola_trigger: TriggerZone,
    sleep_trigger: TriggerZone,
    cupola: Option<CupolaState>,
    scene: SceneTree,
    layers: MapLayers,
    latch: MovementLatch,
    lens: Lens,
    events: Vec<SessionEvent>,
    quit_requested: bool,
}

impl GameSession {
    pub fn new(level: LevelFile) -> Self {
        let mut scene = SceneTree::new();
        let root2d = scene.render2d();
        let layers = MapLayers {
            background: scene.create_group(root2d, "bg"),
            game: scene.create_group(root2d, "game"),
            ui: scene.create_group(root2d, "ui"),
        };
        let config = ControllerConfig {
            speed: level.player.speed,
            base_scale: level.player.scale,
            boost_scale: level.player.boost_scale,
            bounds: level.world_bounds(),
        };
        let player = PlayerController::new(level.player.start[0], level.player.start[1], config);
        let walk_clip =
            AnimationClip::uniform(&level.player.frames, seconds_to_us(level.player.frame_time));
        let walls = WallRegistry::new(level.wall_list(), level.show_walls);
        let cupola_trigger = level.cupola_trigger.build("cupola");
        let sleep_trigger = level.sleep_trigger.build("sleep");

        Self {
            level,
            mode: Mode::Map2d,
            dialog: None,
            sleep: None,
            editor: None,
            energy: Energy::full(),
            player,
            walk_clip,
            walls,
            cupola_trigger,
            sleep_trigger,
            cupola: None,
            scene,
            layers,
            latch: MovementLatch::default(),
            lens: Lens::default(),
            events: Vec::new(),
            quit_requested: false,
        }
    }

    pub fn level(&self) -> &LevelFile {
        &self.level
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn dialog(&self) -> Option<DialogKind> {
        self.dialog
    }

    pub fn sleep(&self) -> Option<&SleepSequence> {
        self.sleep.as_ref()
    }

    pub fn editor(&self) -> Option<Editor> {
        self.editor
    }

    pub fn energy(&self) -> &Energy {
        &self.energy
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn walk_clip(&self) -> &AnimationClip {
        &self.walk_clip
    }

    pub fn walls(&self) -> &WallRegistry {
        &self.walls
    }

    pub fn cupola_trigger(&self) -> &TriggerZone {
        &self.cupola_trigger
    }

    pub fn sleep_trigger(&self) -> &TriggerZone {
        &self.sleep_trigger
    }

    pub fn cupola(&self) -> Option<&CupolaState> {
        self.cupola.as_ref()
    }

    pub fn scene(&self) -> &SceneTree {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneTree {
        &mut self.scene
    }

    pub fn layers(&self) -> MapLayers {
        self.layers
    }

    pub fn latch(&self) -> MovementLatch {
        self.latch
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.lens = Lens::for_viewport(width, height);
    }

    pub fn input_context(&self) -> InputContext {
        InputContext {
            mode: self.mode,
            dialog_open: self.dialog.is_some(),
            sleeping: self.sleep.is_some(),
            editor: self.editor,
        }
    }

    /// Level files only hot-reload on the plain map, so a reload never
    /// clobbers editor work or the cupola scene.
    pub fn can_hot_reload(&self) -> bool {
        self.mode == Mode::Map2d && self.editor.is_none()
    }

    /// One whole frame: latch movement keys, apply commands, then update.
    pub fn frame(&mut self, input: &InputState, dt: f32, pointer: Option<Vec2>) {
        let ctx = self.input_context();
        self.latch.update(input, ctx.movement_blocked());
        for command in resolve_commands(input, ctx) {
            self.apply(command, pointer);
        }
        self.update(dt, pointer);
    }

    pub fn apply(&mut self, command: Command, pointer: Option<Vec2>) {
        log::trace!("Command: {command:?}");
        match command {
            Command::Confirm => self.confirm_dialog(),
            Command::Cancel => self.cancel_dialog(),
            Command::Quit => {
                self.quit_requested = true;
                self.events.push(SessionEvent::QuitRequested);
            }
            Command::BackToMap => self.exit_cupola(),
            Command::BeginRotate => self.with_camera(OrbitCamera::begin_rotate),
            Command::EndRotate => self.with_camera(OrbitCamera::end_rotate),
            Command::BeginPan => self.with_camera(OrbitCamera::begin_pan),
            Command::EndPan => self.with_camera(OrbitCamera::end_pan),
            Command::ZoomIn => self.with_camera(OrbitCamera::zoom_in),
            Command::ZoomOut => self.with_camera(OrbitCamera::zoom_out),
            Command::Pick => self.pick_at(pointer),
            Command::ToggleWallEditor => self.toggle_editor(Editor::Walls),
            Command::ToggleBedEditor => self.toggle_editor(Editor::Bed),
            Command::ToggleWallVisibility => {
                let visible = self.walls.toggle_visible();
                log::info!("Wall quads: {}", if visible { "ON" } else { "OFF" });
            }
            Command::CycleWall(step) if self.editor == Some(Editor::Walls) => {
                self.walls.cycle(step);
            }
            Command::AddWall if self.editor == Some(Editor::Walls) => {
                let (x, z) = self.player.position();
                let index = self.walls.add_selected(x, z);
                log::info!("Wall {} added at ({x:.3}, {z:.3})", index + 1);
            }
            Command::DeleteWall if self.editor == Some(Editor::Walls) => {
                if let Some(wall) = self.walls.delete_selected() {
                    log::info!(
                        "Wall removed at ({:.3}, {:.3}), {} left",
                        wall.center_x,
                        wall.center_z,
                        self.walls.len()
                    );
                }
            }
            Command::Nudge(dx, dz) => match self.editor {
                Some(Editor::Walls) => {
                    self.walls.nudge_selected(dx, dz);
                }
                Some(Editor::Bed) => editor::nudge_bed(&mut self.sleep_trigger, dx, dz),
                None => {}
            },
            Command::Resize(dw, dh) => match self.editor {
                Some(Editor::Walls) => {
                    self.walls.resize_selected(dw, dh);
                }
                Some(Editor::Bed) => editor::resize_bed(&mut self.sleep_trigger, dw, dh),
                None => {}
            },
            Command::PrintWalls if self.editor == Some(Editor::Walls) => {
                self.events
                    .push(SessionEvent::Printed(editor::walls_constant(&self.walls)));
                log::info!("Level file form:\n{}", self.walls.dump());
            }
            Command::PrintBed if self.editor == Some(Editor::Bed) => {
                self.events
                    .push(SessionEvent::Printed(editor::bed_constants(&self.sleep_trigger)));
            }
            Command::PrintPlayer => {
                let (x, z) = self.player.position();
                self.events
                    .push(SessionEvent::Printed(editor::player_position(x, z)));
            }
            Command::CycleWall(_)
            | Command::AddWall
            | Command::DeleteWall
            | Command::PrintWalls
            | Command::PrintBed => {}
        }
    }

    /// Per-frame simulation: the active mode, then the sleep sequence, which
    /// runs regardless of mode.
    pub fn update(&mut self, dt: f32, pointer: Option<Vec2>) {
        match self.mode {
            Mode::Map2d => self.update_map(dt),
            Mode::Cupola3d => {
                if let Some(cupola) = self.cupola.as_mut() {
                    cupola.camera.update(pointer);
                }
            }
        }
        self.advance_sleep(dt);
    }

    fn update_map(&mut self, dt: f32) {
        if self.dialog.is_some() || self.sleep.is_some() || self.editor.is_some() {
            return;
        }

        let intent = self.latch.controller_input();
        // Triggers test against the size the player collided with this step.
        let (half_w, half_h) = (self.player.aabb.half_w, self.player.aabb.half_h);
        self.player.step(intent, dt, &self.walls, &self.walk_clip);

        if intent.is_moving() {
            let lost = self.energy.record_walk(dt);
            if lost > 0 {
                log::debug!("Energy -{lost} -> {}", self.energy.level());
                self.events
                    .push(SessionEvent::EnergyChanged(self.energy.level()));
            }
        }

        let (x, z) = self.player.position();
        let probe = Aabb::new(x, z, half_w, half_h);
        if self
            .cupola_trigger
            .check_entry(&probe, self.dialog.is_some())
        {
            self.open_dialog(DialogKind::EnterCupola);
        }
        if self.sleep_trigger.check_entry(&probe, self.dialog.is_some()) {
            self.open_dialog(DialogKind::Sleep);
        }
    }

    fn advance_sleep(&mut self, dt: f32) {
        let Some(sequence) = self.sleep.as_mut() else {
            return;
        };
        if let SleepTick::Finished = sequence.advance(dt) {
            self.sleep = None;
            self.energy.restore_full();
            self.clear_movement();
            log::info!("Sleep finished, energy restored");
            self.events.push(SessionEvent::SleepFinished);
            self.events
                .push(SessionEvent::EnergyChanged(self.energy.level()));
        }
    }

    fn clear_movement(&mut self) {
        self.latch.clear();
        self.player.stop();
    }

    fn open_dialog(&mut self, kind: DialogKind) {
        self.clear_movement();
        self.dialog = Some(kind);
        log::info!("Dialog: {}", kind.prompt());
        self.events.push(SessionEvent::DialogOpened(kind));
    }

    fn confirm_dialog(&mut self) {
        let Some(kind) = self.dialog.take() else {
            return;
        };
        self.events.push(SessionEvent::DialogClosed {
            kind,
            confirmed: true,
        });
        match kind {
            DialogKind::EnterCupola => self.enter_cupola(),
            DialogKind::Sleep => self.start_sleep(),
        }
    }

    fn cancel_dialog(&mut self) {
        let Some(kind) = self.dialog.take() else {
            return;
        };
        self.clear_movement();
        self.events.push(SessionEvent::DialogClosed {
            kind,
            confirmed: false,
        });
    }

    fn start_sleep(&mut self) {
        if self.mode != Mode::Map2d {
            return;
        }
        self.clear_movement();
        self.sleep = Some(SleepSequence::new(self.level.sleep.duration));
        log::info!("Sleeping for {:.1}s", self.level.sleep.duration);
        self.events.push(SessionEvent::SleepStarted);
    }

    fn toggle_editor(&mut self, kind: Editor) {
        if self.mode != Mode::Map2d {
            return;
        }
        self.clear_movement();
        self.editor = if self.editor == Some(kind) {
            None
        } else {
            Some(kind)
        };
        if kind == Editor::Bed {
            // The bed hitbox stays visible once the bed editor has been used.
            self.sleep_trigger.set_visible(true);
        }
        log::info!("Editor: {:?}", self.editor);
        self.events.push(SessionEvent::EditorChanged(self.editor));
    }

    fn enter_cupola(&mut self) {
        if self.mode != Mode::Map2d {
            return;
        }
        self.clear_movement();
        self.editor = None;
        self.mode = Mode::Cupola3d;
        self.scene.set_visible(self.layers.background, false);
        self.scene.set_visible(self.layers.game, false);

        let settings = &self.level.model;
        let primary = Path::new(&settings.primary);
        let alternate = Path::new(&settings.alternate);
        let loaded = load_model_any(primary, alternate);

        let render = self.scene.render3d();
        let root = self.scene.create_group(render, "cupola_root");
        let model_root = model::instantiate(&mut self.scene, root, &loaded);
        self.scene
            .set_position(model_root, Vec3::from_array(settings.position));
        self.scene.set_scale(model_root, Vec3::splat(settings.scale));
        let clickables = register_clickables(&mut self.scene, root, model_root, settings);

        let target = self.scene.world_position(model_root).unwrap_or(Vec3::ZERO);
        let camera = OrbitCamera::framing(target, settings.scale);
        let load_hint = loaded
            .show_convert_hint
            .then(|| convert_hint_text(primary, alternate));

        log::info!(
            "Entered cupola ({:?} model, {} clickables)",
            loaded.source,
            clickables
        );
        self.cupola = Some(CupolaState {
            root,
            model_root,
            camera,
            info: None,
            source: loaded.source,
            load_hint,
        });
        self.events.push(SessionEvent::EnteredCupola {
            source: loaded.source,
            clickables,
        });
    }

    fn exit_cupola(&mut self) {
        if self.mode != Mode::Cupola3d {
            return;
        }
        self.clear_movement();
        if let Some(cupola) = self.cupola.take() {
            self.scene.destroy(cupola.root);
            if cupola.info.is_some() {
                self.events.push(SessionEvent::InfoChanged(None));
            }
        }
        self.scene.set_visible(self.layers.background, true);
        self.scene.set_visible(self.layers.game, true);
        self.mode = Mode::Map2d;
        log::info!("Back to map");
        self.events.push(SessionEvent::ExitedCupola);
    }

    fn with_camera(&mut self, op: impl FnOnce(&mut OrbitCamera)) {
        if let Some(cupola) = self.cupola.as_mut() {
            op(&mut cupola.camera);
        }
    }

    fn pick_at(&mut self, pointer: Option<Vec2>) {
        let (Some(cupola), Some(ndc)) = (self.cupola.as_mut(), pointer) else {
            return;
        };
        let ray = ray_from_pointer(&cupola.camera, self.lens, ndc);
        let info = pick(&self.scene, cupola.root, &ray).and_then(|hit| hit.info);
        if cupola.info != info {
            cupola.info = info.clone();
            self.events.push(SessionEvent::InfoChanged(info));
        }
    }

    /// Swap in walls and trigger geometry from a freshly loaded level. Other
    /// level settings only apply at startup.
    pub fn apply_level_reload(&mut self, level: LevelFile) {
        if !self.can_hot_reload() {
            log::warn!("Level reload skipped: not on the plain map");
            return;
        }
        self.walls.replace(level.wall_list());
        let cupola = &level.cupola_trigger;
        self.cupola_trigger
            .set_center(cupola.center[0], cupola.center[1]);
        self.cupola_trigger.set_size(cupola.size[0], cupola.size[1]);
        let sleep = &level.sleep_trigger;
        self.sleep_trigger.set_center(sleep.center[0], sleep.center[1]);
        self.sleep_trigger.set_size(sleep.size[0], sleep.size[1]);
        self.level.walls = level.walls;
        self.level.cupola_trigger = level.cupola_trigger;
        self.level.sleep_trigger = level.sleep_trigger;
        log::info!("Level reloaded: {} walls", self.walls.len());
        self.events.push(SessionEvent::LevelReloaded);
    }
}
