//! Mirrors session state into the 2D scene layers and builds the HUD snapshot.
//!
//! Map quads are unit squares scaled to size, so an edit only touches the
//! transform. Anything whose art failed to probe is drawn untextured or, for
//! the HUD strips, replaced by text and a plain fill bar.

use glam::Vec3;

use crate::assets::TextureProbe;
use crate::editor;
use crate::level::{LevelFile, SleepSettings};
use crate::scene::{NodeId, QuadSpec, Scene, SceneTree};
use crate::session::{Editor, GameSession, MapLayers, Mode};
use crate::trigger::TriggerZone;
use crate::walls::Wall;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const WALL_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 0.25];
const WALL_SELECTED_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 0.45];

const ENERGY_HUD_POS: Vec3 = Vec3::new(-0.90, 0.0, 0.88);
const ENERGY_HUD_SCALE: Vec3 = Vec3::new(1.0, 1.0, 0.12);

const SLEEP_OVERLAY_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.92];
const SLEEP_BAR_Z: f32 = -0.25;
const SLEEP_BAR_IMAGE_SCALE: Vec3 = Vec3::new(2.40, 1.0, 0.08);
const SLEEP_BAR_BACK_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.25];
const SLEEP_BAR_FILL_COLOR: [f32; 4] = [0.2, 0.5, 1.0, 0.9];

/// Width of the plain progress fill at `progress` in [0, 1].
pub fn sleep_fill_width(progress: f32, settings: &SleepSettings) -> f32 {
    let inner = settings.bar_half_w * 2.0 - settings.bar_margin * 2.0;
    progress.clamp(0.0, 1.0) * inner.max(0.0)
}

/// HUD art that survived probing. A strip is all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct HudStrips {
    pub energy: Option<Vec<String>>,
    pub sleep: Option<Vec<String>>,
}

impl HudStrips {
    pub fn probe(level: &LevelFile, probe: &mut TextureProbe) -> Self {
        Self {
            energy: probe.icon_strip("Energy HUD", &level.energy.icons),
            sleep: probe.icon_strip("Sleep bar", &level.sleep.bar_images),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SleepBar {
    Image(String),
    Fill { width: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SleepOverlay {
    pub title: String,
    pub message: String,
    pub bar: SleepBar,
}

/// Everything the HUD shows this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hud {
    pub energy_icon: Option<String>,
    pub energy_label: Option<String>,
    pub dialog: Option<&'static str>,
    pub sleep: Option<SleepOverlay>,
    pub editor_hint: Option<String>,
    pub info: Option<String>,
    pub load_hint: Option<String>,
}

impl Hud {
    pub fn build(session: &GameSession, strips: &HudStrips) -> Self {
        let energy = session.energy();
        let (energy_icon, energy_label) = match &strips.energy {
            Some(icons) => (icons.get(energy.hud_index()).cloned(), None),
            None => (None, Some(energy.label())),
        };

        let sleep = session.sleep().map(|sequence| {
            let settings = &session.level().sleep;
            let bar = strips
                .sleep
                .as_ref()
                .and_then(|images| images.get(sequence.bar_index()).cloned())
                .map(SleepBar::Image)
                .unwrap_or_else(|| SleepBar::Fill {
                    width: sleep_fill_width(sequence.progress(), settings),
                });
            SleepOverlay {
                title: settings.title.clone(),
                message: settings.message.clone(),
                bar,
            }
        });

        let editor_hint = match session.editor() {
            Some(Editor::Walls) => Some(editor::wall_hint(session.walls())),
            Some(Editor::Bed) => Some(editor::bed_hint(session.sleep_trigger())),
            None => None,
        };

        let cupola = session.cupola();
        Self {
            energy_icon,
            energy_label,
            dialog: session.dialog().map(|d| d.prompt()),
            sleep,
            editor_hint,
            info: cupola.and_then(|c| c.info.clone()),
            load_hint: cupola.and_then(|c| c.load_hint.clone()),
        }
    }

    /// One-line summary for the window title.
    pub fn status_line(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(label) = &self.energy_label {
            parts.push(label.clone());
        }
        if let Some(prompt) = self.dialog {
            parts.push(format!("{prompt} [Y/N]"));
        }
        if let Some(sleep) = &self.sleep {
            parts.push(sleep.title.clone());
        }
        if let Some(hint) = &self.editor_hint {
            parts.push(hint.lines().next().unwrap_or_default().to_string());
        }
        if let Some(info) = &self.info {
            parts.push(info.clone());
        }
        if let Some(hint) = &self.load_hint {
            parts.push(hint.clone());
        }
        parts.join(" | ")
    }
}

struct SleepNodes {
    root: NodeId,
    image: Option<NodeId>,
    fill: Option<NodeId>,
}

/// Scene nodes for the map and HUD, created once and updated every frame.
pub struct MapView {
    strips: HudStrips,
    player_textured: bool,
    player: NodeId,
    wall_group: NodeId,
    walls: Vec<NodeId>,
    cupola_trigger: NodeId,
    sleep_trigger: NodeId,
    bed: Option<NodeId>,
    energy_icon: Option<NodeId>,
    sleep: SleepNodes,
}

impl MapView {
    pub fn new(session: &mut GameSession, probe: &mut TextureProbe) -> Self {
        let strips = HudStrips::probe(session.level(), probe);
        let level = session.level().clone();
        let player_textured = probe.all_available(&level.player.frames);
        if !player_textured {
            log::warn!("Player frames incomplete, drawing an untextured sprite");
        }
        let background = level.background.as_deref().and_then(|p| probe.texture(p));
        let bed_texture = probe.texture(&level.bed.image);

        let MapLayers {
            background: bg_layer,
            game,
            ui,
        } = session.layers();
        let scene = session.scene_mut();

        if let Some(texture) = background {
            let bg = scene.create_quad(bg_layer, "background", unit_quad(WHITE, Some(texture)));
            scene.set_scale(bg, Vec3::new(2.0, 1.0, 2.0));
        }
        // Draw order follows creation order: triggers and walls under the bed
        // and the player.
        let wall_group = scene.create_group(game, "walls");
        let cupola_trigger = scene.create_quad(game, "cupola_trigger", unit_quad(WHITE, None));
        let sleep_trigger = scene.create_quad(game, "sleep_trigger", unit_quad(WHITE, None));
        let bed = bed_texture.map(|texture| {
            let bed = scene.create_quad(game, "bed", unit_quad(WHITE, Some(texture)));
            scene.set_scale(bed, Vec3::new(level.bed.scale, 1.0, level.bed.scale));
            bed
        });
        let player = scene.create_quad(game, "player", unit_quad(WHITE, None));

        let energy_icon = strips.energy.as_ref().map(|icons| {
            let icon = scene.create_quad(ui, "energy_hud", unit_quad(WHITE, icons.first().cloned()));
            scene.set_position(icon, ENERGY_HUD_POS);
            scene.set_scale(icon, ENERGY_HUD_SCALE);
            icon
        });
        let sleep = build_sleep_nodes(scene, ui, &strips, &level.sleep);

        Self {
            strips,
            player_textured,
            player,
            wall_group,
            walls: Vec::new(),
            cupola_trigger,
            sleep_trigger,
            bed,
            energy_icon,
            sleep,
        }
    }

    pub fn sync(&mut self, session: &mut GameSession) -> Hud {
        let hud = Hud::build(session, &self.strips);
        if session.mode() == Mode::Cupola3d {
            self.sync_hud(session.scene_mut(), &hud);
            return hud;
        }

        let walls: Vec<Wall> = session.walls().walls().to_vec();
        let selected = session.walls().selected();
        let walls_visible = session.walls().visible;
        let cupola_zone = session.cupola_trigger().clone();
        let sleep_zone = session.sleep_trigger().clone();
        let player = session.player();
        let (x, z) = player.position();
        let (scale_x, scale_z) = player.sprite_scale();
        let frame = self
            .player_textured
            .then(|| player.animation.current(session.walk_clip()).to_string());
        let scene = session.scene_mut();

        scene.set_position(self.player, Vec3::new(x, 0.0, z));
        scene.set_scale(self.player, Vec3::new(scale_x, 1.0, scale_z));
        scene.set_texture(self.player, frame.as_deref());

        self.sync_walls(scene, &walls, selected, walls_visible);
        sync_trigger(scene, self.cupola_trigger, &cupola_zone);
        sync_trigger(scene, self.sleep_trigger, &sleep_zone);
        if let Some(bed) = self.bed {
            scene.set_position(bed, Vec3::new(sleep_zone.center_x, 0.0, sleep_zone.center_z));
        }
        self.sync_hud(scene, &hud);
        hud
    }

    fn sync_walls(
        &mut self,
        scene: &mut SceneTree,
        walls: &[Wall],
        selected: Option<usize>,
        visible: bool,
    ) {
        while self.walls.len() > walls.len() {
            if let Some(id) = self.walls.pop() {
                scene.destroy(id);
            }
        }
        while self.walls.len() < walls.len() {
            let id = scene.create_quad(self.wall_group, "wall", unit_quad(WALL_COLOR, None));
            self.walls.push(id);
        }
        for (index, (id, wall)) in self.walls.iter().zip(walls).enumerate() {
            scene.set_position(*id, Vec3::new(wall.center_x, 0.0, wall.center_z));
            scene.set_scale(*id, Vec3::new(wall.width, 1.0, wall.height));
            let color = if selected == Some(index) {
                WALL_SELECTED_COLOR
            } else {
                WALL_COLOR
            };
            scene.set_color(*id, color);
            scene.set_visible(*id, visible);
        }
    }

    fn sync_hud(&self, scene: &mut SceneTree, hud: &Hud) {
        if let Some(icon) = self.energy_icon {
            scene.set_texture(icon, hud.energy_icon.as_deref());
        }
        scene.set_visible(self.sleep.root, hud.sleep.is_some());
        let Some(overlay) = &hud.sleep else {
            return;
        };
        match (&overlay.bar, self.sleep.image, self.sleep.fill) {
            (SleepBar::Image(texture), Some(image), _) => {
                scene.set_texture(image, Some(texture));
            }
            (SleepBar::Fill { width }, _, Some(fill)) => {
                let width = width.max(f32::EPSILON);
                scene.set_scale(fill, Vec3::new(width, 1.0, 1.0));
                scene.set_position(fill, Vec3::new(width * 0.5, 0.0, SLEEP_BAR_Z));
            }
            _ => {}
        }
    }
}

fn unit_quad(color: [f32; 4], texture: Option<String>) -> QuadSpec {
    QuadSpec {
        texture,
        ..QuadSpec::untextured(1.0, 1.0, color)
    }
}

fn sync_trigger(scene: &mut SceneTree, id: NodeId, zone: &TriggerZone) {
    scene.set_position(id, Vec3::new(zone.center_x, 0.0, zone.center_z));
    scene.set_scale(id, Vec3::new(zone.width, 1.0, zone.height));
    scene.set_color(id, zone.color);
    scene.set_visible(id, zone.visible);
}

fn build_sleep_nodes(
    scene: &mut SceneTree,
    ui: NodeId,
    strips: &HudStrips,
    settings: &SleepSettings,
) -> SleepNodes {
    let root = scene.create_group(ui, "sleep_overlay");
    scene.set_visible(root, false);
    let backdrop = scene.create_quad(root, "sleep_backdrop", unit_quad(SLEEP_OVERLAY_COLOR, None));
    scene.set_scale(backdrop, Vec3::new(3.0, 1.0, 2.2));

    if let Some(images) = &strips.sleep {
        let image = scene.create_quad(root, "sleep_bar", unit_quad(WHITE, images.first().cloned()));
        scene.set_position(image, Vec3::new(0.0, 0.0, SLEEP_BAR_Z));
        scene.set_scale(image, SLEEP_BAR_IMAGE_SCALE);
        return SleepNodes {
            root,
            image: Some(image),
            fill: None,
        };
    }

    let back = scene.create_quad(
        root,
        "sleep_bar_back",
        QuadSpec::untextured(
            settings.bar_half_w * 2.0,
            settings.bar_half_h * 2.0,
            SLEEP_BAR_BACK_COLOR,
        ),
    );
    scene.set_position(back, Vec3::new(0.0, 0.0, SLEEP_BAR_Z));
    // The fill grows rightwards from the anchor at the bar's inner left edge.
    let fill_anchor = scene.create_group(root, "sleep_bar_fill_anchor");
    scene.set_position(
        fill_anchor,
        Vec3::new(-settings.bar_half_w + settings.bar_margin, 0.0, 0.0),
    );
    let fill = scene.create_quad(
        fill_anchor,
        "sleep_bar_fill",
        QuadSpec::untextured(1.0, settings.bar_half_h * 1.5, SLEEP_BAR_FILL_COLOR),
    );
    SleepNodes {
        root,
        image: None,
        fill: Some(fill),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Command;
    use crate::scene::Drawable;
    use crate::session::DialogKind;

    fn session_and_view() -> (GameSession, MapView) {
        view_for(LevelFile::default())
    }

    fn view_for(level: LevelFile) -> (GameSession, MapView) {
        let mut session = GameSession::new(level);
        // Default art paths do not resolve from the test working directory.
        let mut probe = TextureProbe::new();
        let view = MapView::new(&mut session, &mut probe);
        (session, view)
    }

    #[test]
    fn missing_strips_fall_back_to_label_and_fill() {
        let (mut session, mut view) = session_and_view();
        let hud = view.sync(&mut session);
        assert_eq!(hud.energy_icon, None);
        assert_eq!(hud.energy_label.as_deref(), Some("Energy: 10/10"));
        assert!(hud.sleep.is_none());
    }

    #[test]
    fn fill_width_spans_inner_bar() {
        let settings = LevelFile::default().sleep;
        assert_eq!(sleep_fill_width(0.0, &settings), 0.0);
        let full = sleep_fill_width(1.0, &settings);
        assert!((full - (2.4 - 0.04)).abs() < 1e-5);
        assert!((sleep_fill_width(0.5, &settings) - full * 0.5).abs() < 1e-5);
        assert_eq!(sleep_fill_width(3.0, &settings), full);
    }

    #[test]
    fn wall_quads_track_registry() {
        let (mut session, mut view) = session_and_view();
        view.sync(&mut session);
        assert_eq!(view.walls.len(), 16);
        let first = view.walls[0];
        let node = session.scene().node(first).expect("wall quad");
        assert!((node.position.x - -0.323).abs() < 1e-6);
        assert!((node.scale.z - 0.560).abs() < 1e-6);
        assert_eq!(node.drawable, Drawable::Quad(unit_quad(WALL_COLOR, None)));
    }

    #[test]
    fn player_quad_follows_controller() {
        let (mut session, mut view) = session_and_view();
        view.sync(&mut session);
        let node = session.scene().node(view.player).expect("player quad");
        assert!((node.position.x - 0.2).abs() < 1e-6);
        assert!((node.position.z - -0.5).abs() < 1e-6);
        assert!((node.scale.x - 0.15).abs() < 1e-6);
    }

    #[test]
    fn hidden_sleep_trigger_hides_quad() {
        let (mut session, mut view) = session_and_view();
        view.sync(&mut session);
        let cupola = session.scene().node(view.cupola_trigger).expect("trigger quad");
        assert!(!cupola.visible);
        let sleep = session.scene().node(view.sleep_trigger).expect("trigger quad");
        assert!(sleep.visible);
    }

    #[test]
    fn dialog_and_sleep_show_in_hud() {
        let mut level = LevelFile::default();
        level.sleep_trigger.center = level.player.start;
        let (mut session, mut view) = view_for(level);
        assert_eq!(view.sync(&mut session).dialog, None);

        // The player starts on the bed, so the first map frame asks.
        session.update(1.0 / 60.0, None);
        let hud = view.sync(&mut session);
        assert_eq!(hud.dialog, Some(DialogKind::Sleep.prompt()));
        assert!(hud.status_line().contains("Go to sleep? [Y/N]"));

        session.apply(Command::Confirm, None);
        session.update(4.0, None);
        let hud = view.sync(&mut session);
        let overlay = hud.sleep.expect("sleep overlay");
        assert_eq!(overlay.title, "Sleeping...");
        assert!(matches!(overlay.bar, SleepBar::Fill { width } if (width - 1.18).abs() < 1e-4));
        assert!(session.scene().is_visible_in_tree(view.sleep.root));
    }
}
