//! Level file: map layout, triggers, HUD art and cupola model settings.
//!
//! Every field has a default equal to the built-in level, so an empty JSON
//! object is a complete level and a missing file simply means "use the
//! defaults". Only the wall list and trigger geometry hot-reload; everything
//! else is read once at startup.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::trigger::TriggerZone;
use crate::walls::{Wall, WorldBounds};

pub const DEFAULT_LEVEL_PATH: &str = "assets/levels/iss_level.json";

const DEFAULT_WALLS: [[f32; 4]; 16] = [
    [-0.323, -0.120, 0.300, 0.560],
    [0.197, 0.620, 0.300, 0.300],
    [0.497, 0.300, 0.300, 0.300],
    [0.617, -0.260, 0.300, 0.300],
    [0.257, -0.080, 0.380, 0.260],
    [0.017, -0.840, 1.020, 0.280],
    [-0.643, -0.540, 0.300, 0.300],
    [0.144, -0.266, 0.160, 0.260],
    [0.084, 0.094, 0.060, 0.120],
    [-0.096, 0.671, 0.300, 0.300],
    [-0.316, 0.611, 0.300, 0.300],
    [0.700, 0.440, 0.720, 1.240],
    [0.780, -0.620, 0.500, 0.700],
    [-0.760, -0.120, 0.540, 2.300],
    [-0.020, 0.860, 1.060, 0.300],
    [0.820, -0.220, 0.420, 0.160],
];

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_background")]
    pub background: Option<String>,
    #[serde(default)]
    pub player: PlayerSettings,
    #[serde(default)]
    pub bounds: BoundsSettings,
    #[serde(default = "default_walls")]
    pub walls: Vec<[f32; 4]>,
    #[serde(default = "default_true")]
    pub show_walls: bool,
    #[serde(default = "default_cupola_trigger")]
    pub cupola_trigger: TriggerSettings,
    #[serde(default = "default_sleep_trigger")]
    pub sleep_trigger: TriggerSettings,
    #[serde(default)]
    pub bed: BedSettings,
    #[serde(default)]
    pub energy: EnergySettings,
    #[serde(default)]
    pub sleep: SleepSettings,
    #[serde(default)]
    pub model: ModelSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlayerSettings {
    #[serde(default = "default_player_start")]
    pub start: [f32; 2],
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_player_scale")]
    pub scale: f32,
    #[serde(default = "default_boost_scale")]
    pub boost_scale: f32,
    #[serde(default = "default_player_frames")]
    pub frames: Vec<String>,
    #[serde(default = "default_frame_time")]
    pub frame_time: f32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct BoundsSettings {
    #[serde(default = "default_half_x")]
    pub half_x: f32,
    #[serde(default = "default_half_z")]
    pub half_z: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TriggerSettings {
    pub center: [f32; 2],
    pub size: [f32; 2],
    #[serde(default)]
    pub visible: bool,
    #[serde(default = "default_trigger_color")]
    pub color: [f32; 4],
}

#[derive(Debug, Deserialize, Clone)]
pub struct BedSettings {
    #[serde(default = "default_bed_image")]
    pub image: String,
    #[serde(default = "default_bed_scale")]
    pub scale: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnergySettings {
    /// Ordered full (100%) to empty (0%).
    #[serde(default = "default_energy_icons")]
    pub icons: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SleepSettings {
    #[serde(default = "default_sleep_duration")]
    pub duration: f32,
    /// Ordered empty (0%) to full (100%).
    #[serde(default = "default_sleep_bar_images")]
    pub bar_images: Vec<String>,
    #[serde(default = "default_bar_half_w")]
    pub bar_half_w: f32,
    #[serde(default = "default_bar_half_h")]
    pub bar_half_h: f32,
    #[serde(default = "default_bar_margin")]
    pub bar_margin: f32,
    #[serde(default = "default_sleep_title")]
    pub title: String,
    #[serde(default = "default_sleep_message")]
    pub message: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelSettings {
    #[serde(default = "default_model_primary")]
    pub primary: String,
    #[serde(default = "default_model_alternate")]
    pub alternate: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "default_model_scale")]
    pub scale: f32,
    /// Model part name to the text shown when it is clicked.
    #[serde(default)]
    pub parts_info: BTreeMap<String, String>,
    #[serde(default)]
    pub markers: Vec<MarkerSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarkerSettings {
    pub position: [f32; 3],
    pub radius: f32,
    pub info: String,
}

impl LevelFile {
    pub fn wall_list(&self) -> Vec<Wall> {
        self.walls
            .iter()
            .map(|&[x, z, w, h]| Wall::new(x, z, w, h))
            .collect()
    }

    pub fn world_bounds(&self) -> WorldBounds {
        WorldBounds {
            half_x: self.bounds.half_x,
            half_z: self.bounds.half_z,
        }
    }
}

impl Default for LevelFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            background: default_background(),
            player: PlayerSettings::default(),
            bounds: BoundsSettings::default(),
            walls: default_walls(),
            show_walls: true,
            cupola_trigger: default_cupola_trigger(),
            sleep_trigger: default_sleep_trigger(),
            bed: BedSettings::default(),
            energy: EnergySettings::default(),
            sleep: SleepSettings::default(),
            model: ModelSettings::default(),
        }
    }
}

impl TriggerSettings {
    pub fn build(&self, name: &str) -> TriggerZone {
        TriggerZone::new(
            name,
            (self.center[0], self.center[1]),
            (self.size[0], self.size[1]),
            self.visible,
            self.color,
        )
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            start: default_player_start(),
            speed: default_speed(),
            scale: default_player_scale(),
            boost_scale: default_boost_scale(),
            frames: default_player_frames(),
            frame_time: default_frame_time(),
        }
    }
}

impl Default for BoundsSettings {
    fn default() -> Self {
        Self {
            half_x: default_half_x(),
            half_z: default_half_z(),
        }
    }
}

impl Default for BedSettings {
    fn default() -> Self {
        Self {
            image: default_bed_image(),
            scale: default_bed_scale(),
        }
    }
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            icons: default_energy_icons(),
        }
    }
}

impl Default for SleepSettings {
    fn default() -> Self {
        Self {
            duration: default_sleep_duration(),
            bar_images: default_sleep_bar_images(),
            bar_half_w: default_bar_half_w(),
            bar_half_h: default_bar_half_h(),
            bar_margin: default_bar_margin(),
            title: default_sleep_title(),
            message: default_sleep_message(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            primary: default_model_primary(),
            alternate: default_model_alternate(),
            position: [0.0; 3],
            scale: default_model_scale(),
            parts_info: BTreeMap::new(),
            markers: Vec::new(),
        }
    }
}

/// mtime poller for the level file. Reports a change once per new mtime,
/// including the file appearing after startup.
pub struct LevelWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl LevelWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

pub fn load_level_from_path(path: &Path) -> Result<LevelFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read level file {}: {e}", path.display()))?;
    let level: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", path.display()))?;
    validate_level(&level)?;
    Ok(level)
}

/// Load the level at `path`, or the built-in level when it is missing or
/// broken.
pub fn load_level_or_default(path: &Path) -> LevelFile {
    if !path.exists() {
        log::warn!(
            "Level file '{}' was not found. Using built-in level.",
            path.display()
        );
        return LevelFile::default();
    }
    match load_level_from_path(path) {
        Ok(level) => {
            log::info!(
                "Level loaded: {} ({} walls, version {})",
                path.display(),
                level.walls.len(),
                level.version
            );
            level
        }
        Err(err) => {
            log::error!("{err}. Using built-in level.");
            LevelFile::default()
        }
    }
}

fn validate_level(level: &LevelFile) -> Result<(), String> {
    if level.bounds.half_x <= 0.0 || level.bounds.half_z <= 0.0 {
        return Err("Level validation failed: bounds must be > 0".to_string());
    }
    if level.player.speed < 0.0 {
        return Err("Level validation failed: player speed must be >= 0".to_string());
    }
    if level.player.scale <= 0.0 || level.player.boost_scale <= 0.0 {
        return Err("Level validation failed: player scales must be > 0".to_string());
    }
    if level.player.frames.is_empty() {
        return Err("Level validation failed: player frames list is empty".to_string());
    }
    if level.player.frame_time <= 0.0 {
        return Err("Level validation failed: player frame_time must be > 0".to_string());
    }
    if level.sleep.duration <= 0.0 {
        return Err("Level validation failed: sleep duration must be > 0".to_string());
    }
    for (i, wall) in level.walls.iter().enumerate() {
        if wall.iter().any(|v| !v.is_finite()) {
            return Err(format!("Level validation failed: wall {i} is not finite"));
        }
    }
    for marker in &level.model.markers {
        if marker.radius <= 0.0 {
            return Err(format!(
                "Level validation failed: marker '{}' radius must be > 0",
                marker.info
            ));
        }
    }
    if level.walls.is_empty() {
        log::warn!("Level has no walls. This is allowed but often accidental.");
    }
    Ok(())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

fn default_version() -> String {
    "0.1".to_string()
}

fn default_background() -> Option<String> {
    Some("assets/backgrounds/bg2.png".to_string())
}

fn default_walls() -> Vec<[f32; 4]> {
    DEFAULT_WALLS.to_vec()
}

const fn default_true() -> bool {
    true
}

const fn default_player_start() -> [f32; 2] {
    [0.20, -0.5]
}

const fn default_speed() -> f32 {
    1.5
}

const fn default_player_scale() -> f32 {
    0.15
}

const fn default_boost_scale() -> f32 {
    0.18
}

fn default_player_frames() -> Vec<String> {
    vec![
        "assets/models/player_walk1.png".to_string(),
        "assets/models/player_walk2.png".to_string(),
    ]
}

const fn default_frame_time() -> f32 {
    0.12
}

const fn default_half_x() -> f32 {
    1.2
}

const fn default_half_z() -> f32 {
    1.0
}

const fn default_trigger_color() -> [f32; 4] {
    [1.0, 1.0, 0.0, 0.25]
}

fn default_cupola_trigger() -> TriggerSettings {
    TriggerSettings {
        center: [0.20, 0.12],
        size: [0.22, 0.16],
        visible: false,
        color: default_trigger_color(),
    }
}

fn default_sleep_trigger() -> TriggerSettings {
    TriggerSettings {
        center: [0.300, -0.320],
        size: [0.160, 0.120],
        visible: true,
        color: [0.0, 1.0, 1.0, 0.35],
    }
}

fn default_bed_image() -> String {
    "assets/models/astroBed.png".to_string()
}

const fn default_bed_scale() -> f32 {
    0.10
}

fn energy_bar_path(percent: u32) -> String {
    format!("assets/hud/sleep/energyBar{percent}.png")
}

fn default_energy_icons() -> Vec<String> {
    (0..=10).rev().map(|i| energy_bar_path(i * 10)).collect()
}

fn default_sleep_bar_images() -> Vec<String> {
    (0..=10).map(|i| energy_bar_path(i * 10)).collect()
}

const fn default_sleep_duration() -> f32 {
    8.0
}

const fn default_bar_half_w() -> f32 {
    1.20
}

const fn default_bar_half_h() -> f32 {
    0.018
}

const fn default_bar_margin() -> f32 {
    0.02
}

fn default_sleep_title() -> String {
    "Sleeping...".to_string()
}

fn default_sleep_message() -> String {
    "Astronauts experience 16 sunsets every day, which affects their circadian rhythm or sleep cycle.\n\
     It is important for them to rest so that they can have a good performance."
        .to_string()
}

fn default_model_primary() -> String {
    "assets/cupola.model.json".to_string()
}

fn default_model_alternate() -> String {
    "assets/cupola.glb".to_string()
}

const fn default_model_scale() -> f32 {
    1.0
}
