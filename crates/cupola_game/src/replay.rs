use cupola_core::input::{InputState, Key};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::session::GameSession;

/// Scripted key input: each frame lists the keys held during it.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_frames(&self) -> Result<Vec<HashSet<Key>>, String> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let held = frame
                .keys
                .iter()
                .map(|name| parse_key(name).ok_or_else(|| format!("Unknown replay key '{name}'")))
                .collect::<Result<HashSet<Key>, String>>()?;
            for _ in 0..frame.repeat.max(1) {
                out.push(held.clone());
            }
        }
        Ok(out)
    }
}

/// Feed every frame to `session`, turning held-set changes into key edges.
pub fn run_replay(session: &mut GameSession, replay: &ReplaySequence) -> Result<(), String> {
    let mut input = InputState::new();
    let mut previous: HashSet<Key> = HashSet::new();
    for held in replay.expanded_frames()? {
        for &key in previous.difference(&held) {
            input.key_up(key);
        }
        for &key in held.difference(&previous) {
            input.key_down(key);
        }
        session.frame(&input, replay.fixed_dt, None);
        input.end_frame();
        previous = held;
    }
    Ok(())
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    replay.expanded_frames().map(|_| ())
}

fn parse_key(name: &str) -> Option<Key> {
    let key = match name.to_ascii_lowercase().as_str() {
        "w" => Key::W,
        "a" => Key::A,
        "s" => Key::S,
        "d" => Key::D,
        "b" => Key::B,
        "n" => Key::N,
        "p" => Key::P,
        "y" => Key::Y,
        "space" => Key::Space,
        "escape" => Key::Escape,
        "enter" => Key::Enter,
        "tab" => Key::Tab,
        "shift" => Key::Shift,
        "delete" => Key::Delete,
        "left" => Key::Left,
        "right" => Key::Right,
        "up" => Key::Up,
        "down" => Key::Down,
        "[" => Key::BracketLeft,
        "]" => Key::BracketRight,
        ";" => Key::Semicolon,
        "'" => Key::Quote,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        _ => return None,
    };
    Some(key)
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelFile;
    use crate::session::{Editor, Mode};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "cupola_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_replay(name_hint: &str, json: &str) -> ReplaySequence {
        let path = temp_file_path(name_hint);
        fs::write(&path, json).expect("write replay file");
        let replay = load_replay_from_path(&path).expect("replay should load");
        let _ = fs::remove_file(path);
        replay
    }

    fn open_level() -> LevelFile {
        let mut level = LevelFile {
            walls: Vec::new(),
            ..LevelFile::default()
        };
        level.sleep_trigger.center = [-0.8, -0.8];
        level
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let replay = write_replay(
            "parse",
            r#"{
              "frames": [
                { "keys": ["d", "space"], "repeat": 3 },
                { "keys": [] }
              ]
            }"#,
        );
        let frames = replay.expanded_frames().expect("known keys");
        assert_eq!(frames.len(), 4);
        assert!(frames[0].contains(&Key::Space));
        assert!(frames[3].is_empty());
    }

    #[test]
    fn unknown_key_names_are_rejected() {
        let path = temp_file_path("unknown");
        fs::write(&path, r#"{ "frames": [ { "keys": ["q"] } ] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("q is not bound");
        assert!(err.contains("Unknown replay key 'q'"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let replay = write_replay(
            "deterministic",
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "keys": ["d"], "repeat": 45 },
                { "keys": ["d", "space"], "repeat": 30 },
                { "keys": ["s", "a"], "repeat": 90 },
                { "keys": [], "repeat": 5 },
                { "keys": ["w"], "repeat": 120 }
              ]
            }"#,
        );

        let mut run_a = GameSession::new(LevelFile::default());
        let mut run_b = GameSession::new(LevelFile::default());
        run_replay(&mut run_a, &replay).expect("replay a");
        run_replay(&mut run_b, &replay).expect("replay b");

        let (ax, az) = run_a.player().position();
        let (bx, bz) = run_b.player().position();
        assert!((ax - bx).abs() < 0.0001);
        assert!((az - bz).abs() < 0.0001);
        assert_eq!(run_a.energy(), run_b.energy());
        assert_eq!(run_a.mode(), run_b.mode());
        assert_eq!(run_a.dialog(), run_b.dialog());
    }

    #[test]
    fn scripted_visit_to_the_cupola_and_back() {
        let replay = write_replay(
            "visit",
            r#"{
              "frames": [
                { "keys": ["w"], "repeat": 60 },
                { "keys": [], "repeat": 2 },
                { "keys": ["y"] },
                { "keys": [], "repeat": 10 }
              ]
            }"#,
        );
        let mut session = GameSession::new(open_level());
        run_replay(&mut session, &replay).expect("replay");
        assert_eq!(session.mode(), Mode::Cupola3d);

        let back = write_replay(
            "back",
            r#"{ "frames": [ { "keys": ["escape"] }, { "keys": [], "repeat": 3 } ] }"#,
        );
        run_replay(&mut session, &back).expect("replay back");
        assert_eq!(session.mode(), Mode::Map2d);
        assert!(!session.quit_requested());
    }

    #[test]
    fn scripted_wall_edit_session() {
        let replay = write_replay(
            "walls",
            r#"{
              "frames": [
                { "keys": ["f8"] }, { "keys": [] },
                { "keys": ["n"] }, { "keys": [] },
                { "keys": ["up"] }, { "keys": [] },
                { "keys": ["'"] }, { "keys": [] },
                { "keys": ["f8"] }, { "keys": [] }
              ]
            }"#,
        );
        let mut session = GameSession::new(open_level());
        run_replay(&mut session, &replay).expect("replay");
        assert_eq!(session.editor(), None::<Editor>);
        let wall = session.walls().walls()[0];
        assert!((wall.center_z - -0.48).abs() < 1e-5);
        assert!((wall.height - 0.32).abs() < 1e-5);
    }
}
