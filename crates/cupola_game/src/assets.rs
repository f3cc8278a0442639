//! Texture probing with non-fatal fallback.
//!
//! Pixels are never decoded here. A texture counts as available when its
//! header can be read; the renderer loads the real data later. A missing
//! texture degrades the element that wanted it (untextured quad, text HUD,
//! fallback bar) rather than stopping the game.

use std::collections::HashMap;
use std::path::Path;

/// Both HUD strips hold one image per 10% step.
pub const ICON_STRIP_LEN: usize = 11;

pub fn probe_texture(path: &Path) -> Result<(u32, u32), String> {
    image::image_dimensions(path)
        .map_err(|e| format!("Failed to read texture '{}': {e}", path.display()))
}

/// Remembers probe results so each path is checked (and warned about) once.
#[derive(Debug, Default)]
pub struct TextureProbe {
    known: HashMap<String, Option<(u32, u32)>>,
}

impl TextureProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(&mut self, path: &str) -> Option<(u32, u32)> {
        if let Some(known) = self.known.get(path) {
            return *known;
        }
        let result = match probe_texture(Path::new(path)) {
            Ok(size) => Some(size),
            Err(err) => {
                log::warn!("{err}. Falling back to untextured quad.");
                None
            }
        };
        self.known.insert(path.to_string(), result);
        result
    }

    /// The path back when it can be used as a texture.
    pub fn texture(&mut self, path: &str) -> Option<String> {
        self.dimensions(path).map(|_| path.to_string())
    }

    /// Every frame of an animation must resolve, otherwise the sprite is
    /// drawn untextured.
    pub fn all_available(&mut self, paths: &[String]) -> bool {
        paths.iter().all(|p| self.dimensions(p).is_some())
    }

    /// A complete 11-entry strip, or `None` when the list has the wrong length
    /// or any image is unreadable.
    pub fn icon_strip(&mut self, label: &str, paths: &[String]) -> Option<Vec<String>> {
        if paths.len() != ICON_STRIP_LEN {
            log::warn!(
                "{label} needs {ICON_STRIP_LEN} images, got {}. Using fallback.",
                paths.len()
            );
            return None;
        }
        let mut missing = 0;
        for path in paths {
            if self.dimensions(path).is_none() {
                missing += 1;
            }
        }
        if missing > 0 {
            log::warn!("{label}: {missing} image(s) missing. Using fallback.");
            return None;
        }
        Some(paths.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "cupola_assets_test_{}_{}_{}.png",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        image::RgbaImage::new(w, h)
            .save(path)
            .expect("failed to write temp png");
    }

    #[test]
    fn probe_reads_dimensions_without_decoding() {
        let path = temp_file_path("dims");
        write_png(&path, 4, 2);
        assert_eq!(probe_texture(&path).expect("png should probe"), (4, 2));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_texture_is_reported_not_fatal() {
        let mut probe = TextureProbe::new();
        let path = temp_file_path("missing");
        let path = path.to_string_lossy().to_string();
        assert_eq!(probe.texture(&path), None);
        // Cached: a second lookup does not hit the filesystem again.
        assert_eq!(probe.dimensions(&path), None);
    }

    #[test]
    fn icon_strip_requires_eleven_readable_images() {
        let mut probe = TextureProbe::new();
        let paths: Vec<PathBuf> = (0..ICON_STRIP_LEN)
            .map(|i| temp_file_path(&format!("strip{i}")))
            .collect();
        for path in &paths {
            write_png(path, 1, 1);
        }
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();

        assert!(probe.icon_strip("energy", &names).is_some());
        assert!(probe.icon_strip("energy", &names[..10]).is_none());

        let mut broken = names.clone();
        broken[3] = temp_file_path("strip_missing").to_string_lossy().to_string();
        assert!(probe.icon_strip("energy", &broken).is_none());

        for path in paths {
            let _ = fs::remove_file(path);
        }
    }
}
