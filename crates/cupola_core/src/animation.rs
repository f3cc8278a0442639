//! Frame-based sprite animation types and deterministic tick logic.
//!
//! A clip is an ordered, looping list of texture paths shown for a fixed
//! duration each. Timing uses integer microseconds (`u64`) so two runs fed the
//! same frame deltas land on the same frame index. Callers working in float
//! seconds convert once with [`seconds_to_us`].

/// A single frame in an animation clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    pub texture: String,
    pub duration_us: u64,
}

/// A sequence of frames that wraps back to the first after the last.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub frames: Vec<AnimationFrame>,
}

impl AnimationClip {
    /// Build a clip where every frame lasts `frame_us`.
    pub fn uniform<S: AsRef<str>>(textures: &[S], frame_us: u64) -> Self {
        Self {
            frames: textures
                .iter()
                .map(|t| AnimationFrame {
                    texture: t.as_ref().to_string(),
                    duration_us: frame_us,
                })
                .collect(),
        }
    }
}

/// Runtime state for one animated sprite.
///
/// Sprites toggle between playing and idle every few frames; stopping rewinds
/// to frame 0 so an idle sprite always shows its rest pose.
#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub playing: bool,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_playing(&mut self, playing: bool) {
        if self.playing && !playing {
            self.frame_index = 0;
            self.elapsed_us = 0;
        }
        self.playing = playing;
    }

    /// Current frame's texture without advancing.
    pub fn current<'a>(&self, clip: &'a AnimationClip) -> &'a str {
        clip.frames
            .get(self.frame_index)
            .or_else(|| clip.frames.last())
            .map(|f| f.texture.as_str())
            .unwrap_or("")
    }

    /// Advance the animation by `dt_us` microseconds. Returns the current frame's
    /// texture. A stopped animation does not advance.
    pub fn tick<'a>(&mut self, dt_us: u64, clip: &'a AnimationClip) -> &'a str {
        if clip.frames.is_empty() || !self.playing {
            return self.current(clip);
        }

        self.elapsed_us += dt_us;

        loop {
            let current_frame = &clip.frames[self.frame_index];
            if current_frame.duration_us == 0 || self.elapsed_us < current_frame.duration_us {
                break;
            }

            self.elapsed_us -= current_frame.duration_us;
            self.frame_index = (self.frame_index + 1) % clip.frames.len();
        }

        &clip.frames[self.frame_index].texture
    }
}

pub fn seconds_to_us(seconds: f32) -> u64 {
    if seconds <= 0.0 {
        return 0;
    }
    (seconds as f64 * 1_000_000.0).round() as u64
}
