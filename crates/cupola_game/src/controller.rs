use cupola_core::animation::{seconds_to_us, AnimationClip, AnimationState};

use crate::geometry::Aabb;
use crate::walls::{MoveResult, WallRegistry, WorldBounds};

/// Movement intent for one map frame, already reduced from latched keys.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerInput {
    /// -1, 0 or 1 per axis.
    pub move_x: f32,
    pub move_z: f32,
    /// Held boost key: draws the sprite larger, which also grows its box.
    pub boost: bool,
}

impl ControllerInput {
    pub fn is_moving(&self) -> bool {
        self.move_x != 0.0 || self.move_z != 0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub speed: f32,
    pub base_scale: f32,
    pub boost_scale: f32,
    pub bounds: WorldBounds,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            speed: 1.5,
            base_scale: 0.15,
            boost_scale: 0.18,
            bounds: WorldBounds::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub up: bool,
}

/// The map-mode player: a unit quad scaled by `scale`, mirrored by `facing`.
#[derive(Debug, Clone)]
pub struct PlayerController {
    pub aabb: Aabb,
    /// +1 facing right, -1 facing left.
    pub facing: f32,
    pub scale: f32,
    pub moving: bool,
    pub contacts: ContactState,
    pub config: ControllerConfig,
    pub animation: AnimationState,
}

impl PlayerController {
    pub fn new(x: f32, z: f32, config: ControllerConfig) -> Self {
        let half = config.base_scale * 0.5;
        Self {
            aabb: Aabb::new(x, z, half, half),
            facing: 1.0,
            scale: config.base_scale,
            moving: false,
            contacts: ContactState::default(),
            config,
            animation: AnimationState::new(),
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.aabb.center_x, self.aabb.center_z)
    }

    /// Signed sprite scale: x is negative while facing left.
    pub fn sprite_scale(&self) -> (f32, f32) {
        (self.scale * self.facing, self.scale)
    }

    /// Advance one map frame: resolve movement against walls, then update the
    /// animation and the size the player will collide with next frame.
    pub fn step(
        &mut self,
        input: ControllerInput,
        dt: f32,
        walls: &WallRegistry,
        clip: &AnimationClip,
    ) {
        if input.move_x < 0.0 {
            self.facing = -1.0;
        } else if input.move_x > 0.0 {
            self.facing = 1.0;
        }

        let dx = input.move_x * self.config.speed * dt;
        let dz = input.move_z * self.config.speed * dt;
        let result = walls.move_and_collide_detailed(self.aabb, dx, dz, self.config.bounds);
        self.apply_collision_result(result);

        self.moving = input.is_moving();
        self.animation.set_playing(self.moving);
        self.animation.tick(seconds_to_us(dt), clip);

        // Size change lands after resolution, so it only affects the next step.
        self.scale = if input.boost {
            self.config.boost_scale
        } else {
            self.config.base_scale
        };
        self.aabb.half_w = self.scale * 0.5;
        self.aabb.half_h = self.scale * 0.5;
    }

    fn apply_collision_result(&mut self, result: MoveResult) {
        self.aabb = result.aabb;
        self.contacts = ContactState {
            left: result.blocked_left,
            right: result.blocked_right,
            down: result.blocked_down,
            up: result.blocked_up,
        };
    }

    /// Idle the sprite without moving, used when input gets cleared mid-walk.
    pub fn stop(&mut self) {
        self.moving = false;
        self.animation.set_playing(false);
    }
}
