//! Named trigger regions on the map.
//!
//! A zone's debug quad is presentation only: overlap checks always use the
//! stored box, whether or not the quad is shown.

use crate::geometry::{overlaps, Aabb};

pub const MIN_TRIGGER_SIZE: f32 = 0.02;

#[derive(Debug, Clone)]
pub struct TriggerZone {
    pub name: String,
    pub center_x: f32,
    pub center_z: f32,
    pub width: f32,
    pub height: f32,
    pub visible: bool,
    pub color: [f32; 4],
    was_inside: bool,
}

impl TriggerZone {
    pub fn new(name: &str, center: (f32, f32), size: (f32, f32), visible: bool, color: [f32; 4]) -> Self {
        let mut zone = Self {
            name: name.to_string(),
            center_x: center.0,
            center_z: center.1,
            width: MIN_TRIGGER_SIZE,
            height: MIN_TRIGGER_SIZE,
            visible,
            color,
            was_inside: false,
        };
        zone.set_size(size.0, size.1);
        zone
    }

    pub fn set_center(&mut self, x: f32, z: f32) {
        self.center_x = x;
        self.center_z = z;
    }

    pub fn set_size(&mut self, w: f32, h: f32) {
        self.width = w.max(MIN_TRIGGER_SIZE);
        self.height = h.max(MIN_TRIGGER_SIZE);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_size(self.center_x, self.center_z, self.width, self.height)
    }

    pub fn contains(&self, player: &Aabb) -> bool {
        overlaps(player, &self.aabb())
    }

    pub fn was_inside(&self) -> bool {
        self.was_inside
    }

    /// Edge-triggered entry check, run once per map frame. Returns true only on
    /// the frame the player goes from outside to inside, and never while a
    /// dialog is already open. The inside flag is refreshed either way, so a
    /// player who stays inside after a dialog closes does not re-fire.
    pub fn check_entry(&mut self, player: &Aabb, dialog_open: bool) -> bool {
        let inside = self.contains(player);
        let entered = inside && !self.was_inside && !dialog_open;
        self.was_inside = inside;
        entered
    }
}
