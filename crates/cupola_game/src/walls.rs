//! Wall colliders and the map movement resolver.
//!
//! Walls are plain boxes in map space kept in an ordered list. The list is the
//! single source of truth for both gameplay and the wall editor: editing
//! commands mutate it in place and the next movement step sees the result.
//!
//! The resolver is **axis-separable push-out**: resolve X first against every
//! wall the player already overlaps on Z, then resolve Z using the resolved X.
//! It is not a swept test; a large enough step can carry the player through a
//! thin wall. Resolving X before Z means sliding into a corner can end in a
//! different spot depending on approach direction. Designers have not signed
//! off on that ordering, so it is kept as-is.

use crate::geometry::Aabb;

pub const MIN_WALL_SIZE: f32 = 0.05;
pub const NEW_WALL_SIZE: f32 = 0.3;
/// Position touching the wall edge on the `positive` side of `center`.
/// `center + reach` can round back inside, so step out by rounding-sized
/// increments until the strict overlap test reads it as clear.
fn edge_position(center: f32, reach: f32, positive: bool) -> f32 {
    let mut edge = if positive { center + reach } else { center - reach };
    while (edge - center).abs() < reach {
        let step = edge.abs().max(reach) * f32::EPSILON;
        edge = if positive { edge + step } else { edge - step };
    }
    edge
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub center_x: f32,
    pub center_z: f32,
    pub width: f32,
    pub height: f32,
}

impl Wall {
    pub fn new(center_x: f32, center_z: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_z,
            width: width.max(MIN_WALL_SIZE),
            height: height.max(MIN_WALL_SIZE),
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_size(self.center_x, self.center_z, self.width, self.height)
    }
}

/// Hard limits on the player's center, applied before wall resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub half_x: f32,
    pub half_z: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            half_x: 1.2,
            half_z: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MoveResult {
    pub aabb: Aabb,
    pub blocked_left: bool,
    pub blocked_right: bool,
    pub blocked_down: bool,
    pub blocked_up: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WallRegistry {
    walls: Vec<Wall>,
    selected: Option<usize>,
    /// Debug quads for walls are drawn only when set.
    pub visible: bool,
}

impl WallRegistry {
    pub fn new(walls: Vec<Wall>, visible: bool) -> Self {
        Self {
            walls,
            selected: None,
            visible,
        }
    }

    #[cfg(test)]
    pub fn from_tuples(tuples: &[(f32, f32, f32, f32)], visible: bool) -> Self {
        let walls = tuples
            .iter()
            .map(|&(x, z, w, h)| Wall::new(x, z, w, h))
            .collect();
        Self::new(walls, visible)
    }

    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn get(&self, index: usize) -> Option<&Wall> {
        self.walls.get(index)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_wall(&self) -> Option<&Wall> {
        self.selected.and_then(|i| self.walls.get(i))
    }

    /// Swap in a freshly loaded wall list. Selection is dropped because the
    /// old indices no longer mean anything.
    pub fn replace(&mut self, walls: Vec<Wall>) {
        self.walls = walls;
        self.selected = None;
    }

    pub fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// Append a wall and return its index.
    pub fn add(&mut self, x: f32, z: f32, w: f32, h: f32) -> usize {
        self.walls.push(Wall::new(x, z, w, h));
        self.walls.len() - 1
    }

    /// Append a default-sized wall and select it.
    pub fn add_selected(&mut self, x: f32, z: f32) -> usize {
        let index = self.add(x, z, NEW_WALL_SIZE, NEW_WALL_SIZE);
        self.selected = Some(index);
        index
    }

    /// Remove the selected wall. Selection stays on the same index when
    /// possible, otherwise moves to the new last wall, or clears.
    pub fn delete_selected(&mut self) -> Option<Wall> {
        let index = self.selected?;
        if index >= self.walls.len() {
            self.selected = None;
            return None;
        }
        let removed = self.walls.remove(index);
        self.selected = if self.walls.is_empty() {
            None
        } else {
            Some(index.min(self.walls.len() - 1))
        };
        Some(removed)
    }

    /// Move the selection by `step`, wrapping in both directions. With no
    /// current selection the count starts from just before the first wall.
    pub fn cycle(&mut self, step: i32) {
        if self.walls.is_empty() {
            return;
        }
        let len = self.walls.len() as i64;
        let current = self.selected.map(|i| i as i64).unwrap_or(-1);
        self.selected = Some((current + step as i64).rem_euclid(len) as usize);
    }

    pub fn nudge_selected(&mut self, dx: f32, dz: f32) -> bool {
        let Some(wall) = self.selected.and_then(|i| self.walls.get_mut(i)) else {
            return false;
        };
        wall.center_x += dx;
        wall.center_z += dz;
        true
    }

    pub fn resize_selected(&mut self, dw: f32, dh: f32) -> bool {
        let Some(wall) = self.selected.and_then(|i| self.walls.get_mut(i)) else {
            return false;
        };
        wall.width = (wall.width + dw).max(MIN_WALL_SIZE);
        wall.height = (wall.height + dh).max(MIN_WALL_SIZE);
        true
    }

    /// Textual export of the wall list in the level file's `walls` format,
    /// ready to paste back into the level JSON.
    pub fn dump(&self) -> String {
        let items: Vec<String> = self
            .walls
            .iter()
            .map(|w| {
                format!(
                    "[{:.3}, {:.3}, {:.3}, {:.3}]",
                    w.center_x, w.center_z, w.width, w.height
                )
            })
            .collect();
        format!("\"walls\": [\n    {}\n]", items.join(",\n    "))
    }

    pub fn move_and_collide_detailed(
        &self,
        aabb: Aabb,
        dx: f32,
        dz: f32,
        bounds: WorldBounds,
    ) -> MoveResult {
        const EPS: f32 = 0.0001;

        let expected_x = (aabb.center_x + dx).clamp(-bounds.half_x, bounds.half_x);
        let resolved_x = self.resolve_axis_x(aabb, expected_x);
        let collided_x = (resolved_x - expected_x).abs() > EPS;

        let moved = aabb.with_center(resolved_x, aabb.center_z);
        let expected_z = (aabb.center_z + dz).clamp(-bounds.half_z, bounds.half_z);
        let resolved_z = self.resolve_axis_z(moved, expected_z);
        let collided_z = (resolved_z - expected_z).abs() > EPS;

        MoveResult {
            aabb: moved.with_center(resolved_x, resolved_z),
            blocked_left: collided_x && dx < 0.0,
            blocked_right: collided_x && dx > 0.0,
            blocked_down: collided_z && dz < 0.0,
            blocked_up: collided_z && dz > 0.0,
        }
    }

    fn resolve_axis_x(&self, aabb: Aabb, mut target_x: f32) -> f32 {
        for wall in &self.walls {
            let reach_x = aabb.half_w + wall.width * 0.5;
            let reach_z = aabb.half_h + wall.height * 0.5;
            if (target_x - wall.center_x).abs() < reach_x
                && (aabb.center_z - wall.center_z).abs() < reach_z
            {
                target_x = edge_position(wall.center_x, reach_x, target_x > wall.center_x);
            }
        }
        target_x
    }

    fn resolve_axis_z(&self, aabb: Aabb, mut target_z: f32) -> f32 {
        for wall in &self.walls {
            let reach_x = aabb.half_w + wall.width * 0.5;
            let reach_z = aabb.half_h + wall.height * 0.5;
            if (aabb.center_x - wall.center_x).abs() < reach_x
                && (target_z - wall.center_z).abs() < reach_z
            {
                target_z = edge_position(wall.center_z, reach_z, target_z > wall.center_z);
            }
        }
        target_z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(x: f32, z: f32) -> Aabb {
        Aabb::from_size(x, z, 0.15, 0.15)
    }

    #[test]
    fn move_and_collide_blocks_motion_into_wall() {
        let walls = WallRegistry::from_tuples(&[(0.5, 0.0, 0.2, 0.4)], true);
        let moved = walls.move_and_collide_detailed(player(0.2, 0.0), 0.3, 0.0, WorldBounds::default()).aabb;
        assert!((moved.center_x - (0.5 - 0.1 - 0.075)).abs() < 1e-4);
        assert_eq!(moved.center_z, 0.0);
    }

    #[test]
    fn blocked_player_rests_on_the_wall_edge() {
        let walls = WallRegistry::from_tuples(&[(0.5, 0.0, 0.2, 0.4)], true);
        let bounds = WorldBounds::default();
        let moved = walls.move_and_collide_detailed(player(0.2, 0.0), 0.3, 0.0, bounds).aabb;
        assert!((moved.center_x - 0.325).abs() < 1e-6);
        assert!(!moved.overlaps(&walls.walls()[0].aabb()));

        // Touching is legal: sliding along the face keeps the full z step.
        let slid = walls.move_and_collide_detailed(moved, 0.0, 0.05, bounds).aabb;
        assert_eq!(slid.center_x, moved.center_x);
        assert!((slid.center_z - 0.05).abs() < 1e-6);
    }

    #[test]
    fn edge_position_is_exact_when_representable() {
        assert_eq!(edge_position(0.5, 0.25, true), 0.75);
        assert_eq!(edge_position(0.5, 0.25, false), 0.25);
    }

    #[test]
    fn detailed_result_sets_blocked_direction_flags() {
        let walls = WallRegistry::from_tuples(&[(0.5, 0.0, 0.2, 0.4)], true);
        let result =
            walls.move_and_collide_detailed(player(0.2, 0.0), 0.3, 0.0, WorldBounds::default());
        assert!(result.blocked_right);
        assert!(!result.blocked_left);
        assert!(!result.blocked_up && !result.blocked_down);
    }

    #[test]
    fn world_bounds_clamp_before_walls() {
        let walls = WallRegistry::default();
        let moved = walls.move_and_collide_detailed(player(1.1, 0.9), 1.0, 1.0, WorldBounds::default()).aabb;
        assert_eq!(moved.center_x, 1.2);
        assert_eq!(moved.center_z, 1.0);
    }

    #[test]
    fn slides_along_wall_on_free_axis() {
        let walls = WallRegistry::from_tuples(&[(0.5, 0.0, 0.2, 1.0)], true);
        let moved = walls.move_and_collide_detailed(player(0.3, 0.0), 0.1, 0.05, WorldBounds::default()).aabb;
        assert!(moved.center_x <= 0.325 + 1e-4);
        assert!((moved.center_z - 0.05).abs() < 1e-6);
    }

    #[test]
    fn x_resolves_before_z_at_corners() {
        // Diagonal step into the corner of a box: X sees no Z overlap from the
        // starting row, so X is kept and Z gets pushed back out instead.
        let walls = WallRegistry::from_tuples(&[(0.0, 0.0, 0.2, 0.2)], true);
        let start = player(-0.2, -0.2);
        let moved = walls.move_and_collide_detailed(start, 0.05, 0.05, WorldBounds::default()).aabb;
        assert!((moved.center_x - (-0.15)).abs() < 1e-4);
        assert!((moved.center_z - (-0.175)).abs() < 1e-4);
    }

    #[test]
    fn resolved_position_never_overlaps_spaced_walls() {
        // Walls separated by more than the player's width on both axes.
        let walls = WallRegistry::from_tuples(
            &[
                (-0.6, -0.6, 0.3, 0.3),
                (0.0, -0.6, 0.2, 0.4),
                (0.6, -0.6, 0.3, 0.2),
                (-0.6, 0.2, 0.2, 0.6),
                (0.0, 0.2, 0.3, 0.3),
                (0.6, 0.3, 0.4, 0.3),
            ],
            true,
        );
        let bounds = WorldBounds::default();
        let mut seed: u32 = 0x2545_f491;
        let mut next = || {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 8) as f32 / (1u32 << 24) as f32
        };

        let mut checked = 0;
        for _ in 0..2000 {
            let start = player(next() * 2.0 - 1.0, next() * 2.0 - 1.0);
            if walls.walls().iter().any(|w| start.overlaps(&w.aabb())) {
                continue;
            }
            let dx = (next() - 0.5) * 0.1;
            let dz = (next() - 0.5) * 0.1;
            let moved = walls.move_and_collide_detailed(start, dx, dz, bounds).aabb;
            for wall in walls.walls() {
                assert!(
                    !moved.overlaps(&wall.aabb()),
                    "start ({}, {}) step ({dx}, {dz}) ended inside {:?}",
                    start.center_x,
                    start.center_z,
                    wall
                );
            }
            checked += 1;
        }
        assert!(checked > 500);
    }

    #[test]
    fn cycle_wraps_from_no_selection() {
        let mut walls =
            WallRegistry::from_tuples(&[(0.0, 0.0, 0.1, 0.1), (0.5, 0.0, 0.1, 0.1), (1.0, 0.0, 0.1, 0.1)], true);
        walls.cycle(1);
        assert_eq!(walls.selected(), Some(0));
        walls.cycle(-1);
        assert_eq!(walls.selected(), Some(2));

        let mut fresh = WallRegistry::from_tuples(&[(0.0, 0.0, 0.1, 0.1), (0.5, 0.0, 0.1, 0.1), (1.0, 0.0, 0.1, 0.1)], true);
        fresh.cycle(-1);
        assert_eq!(fresh.selected(), Some(1));
    }

    #[test]
    fn cycle_on_empty_registry_is_no_op() {
        let mut walls = WallRegistry::default();
        walls.cycle(1);
        assert_eq!(walls.selected(), None);
    }

    #[test]
    fn delete_reclamps_selection() {
        let mut walls = WallRegistry::from_tuples(&[(0.0, 0.0, 0.1, 0.1), (0.5, 0.0, 0.1, 0.1)], true);
        walls.cycle(-1);
        assert_eq!(walls.selected(), Some(1));

        walls.delete_selected().expect("wall removed");
        assert_eq!(walls.selected(), Some(0));

        walls.delete_selected().expect("wall removed");
        assert_eq!(walls.selected(), None);
        assert!(walls.is_empty());
        assert!(walls.delete_selected().is_none());
    }

    #[test]
    fn add_selected_uses_default_size() {
        let mut walls = WallRegistry::default();
        let index = walls.add_selected(0.1, -0.2);
        assert_eq!(walls.selected(), Some(index));
        let wall = walls.selected_wall().expect("selected wall");
        assert_eq!(wall.width, NEW_WALL_SIZE);
        assert_eq!(wall.center_z, -0.2);
    }

    #[test]
    fn resize_clamps_to_minimum_and_nudge_moves() {
        let mut walls = WallRegistry::default();
        walls.add_selected(0.0, 0.0);
        assert!(walls.resize_selected(-1.0, 0.02));
        assert!(walls.nudge_selected(0.02, -0.02));
        let wall = walls.selected_wall().expect("selected wall");
        assert_eq!(wall.width, MIN_WALL_SIZE);
        assert!((wall.height - 0.32).abs() < 1e-6);
        assert!((wall.center_x - 0.02).abs() < 1e-6);
    }

    #[test]
    fn edits_without_selection_are_ignored() {
        let mut walls = WallRegistry::from_tuples(&[(0.0, 0.0, 0.1, 0.1)], true);
        assert!(!walls.nudge_selected(0.1, 0.1));
        assert!(!walls.resize_selected(0.1, 0.1));
        assert_eq!(walls.walls()[0], Wall::new(0.0, 0.0, 0.1, 0.1));
    }

    #[test]
    fn constructor_enforces_minimum_size() {
        let wall = Wall::new(0.0, 0.0, 0.01, 0.0);
        assert_eq!(wall.width, MIN_WALL_SIZE);
        assert_eq!(wall.height, MIN_WALL_SIZE);
    }

    #[test]
    fn dump_lists_walls_in_level_file_format() {
        let walls = WallRegistry::from_tuples(&[(-0.323, -0.12, 0.3, 0.56), (0.197, 0.62, 0.3, 0.3)], true);
        let dump = walls.dump();
        assert!(dump.starts_with("\"walls\": ["));
        assert!(dump.contains("[-0.323, -0.120, 0.300, 0.560],\n    [0.197, 0.620, 0.300, 0.300]"));

        let body = format!("{{{}}}", dump);
        let parsed: serde_json::Value = serde_json::from_str(&body).expect("dump is valid JSON");
        assert_eq!(parsed["walls"].as_array().map(|a| a.len()), Some(2));
    }
}
