//! Retained node tree handed to the renderer.
//!
//! Two long-lived roots exist: `render2d` for the flat map layers and HUD
//! quads, and `render3d` for the cupola scene. 2D nodes live in the x/z plane
//! (y is unused), matching map coordinates. Nodes are stored in a slot arena;
//! destroying a node frees its whole subtree. Freed slots are reused under a
//! new generation, so stale ids resolve to nothing.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    slot: u32,
    generation: u32,
}

impl NodeId {
    fn index(self) -> usize {
        self.slot as usize
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadSpec {
    pub width: f32,
    pub height: f32,
    pub color: [f32; 4],
    pub texture: Option<String>,
}

impl QuadSpec {
    pub fn untextured(width: f32, height: f32, color: [f32; 4]) -> Self {
        Self {
            width,
            height,
            color,
            texture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    None,
    Quad(QuadSpec),
    /// Part of a loaded model; bounds are local min/max corners when known.
    ModelPart { bounds: Option<(Vec3, Vec3)> },
    /// Placeholder box drawn when no model file could be loaded.
    Box { half_extent: Vec3, color: [f32; 4] },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub visible: bool,
    pub drawable: Drawable,
    pub tags: HashMap<String, String>,
    /// Sphere collider radius in local units, centered on the node origin.
    pub collider: Option<f32>,
}

impl Node {
    fn new(name: &str, parent: Option<NodeId>, drawable: Drawable) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            visible: true,
            drawable,
            tags: HashMap::new(),
            collider: None,
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Renderer-facing operations the game drives. Calls on unknown or destroyed
/// nodes are ignored and report `false` / `None`.
pub trait Scene {
    fn create_group(&mut self, parent: NodeId, name: &str) -> NodeId;
    fn create_quad(&mut self, parent: NodeId, name: &str, quad: QuadSpec) -> NodeId;
    fn destroy(&mut self, id: NodeId) -> bool;
    fn set_position(&mut self, id: NodeId, position: Vec3) -> bool;
    fn set_scale(&mut self, id: NodeId, scale: Vec3) -> bool;
    fn set_texture(&mut self, id: NodeId, texture: Option<&str>) -> bool;
    fn set_color(&mut self, id: NodeId, color: [f32; 4]) -> bool;
    fn set_visible(&mut self, id: NodeId, visible: bool) -> bool;
    fn position(&self, id: NodeId) -> Option<Vec3>;
}

#[derive(Debug, Clone)]
pub struct SceneTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    render2d: NodeId,
    render3d: NodeId,
}

impl SceneTree {
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            render2d: NodeId { slot: 0, generation: 0 },
            render3d: NodeId { slot: 0, generation: 0 },
        };
        tree.render2d = tree.insert(Node::new("render2d", None, Drawable::None));
        tree.render3d = tree.insert(Node::new("render", None, Drawable::None));
        tree
    }

    pub fn render2d(&self) -> NodeId {
        self.render2d
    }

    pub fn render3d(&self) -> NodeId {
        self.render3d
    }

    /// Number of live nodes, roots included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let parent = node.parent;
        let id = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.node = Some(node);
                NodeId {
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    slot: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
            parent.children.push(id);
        }
        id
    }

    /// Attach a node with an arbitrary drawable. Falls back to the 3D root when
    /// `parent` is stale.
    pub fn create_node(&mut self, parent: NodeId, name: &str, drawable: Drawable) -> NodeId {
        let parent = if self.contains(parent) {
            parent
        } else {
            log::warn!("Scene: parent {:?} is gone, attaching '{}' to render root", parent, name);
            self.render3d
        };
        self.insert(Node::new(name, Some(parent), drawable))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// The node itself followed by each ancestor up to its root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.contains(id).then_some(id), move |&n| self.parent(n))
    }

    /// Depth-first search below `root` (excluding `root`) for a node name.
    pub fn find_descendant(&self, root: NodeId, name: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            if node.name == name {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// All live nodes below `root`, depth-first, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut chain: Vec<NodeId> = self.ancestors(id).collect();
        chain.reverse();
        chain
            .into_iter()
            .filter_map(|n| self.node(n))
            .fold(Mat4::IDENTITY, |acc, node| acc * node.local_matrix())
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.contains(id)
            .then(|| self.world_matrix(id).transform_point3(Vec3::ZERO))
    }

    /// Visible only if the node and every ancestor are visible.
    #[cfg(test)]
    pub fn is_visible_in_tree(&self, id: NodeId) -> bool {
        self.contains(id)
            && self
                .ancestors(id)
                .all(|n| self.node(n).is_some_and(|node| node.visible))
    }

    pub fn set_tag(&mut self, id: NodeId, key: &str, value: &str) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.tags.insert(key.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    pub fn tag(&self, id: NodeId, key: &str) -> Option<&str> {
        self.node(id)?.tags.get(key).map(String::as_str)
    }

    pub fn has_tag(&self, id: NodeId, key: &str) -> bool {
        self.tag(id, key).is_some()
    }

    pub fn set_collider(&mut self, id: NodeId, radius: f32) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.collider = Some(radius.max(0.0));
                true
            }
            None => false,
        }
    }

    /// World-space collider spheres below `root` as (node, center, radius).
    /// The radius scales with the largest axis of the node's world scale.
    pub fn colliders_under(&self, root: NodeId) -> Vec<(NodeId, Vec3, f32)> {
        self.descendants(root)
            .into_iter()
            .filter_map(|id| {
                let radius = self.node(id)?.collider?;
                let world = self.world_matrix(id);
                let (scale, _, center) = world.to_scale_rotation_translation();
                Some((id, center, radius * scale.abs().max_element()))
            })
            .collect()
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for SceneTree {
    fn create_group(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.create_node(parent, name, Drawable::None)
    }

    fn create_quad(&mut self, parent: NodeId, name: &str, quad: QuadSpec) -> NodeId {
        self.create_node(parent, name, Drawable::Quad(quad))
    }

    /// Roots cannot be destroyed.
    fn destroy(&mut self, id: NodeId) -> bool {
        if id == self.render2d || id == self.render3d || !self.contains(id) {
            return false;
        }
        if let Some(parent) = self.parent(id).and_then(|p| self.node_mut(p)) {
            parent.children.retain(|&c| c != id);
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current.index()) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                stack.extend(node.children);
                self.free.push(current.slot);
            }
        }
        true
    }

    fn set_position(&mut self, id: NodeId, position: Vec3) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    fn set_scale(&mut self, id: NodeId, scale: Vec3) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.scale = scale;
                true
            }
            None => false,
        }
    }

    fn set_texture(&mut self, id: NodeId, texture: Option<&str>) -> bool {
        match self.node_mut(id).map(|n| &mut n.drawable) {
            Some(Drawable::Quad(quad)) => {
                quad.texture = texture.map(str::to_string);
                true
            }
            _ => false,
        }
    }

    fn set_color(&mut self, id: NodeId, color: [f32; 4]) -> bool {
        match self.node_mut(id).map(|n| &mut n.drawable) {
            Some(Drawable::Quad(quad)) => {
                quad.color = color;
                true
            }
            Some(Drawable::Box { color: c, .. }) => {
                *c = color;
                true
            }
            _ => false,
        }
    }

    fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.visible = visible;
                true
            }
            None => false,
        }
    }

    fn position(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|n| n.position)
    }
}
