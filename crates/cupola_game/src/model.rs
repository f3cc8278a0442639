//! Cupola model loading: primary descriptor, GLB fallback, then a placeholder.
//!
//! Neither format is rendered here. Loading only recovers what the game needs
//! from a model: named parts, their local transforms and parent links, and
//! their local bounds (used to size click colliders).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::scene::{Drawable, NodeId, SceneTree};

const PLACEHOLDER_HALF_EXTENT: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    Primary,
    Alternate,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPart {
    pub name: String,
    /// Index of the parent part; always lower than this part's own index.
    pub parent: Option<usize>,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub bounds: Option<(Vec3, Vec3)>,
}

#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub source: ModelSource,
    pub parts: Vec<ModelPart>,
    /// Set when the GLB was the only candidate on disk and it failed, so the
    /// player should be told how to convert it.
    pub show_convert_hint: bool,
}

impl LoadedModel {
    pub fn placeholder() -> Self {
        Self {
            source: ModelSource::Placeholder,
            parts: Vec::new(),
            show_convert_hint: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelDescriptor {
    #[serde(default)]
    parts: Vec<DescriptorPart>,
}

#[derive(Debug, Deserialize)]
struct DescriptorPart {
    name: String,
    #[serde(default)]
    position: [f32; 3],
    #[serde(default)]
    bounds: Option<DescriptorBounds>,
}

#[derive(Debug, Deserialize)]
struct DescriptorBounds {
    min: [f32; 3],
    max: [f32; 3],
}

pub fn load_descriptor_from_path(path: &Path) -> Result<Vec<ModelPart>, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let descriptor: ModelDescriptor = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse model JSON {}: {e}", path.display()))?;
    descriptor
        .parts
        .into_iter()
        .map(|part| {
            if part.name.trim().is_empty() {
                return Err(format!(
                    "Model validation failed: {} has a part with an empty name",
                    path.display()
                ));
            }
            Ok(ModelPart {
                name: part.name,
                parent: None,
                position: Vec3::from_array(part.position),
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
                bounds: part
                    .bounds
                    .map(|b| (Vec3::from_array(b.min), Vec3::from_array(b.max))),
            })
        })
        .collect()
}

pub fn load_glb_from_path(path: &Path) -> Result<Vec<ModelPart>, String> {
    let bytes = fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    parse_glb(&bytes).map_err(|e| format!("Failed to parse GLB {}: {e}", path.display()))
}

/// Header, chunk layout and JSON schema are all checked by `gltf`. Parts come
/// out in depth-first order from the scene roots, parents before children.
fn parse_glb(bytes: &[u8]) -> Result<Vec<ModelPart>, String> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| e.to_string())?;
    let roots: Vec<gltf::Node<'_>> = match gltf.default_scene().or_else(|| gltf.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        None => {
            let children: HashSet<usize> = gltf
                .nodes()
                .flat_map(|node| node.children().map(|child| child.index()))
                .collect();
            gltf.nodes()
                .filter(|node| !children.contains(&node.index()))
                .collect()
        }
    };

    let mut parts = Vec::new();
    let mut seen = HashSet::new();
    let mut stack: Vec<(gltf::Node<'_>, Option<usize>)> =
        roots.into_iter().rev().map(|node| (node, None)).collect();
    while let Some((node, parent)) = stack.pop() {
        if !seen.insert(node.index()) {
            continue;
        }
        let index = parts.len();
        parts.push(part_from_node(&node, parent));
        let children: Vec<gltf::Node<'_>> = node.children().collect();
        stack.extend(children.into_iter().rev().map(|child| (child, Some(index))));
    }
    Ok(parts)
}

/// Local transform of `node`, re-expressed in the Z-up frame. The frame change
/// is a fixed rotation, so conjugating each local transform by it keeps the
/// composed hierarchy exact.
fn part_from_node(node: &gltf::Node<'_>, parent: Option<usize>) -> ModelPart {
    let (translation, rotation, scale) = node.transform().decomposed();
    let axis = y_up_to_z_up([rotation[0], rotation[1], rotation[2]]);
    ModelPart {
        name: node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{}", node.index())),
        parent,
        position: y_up_to_z_up(translation),
        rotation: Quat::from_xyzw(axis.x, axis.y, axis.z, rotation[3]),
        scale: Vec3::new(scale[0], scale[2], scale[1]),
        bounds: node.mesh().and_then(|mesh| mesh_bounds(&mesh)),
    }
}

/// glTF is Y-up; the cupola scene is Z-up.
fn y_up_to_z_up(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0], -v[2], v[1])
}

fn accessor_corner(value: Option<gltf::json::Value>) -> Option<[f32; 3]> {
    let values: Vec<f32> = serde_json::from_value(value?).ok()?;
    match values.as_slice() {
        [x, y, z, ..] => Some([*x, *y, *z]),
        _ => None,
    }
}

/// Union of the POSITION accessor bounds over every primitive.
fn mesh_bounds(mesh: &gltf::Mesh<'_>) -> Option<(Vec3, Vec3)> {
    let mut bounds: Option<(Vec3, Vec3)> = None;
    for primitive in mesh.primitives() {
        let Some(accessor) = primitive.get(&gltf::Semantic::Positions) else {
            continue;
        };
        let (Some(min), Some(max)) = (accessor_corner(accessor.min()), accessor_corner(accessor.max()))
        else {
            continue;
        };
        let a = y_up_to_z_up(min);
        let b = y_up_to_z_up(max);
        let (lo, hi) = (a.min(b), a.max(b));
        bounds = Some(match bounds {
            Some((l, h)) => (l.min(lo), h.max(hi)),
            None => (lo, hi),
        });
    }
    bounds
}

/// Try the primary descriptor, then the GLB, then fall back to a placeholder.
/// Failures are logged and never fatal.
pub fn load_model_any(primary: &Path, alternate: &Path) -> LoadedModel {
    if primary.exists() {
        match load_descriptor_from_path(primary) {
            Ok(parts) => {
                log::info!("Loaded model {} ({} parts)", primary.display(), parts.len());
                return LoadedModel {
                    source: ModelSource::Primary,
                    parts,
                    show_convert_hint: false,
                };
            }
            Err(err) => log::error!("{err}"),
        }
    }

    if alternate.exists() {
        match load_glb_from_path(alternate) {
            Ok(parts) => {
                log::info!("Loaded model {} ({} parts)", alternate.display(), parts.len());
                return LoadedModel {
                    source: ModelSource::Alternate,
                    parts,
                    show_convert_hint: false,
                };
            }
            Err(err) => log::error!("Could not load GLB: {err}"),
        }
    }

    log::warn!("No cupola model could be loaded, using placeholder box");
    LoadedModel {
        show_convert_hint: !primary.exists() && alternate.exists(),
        ..LoadedModel::placeholder()
    }
}

pub fn convert_hint_text(primary: &Path, alternate: &Path) -> String {
    format!(
        "Could not load GLB.\nTip: convert it to the model descriptor format:\n{} -> {}",
        alternate.display(),
        primary.display()
    )
}

/// Build the model under `parent` and return its root node. Parts become nodes
/// named after the model's nodes, nested the way the model nests them; a
/// placeholder becomes a single box.
pub fn instantiate(tree: &mut SceneTree, parent: NodeId, model: &LoadedModel) -> NodeId {
    let root = tree.create_node(parent, "cupola_model", Drawable::None);
    if model.source == ModelSource::Placeholder {
        tree.create_node(
            root,
            "placeholder_box",
            Drawable::Box {
                half_extent: Vec3::splat(PLACEHOLDER_HALF_EXTENT),
                color: [0.7, 0.7, 0.75, 1.0],
            },
        );
        return root;
    }
    let mut ids: Vec<NodeId> = Vec::with_capacity(model.parts.len());
    for part in &model.parts {
        let parent = part
            .parent
            .and_then(|index| ids.get(index).copied())
            .unwrap_or(root);
        let id = tree.create_node(parent, &part.name, Drawable::ModelPart { bounds: part.bounds });
        if let Some(node) = tree.node_mut(id) {
            node.position = part.position;
            node.rotation = part.rotation;
            node.scale = part.scale;
        }
        ids.push(id);
    }
    root
}
