//! Mouse-ray picking over the cupola scene.
//!
//! Clickable things carry a `clickable` tag and usually an `info` tag with
//! the text to show. Colliders are spheres; the nearest hit under the scene
//! root wins, and the tag lookup walks from the hit node up its ancestors.

use glam::{Vec2, Vec3};

use crate::level::ModelSettings;
use crate::orbit::OrbitCamera;
use crate::scene::{Drawable, NodeId, Scene, SceneTree};

pub const TAG_CLICKABLE: &str = "clickable";
pub const TAG_INFO: &str = "info";
const RADIUS_WITHOUT_BOUNDS: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Perspective lens. `fov_x_deg` is the horizontal field of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pub fov_x_deg: f32,
    pub aspect: f32,
}

impl Lens {
    pub fn for_viewport(width: u32, height: u32) -> Self {
        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        Self {
            aspect,
            ..Self::default()
        }
    }
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov_x_deg: 40.0,
            aspect: 16.0 / 9.0,
        }
    }
}

/// Ray from the camera eye through a pointer position in normalized device
/// coordinates (+y up).
pub fn ray_from_pointer(camera: &OrbitCamera, lens: Lens, ndc: Vec2) -> Ray {
    let half_w = (lens.fov_x_deg.to_radians() * 0.5).tan();
    let half_h = half_w / lens.aspect.max(f32::EPSILON);
    let (right, up) = camera.basis();
    let direction = camera.forward() + right * (ndc.x * half_w) + up * (ndc.y * half_h);
    Ray::new(camera.eye(), direction)
}

/// Distance along the ray to the first sphere surface point in front of the
/// origin. A ray starting inside the sphere hits at 0.
pub fn ray_sphere_intersection(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub collider: NodeId,
    pub distance: f32,
    /// Nearest ancestor tagged clickable, if any.
    pub clickable: Option<NodeId>,
    pub info: Option<String>,
}

/// First value of `key` on the node or its closest tagged ancestor.
pub fn net_tag<'a>(tree: &'a SceneTree, id: NodeId, key: &str) -> Option<&'a str> {
    tree.ancestors(id).find_map(|n| tree.tag(n, key))
}

pub fn pick(tree: &SceneTree, root: NodeId, ray: &Ray) -> Option<PickHit> {
    let mut hits: Vec<(NodeId, f32)> = tree
        .colliders_under(root)
        .into_iter()
        .filter_map(|(id, center, radius)| {
            ray_sphere_intersection(ray, center, radius).map(|t| (id, t))
        })
        .collect();
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
    let &(collider, distance) = hits.first()?;

    let clickable = tree
        .ancestors(collider)
        .find(|&n| tree.has_tag(n, TAG_CLICKABLE));
    let info = clickable
        .and_then(|n| net_tag(tree, n, TAG_INFO))
        .map(str::to_string);
    log::debug!(
        "Pick: {} hit(s), nearest {:?} at {:.3}",
        hits.len(),
        collider,
        distance
    );
    Some(PickHit {
        collider,
        distance,
        clickable,
        info,
    })
}

/// Tag a node clickable and give it a collider sized from its bounds.
pub fn make_clickable(tree: &mut SceneTree, id: NodeId, info: &str) -> bool {
    let radius = match tree.node(id).map(|n| &n.drawable) {
        Some(Drawable::ModelPart {
            bounds: Some((min, max)),
        }) => (*max - *min).length().max(0.001) * 0.25,
        Some(Drawable::Box { half_extent, .. }) => (*half_extent * 2.0).length().max(0.001) * 0.25,
        Some(_) => RADIUS_WITHOUT_BOUNDS,
        None => return false,
    };
    tree.set_tag(id, TAG_CLICKABLE, "1");
    tree.set_tag(id, TAG_INFO, info);
    tree.set_collider(id, radius)
}

/// Invisible clickable point with an explicit collider radius.
pub fn add_marker(
    tree: &mut SceneTree,
    parent: NodeId,
    position: Vec3,
    radius: f32,
    info: &str,
) -> NodeId {
    let id = tree.create_group(parent, &format!("marker_{}", info.len()));
    tree.set_position(id, position);
    tree.set_visible(id, false);
    tree.set_tag(id, TAG_CLICKABLE, "1");
    tree.set_tag(id, TAG_INFO, info);
    tree.set_collider(id, radius);
    id
}

/// Register configured model parts (looked up by name below `model_root`)
/// and markers (attached to `scene_root`). Returns how many clickables were
/// created; unknown part names are skipped with a warning.
pub fn register_clickables(
    tree: &mut SceneTree,
    scene_root: NodeId,
    model_root: NodeId,
    settings: &ModelSettings,
) -> usize {
    let mut count = 0;
    for (part, info) in &settings.parts_info {
        match tree.find_descendant(model_root, part) {
            Some(id) => {
                if make_clickable(tree, id, info) {
                    count += 1;
                }
            }
            None => log::warn!("Clickable part '{part}' not found in cupola model"),
        }
    }
    for marker in &settings.markers {
        add_marker(
            tree,
            scene_root,
            Vec3::from_array(marker.position),
            marker.radius,
            &marker.info,
        );
        count += 1;
    }
    count
}
