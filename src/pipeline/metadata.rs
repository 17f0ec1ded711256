use std::collections::{BTreeMap, HashMap};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::ExportConfig;
use crate::host::SceneNode;
use crate::pipeline::collider::is_collider;
use crate::pipeline::orchestrator::ExportResults;
use crate::pipeline::partition::{group_roots, Group};
use crate::pipeline::snapshot::{CapturedTransform, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vector3 {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vector3> for Vec3 {
    fn from(v: Vector3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl From<Quat> for Quaternion {
    fn from(q: Quat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

impl From<Quaternion> for Quat {
    fn from(q: Quaternion) -> Self {
        Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

/// Per-node entry of `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub gltf_file: Option<String>,
    pub location: Vector3,
    pub rotation: Quaternion,
    pub scale: Vector3,
    pub dimensions: Vector3,
    pub parent: Option<String>,
    pub is_collider: bool,
    pub collection: Option<String>,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub objects: BTreeMap<String, MetadataRecord>,
    pub groups: ExportResults,
    pub coordinate_system: String,
    #[serde(rename = "blender_version")]
    pub host_version: String,
}

/// Output transform of a node: (location, rotation, scale).
///
/// A group root is written as identity: its bundle already carries the
/// root's world placement in Y-up space, so the runtime instantiates it at
/// the origin. Any other node is written with its captured world transform
/// as-is, not relative to its parent.
// NOTE: the child case is world space, not parent-local. Consumers that
// re-parent children under the instantiated root will see them misplaced.
pub fn output_transform(captured: &CapturedTransform, is_group_root: bool) -> (Vec3, Quat, Vec3) {
    if is_group_root {
        (Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    } else {
        (captured.translation, captured.rotation, captured.scale)
    }
}

/// Swaps Y and Z to move a Z-up size into the runtime's Y-up frame.
pub fn runtime_dimensions(dimensions: Vec3) -> Vec3 {
    Vec3::new(dimensions.x, dimensions.z, dimensions.y)
}

pub fn synthesize(
    nodes: &[SceneNode],
    snapshot: &Snapshot,
    groups: &[Group],
    results: &ExportResults,
    config: &ExportConfig,
    host_version: String,
) -> Metadata {
    let by_name: HashMap<&str, &SceneNode> =
        nodes.iter().map(|node| (node.name.as_str(), node)).collect();
    let roots = group_roots(groups);
    let children_of: HashMap<&str, &[String]> = groups
        .iter()
        .map(|group| (group.root(), group.children()))
        .collect();

    let mut objects = BTreeMap::new();

    for (name, captured) in snapshot.iter() {
        let Some(node) = by_name.get(name) else {
            continue;
        };

        let group_root = roots.get(name).copied();
        let is_group_root = group_root == Some(name);
        let gltf_file = group_root
            .and_then(|root| results.get(root))
            .map(|result| result.gltf_file.clone());

        let (location, rotation, scale) = output_transform(captured, is_group_root);

        if is_group_root {
            log::debug!(
                "{} (root): world position ({:.2}, {:.2}, {:.2}) baked into bundle",
                name,
                captured.translation.x,
                captured.translation.y,
                captured.translation.z
            );
        } else {
            log::debug!(
                "{} (child of {}): world position ({:.2}, {:.2}, {:.2})",
                name,
                captured.parent.as_deref().unwrap_or("-"),
                location.x,
                location.y,
                location.z
            );
        }

        let children = if is_group_root {
            children_of.get(name).map(|children| children.to_vec())
        } else {
            None
        };

        objects.insert(
            name.to_string(),
            MetadataRecord {
                name: name.to_string(),
                kind: node.kind.tag().to_string(),
                gltf_file,
                location: location.into(),
                rotation: rotation.into(),
                scale: scale.into(),
                dimensions: runtime_dimensions(captured.dimensions).into(),
                parent: captured.parent.clone(),
                is_collider: is_collider(name),
                collection: node.collection.clone(),
                visible: node.visible,
                children,
            },
        );
    }

    Metadata {
        objects,
        groups: results.clone(),
        coordinate_system: config.coordinate_system.clone(),
        host_version,
    }
}
