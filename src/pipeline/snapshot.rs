use std::collections::HashMap;

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::host::{HostError, SceneHost, SceneNode};

/// World-space state of one mesh node at capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub dimensions: Vec3,
    pub parent: Option<String>,
}

/// Transforms of every mesh node, taken in one pass before any export.
///
/// Exports change the host selection and may re-evaluate the scene, so
/// nothing downstream reads transforms from the host again.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    order: Vec<String>,
    entries: HashMap<String, CapturedTransform>,
}

impl Snapshot {
    pub fn capture<H: SceneHost + ?Sized>(
        host: &H,
        nodes: &[SceneNode],
    ) -> Result<Snapshot, HostError> {
        let mut snapshot = Snapshot::default();

        for node in nodes.iter().filter(|node| node.kind.is_mesh()) {
            let world_matrix = host.evaluate_world_transform(&node.name)?;
            let (scale, rotation, translation) = world_matrix.to_scale_rotation_translation();
            let rotation = if rotation.is_finite() {
                rotation
            } else {
                let recovered = rotation_of_degenerate(&world_matrix);
                log::warn!(
                    "{} has a zero scale axis, rotation rebuilt as {:?}",
                    node.name,
                    recovered
                );
                recovered
            };

            log::debug!(
                "Captured {}: world position ({:.2}, {:.2}, {:.2})",
                node.name,
                translation.x,
                translation.y,
                translation.z
            );

            snapshot.order.push(node.name.clone());
            snapshot.entries.insert(
                node.name.clone(),
                CapturedTransform {
                    translation,
                    rotation,
                    scale,
                    dimensions: node.dimensions,
                    parent: node.parent.clone(),
                },
            );
        }

        Ok(snapshot)
    }

    pub fn get(&self, name: &str) -> Option<&CapturedTransform> {
        self.entries.get(name)
    }

    /// Captured entries in host enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapturedTransform)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|entry| (name.as_str(), entry)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Rotation of a matrix with a collapsed axis, taken from the remaining
/// axes. Falls back to identity when fewer than two axes survive.
fn rotation_of_degenerate(world_matrix: &Mat4) -> Quat {
    let x = world_matrix.x_axis.truncate().normalize_or_zero();
    let y = world_matrix.y_axis.truncate().normalize_or_zero();
    let z = world_matrix.z_axis.truncate().normalize_or_zero();

    let (x, y, z) = match (x == Vec3::ZERO, y == Vec3::ZERO, z == Vec3::ZERO) {
        (false, false, true) => (x, y, x.cross(y).normalize_or_zero()),
        (false, true, false) => (x, z.cross(x).normalize_or_zero(), z),
        (true, false, false) => (y.cross(z).normalize_or_zero(), y, z),
        _ => return Quat::IDENTITY,
    };

    let rotation = Quat::from_mat3(&Mat3::from_cols(x, y, z));
    if rotation.is_finite() && rotation.length_squared() > 0.0 {
        rotation.normalize()
    } else {
        Quat::IDENTITY
    }
}
