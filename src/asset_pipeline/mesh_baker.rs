use std::collections::HashMap;

use anyhow::bail;
use glam::Vec3;

use crate::host::NodeKind;
use crate::math::axis::{matrix_to_y_up, point_to_y_up};
use crate::math::bounds::AABB;
use crate::model::ModelId;
use crate::scene_graph::{ObjectId, Scene, Transform};

pub struct PrimitiveBuffers {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub bounding_box: AABB,
}

pub struct BakedMesh {
    pub name: String,
    pub primitives: Vec<PrimitiveBuffers>,
}

pub struct BakedNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

/// Selected objects flattened into the shape of a single bundle file.
pub struct BakedBundle {
    pub nodes: Vec<BakedNode>,
    pub meshes: Vec<BakedMesh>,
    pub roots: Vec<usize>,
}

/// Collects `selection` into a bundle.
///
/// An object whose nearest selected ancestor does not exist becomes a root
/// and keeps its full world transform. Other objects keep their transform
/// relative to that ancestor. With `y_up`, node transforms and geometry are
/// rewritten into the Y-up frame.
pub fn bake_bundle(scene: &Scene, selection: &[ObjectId], y_up: bool) -> anyhow::Result<BakedBundle> {
    if selection.is_empty() {
        bail!("Nothing selected to export");
    }

    let mut bundle = BakedBundle {
        nodes: Vec::new(),
        meshes: Vec::new(),
        roots: Vec::new(),
    };
    let mut node_index: HashMap<ObjectId, usize> = HashMap::new();
    let mut mesh_index: HashMap<ModelId, usize> = HashMap::new();

    let is_selected_mesh = |id: &ObjectId| {
        selection.contains(id)
            && scene
                .get_object(*id)
                .is_some_and(|object| object.kind == NodeKind::Mesh)
    };

    // Ancestors first, so a child can always find its parent's node.
    let mut ordered = selection.to_vec();
    ordered.sort_by_key(|&id| ancestors(scene, id).count());

    for object_id in ordered {
        let Some(object) = scene.get_object(object_id) else {
            bail!("Selected object is not part of the scene");
        };
        if object.kind != NodeKind::Mesh {
            log::debug!("Skipping non-mesh object {}", object.name);
            continue;
        }

        let selected_ancestor = ancestors(scene, object_id).find(|id| is_selected_mesh(id));

        let world_matrix = scene.world_matrix(object_id);
        let matrix = match selected_ancestor {
            Some(ancestor) => scene.world_matrix(ancestor).inverse() * world_matrix,
            None => world_matrix,
        };
        let matrix = if y_up { matrix_to_y_up(matrix) } else { matrix };

        let mesh = match object.model_id {
            Some(model_id) => match mesh_index.get(&model_id) {
                Some(&index) => Some(index),
                None => {
                    let index = bundle.meshes.len();
                    bundle.meshes.push(bake_mesh(scene, model_id, y_up)?);
                    mesh_index.insert(model_id, index);
                    Some(index)
                }
            },
            None => None,
        };

        let index = bundle.nodes.len();
        bundle.nodes.push(BakedNode {
            name: object.name.clone(),
            transform: Transform::from_matrix(matrix),
            mesh,
            children: Vec::new(),
        });
        node_index.insert(object_id, index);

        match selected_ancestor.and_then(|ancestor| node_index.get(&ancestor).copied()) {
            Some(parent) => bundle.nodes[parent].children.push(index),
            None => bundle.roots.push(index),
        }
    }

    if bundle.nodes.is_empty() {
        bail!("Selection contains no mesh objects");
    }

    Ok(bundle)
}

fn ancestors(scene: &Scene, object_id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
    let parent = scene.get_object(object_id).and_then(|object| object.parent_id);
    std::iter::successors(parent, |&id| {
        scene.get_object(id).and_then(|ancestor| ancestor.parent_id)
    })
}

fn bake_mesh(scene: &Scene, model_id: ModelId, y_up: bool) -> anyhow::Result<BakedMesh> {
    let Some(model) = scene.models.get(model_id) else {
        bail!("Object references a missing mesh");
    };

    let convert = |v: Vec3| if y_up { point_to_y_up(v) } else { v };

    let mut primitives = Vec::with_capacity(model.primitives.len());
    for primitive in &model.primitives {
        let positions: Vec<Vec3> = primitive.positions.iter().copied().map(convert).collect();
        let Some(bounding_box) = AABB::from_points(positions.iter().copied()) else {
            log::warn!(
                "Skipping empty primitive {} of mesh {}",
                primitive.index,
                model.name
            );
            continue;
        };

        primitives.push(PrimitiveBuffers {
            normals: primitive.normals.iter().copied().map(convert).collect(),
            indices: primitive.indices.clone(),
            positions,
            bounding_box,
        });
    }

    if primitives.is_empty() {
        bail!("Mesh {} has no geometry to export", model.name);
    }

    Ok(BakedMesh {
        name: model.name.clone(),
        primitives,
    })
}
