use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use glam::Mat4;
use serde::Deserialize;

use crate::host::NodeKind;
use crate::math::axis::matrix_to_z_up;
use crate::model::{Buffers, Model, ModelId};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Transform;

#[derive(Debug, Default, Deserialize)]
struct NodeExtras {
    visible: Option<bool>,
}

struct GltfSpawner<'a> {
    buffers: Buffers<'a>,
    gltf_mesh_to_model: HashMap<usize, ModelId>,
    spawned: HashSet<usize>,
    names: HashSet<String>,
}

impl Scene {
    /// Imports a `.gltf` / `.glb` file as an authoring scene.
    ///
    /// glTF is Y-up; objects and geometry are converted to the host's Z-up
    /// frame on the way in. Each glTF scene acts as a collection.
    pub fn load_gltf(path: impl AsRef<Path>) -> anyhow::Result<Scene> {
        let path = path.as_ref();
        let (document, buffers, _images) = gltf::import(path)
            .with_context(|| format!("Failed to import {}", path.display()))?;

        let mut scene = Scene::new();
        scene.generator = document.as_json().asset.generator.clone();

        let mut spawner = GltfSpawner {
            buffers: &buffers,
            gltf_mesh_to_model: HashMap::new(),
            spawned: HashSet::new(),
            names: HashSet::new(),
        };

        for gltf_scene in document.scenes() {
            let collection = gltf_scene.name().map(String::from);
            for node in gltf_scene.nodes() {
                spawner.spawn_gltf_node(&mut scene, &node, None, collection.as_deref())?;
            }
        }

        log::info!(
            "Loaded {} objects and {} meshes from {}",
            scene.objects.len(),
            scene.models.len(),
            path.display()
        );

        Ok(scene)
    }
}

impl GltfSpawner<'_> {
    fn spawn_gltf_node(
        &mut self,
        scene: &mut Scene,
        node: &gltf::Node,
        parent: Option<ObjectId>,
        collection: Option<&str>,
    ) -> anyhow::Result<()> {
        // A node shared by several scenes belongs to the first one.
        if !self.spawned.insert(node.index()) {
            return Ok(());
        }

        let base_name = node
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("Node.{}", node.index()));
        let node_name = self.unique_name(base_name);

        let kind = if node.mesh().is_some() {
            NodeKind::Mesh
        } else if node.camera().is_some() {
            NodeKind::Camera
        } else if node.light().is_some() {
            NodeKind::Light
        } else {
            NodeKind::Empty
        };

        let mut object = Object3D::new(node_name.clone(), kind);
        let local_matrix = Mat4::from_cols_array_2d(&node.transform().matrix());
        object.transform = Transform::from_matrix(matrix_to_z_up(local_matrix));
        object.collection = collection.map(String::from);
        object.visible = node
            .extras()
            .as_ref()
            .and_then(|raw| serde_json::from_str::<NodeExtras>(raw.get()).ok())
            .and_then(|extras| extras.visible)
            .unwrap_or(true);

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            let model_id = match self.gltf_mesh_to_model.get(&mesh_index).copied() {
                Some(model_id) => model_id,
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", node_name));

                    let model = Model::from_gltf(mesh_name, mesh, self.buffers)
                        .with_context(|| format!("Failed to read mesh of {}", node_name))?;
                    let model_id = scene.add_model(model);
                    self.gltf_mesh_to_model.insert(mesh_index, model_id);

                    model_id
                }
            };

            object.model_id = Some(model_id);
        }

        let object_id = scene.add_object(object);

        if let Some(parent_id) = parent {
            scene.set_object_parent(object_id, Some(parent_id));
        }

        for child in node.children() {
            self.spawn_gltf_node(scene, &child, Some(object_id), collection)?;
        }

        Ok(())
    }

    fn unique_name(&mut self, base_name: String) -> String {
        let mut name = base_name.clone();
        let mut suffix = 1;
        while self.names.contains(&name) {
            name = format!("{}.{:03}", base_name, suffix);
            suffix += 1;
        }
        self.names.insert(name.clone());
        name
    }
}
