use anyhow::Context;
use glam::Mat4;

use crate::asset_pipeline::{bake_bundle, write_glb};
use crate::host::{ExportRequest, HostError, SceneHost, SceneNode};
use crate::scene_graph::object3d::ObjectId;
use crate::scene_graph::scene::Scene;

impl Scene {
    fn resolve(&self, name: &str) -> Result<ObjectId, HostError> {
        self.get_object_by_name(name)
            .ok_or_else(|| HostError::UnknownNode(name.to_string()))
    }
}

impl SceneHost for Scene {
    fn nodes(&self) -> Vec<SceneNode> {
        self.objects
            .iter()
            .map(|(id, object)| SceneNode {
                name: object.name.clone(),
                kind: object.kind,
                parent: object.parent(self).map(|parent| parent.name.clone()),
                visible: object.visible,
                collection: object.collection.clone(),
                dimensions: self.dimensions(id),
            })
            .collect()
    }

    fn evaluate_world_transform(&self, name: &str) -> Result<Mat4, HostError> {
        let object_id = self.resolve(name)?;
        Ok(self.world_matrix(object_id))
    }

    fn export_bundle(&mut self, request: &ExportRequest) -> anyhow::Result<()> {
        let settings = &request.settings;
        if settings.export_animations || settings.export_cameras || settings.export_lights {
            log::warn!(
                "Animations, cameras and lights are not written to bundles; exporting meshes only"
            );
        }
        if !settings.apply_modifiers {
            log::debug!("Scene has no modifier stack, apply_modifiers has no effect");
        }

        let selection = request
            .selection
            .iter()
            .map(|name| self.resolve(name))
            .collect::<Result<Vec<_>, _>>()?;
        let active = self.resolve(&request.active)?;
        self.select_only(&selection, Some(active));

        let objects = if settings.use_selection {
            self.selected()
        } else {
            self.objects
                .iter()
                .filter(|(_, object)| object.kind.is_mesh())
                .map(|(id, _)| id)
                .collect()
        };

        let bundle = bake_bundle(self, &objects, settings.y_up)
            .with_context(|| format!("Failed to bake bundle for {}", request.active))?;
        write_glb(&bundle, &request.path)?;

        log::debug!(
            "Wrote {} nodes and {} meshes to {}",
            bundle.nodes.len(),
            bundle.meshes.len(),
            request.path.display()
        );

        Ok(())
    }

    fn version(&self) -> String {
        self.generator
            .clone()
            .unwrap_or_else(|| format!("scene_bundler {}", env!("CARGO_PKG_VERSION")))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::host::{ExportSettings, NodeKind};
    use crate::model::{Model, ModelPrimitive};
    use crate::scene_graph::{Object3D, Transform};

    fn scene() -> Scene {
        let mut scene = Scene::new();
        let model = scene.add_model(Model {
            name: "Cube".to_string(),
            primitives: vec![ModelPrimitive {
                index: 0,
                positions: vec![Vec3::splat(-1.0), Vec3::splat(1.0), Vec3::X],
                normals: vec![Vec3::Z; 3],
                indices: vec![0, 1, 2],
            }],
        });

        let mut table = Object3D::new("Table", NodeKind::Mesh);
        table.model_id = Some(model);
        table.transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let table = scene.add_object(table);

        let mut leg = Object3D::new("Table_Leg", NodeKind::Mesh);
        leg.model_id = Some(model);
        let leg = scene.add_object(leg);
        scene.set_object_parent(leg, Some(table));

        scene.add_object(Object3D::new("Camera", NodeKind::Camera));
        scene
    }

    #[test]
    fn nodes_report_parents_and_dimensions() {
        let scene = scene();
        let nodes = scene.nodes();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].name, "Table");
        assert_eq!(nodes[0].parent, None);
        assert_eq!(nodes[0].dimensions, Vec3::splat(2.0));
        assert_eq!(nodes[1].parent.as_deref(), Some("Table"));
        assert_eq!(nodes[2].kind, NodeKind::Camera);
    }

    #[test]
    fn world_transform_of_child_includes_parent() {
        let scene = scene();
        let matrix = scene.evaluate_world_transform("Table_Leg").unwrap();
        assert_eq!(matrix.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
        assert!(scene.evaluate_world_transform("Nope").is_err());
    }

    #[test]
    fn export_selects_group_and_writes_glb() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = scene();
        let request = ExportRequest {
            selection: vec!["Table".to_string(), "Table_Leg".to_string()],
            active: "Table".to_string(),
            path: dir.path().join("Table.glb"),
            settings: ExportSettings::bundle(),
        };

        scene.export_bundle(&request).unwrap();

        assert_eq!(scene.selected().len(), 2);
        let table = scene.get_object_by_name("Table").unwrap();
        assert_eq!(scene.active(), Some(table));

        let document = gltf::Gltf::open(&request.path).unwrap();
        let names: Vec<_> = document.nodes().filter_map(|node| node.name()).collect();
        assert_eq!(names, ["Table", "Table_Leg"]);
    }

    #[test]
    fn unknown_selection_fails_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = scene();
        let request = ExportRequest {
            selection: vec!["Ghost".to_string()],
            active: "Ghost".to_string(),
            path: dir.path().join("Ghost.glb"),
            settings: ExportSettings::bundle(),
        };

        assert!(scene.export_bundle(&request).is_err());
        assert!(!request.path.exists());
    }
}
