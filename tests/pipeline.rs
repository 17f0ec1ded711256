use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use scene_bundler::config::ExportConfig;
use scene_bundler::host::{MemoryHost, NodeKind, SceneNode};
use scene_bundler::pipeline::{self, Metadata};

fn run(host: &mut MemoryHost, dir: &Path) -> Metadata {
    pipeline::run(host, dir, &ExportConfig::default()).unwrap()
}

fn placed(translation: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::new(2.0, 2.0, 2.0),
        Quat::from_rotation_z(0.5),
        translation,
    )
}

fn table_host() -> MemoryHost {
    let mut host = MemoryHost::new();
    host.add_node(SceneNode::mesh("Table", None), placed(Vec3::new(4.0, 5.0, 6.0)));
    let mut leg = SceneNode::mesh("Table_Leg", Some("Table"));
    leg.dimensions = Vec3::new(0.1, 0.2, 0.9);
    host.add_node(leg, placed(Vec3::new(4.0, 5.0, 5.5)));
    host.add_node(
        SceneNode::mesh("Table_Leg_Collider", Some("Table_Leg")),
        Mat4::from_translation(Vec3::new(4.0, 5.0, 5.0)),
    );
    host
}

#[test]
fn table_hierarchy_becomes_one_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = table_host();

    let metadata = run(&mut host, dir.path());

    assert_eq!(metadata.groups.len(), 1);
    let group = &metadata.groups["Table"];
    assert_eq!(group.objects, ["Table", "Table_Leg", "Table_Leg_Collider"]);
    assert_eq!(group.gltf_file, "Table.glb");

    let table = &metadata.objects["Table"];
    assert_eq!(
        table.children.as_deref(),
        Some(&["Table_Leg".to_string(), "Table_Leg_Collider".to_string()][..])
    );
    assert!(metadata.objects["Table_Leg_Collider"].is_collider);
    assert!(!metadata.objects["Table_Leg"].is_collider);

    for record in metadata.objects.values() {
        assert_eq!(record.gltf_file.as_deref(), Some("Table.glb"));
    }
    assert!(dir.path().join("Table.glb").exists());
}

#[test]
fn root_is_identity_and_children_keep_world_transform() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = table_host();

    let metadata = run(&mut host, dir.path());

    let table = &metadata.objects["Table"];
    assert_eq!(Vec3::from(table.location), Vec3::ZERO);
    assert_eq!(Quat::from(table.rotation), Quat::IDENTITY);
    assert_eq!(Vec3::from(table.scale), Vec3::ONE);

    let (scale, rotation, translation) = placed(Vec3::new(4.0, 5.0, 5.5)).to_scale_rotation_translation();
    let leg = &metadata.objects["Table_Leg"];
    assert_eq!(Vec3::from(leg.location), translation);
    assert_eq!(Quat::from(leg.rotation), rotation);
    assert_eq!(Vec3::from(leg.scale), scale);
    assert_eq!(leg.parent.as_deref(), Some("Table"));
    assert!(leg.children.is_none());

    // Y and Z swap for the runtime frame.
    assert_eq!(Vec3::from(leg.dimensions), Vec3::new(0.1, 0.9, 0.2));
}

#[test]
fn failed_group_is_dropped_but_described() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = MemoryHost::new();
    host.add_node(SceneNode::mesh("Good", None), Mat4::IDENTITY);
    host.add_node(SceneNode::mesh("Good_Child", Some("Good")), Mat4::IDENTITY);
    host.add_node(SceneNode::mesh("Broken", None), Mat4::IDENTITY);
    host.add_node(
        SceneNode::mesh("Broken_Child", Some("Broken")),
        Mat4::IDENTITY,
    );
    host.fail_export_of("Broken");

    let metadata = run(&mut host, dir.path());

    assert_eq!(metadata.groups.keys().collect::<Vec<_>>(), ["Good"]);
    assert_eq!(metadata.objects.len(), 4);
    assert_eq!(metadata.objects["Good_Child"].gltf_file.as_deref(), Some("Good.glb"));
    assert_eq!(metadata.objects["Broken"].gltf_file, None);
    assert_eq!(metadata.objects["Broken_Child"].gltf_file, None);
    assert_eq!(
        metadata.objects["Broken"].children.as_deref(),
        Some(&["Broken_Child".to_string()][..])
    );
    assert!(!dir.path().join("Broken.glb").exists());
}

#[test]
fn metadata_file_has_runtime_layout() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("nested").join("export");
    let mut host = table_host();
    let mut lamp = SceneNode::mesh("Lamp", None);
    lamp.collection = Some("Props".to_string());
    lamp.visible = false;
    host.add_node(lamp, Mat4::from_translation(Vec3::X));
    host.add_node(
        SceneNode::new("Camera", NodeKind::Camera, None),
        Mat4::IDENTITY,
    );

    run(&mut host, &output_dir);

    let contents = std::fs::read_to_string(output_dir.join("metadata.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();

    assert_eq!(json["coordinate_system"], "Y_UP");
    assert!(json["blender_version"].as_str().unwrap().starts_with("memory-host"));
    assert_eq!(json["groups"]["Table"]["gltfFile"], "Table.glb");
    assert_eq!(json["groups"]["Table"]["root"], "Table");

    assert!(json["objects"].get("Camera").is_none());

    let lamp = &json["objects"]["Lamp"];
    assert_eq!(lamp["type"], "MESH");
    assert_eq!(lamp["gltfFile"], "Lamp.glb");
    assert_eq!(lamp["collection"], "Props");
    assert_eq!(lamp["visible"], false);
    assert_eq!(lamp["isCollider"], false);
    // Roots are written at the origin; the bundle carries the placement.
    assert_eq!(lamp["location"]["x"], 0.0);
    assert_eq!(lamp["children"], serde_json::json!([]));

    let table = &json["objects"]["Table"];
    assert_eq!(table["type"], "MESH");
    assert_eq!(table["rotation"]["w"], 1.0);
    assert_eq!(table["parent"], serde_json::Value::Null);
}

#[test]
fn flattened_child_writes_readable_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = MemoryHost::new();
    host.add_node(SceneNode::mesh("Wall", None), Mat4::IDENTITY);
    host.add_node(
        SceneNode::mesh("Flat", Some("Wall")),
        Mat4::from_scale_rotation_translation(Vec3::new(1.0, 1.0, 0.0), Quat::IDENTITY, Vec3::X),
    );

    let metadata = run(&mut host, dir.path());
    assert_eq!(Quat::from(metadata.objects["Flat"].rotation), Quat::IDENTITY);

    let contents = std::fs::read_to_string(dir.path().join("metadata.json")).unwrap();
    let reparsed: Metadata = serde_json::from_str(&contents).unwrap();
    assert_eq!(reparsed, metadata);
}

#[test]
fn unwritable_output_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let mut host = table_host();
    let result = pipeline::run(&mut host, &blocker.join("out"), &ExportConfig::default());

    assert!(result.is_err());
    assert!(host.requests().is_empty());
}
