use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use gltf::json;
use gltf::json::validation::Checked::Valid;
use gltf::json::validation::USize64;

use crate::asset_pipeline::mesh_baker::{BakedBundle, PrimitiveBuffers};

const GLB_HEADER_SIZE: usize = 12;
const GLB_CHUNK_HEADER_SIZE: usize = 8;

/// Packs every view into one binary buffer, 4-byte aligned.
struct BufferBuilder {
    bytes: Vec<u8>,
}

impl BufferBuilder {
    fn push_view(
        &mut self,
        root: &mut json::Root,
        data: &[u8],
        target: json::buffer::Target,
    ) -> json::Index<json::buffer::View> {
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(data);
        pad_to_four(&mut self.bytes, 0);

        root.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: USize64::from(data.len()),
            byte_offset: Some(USize64::from(offset)),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(target)),
        })
    }
}

fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
}

fn accessor(
    view: json::Index<json::buffer::View>,
    count: usize,
    component_type: json::accessor::ComponentType,
    type_: json::accessor::Type,
) -> json::Accessor {
    json::Accessor {
        buffer_view: Some(view),
        byte_offset: Some(USize64(0)),
        count: USize64::from(count),
        component_type: Valid(json::accessor::GenericComponentType(component_type)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Valid(type_),
        min: None,
        max: None,
        name: None,
        normalized: false,
        sparse: None,
    }
}

fn push_primitive(
    root: &mut json::Root,
    buffer: &mut BufferBuilder,
    primitive: &PrimitiveBuffers,
) -> json::mesh::Primitive {
    use json::accessor::{ComponentType, Type};
    use json::buffer::Target;

    let positions_view = buffer.push_view(
        root,
        bytemuck::cast_slice(&primitive.positions),
        Target::ArrayBuffer,
    );
    let mut positions = accessor(
        positions_view,
        primitive.positions.len(),
        ComponentType::F32,
        Type::Vec3,
    );
    let min = primitive.bounding_box.min;
    let max = primitive.bounding_box.max;
    positions.min = Some(json::Value::from(vec![min.x, min.y, min.z]));
    positions.max = Some(json::Value::from(vec![max.x, max.y, max.z]));
    let positions = root.push(positions);

    let mut attributes = BTreeMap::new();
    attributes.insert(Valid(json::mesh::Semantic::Positions), positions);

    if primitive.normals.len() == primitive.positions.len() {
        let normals_view = buffer.push_view(
            root,
            bytemuck::cast_slice(&primitive.normals),
            Target::ArrayBuffer,
        );
        let normals = root.push(accessor(
            normals_view,
            primitive.normals.len(),
            ComponentType::F32,
            Type::Vec3,
        ));
        attributes.insert(Valid(json::mesh::Semantic::Normals), normals);
    }

    let indices_view = buffer.push_view(
        root,
        bytemuck::cast_slice(&primitive.indices),
        Target::ElementArrayBuffer,
    );
    let indices = root.push(accessor(
        indices_view,
        primitive.indices.len(),
        ComponentType::U32,
        Type::Scalar,
    ));

    json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices: Some(indices),
        material: None,
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
    }
}

/// Builds the glTF document for a bundle and the binary chunk it points into.
pub fn build_document(bundle: &BakedBundle) -> (json::Root, Vec<u8>) {
    let mut root = json::Root::default();
    root.asset.generator = Some(format!("scene_bundler {}", env!("CARGO_PKG_VERSION")));

    let mut buffer = BufferBuilder { bytes: Vec::new() };

    let meshes: Vec<json::Index<json::Mesh>> = bundle
        .meshes
        .iter()
        .map(|mesh| {
            let primitives = mesh
                .primitives
                .iter()
                .map(|primitive| push_primitive(&mut root, &mut buffer, primitive))
                .collect();

            root.push(json::Mesh {
                extensions: Default::default(),
                extras: Default::default(),
                name: Some(mesh.name.clone()),
                primitives,
                weights: None,
            })
        })
        .collect();

    // Nodes are pushed in bundle order, so bundle indices are glTF indices.
    for node in &bundle.nodes {
        let transform = node.transform;
        root.push(json::Node {
            name: Some(node.name.clone()),
            mesh: node.mesh.map(|index| meshes[index]),
            translation: Some(transform.translation.to_array()),
            rotation: Some(json::scene::UnitQuaternion(transform.rotation.to_array())),
            scale: Some(transform.scale.to_array()),
            children: if node.children.is_empty() {
                None
            } else {
                Some(
                    node.children
                        .iter()
                        .map(|&child| json::Index::new(child as u32))
                        .collect(),
                )
            },
            ..Default::default()
        });
    }

    let scene = root.push(json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        nodes: bundle
            .roots
            .iter()
            .map(|&index| json::Index::new(index as u32))
            .collect(),
    });
    root.scene = Some(scene);

    root.push(json::Buffer {
        byte_length: USize64::from(buffer.bytes.len()),
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        uri: None,
    });

    (root, buffer.bytes)
}

pub fn write_glb(bundle: &BakedBundle, path: &Path) -> anyhow::Result<()> {
    let (root, bin) = build_document(bundle);

    let mut json_bytes = json::serialize::to_vec(&root).context("Failed to serialize glTF")?;
    pad_to_four(&mut json_bytes, b' ');

    let length = GLB_HEADER_SIZE + GLB_CHUNK_HEADER_SIZE + json_bytes.len()
        + GLB_CHUNK_HEADER_SIZE
        + bin.len();

    let glb = gltf::binary::Glb {
        header: gltf::binary::Header {
            magic: *b"glTF",
            version: 2,
            length: u32::try_from(length).context("Bundle exceeds the GLB size limit")?,
        },
        bin: Some(Cow::Owned(bin)),
        json: Cow::Owned(json_bytes),
    };

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    glb.to_writer(BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::asset_pipeline::mesh_baker::{BakedMesh, BakedNode};
    use crate::math::bounds::AABB;
    use crate::scene_graph::Transform;

    fn bundle() -> BakedBundle {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        BakedBundle {
            nodes: vec![
                BakedNode {
                    name: "Table".to_string(),
                    transform: Transform {
                        translation: Vec3::new(1.0, 2.0, 3.0),
                        rotation: Quat::IDENTITY,
                        scale: Vec3::ONE,
                    },
                    mesh: Some(0),
                    children: vec![1],
                },
                BakedNode {
                    name: "Table_collider".to_string(),
                    transform: Transform::from_translation(Vec3::Y),
                    mesh: Some(0),
                    children: Vec::new(),
                },
            ],
            meshes: vec![BakedMesh {
                name: "Triangle".to_string(),
                primitives: vec![PrimitiveBuffers {
                    bounding_box: AABB::from_points(positions.iter().copied()).unwrap(),
                    normals: vec![Vec3::Z; 3],
                    indices: vec![0, 1, 2],
                    positions,
                }],
            }],
            roots: vec![0],
        }
    }

    #[test]
    fn views_are_four_byte_aligned() {
        let (root, bin) = build_document(&bundle());

        assert_eq!(bin.len() % 4, 0);
        assert_eq!(root.buffers.len(), 1);
        assert_eq!(root.buffer_views.len(), 3);
        for view in &root.buffer_views {
            assert_eq!(view.byte_offset.unwrap().0 % 4, 0);
        }
    }

    #[test]
    fn written_file_imports_with_hierarchy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Table.glb");

        write_glb(&bundle(), &path).unwrap();

        let (document, buffers, _) = gltf::import(&path).unwrap();
        let scene = document.default_scene().unwrap();
        let roots: Vec<_> = scene.nodes().collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name(), Some("Table"));

        let (translation, _, _) = roots[0].transform().decomposed();
        assert_eq!(translation, [1.0, 2.0, 3.0]);

        let children: Vec<_> = roots[0].children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), Some("Table_collider"));

        let mesh = children[0].mesh().unwrap();
        let primitive = mesh.primitives().next().unwrap();
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let positions: Vec<[f32; 3]> = reader.read_positions().unwrap().collect();
        assert_eq!(positions, [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(document.meshes().count(), 1);
    }
}
