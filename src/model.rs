use glam::Vec3;
use gltf::buffer;
use id_arena::Id;

use crate::math::axis::point_to_z_up;
use crate::math::bounds::AABB;

pub struct ModelPrimitive {
    pub index: usize,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl ModelPrimitive {
    pub fn bounding_box(&self) -> Option<AABB> {
        AABB::from_points(self.positions.iter().copied())
    }
}

/// Mesh geometry in the host's Z-up frame.
pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

pub type ModelId = Id<Model>;

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Model> {
        let mut model = Model {
            name: name.into(),
            primitives: Vec::new(),
        };

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(anyhow::anyhow!(
                    "Unsupported primitive mode: {:?}",
                    primitive.mode()
                ));
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<Vec3> = reader
                .read_positions()
                .ok_or_else(|| anyhow::anyhow!("Primitive without positions in {}", model.name))?
                .map(|position| point_to_z_up(Vec3::from(position)))
                .collect();

            let normals: Vec<Vec3> = match reader.read_normals() {
                Some(normals) => normals
                    .map(|normal| point_to_z_up(Vec3::from(normal)))
                    .collect(),
                None => vec![Vec3::Z; positions.len()],
            };

            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            model.primitives.push(ModelPrimitive {
                index: primitive.index(),
                positions,
                normals,
                indices,
            });
        }

        if model.primitives.is_empty() {
            return Err(anyhow::anyhow!("Mesh without primitives: {}", model.name));
        }

        Ok(model)
    }

    pub fn bounding_box(&self) -> Option<AABB> {
        self.primitives
            .iter()
            .filter_map(ModelPrimitive::bounding_box)
            .reduce(|a, b| a.union(&b))
    }
}
