pub mod glb_writer;
pub mod mesh_baker;

pub use glb_writer::write_glb;
pub use mesh_baker::{bake_bundle, BakedBundle};
