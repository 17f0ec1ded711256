pub mod loader;
pub mod object3d;
pub mod scene;
pub mod scene_host;
pub mod transform;

// Re-export main types for convenience
pub use object3d::{Object3D, ObjectId};
pub use scene::Scene;
pub use transform::Transform;
