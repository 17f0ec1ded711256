//! The boundary between the bundling pipeline and the scene authoring host.
//!
//! The pipeline never evaluates transforms or writes geometry itself. It asks
//! a [`SceneHost`] for nodes and evaluated world matrices, and hands it an
//! [`ExportRequest`] per group.

use std::path::PathBuf;

use glam::{Mat4, Vec3};

pub mod memory;

pub use memory::MemoryHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Mesh,
    Empty,
    Camera,
    Light,
}

impl NodeKind {
    /// Type tag written into the metadata record.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Mesh => "MESH",
            NodeKind::Empty => "EMPTY",
            NodeKind::Camera => "CAMERA",
            NodeKind::Light => "LIGHT",
        }
    }

    pub fn is_mesh(self) -> bool {
        self == NodeKind::Mesh
    }
}

/// A host node as enumerated by [`SceneHost::nodes`]. Names are unique and
/// act as the key everywhere downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<String>,
    pub visible: bool,
    pub collection: Option<String>,
    /// Bounding box size in the host's axis convention (Z up).
    pub dimensions: Vec3,
}

impl SceneNode {
    pub fn mesh(name: impl Into<String>, parent: Option<&str>) -> Self {
        Self::new(name, NodeKind::Mesh, parent)
    }

    pub fn new(name: impl Into<String>, kind: NodeKind, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: parent.map(String::from),
            visible: true,
            collection: None,
            dimensions: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleFormat {
    Glb,
}

impl BundleFormat {
    pub fn extension(self) -> &'static str {
        match self {
            BundleFormat::Glb => "glb",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub format: BundleFormat,
    pub apply_modifiers: bool,
    pub export_animations: bool,
    pub export_cameras: bool,
    pub export_lights: bool,
    /// Reorient the whole bundle to the Y-up convention of the runtime.
    pub y_up: bool,
    pub use_selection: bool,
}

impl ExportSettings {
    /// The configuration every group bundle is written with.
    pub fn bundle() -> Self {
        Self {
            format: BundleFormat::Glb,
            apply_modifiers: true,
            export_animations: false,
            export_cameras: false,
            export_lights: false,
            y_up: true,
            use_selection: true,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::bundle()
    }
}

/// One export command. The selection travels with the request instead of
/// living as ambient host state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub selection: Vec<String>,
    pub active: String,
    pub path: PathBuf,
    pub settings: ExportSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("unknown scene node '{0}'")]
    UnknownNode(String),
}

pub trait SceneHost {
    /// All nodes, in host order.
    fn nodes(&self) -> Vec<SceneNode>;

    /// World matrix after the host has applied parenting, constraints and
    /// modifiers.
    fn evaluate_world_transform(&self, name: &str) -> Result<Mat4, HostError>;

    /// Replace the selection with `request.selection` and write the bundle.
    fn export_bundle(&mut self, request: &ExportRequest) -> anyhow::Result<()>;

    fn version(&self) -> String;
}
