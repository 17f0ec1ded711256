use std::collections::{HashMap, HashSet};

use anyhow::bail;
use glam::Mat4;

use crate::host::{ExportRequest, HostError, SceneHost, SceneNode};

/// A host that keeps its scene in plain maps.
///
/// Bundles are written as a JSON list of the selected node names, which is
/// enough for tooling that only cares about grouping. Roots listed in
/// `failing_roots` make the export call fail without touching the disk.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<SceneNode>,
    world_matrices: HashMap<String, Mat4>,
    failing_roots: HashSet<String>,
    selection: Vec<String>,
    requests: Vec<ExportRequest>,
    version: String,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            version: format!("memory-host {}", env!("CARGO_PKG_VERSION")),
            ..Default::default()
        }
    }

    pub fn add_node(&mut self, node: SceneNode, world_matrix: Mat4) {
        self.world_matrices.insert(node.name.clone(), world_matrix);
        self.nodes.push(node);
    }

    pub fn fail_export_of(&mut self, root: impl Into<String>) {
        self.failing_roots.insert(root.into());
    }

    /// Every export request received so far, in order.
    pub fn requests(&self) -> &[ExportRequest] {
        &self.requests
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Moves a node after capture, the way a selection-triggered re-evaluation
    /// could on a real host.
    pub fn set_world_matrix(&mut self, name: &str, world_matrix: Mat4) {
        self.world_matrices.insert(name.to_string(), world_matrix);
    }
}

impl SceneHost for MemoryHost {
    fn nodes(&self) -> Vec<SceneNode> {
        self.nodes.clone()
    }

    fn evaluate_world_transform(&self, name: &str) -> Result<Mat4, HostError> {
        self.world_matrices
            .get(name)
            .copied()
            .ok_or_else(|| HostError::UnknownNode(name.to_string()))
    }

    fn export_bundle(&mut self, request: &ExportRequest) -> anyhow::Result<()> {
        self.requests.push(request.clone());

        self.selection.clear();
        self.selection.extend(request.selection.iter().cloned());

        if self.failing_roots.contains(&request.active) {
            bail!("exporter rejected group '{}'", request.active);
        }

        for name in &request.selection {
            if !self.world_matrices.contains_key(name) {
                return Err(HostError::UnknownNode(name.clone()).into());
            }
        }

        let contents = serde_json::to_vec_pretty(&request.selection)?;
        std::fs::write(&request.path, contents)?;

        Ok(())
    }

    fn version(&self) -> String {
        self.version.clone()
    }
}
