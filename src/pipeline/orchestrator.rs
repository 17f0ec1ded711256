use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ExportConfig;
use crate::host::{ExportRequest, SceneHost};
use crate::pipeline::collider::is_collider;
use crate::pipeline::partition::Group;

/// Outcome of one successfully exported group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub gltf_file: String,
    pub objects: Vec<String>,
    pub root: String,
    pub children: Vec<String>,
}

/// Successful exports keyed by root name. Failed groups are absent.
pub type ExportResults = BTreeMap<String, ExportResult>;

/// Exports every group as its own bundle. A failing group is logged and
/// skipped; the remaining groups are still attempted, each exactly once.
pub fn export_groups<H: SceneHost + ?Sized>(
    host: &mut H,
    groups: &[Group],
    output_dir: &Path,
    config: &ExportConfig,
) -> ExportResults {
    let mut results = ExportResults::new();

    for group in groups {
        let file_name = config.bundle_file_name(group.root());
        let request = ExportRequest {
            selection: group.members().to_vec(),
            active: group.root().to_string(),
            path: output_dir.join(&file_name),
            settings: config.settings.clone(),
        };

        match host.export_bundle(&request) {
            Ok(()) => {
                log::info!("Exported group '{}' -> {}", group.root(), file_name);
                for child in group.children() {
                    if is_collider(child) {
                        log::info!("  child: {} [collider]", child);
                    } else {
                        log::info!("  child: {}", child);
                    }
                }

                results.insert(
                    group.root().to_string(),
                    ExportResult {
                        gltf_file: file_name,
                        objects: group.members().to_vec(),
                        root: group.root().to_string(),
                        children: group.children().to_vec(),
                    },
                );
            }
            Err(err) => {
                log::error!("Failed to export group '{}': {:#}", group.root(), err);
            }
        }
    }

    log::info!(
        "Exported {} of {} groups",
        results.len(),
        groups.len()
    );

    results
}
