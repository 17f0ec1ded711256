//! Scene to bundles: capture, partition, export, describe.
//!
//! The stages run strictly in sequence. Transforms are captured before the
//! first export touches the host, and every later stage reads that capture.

use std::path::Path;

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::host::SceneHost;

pub mod collider;
pub mod metadata;
pub mod orchestrator;
pub mod partition;
pub mod snapshot;

pub use collider::is_collider;
pub use metadata::{Metadata, MetadataRecord};
pub use orchestrator::{ExportResult, ExportResults};
pub use partition::{partition, Group};
pub use snapshot::{CapturedTransform, Snapshot};

/// Runs the whole export into `output_dir` and writes the metadata file.
///
/// Directory creation, capture and metadata writing failures abort the run.
/// Failing groups only drop out of the result.
pub fn run<H: SceneHost + ?Sized>(
    host: &mut H,
    output_dir: &Path,
    config: &ExportConfig,
) -> Result<Metadata, ExportError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ExportError::CreateOutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    log::info!("Starting export to {}", output_dir.display());

    let nodes = host.nodes();

    log::info!("Capturing transforms");
    let snapshot = Snapshot::capture(&*host, &nodes)?;

    let groups = partition(&nodes);

    log::info!("Exporting {} groups", groups.len());
    let results = orchestrator::export_groups(host, &groups, output_dir, config);

    log::info!("Building metadata");
    let metadata = metadata::synthesize(
        &nodes,
        &snapshot,
        &groups,
        &results,
        config,
        host.version(),
    );

    let metadata_path = output_dir.join(&config.metadata_file_name);
    let contents = serde_json::to_string_pretty(&metadata)?;
    std::fs::write(&metadata_path, contents).map_err(|source| ExportError::WriteMetadata {
        path: metadata_path.clone(),
        source,
    })?;

    let root_count = metadata
        .objects
        .values()
        .filter(|record| record.parent.is_none())
        .count();
    log::info!(
        "Wrote {} objects ({} root entities) to {}",
        metadata.objects.len(),
        root_count,
        metadata_path.display()
    );

    let missing = crate::sync::missing_bundles(&metadata, output_dir);
    if !missing.is_empty() {
        log::warn!("Some bundle files were not created: {:?}", missing);
    }

    Ok(metadata)
}
