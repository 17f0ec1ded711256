use std::path::PathBuf;

use crate::host::HostError;

/// Failures that abort a whole export run. Per-group exporter failures are
/// not in here; they are logged and the group is dropped.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to create output directory {path}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to capture scene transforms")]
    Capture(#[from] HostError),

    #[error("failed to serialize metadata")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write metadata to {path}")]
    WriteMetadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
