use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::pipeline::Metadata;
use crate::sync::PROJECT_ASSET_DIR;

const BUNDLE_EXTENSIONS: &[&str] = &["glb", "gltf", "bin"];

/// Bundle files referenced by `metadata` that do not exist under `dir`.
pub fn missing_bundles(metadata: &Metadata, dir: &Path) -> Vec<String> {
    let mut missing: Vec<String> = metadata
        .objects
        .values()
        .filter_map(|record| record.gltf_file.as_ref())
        .filter(|file| !dir.join(file).exists())
        .cloned()
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

/// Replaces the project's bundle directory with the bundles from
/// `export_dir`. Returns the number of files copied.
pub fn copy_bundles_to_project(export_dir: &Path, project_dir: &Path) -> anyhow::Result<usize> {
    let assets_dir = project_dir.join(PROJECT_ASSET_DIR);

    clean_asset_dir(&assets_dir);

    std::fs::create_dir_all(&assets_dir)
        .with_context(|| format!("Failed to create {}", assets_dir.display()))?;

    let mut copied = 0;
    for entry in std::fs::read_dir(export_dir)
        .with_context(|| format!("Failed to read {}", export_dir.display()))?
    {
        let path = entry?.path();
        if !is_bundle_file(&path) {
            continue;
        }

        let Some(file_name) = path.file_name() else {
            continue;
        };
        let destination = assets_dir.join(file_name);
        std::fs::copy(&path, &destination).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                path.display(),
                destination.display()
            )
        })?;
        log::info!("Copied {}", file_name.to_string_lossy());
        copied += 1;
    }

    log::info!("Copied {} bundle files to project", copied);

    Ok(copied)
}

fn is_bundle_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| BUNDLE_EXTENSIONS.contains(&extension))
}

// Best effort: leftovers that cannot be removed are logged and kept.
fn clean_asset_dir(assets_dir: &Path) {
    let entries = match std::fs::read_dir(assets_dir) {
        Ok(entries) => entries,
        Err(_) => {
            log::info!("{} does not exist, nothing to clean", assets_dir.display());
            return;
        }
    };

    let paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect();

    let mut deleted = 0;
    for path in &paths {
        let result = if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };

        match result {
            Ok(()) => deleted += 1,
            Err(err) => log::warn!("Failed to delete {}: {}", path.display(), err),
        }
    }

    log::info!("Deleted {} of {} old files", deleted, paths.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_only_bundle_files_and_clears_old_ones() {
        let export_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();

        std::fs::write(export_dir.path().join("Table.glb"), b"glb").unwrap();
        std::fs::write(export_dir.path().join("Chair.gltf"), b"{}").unwrap();
        std::fs::write(export_dir.path().join("metadata.json"), b"{}").unwrap();

        let assets_dir = project_dir.path().join(PROJECT_ASSET_DIR);
        std::fs::create_dir_all(&assets_dir).unwrap();
        std::fs::write(assets_dir.join("Stale.glb"), b"old").unwrap();

        let copied = copy_bundles_to_project(export_dir.path(), project_dir.path()).unwrap();

        assert_eq!(copied, 2);
        assert!(assets_dir.join("Table.glb").exists());
        assert!(assets_dir.join("Chair.gltf").exists());
        assert!(!assets_dir.join("metadata.json").exists());
        assert!(!assets_dir.join("Stale.glb").exists());
    }

    #[test]
    fn missing_export_dir_is_an_error() {
        let project_dir = tempfile::tempdir().unwrap();
        let export_dir = project_dir.path().join("nope");

        assert!(copy_bundles_to_project(&export_dir, project_dir.path()).is_err());
    }

    #[test]
    fn reports_absent_bundles_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Table.glb"), b"glb").unwrap();

        let metadata: Metadata = serde_json::from_value(serde_json::json!({
            "objects": {
                "Table": {
                    "name": "Table", "type": "MESH", "gltfFile": "Table.glb",
                    "location": {"x": 0.0, "y": 0.0, "z": 0.0},
                    "rotation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0},
                    "scale": {"x": 1.0, "y": 1.0, "z": 1.0},
                    "dimensions": {"x": 1.0, "y": 1.0, "z": 1.0},
                    "parent": null, "isCollider": false, "collection": null, "visible": true
                },
                "Lamp": {
                    "name": "Lamp", "type": "MESH", "gltfFile": "Lamp.glb",
                    "location": {"x": 0.0, "y": 0.0, "z": 0.0},
                    "rotation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0},
                    "scale": {"x": 1.0, "y": 1.0, "z": 1.0},
                    "dimensions": {"x": 1.0, "y": 1.0, "z": 1.0},
                    "parent": null, "isCollider": false, "collection": null, "visible": true
                },
                "Lamp_Shade": {
                    "name": "Lamp_Shade", "type": "MESH", "gltfFile": "Lamp.glb",
                    "location": {"x": 0.0, "y": 0.0, "z": 0.0},
                    "rotation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0},
                    "scale": {"x": 1.0, "y": 1.0, "z": 1.0},
                    "dimensions": {"x": 1.0, "y": 1.0, "z": 1.0},
                    "parent": "Lamp", "isCollider": false, "collection": null, "visible": true
                }
            },
            "groups": {},
            "coordinate_system": "Y_UP",
            "blender_version": "test"
        }))
        .unwrap();

        assert_eq!(missing_bundles(&metadata, dir.path()), ["Lamp.glb"]);
        assert!(metadata.groups.is_empty());
    }
}
