//! Reconciles exported metadata with the entities already placed in a
//! runtime project.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::pipeline::metadata::{MetadataRecord, Quaternion, Vector3};

pub mod assets;

pub use assets::{copy_bundles_to_project, missing_bundles};

/// Project-relative directory holding copied bundles.
pub const PROJECT_ASSET_DIR: &str = "assets/blender";

/// Parent entity the project creates to hold imported objects. Never an
/// exported object itself.
const CONTAINER_ENTITY: &str = "Blender";

const TRANSFORM_EPSILON: f32 = 0.0001;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTransform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vector3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Quaternion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vector3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    pub position: Vector3,
    pub rotation: Quaternion,
    pub scale: Vector3,
}

impl From<&MetadataRecord> for ObjectTransform {
    fn from(record: &MetadataRecord) -> Self {
        Self {
            position: record.location,
            rotation: record.rotation,
            scale: record.scale,
        }
    }
}

/// An entity as it currently exists in the runtime project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityData {
    pub entity_id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gltf_src: Option<String>,
    #[serde(default)]
    pub transform: Option<EntityTransform>,
}

impl EntityData {
    fn gltf_file_name(&self) -> Option<&str> {
        self.gltf_src
            .as_deref()
            .and_then(|src| src.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformChange {
    pub object_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gltf_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_transform: Option<EntityTransform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_transform: Option<ObjectTransform>,
    pub is_new_object: bool,
    pub is_deleted: bool,
}

/// Compares the components present on `current` against `new`. Missing
/// components are not compared.
pub fn transforms_equal(current: &EntityTransform, new: &ObjectTransform) -> bool {
    let close = |a: f32, b: f32| (a - b).abs() <= TRANSFORM_EPSILON;
    let close3 = |a: &Vector3, b: &Vector3| close(a.x, b.x) && close(a.y, b.y) && close(a.z, b.z);

    current
        .position
        .as_ref()
        .is_none_or(|position| close3(position, &new.position))
        && current.rotation.as_ref().is_none_or(|rotation| {
            close(rotation.x, new.rotation.x)
                && close(rotation.y, new.rotation.y)
                && close(rotation.z, new.rotation.z)
                && close(rotation.w, new.rotation.w)
        })
        && current
            .scale
            .as_ref()
            .is_none_or(|scale| close3(scale, &new.scale))
}

/// Lists new, updated and deleted objects between an export and the
/// entities of a project.
///
/// Objects are matched to entities by name first and by bundle file name
/// second.
pub fn detect_changes(
    objects: &BTreeMap<String, MetadataRecord>,
    entities: &[EntityData],
) -> Vec<TransformChange> {
    let mut by_name: HashMap<&str, &EntityData> = HashMap::new();
    let mut by_gltf: HashMap<&str, &EntityData> = HashMap::new();

    for entity in entities {
        if let Some(name) = entity.name.as_deref() {
            by_name.insert(name, entity);
        }
        if let Some(file_name) = entity.gltf_file_name() {
            by_gltf.insert(file_name, entity);
        }
        if entity.name.is_none() && entity.gltf_src.is_none() {
            log::warn!(
                "Entity {} has neither name nor bundle source and cannot be matched",
                entity.entity_id
            );
        }
    }

    let find_entity = |name: &str, record: &MetadataRecord| {
        by_name.get(name).copied().or_else(|| {
            record
                .gltf_file
                .as_deref()
                .and_then(|file| by_gltf.get(file).copied())
        })
    };

    let mut changes = Vec::new();
    let mut matched_ids = HashSet::new();

    for (name, record) in objects {
        let entity = find_entity(name, record);
        if let Some(entity) = entity {
            matched_ids.insert(entity.entity_id);
        }

        let new_transform = ObjectTransform::from(record);
        let mut change = TransformChange {
            object_name: name.clone(),
            gltf_file: record.gltf_file.clone(),
            entity_id: entity.map(|entity| entity.entity_id),
            entity_name: entity.and_then(|entity| entity.name.clone()),
            current_transform: None,
            new_transform: Some(new_transform.clone()),
            is_new_object: entity.is_none(),
            is_deleted: false,
        };

        match entity.and_then(|entity| entity.transform.as_ref().map(|t| (entity, t))) {
            Some((entity, current)) => {
                change.current_transform = Some(current.clone());

                let moved = !transforms_equal(current, &new_transform);
                let source_changed = record.gltf_file.as_deref().is_some_and(|file| {
                    let expected = format!("{}/{}", PROJECT_ASSET_DIR, file);
                    entity.gltf_src.as_deref() != Some(expected.as_str())
                });

                log::debug!(
                    "Object '{}': transform changed={}, bundle changed={}",
                    name,
                    moved,
                    source_changed
                );

                if moved || source_changed {
                    changes.push(change);
                }
            }
            None => changes.push(change),
        }
    }

    let asset_prefix = format!("{}/", PROJECT_ASSET_DIR);

    for entity in entities {
        if matched_ids.contains(&entity.entity_id) {
            continue;
        }
        if entity.name.as_deref() == Some(CONTAINER_ENTITY) {
            continue;
        }

        let name_gone = entity
            .name
            .as_deref()
            .is_some_and(|name| !objects.contains_key(name));
        let source_gone = entity.gltf_src.as_deref().is_some_and(|src| {
            src.contains(&asset_prefix)
                && !objects.values().any(|record| {
                    record
                        .gltf_file
                        .as_deref()
                        .is_some_and(|file| src.ends_with(file))
                })
        });

        if name_gone || source_gone {
            log::info!(
                "Detected deleted object: {} (id {})",
                entity
                    .name
                    .as_deref()
                    .or(entity.gltf_src.as_deref())
                    .unwrap_or("-"),
                entity.entity_id
            );

            changes.push(TransformChange {
                object_name: deleted_object_name(entity),
                gltf_file: None,
                entity_id: Some(entity.entity_id),
                entity_name: entity.name.clone(),
                current_transform: entity.transform.clone(),
                new_transform: None,
                is_new_object: false,
                is_deleted: true,
            });
        }
    }

    log::info!(
        "Found {} changes ({} new, {} updated, {} deleted)",
        changes.len(),
        changes.iter().filter(|c| c.is_new_object).count(),
        changes
            .iter()
            .filter(|c| !c.is_new_object && !c.is_deleted)
            .count(),
        changes.iter().filter(|c| c.is_deleted).count()
    );

    changes
}

fn deleted_object_name(entity: &EntityData) -> String {
    if let Some(name) = &entity.name {
        return name.clone();
    }

    entity
        .gltf_file_name()
        .map(|file| {
            let lower = file.to_ascii_lowercase();
            if lower.ends_with(".glb") {
                file[..file.len() - 4].to_string()
            } else if lower.ends_with(".gltf") {
                file[..file.len() - 5].to_string()
            } else {
                file.to_string()
            }
        })
        .unwrap_or_else(|| "Unknown".to_string())
}
