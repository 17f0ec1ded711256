use std::collections::HashSet;

use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::model::{Model, ModelId};
use crate::scene_graph::object3d::{Object3D, ObjectId};

/// The authoring-side scene: objects in a Z-up frame with parent links,
/// plus the host's current selection.
pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<Model>,
    selection: HashSet<ObjectId>,
    active: Option<ObjectId>,
    pub generator: Option<String>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            selection: HashSet::new(),
            active: None,
            generator: None,
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_model(&mut self, model: Model) -> ModelId {
        self.models.alloc(model)
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        // Remove from old parent's children list
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        // Set new parent and add to new parent's children list
        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }
    }

    /// World matrix of an object, composed from the root down.
    pub fn world_matrix(&self, object_id: ObjectId) -> Mat4 {
        let Some(object) = self.objects.get(object_id) else {
            return Mat4::IDENTITY;
        };

        let local_matrix = object.transform.local_matrix();
        match object.parent_id {
            Some(parent_id) => self.world_matrix(parent_id) * local_matrix,
            None => local_matrix,
        }
    }

    /// Mesh bounding box size scaled by the object's own scale.
    pub fn dimensions(&self, object_id: ObjectId) -> Vec3 {
        self.objects
            .get(object_id)
            .and_then(|object| {
                let model = self.models.get(object.model_id?)?;
                let size = model.bounding_box()?.size();
                Some(size * object.transform.scale.abs())
            })
            .unwrap_or(Vec3::ZERO)
    }

    /// Deselects everything, then selects exactly `ids`.
    pub fn select_only(&mut self, ids: &[ObjectId], active: Option<ObjectId>) {
        self.selection.clear();
        self.selection.extend(ids.iter().copied());
        self.active = active;
    }

    pub fn is_selected(&self, object_id: ObjectId) -> bool {
        self.selection.contains(&object_id)
    }

    pub fn active(&self) -> Option<ObjectId> {
        self.active
    }

    /// Selected objects in scene order.
    pub fn selected(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .map(|(id, _)| id)
            .filter(|id| self.selection.contains(id))
            .collect()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
