//! In-memory `HostScene` loaded from a JSON level description.
//!
//! A level lists objects with an optional parent, a local transform, an
//! optional mesh, and the authoring-tool tags the exporter reads. Terrain
//! tags are declared on "area root" objects and inherited by every mesh below
//! them, the same way the terrain toolset scopes them.
//!
//! Validation is strict: names are unique, parents exist and do not form
//! cycles, triangle indices are in range. Tags are not validated here; a bad
//! tag is the exporter's error to report.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use glam::{EulerRot, Mat4, Quat, Vec3};
use msb_core::input::InputState;
use msb_core::transform::Transform;
use serde::Deserialize;

use crate::host::{HostScene, MeshFrame, MeshRef, MeshTriangle, ObjectId};

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    #[serde(default)]
    pub cursor: [f32; 3],
    #[serde(default = "default_view_direction")]
    pub view_direction: [f32; 3],
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    pub objects: Vec<LevelObject>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LevelObject {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default)]
    pub rotation_deg: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub mesh: Option<LevelMesh>,
    #[serde(default = "default_collision")]
    pub collision: bool,
    /// Marks an area root; its terrain applies to all descendants.
    #[serde(default)]
    pub area_terrain: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LevelMesh {
    pub positions: Vec<[f32; 3]>,
    pub triangles: Vec<[u32; 3]>,
    /// Material slot per triangle; defaults to slot 0.
    #[serde(default)]
    pub material_indices: Vec<usize>,
    #[serde(default)]
    pub materials: Vec<Option<String>>,
}

#[derive(Debug, Clone)]
struct SceneObject {
    id: ObjectId,
    name: String,
    parent: Option<ObjectId>,
    local: Transform,
    world_override: Option<Transform>,
    mesh: Option<LevelMesh>,
    collision: bool,
    area_terrain: Option<String>,
    character_mesh: Option<MeshFrame>,
}

pub struct MemoryScene {
    objects: Vec<SceneObject>,
    next_id: u64,
    cursor: Vec3,
    view_direction: Vec3,
    frame_rate: u32,
    keyboard: InputState,
    redraws: u64,
    focus: Option<Vec3>,
}

impl MemoryScene {
    pub fn from_level(level: LevelFile) -> Result<Self, String> {
        validate_level(&level)?;

        let ids: HashMap<&str, ObjectId> = level
            .objects
            .iter()
            .enumerate()
            .map(|(i, obj)| (obj.name.as_str(), ObjectId(i as u64 + 1)))
            .collect();

        let mut objects = Vec::with_capacity(level.objects.len());
        for obj in &level.objects {
            let rotation = Quat::from_euler(
                EulerRot::XYZ,
                obj.rotation_deg[0].to_radians(),
                obj.rotation_deg[1].to_radians(),
                obj.rotation_deg[2].to_radians(),
            );
            objects.push(SceneObject {
                id: ids[obj.name.as_str()],
                name: obj.name.clone(),
                parent: obj.parent.as_deref().map(|p| ids[p]),
                local: Transform {
                    translation: Vec3::from_array(obj.translation),
                    rotation,
                    scale: Vec3::from_array(obj.scale),
                },
                world_override: None,
                mesh: obj.mesh.clone(),
                collision: obj.collision,
                area_terrain: obj.area_terrain.clone(),
                character_mesh: None,
            });
        }

        let view = Vec3::from_array(level.view_direction);
        Ok(Self {
            next_id: objects.len() as u64 + 1,
            objects,
            cursor: Vec3::from_array(level.cursor),
            view_direction: view.try_normalize().unwrap_or(Vec3::NEG_Z),
            frame_rate: level.frame_rate,
            keyboard: InputState::new(),
            redraws: 0,
            focus: None,
        })
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    pub fn focus_target(&self) -> Option<Vec3> {
        self.focus
    }

    pub fn keyboard_mut(&mut self) -> &mut InputState {
        &mut self.keyboard
    }

    pub fn local_transform(&self, object: ObjectId) -> Option<Transform> {
        self.find(object).map(|obj| obj.local)
    }

    /// World transform as last written, or composed from the parent chain.
    pub fn world_transform(&self, object: ObjectId) -> Option<Transform> {
        let obj = self.find(object)?;
        if let Some(world) = obj.world_override {
            return Some(world);
        }
        let (scale, rotation, translation) = self.world_matrix(obj).to_scale_rotation_translation();
        Some(Transform {
            translation,
            rotation,
            scale,
        })
    }

    pub fn character_mesh(&self, object: ObjectId) -> Option<&MeshFrame> {
        self.find(object)?.character_mesh.as_ref()
    }

    fn find(&self, object: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|obj| obj.id == object)
    }

    fn find_mut(&mut self, object: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|obj| obj.id == object)
    }

    fn world_matrix(&self, obj: &SceneObject) -> Mat4 {
        let local = obj.world_override.unwrap_or(obj.local).to_matrix();
        if obj.world_override.is_some() {
            return local;
        }
        match obj.parent.and_then(|p| self.find(p)) {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    fn descends_from(&self, obj: &SceneObject, root: ObjectId) -> bool {
        let mut parent = obj.parent;
        while let Some(id) = parent {
            if id == root {
                return true;
            }
            parent = self.find(id).and_then(|p| p.parent);
        }
        false
    }

    fn inherited_terrain(&self, obj: &SceneObject) -> Option<String> {
        let mut seek = Some(obj);
        while let Some(current) = seek {
            if let Some(terrain) = &current.area_terrain {
                return Some(terrain.clone());
            }
            seek = current.parent.and_then(|p| self.find(p));
        }
        None
    }
}

impl HostScene for MemoryScene {
    fn tagged_meshes(&self) -> Vec<MeshRef> {
        self.objects
            .iter()
            .filter(|obj| obj.collision)
            .filter_map(|obj| {
                let mesh = obj.mesh.as_ref()?;
                let triangles = mesh
                    .triangles
                    .iter()
                    .enumerate()
                    .map(|(i, indices)| MeshTriangle {
                        indices: *indices,
                        material: mesh.material_indices.get(i).copied().unwrap_or(0),
                    })
                    .collect();
                Some(MeshRef {
                    object: obj.name.clone(),
                    world: self.world_matrix(obj),
                    positions: mesh.positions.iter().map(|p| Vec3::from_array(*p)).collect(),
                    triangles,
                    material_tags: mesh.materials.clone(),
                    terrain_tag: self.inherited_terrain(obj),
                })
            })
            .collect()
    }

    fn object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|obj| obj.name == name)
            .map(|obj| obj.id)
    }

    fn child_by_name(&self, root: ObjectId, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|obj| obj.name == name && self.descends_from(obj, root))
            .map(|obj| obj.id)
    }

    fn object_exists(&self, object: ObjectId) -> bool {
        self.find(object).is_some()
    }

    fn create_object(&mut self, name: &str) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push(SceneObject {
            id,
            name: name.to_string(),
            parent: None,
            local: Transform::IDENTITY,
            world_override: None,
            mesh: None,
            collision: false,
            area_terrain: None,
            character_mesh: None,
        });
        id
    }

    fn remove_object(&mut self, object: ObjectId) {
        self.objects.retain(|obj| obj.id != object);
        for obj in &mut self.objects {
            if obj.parent == Some(object) {
                obj.parent = None;
            }
        }
    }

    fn set_world_transform(&mut self, object: ObjectId, transform: Transform) {
        if let Some(obj) = self.find_mut(object) {
            obj.world_override = Some(transform);
        }
    }

    fn set_local_transform(&mut self, object: ObjectId, transform: Transform) {
        if let Some(obj) = self.find_mut(object) {
            obj.local = transform;
        }
    }

    fn write_mesh(&mut self, object: ObjectId, mesh: &MeshFrame) {
        let Some(obj) = self.find_mut(object) else {
            return;
        };
        match &mut obj.character_mesh {
            // Position-only frames keep the colours and UVs already written.
            Some(existing) if mesh.colors.is_empty() => existing.positions = mesh.positions.clone(),
            slot => *slot = Some(mesh.clone()),
        }
    }

    fn spawn_point(&self) -> Vec3 {
        self.cursor
    }

    fn view_direction(&self) -> Vec3 {
        self.view_direction
    }

    fn focus_view(&mut self, target: Vec3) {
        self.focus = Some(target);
    }

    fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    fn set_frame_rate(&mut self, fps: u32) {
        self.frame_rate = fps;
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    fn keyboard(&self) -> &InputState {
        &self.keyboard
    }
}

pub fn load_level_from_path(path: &Path) -> Result<MemoryScene, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let level: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", path.display()))?;
    MemoryScene::from_level(level)
}

fn validate_level(level: &LevelFile) -> Result<(), String> {
    let mut names = HashSet::new();
    for obj in &level.objects {
        if obj.name.trim().is_empty() {
            return Err("Level validation failed: object with empty name".to_string());
        }
        if !names.insert(obj.name.as_str()) {
            return Err(format!(
                "Level validation failed: duplicate object name '{}'",
                obj.name
            ));
        }
    }

    let parents: HashMap<&str, Option<&str>> = level
        .objects
        .iter()
        .map(|obj| (obj.name.as_str(), obj.parent.as_deref()))
        .collect();

    for obj in &level.objects {
        if let Some(parent) = obj.parent.as_deref() {
            if !parents.contains_key(parent) {
                return Err(format!(
                    "Level validation failed: object '{}' has unknown parent '{}'",
                    obj.name, parent
                ));
            }
        }

        let mut seen = HashSet::new();
        let mut current = Some(obj.name.as_str());
        while let Some(name) = current {
            if !seen.insert(name) {
                return Err(format!(
                    "Level validation failed: parent cycle through '{}'",
                    obj.name
                ));
            }
            current = parents.get(name).copied().flatten();
        }

        if let Some(mesh) = &obj.mesh {
            for (i, tri) in mesh.triangles.iter().enumerate() {
                if tri.iter().any(|&v| v as usize >= mesh.positions.len()) {
                    return Err(format!(
                        "Level validation failed: object '{}' triangle {} indexes past {} vertices",
                        obj.name,
                        i,
                        mesh.positions.len()
                    ));
                }
            }
            if !mesh.material_indices.is_empty()
                && mesh.material_indices.len() != mesh.triangles.len()
            {
                return Err(format!(
                    "Level validation failed: object '{}' has {} material indices for {} triangles",
                    obj.name,
                    mesh.material_indices.len(),
                    mesh.triangles.len()
                ));
            }
        }
    }

    if level.frame_rate == 0 {
        return Err("Level validation failed: frame_rate must be > 0".to_string());
    }
    Ok(())
}

const fn default_view_direction() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

const fn default_frame_rate() -> u32 {
    24
}

const fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

const fn default_collision() -> bool {
    true
}
