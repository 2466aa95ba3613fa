//! The narrow view of the host application the bridge depends on.
//!
//! Everything the bridge reads from or writes to the host scene goes through
//! `HostScene`. A host integration implements it over its own object model;
//! `MemoryScene` implements it over a JSON level for headless runs and tests.

use glam::{Mat4, Vec3};
use msb_core::input::InputState;
use msb_core::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshTriangle {
    pub indices: [u32; 3],
    /// Index into `MeshRef::material_tags`.
    pub material: usize,
}

/// A collidable mesh as the host exposes it: local positions plus the world
/// matrix, and the authoring-tool tags that drive surface and terrain codes.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRef {
    pub object: String,
    pub world: Mat4,
    pub positions: Vec<Vec3>,
    pub triangles: Vec<MeshTriangle>,
    /// Surface-type tag per material slot; `None` means untagged.
    pub material_tags: Vec<Option<String>>,
    /// Terrain tag inherited from the nearest area-root ancestor.
    pub terrain_tag: Option<String>,
}

/// Character body mesh in host space, three vertices per triangle.
/// `colors` and `uvs` are empty on frames that only refresh positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshFrame {
    pub positions: Vec<Vec3>,
    pub colors: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
}

pub trait HostScene {
    /// Meshes flagged as collidable terrain, in scene order.
    fn tagged_meshes(&self) -> Vec<MeshRef>;

    fn object_by_name(&self, name: &str) -> Option<ObjectId>;

    /// Descendant of `root` (at any depth) with the given name.
    fn child_by_name(&self, root: ObjectId, name: &str) -> Option<ObjectId>;

    fn object_exists(&self, object: ObjectId) -> bool;

    fn create_object(&mut self, name: &str) -> ObjectId;

    fn remove_object(&mut self, object: ObjectId);

    fn set_world_transform(&mut self, object: ObjectId, transform: Transform);

    fn set_local_transform(&mut self, object: ObjectId, transform: Transform);

    fn write_mesh(&mut self, object: ObjectId, mesh: &MeshFrame);

    /// Where a newly inserted character appears (the editor's 3D cursor).
    fn spawn_point(&self) -> Vec3;

    /// Unit forward vector of the active viewport.
    fn view_direction(&self) -> Vec3;

    /// Re-centres the active viewport on `target`.
    fn focus_view(&mut self, target: Vec3);

    fn frame_rate(&self) -> u32;

    fn set_frame_rate(&mut self, fps: u32);

    fn request_redraw(&mut self);

    fn keyboard(&self) -> &InputState;
}
