//! The contract the bridge programs against.
//!
//! `SimulationLibrary` mirrors the native entry points one to one. The bridge
//! never sees raw ids or pointers: characters are `CharacterHandle`s and all
//! per-frame output comes back as owned `CharacterFrame`s in simulation space.

use glam::Vec3;
use msb_core::transform::Transform;

use crate::abi::Surface;
use crate::arena::Handle;
use crate::error::NativeError;

pub type CharacterHandle = Handle;

/// Input as the library consumes it: unit stick, camera look direction on the
/// ground plane, three buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CharacterInput {
    pub cam_look_x: f32,
    pub cam_look_z: f32,
    pub stick_x: f32,
    pub stick_y: f32,
    pub button_a: bool,
    pub button_b: bool,
    pub button_z: bool,
}

/// A named sub-part transform relative to the character root, in simulation
/// space.
#[derive(Debug, Clone, PartialEq)]
pub struct SimPartPose {
    pub name: String,
    pub local: Transform,
}

/// Body mesh for one frame as flat triangle lists (three entries per
/// triangle). Colours and UVs are empty when the caller did not ask for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryFrame {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
}

impl GeometryFrame {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterFrame {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Yaw about the simulation up axis, radians.
    pub face_angle: f32,
    pub health: i16,
    pub parts: Vec<SimPartPose>,
    pub geometry: Option<GeometryFrame>,
}

/// RGBA texture atlas the library decodes from the ROM during `global_init`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureAtlas {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub trait SimulationLibrary {
    /// One-time process-wide initialisation from validated ROM bytes.
    fn global_init(&mut self, rom: &[u8]) -> Result<TextureAtlas, NativeError>;

    /// Releases all native state, including any characters still alive.
    fn global_terminate(&mut self) -> Result<(), NativeError>;

    /// Replaces the static collision terrain.
    fn load_static_collision(&mut self, surfaces: &[Surface]) -> Result<(), NativeError>;

    fn create_character(&mut self, position: [i16; 3]) -> Result<CharacterHandle, NativeError>;

    /// Advances the character by one library tick. `with_full_geometry`
    /// requests colours and UVs in addition to positions.
    fn step_character(
        &mut self,
        handle: CharacterHandle,
        input: &CharacterInput,
        dt: f32,
        with_full_geometry: bool,
    ) -> Result<CharacterFrame, NativeError>;

    fn destroy_character(&mut self, handle: CharacterHandle) -> Result<(), NativeError>;
}
