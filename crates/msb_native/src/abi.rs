//! `#[repr(C)]` records shared with libsm64.
//!
//! Field order and widths match the library's public header. `Surface` is
//! `Pod` so a collision buffer can be viewed as raw bytes for upload and
//! comparison.

use bytemuck::{Pod, Zeroable};
use std::os::raw::c_char;

pub const SM64_TEXTURE_WIDTH: usize = 64 * 11;
pub const SM64_TEXTURE_HEIGHT: usize = 64;
pub const SM64_GEO_MAX_TRIANGLES: usize = 1024;

/// One static collision triangle in simulation units.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Surface {
    pub surface_type: i16,
    pub force: i16,
    pub terrain: u16,
    pub vertices: [[i16; 3]; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Sm64MarioInputs {
    pub cam_look_x: f32,
    pub cam_look_z: f32,
    pub stick_x: f32,
    pub stick_y: f32,
    pub button_a: u8,
    pub button_b: u8,
    pub button_z: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Sm64MarioState {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub face_angle: f32,
    pub health: i16,
}

/// Output buffers the library writes the body mesh into. The pointers refer to
/// caller-owned storage sized for `SM64_GEO_MAX_TRIANGLES`.
#[repr(C)]
pub struct Sm64MarioGeometryBuffers {
    pub position: *mut f32,
    pub normal: *mut f32,
    pub color: *mut f32,
    pub uv: *mut f32,
    pub num_triangles_used: u16,
}

pub type DebugPrintFn = extern "C" fn(*const c_char);

pub type GlobalInitFn = unsafe extern "C" fn(*const u8, *mut u8, Option<DebugPrintFn>);
pub type GlobalTerminateFn = unsafe extern "C" fn();
pub type StaticSurfacesLoadFn = unsafe extern "C" fn(*const Surface, u32);
pub type MarioCreateFn = unsafe extern "C" fn(i16, i16, i16) -> i32;
pub type MarioTickFn = unsafe extern "C" fn(
    u32,
    *const Sm64MarioInputs,
    *mut Sm64MarioState,
    *mut Sm64MarioGeometryBuffers,
);
pub type MarioDeleteFn = unsafe extern "C" fn(u32);
