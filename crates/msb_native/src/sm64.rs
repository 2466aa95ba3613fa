//! `SimulationLibrary` backed by a dynamically loaded libsm64.
//!
//! The library keeps its state in process globals, so two `Sm64Library`
//! values loading the same file share one simulation. A process-wide claim
//! flag makes the second `global_init` fail with `AlreadyInitialized` instead
//! of silently re-initialising memory another owner is still using.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use libloading::Library;

use crate::abi::{
    GlobalInitFn, GlobalTerminateFn, MarioCreateFn, MarioDeleteFn, MarioTickFn,
    Sm64MarioGeometryBuffers, Sm64MarioInputs, Sm64MarioState, StaticSurfacesLoadFn, Surface,
    SM64_GEO_MAX_TRIANGLES, SM64_TEXTURE_HEIGHT, SM64_TEXTURE_WIDTH,
};
use crate::arena::HandleArena;
use crate::error::NativeError;
use crate::simulation::{
    CharacterFrame, CharacterHandle, CharacterInput, GeometryFrame, SimulationLibrary,
    TextureAtlas,
};

static GLOBAL_INIT_CLAIMED: AtomicBool = AtomicBool::new(false);

pub fn default_library_file_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "sm64.dll"
    } else if cfg!(target_os = "macos") {
        "libsm64.dylib"
    } else {
        "libsm64.so"
    }
}

#[derive(Clone, Copy)]
struct Sm64Api {
    global_init: GlobalInitFn,
    global_terminate: GlobalTerminateFn,
    static_surfaces_load: StaticSurfacesLoadFn,
    mario_create: MarioCreateFn,
    mario_tick: MarioTickFn,
    mario_delete: MarioDeleteFn,
}

impl Sm64Api {
    /// # Safety
    /// The library must export the libsm64 ABI with the signatures in `abi`.
    unsafe fn resolve(library: &Library) -> Result<Self, NativeError> {
        Ok(Self {
            global_init: symbol(library, "sm64_global_init")?,
            global_terminate: symbol(library, "sm64_global_terminate")?,
            static_surfaces_load: symbol(library, "sm64_static_surfaces_load")?,
            mario_create: symbol(library, "sm64_mario_create")?,
            mario_tick: symbol(library, "sm64_mario_tick")?,
            mario_delete: symbol(library, "sm64_mario_delete")?,
        })
    }
}

unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, NativeError> {
    let sym: libloading::Symbol<T> = library
        .get(name.as_bytes())
        .map_err(|_| NativeError::MissingSymbol(name))?;
    Ok(*sym)
}

extern "C" fn debug_print(message: *const c_char) {
    if message.is_null() {
        return;
    }
    let text = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    log::debug!(target: "libsm64", "{}", text.trim_end());
}

/// Caller-owned geometry storage for one character.
struct MarioSlot {
    mario_id: u32,
    position: Vec<f32>,
    normal: Vec<f32>,
    color: Vec<f32>,
    uv: Vec<f32>,
}

impl MarioSlot {
    fn new(mario_id: u32) -> Self {
        Self {
            mario_id,
            position: vec![0.0; SM64_GEO_MAX_TRIANGLES * 9],
            normal: vec![0.0; SM64_GEO_MAX_TRIANGLES * 9],
            color: vec![0.0; SM64_GEO_MAX_TRIANGLES * 9],
            uv: vec![0.0; SM64_GEO_MAX_TRIANGLES * 6],
        }
    }

    fn geometry(&self, triangles: usize, full: bool) -> GeometryFrame {
        let vec3s = |data: &[f32]| -> Vec<[f32; 3]> {
            data[..triangles * 9]
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect()
        };
        GeometryFrame {
            positions: vec3s(&self.position),
            normals: vec3s(&self.normal),
            colors: if full { vec3s(&self.color) } else { Vec::new() },
            uvs: if full {
                self.uv[..triangles * 6]
                    .chunks_exact(2)
                    .map(|c| [c[0], c[1]])
                    .collect()
            } else {
                Vec::new()
            },
        }
    }
}

pub struct Sm64Library {
    api: Sm64Api,
    initialized: bool,
    characters: HandleArena<MarioSlot>,
    // Dropped last: the resolved function pointers borrow this mapping.
    _library: Library,
}

impl Sm64Library {
    pub fn load(path: &Path) -> Result<Self, NativeError> {
        if !path.exists() {
            return Err(NativeError::LibraryLoad {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        let library = unsafe { Library::new(path) }.map_err(|e| NativeError::LibraryLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let api = unsafe { Sm64Api::resolve(&library)? };
        log::info!("Loaded simulation library {}", path.display());

        Ok(Self {
            api,
            initialized: false,
            characters: HandleArena::new(),
            _library: library,
        })
    }

    fn require_initialized(&self) -> Result<(), NativeError> {
        if self.initialized {
            Ok(())
        } else {
            Err(NativeError::NotInitialized)
        }
    }
}

impl SimulationLibrary for Sm64Library {
    fn global_init(&mut self, rom: &[u8]) -> Result<TextureAtlas, NativeError> {
        if self.initialized || GLOBAL_INIT_CLAIMED.swap(true, Ordering::SeqCst) {
            return Err(NativeError::AlreadyInitialized);
        }

        let mut texture = vec![0u8; 4 * SM64_TEXTURE_WIDTH * SM64_TEXTURE_HEIGHT];
        unsafe {
            (self.api.global_init)(rom.as_ptr(), texture.as_mut_ptr(), Some(debug_print));
        }
        self.initialized = true;
        log::info!("Simulation library initialised ({} ROM bytes)", rom.len());

        Ok(TextureAtlas {
            width: SM64_TEXTURE_WIDTH as u32,
            height: SM64_TEXTURE_HEIGHT as u32,
            rgba: texture,
        })
    }

    fn global_terminate(&mut self) -> Result<(), NativeError> {
        self.require_initialized()?;

        for slot in self.characters.drain() {
            unsafe { (self.api.mario_delete)(slot.mario_id) };
        }
        unsafe { (self.api.global_terminate)() };
        self.initialized = false;
        GLOBAL_INIT_CLAIMED.store(false, Ordering::SeqCst);
        log::info!("Simulation library terminated");
        Ok(())
    }

    fn load_static_collision(&mut self, surfaces: &[Surface]) -> Result<(), NativeError> {
        self.require_initialized()?;
        let count =
            u32::try_from(surfaces.len()).map_err(|_| NativeError::TooManySurfaces(surfaces.len()))?;
        unsafe { (self.api.static_surfaces_load)(surfaces.as_ptr(), count) };
        log::info!("Uploaded {} static collision surfaces", count);
        Ok(())
    }

    fn create_character(&mut self, position: [i16; 3]) -> Result<CharacterHandle, NativeError> {
        self.require_initialized()?;
        let id = unsafe { (self.api.mario_create)(position[0], position[1], position[2]) };
        if id < 0 {
            return Err(NativeError::CreateFailed(position));
        }
        let handle = self.characters.insert(MarioSlot::new(id as u32));
        log::debug!("Created character {} (native id {})", handle, id);
        Ok(handle)
    }

    // libsm64 advances a fixed 1/30 s per call; the host interval is not
    // forwarded.
    fn step_character(
        &mut self,
        handle: CharacterHandle,
        input: &CharacterInput,
        _dt: f32,
        with_full_geometry: bool,
    ) -> Result<CharacterFrame, NativeError> {
        self.require_initialized()?;
        let tick = self.api.mario_tick;
        let slot = self
            .characters
            .get_mut(handle)
            .ok_or(NativeError::StaleHandle(handle))?;

        let inputs = Sm64MarioInputs {
            cam_look_x: input.cam_look_x,
            cam_look_z: input.cam_look_z,
            stick_x: input.stick_x,
            stick_y: input.stick_y,
            button_a: input.button_a as u8,
            button_b: input.button_b as u8,
            button_z: input.button_z as u8,
        };
        let mut state = Sm64MarioState::default();
        let mut buffers = Sm64MarioGeometryBuffers {
            position: slot.position.as_mut_ptr(),
            normal: slot.normal.as_mut_ptr(),
            color: slot.color.as_mut_ptr(),
            uv: slot.uv.as_mut_ptr(),
            num_triangles_used: 0,
        };

        unsafe { tick(slot.mario_id, &inputs, &mut state, &mut buffers) };

        let triangles = (buffers.num_triangles_used as usize).min(SM64_GEO_MAX_TRIANGLES);
        Ok(CharacterFrame {
            position: Vec3::from_array(state.position),
            velocity: Vec3::from_array(state.velocity),
            face_angle: state.face_angle,
            health: state.health,
            parts: Vec::new(),
            geometry: Some(slot.geometry(triangles, with_full_geometry)),
        })
    }

    fn destroy_character(&mut self, handle: CharacterHandle) -> Result<(), NativeError> {
        let slot = self
            .characters
            .remove(handle)
            .ok_or(NativeError::StaleHandle(handle))?;
        if self.initialized {
            unsafe { (self.api.mario_delete)(slot.mario_id) };
        }
        log::debug!("Destroyed character {}", handle);
        Ok(())
    }
}

impl Drop for Sm64Library {
    fn drop(&mut self) {
        if self.initialized {
            if let Err(err) = self.global_terminate() {
                log::error!("Failed to terminate simulation library: {}", err);
            }
        }
    }
}
