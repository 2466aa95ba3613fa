//! Contract and loader for the external simulation library.
//!
//! Everything that crosses the native boundary lives here: the `#[repr(C)]`
//! records, the `SimulationLibrary` trait the bridge programs against, the
//! generational arena that turns native character ids into opaque handles, and
//! `Sm64Library`, which resolves the libsm64 entry points at runtime.

pub mod abi;
pub mod arena;
mod error;
pub mod simulation;
mod sm64;

pub use abi::Surface;
pub use arena::{Handle, HandleArena};
pub use error::NativeError;
pub use simulation::{
    CharacterFrame, CharacterHandle, CharacterInput, GeometryFrame, SimPartPose,
    SimulationLibrary, TextureAtlas,
};
pub use sm64::{default_library_file_name, Sm64Library};
