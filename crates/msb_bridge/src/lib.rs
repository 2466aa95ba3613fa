//! Per-frame bridge between a host scene graph and the simulation library.
//!
//! Insertion runs once: the ROM is validated (`asset`), tagged scene meshes
//! are flattened into a collision buffer (`geometry`) and uploaded, and a
//! character is created. After that the host calls `CharacterSession::tick`
//! every frame, which runs input poll -> simulation step -> pose write, gated
//! on the character object still existing in the scene.
//!
//! The host is reached only through the `HostScene` capability trait.
//! `MemoryScene` is a complete in-memory host loaded from JSON.

pub mod asset;
mod error;
pub mod geometry;
pub mod host;
pub mod memory_scene;
pub mod poller;
pub mod pose;
pub mod session;
pub mod step;
pub mod surface;
pub mod texture;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{BridgeError, Result};
pub use host::{HostScene, MeshFrame, MeshRef, MeshTriangle, ObjectId};
pub use session::{CharacterSession, CharacterState, TickOutcome};
