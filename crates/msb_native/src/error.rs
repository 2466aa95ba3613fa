use std::path::PathBuf;

use thiserror::Error;

use crate::simulation::CharacterHandle;

/// Failures at the native boundary. Any of these is fatal to the character
/// involved; none is retried.
#[derive(Error, Debug)]
pub enum NativeError {
    #[error("failed to load simulation library {path}: {reason}")]
    LibraryLoad { path: PathBuf, reason: String },

    #[error("simulation library is missing symbol '{0}'")]
    MissingSymbol(&'static str),

    #[error("simulation library is already initialized in this process")]
    AlreadyInitialized,

    #[error("simulation library has not been initialized")]
    NotInitialized,

    #[error("stale or unknown character handle {0}")]
    StaleHandle(CharacterHandle),

    #[error("simulation library refused to create a character at {0:?}")]
    CreateFailed([i16; 3]),

    #[error("collision upload of {0} surfaces exceeds the library limit")]
    TooManySurfaces(usize),
}
