use std::path::PathBuf;

use msb_native::NativeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Wrong ROM size or digest. Aborts insertion.
    #[error("invalid ROM {path}: {reason}")]
    InvalidAsset { path: PathBuf, reason: String },

    /// Malformed terrain tag or mesh data. Aborts insertion before any upload.
    #[error("collision export failed for object '{object}': {reason}")]
    GeometryExport { object: String, reason: String },

    /// No game controller; the poller falls back to the keyboard.
    #[error("no game controller available: {0}")]
    DeviceUnavailable(String),

    #[error("simulation library call failed: {0}")]
    Native(#[from] NativeError),

    #[error("there is no ground under the spawn point")]
    NoGroundAtSpawn,

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("texture export failed: {0}")]
    Texture(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
