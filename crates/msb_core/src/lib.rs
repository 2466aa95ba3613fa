//! Shared value types for the Mario scene bridge: per-frame input, keyboard
//! state, sim/host space transforms, frame statistics and bridge configuration.

pub mod config;
pub mod input;
pub mod time;
pub mod transform;
