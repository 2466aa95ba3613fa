//! Keyboard state tracking and the fixed-shape per-frame input record.
//!
//! - **Keyboard:** the host feeds key transitions into `InputState`;
//!   `is_held(key)` is level-triggered and is what the keyboard fallback map
//!   reads.
//!
//! - **InputRecord:** the controller-shaped record handed to the simulation
//!   library every frame. Axes use the raw game-controller convention
//!   (`-32768..=32767`, Y positive = stick pulled down) so a keyboard and a
//!   physical pad produce identical records for identical intent.

use std::collections::HashSet;

/// Full-scale axis magnitude used for digital (keyboard) stick deflection.
pub const AXIS_MAX: i16 = i16::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    W,
    A,
    S,
    D,
    J,
    K,
}

pub struct InputState {
    held: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
        }
    }

    pub fn key_down(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// One frame of controller intent. Recreated every frame; carries no identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputRecord {
    pub stick_x: i16,
    pub stick_y: i16,
    pub jump: bool,
    pub punch: bool,
    pub target: bool,
}

impl InputRecord {
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// Stick as unit floats with the dead zone applied, in the order the
    /// simulation library expects (`x`, `y`).
    pub fn stick_unit(&self, dead_zone: f32) -> (f32, f32) {
        (
            axis_to_unit(self.stick_x, dead_zone),
            axis_to_unit(self.stick_y, dead_zone),
        )
    }
}

/// Maps a raw axis value to `-1.0..=1.0`, zeroing anything inside `dead_zone`
/// and rescaling the remainder so the output still reaches full deflection.
pub fn axis_to_unit(raw: i16, dead_zone: f32) -> f32 {
    let val = raw as f32 / 32768.0;
    if val < dead_zone && val > -dead_zone {
        return 0.0;
    }
    let span = 1.0 - dead_zone;
    let scaled = if val > 0.0 {
        (val - dead_zone) / span
    } else {
        (val + dead_zone) / span
    };
    scaled.clamp(-1.0, 1.0)
}

/// Converts a unit axis (`-1.0..=1.0`) to the raw controller range.
pub fn unit_to_axis(unit: f32) -> i16 {
    let clamped = unit.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0).round().max(i16::MIN as f32) as i16
    } else {
        (clamped * 32767.0).round() as i16
    }
}
