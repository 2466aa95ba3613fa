//! Per-frame input polling: first game controller, else a fixed keyboard map.
//!
//! The device is chosen once, when the poller is built. Polling never blocks:
//! pending controller events are drained without waiting and the current
//! state is read back. A controller that stops answering produces a zeroed
//! record rather than switching sources mid-session.

use gilrs::{Axis, Button, GamepadId, Gilrs};
use msb_core::input::{unit_to_axis, InputRecord, InputState, Key, AXIS_MAX};

use crate::error::{BridgeError, Result};

/// Raw controller sample in game-controller conventions: axes in
/// `-32768..=32767` with Y positive when the stick is pulled down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadState {
    pub stick_x: i16,
    pub stick_y: i16,
    /// Button 0 (south face).
    pub south: bool,
    /// Button 2 (west face).
    pub west: bool,
    /// Button 9 (left shoulder).
    pub left_shoulder: bool,
}

impl PadState {
    pub fn to_record(self) -> InputRecord {
        InputRecord {
            stick_x: self.stick_x,
            stick_y: self.stick_y,
            jump: self.south,
            punch: self.west,
            target: self.left_shoulder,
        }
    }
}

pub trait GamepadSource {
    fn name(&self) -> &str;

    /// Current state, or `None` once the device has stopped responding.
    fn sample(&mut self) -> Option<PadState>;
}

pub struct GilrsGamepad {
    gilrs: Gilrs,
    id: GamepadId,
    name: String,
}

impl GilrsGamepad {
    /// Opens the first connected controller.
    pub fn open_first() -> Result<Self> {
        let gilrs = Gilrs::new().map_err(|e| BridgeError::DeviceUnavailable(e.to_string()))?;
        let (id, name) = gilrs
            .gamepads()
            .find(|(_, pad)| pad.is_connected())
            .map(|(id, pad)| (id, pad.name().to_string()))
            .ok_or_else(|| BridgeError::DeviceUnavailable("no controller connected".into()))?;
        log::info!("Using game controller '{name}'");
        Ok(Self { gilrs, id, name })
    }
}

impl GamepadSource for GilrsGamepad {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample(&mut self) -> Option<PadState> {
        while self.gilrs.next_event().is_some() {}

        let pad = self.gilrs.connected_gamepad(self.id)?;
        Some(PadState {
            stick_x: unit_to_axis(pad.value(Axis::LeftStickX)),
            // gilrs reports up as positive.
            stick_y: unit_to_axis(-pad.value(Axis::LeftStickY)),
            south: pad.is_pressed(Button::South),
            west: pad.is_pressed(Button::West),
            left_shoulder: pad.is_pressed(Button::LeftTrigger),
        })
    }
}

/// WASD or arrows for the stick, Space jump, J punch, K target.
pub struct KeyboardMap;

impl KeyboardMap {
    pub fn record(keyboard: &InputState) -> InputRecord {
        let held = |a: Key, b: Key| keyboard.is_held(a) || keyboard.is_held(b);
        let axis = |neg: bool, pos: bool| match (neg, pos) {
            (true, false) => -AXIS_MAX,
            (false, true) => AXIS_MAX,
            _ => 0,
        };
        InputRecord {
            stick_x: axis(held(Key::A, Key::Left), held(Key::D, Key::Right)),
            stick_y: axis(held(Key::W, Key::Up), held(Key::S, Key::Down)),
            jump: keyboard.is_held(Key::Space),
            punch: keyboard.is_held(Key::J),
            target: keyboard.is_held(Key::K),
        }
    }
}

pub struct InputPoller {
    gamepad: Option<Box<dyn GamepadSource>>,
    lost_reported: bool,
}

impl InputPoller {
    pub fn new(gamepad: Option<Box<dyn GamepadSource>>) -> Self {
        Self {
            gamepad,
            lost_reported: false,
        }
    }

    /// Enumerates devices once and falls back to the keyboard when there is
    /// no controller.
    pub fn detect() -> Self {
        Self::detect_with(|| {
            GilrsGamepad::open_first().map(|pad| Box::new(pad) as Box<dyn GamepadSource>)
        })
    }

    /// `detect` with a caller-supplied device opener.
    pub fn detect_with<F>(open: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn GamepadSource>>,
    {
        match open() {
            Ok(pad) => Self::new(Some(pad)),
            Err(err) => {
                log::info!("{err}; using keyboard controls");
                Self::keyboard_only()
            }
        }
    }

    pub fn keyboard_only() -> Self {
        Self::new(None)
    }

    pub fn using_gamepad(&self) -> bool {
        self.gamepad.is_some()
    }

    pub fn poll(&mut self, keyboard: &InputState) -> InputRecord {
        let Some(pad) = self.gamepad.as_mut() else {
            return KeyboardMap::record(keyboard);
        };
        match pad.sample() {
            Some(state) => {
                self.lost_reported = false;
                state.to_record()
            }
            None => {
                if !self.lost_reported {
                    log::warn!("Game controller '{}' stopped responding", pad.name());
                    self.lost_reported = true;
                }
                InputRecord::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGamepad;

    #[test]
    fn keyboard_map_full_deflection() {
        let mut keys = InputState::new();
        keys.key_down(Key::W);
        keys.key_down(Key::D);
        let record = KeyboardMap::record(&keys);
        assert_eq!(record.stick_x, AXIS_MAX);
        assert_eq!(record.stick_y, -AXIS_MAX, "up is negative Y");
        assert!(!record.jump);
    }

    #[test]
    fn arrows_match_wasd() {
        let mut wasd = InputState::new();
        wasd.key_down(Key::A);
        wasd.key_down(Key::S);
        let mut arrows = InputState::new();
        arrows.key_down(Key::Left);
        arrows.key_down(Key::Down);
        assert_eq!(KeyboardMap::record(&wasd), KeyboardMap::record(&arrows));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut keys = InputState::new();
        keys.key_down(Key::A);
        keys.key_down(Key::D);
        assert_eq!(KeyboardMap::record(&keys).stick_x, 0);
    }

    #[test]
    fn keyboard_buttons() {
        let mut keys = InputState::new();
        keys.key_down(Key::Space);
        keys.key_down(Key::J);
        keys.key_down(Key::K);
        let record = KeyboardMap::record(&keys);
        assert!(record.jump && record.punch && record.target);
    }

    #[test]
    fn gamepad_takes_priority_over_keyboard() {
        let pad = ScriptedGamepad::new(vec![Some(PadState {
            stick_x: 1000,
            south: true,
            ..PadState::default()
        })]);
        let mut poller = InputPoller::new(Some(Box::new(pad)));
        let mut keys = InputState::new();
        keys.key_down(Key::D);
        let record = poller.poll(&keys);
        assert!(poller.using_gamepad());
        assert_eq!(record.stick_x, 1000);
        assert!(record.jump);
    }

    #[test]
    fn unresponsive_gamepad_yields_zeroed_record() {
        let pad = ScriptedGamepad::new(vec![None]);
        let mut poller = InputPoller::new(Some(Box::new(pad)));
        let mut keys = InputState::new();
        keys.key_down(Key::Space);
        assert!(poller.poll(&keys).is_neutral());
    }

    #[test]
    fn missing_controller_falls_back_to_keyboard() {
        let mut poller = InputPoller::detect_with(|| {
            Err(BridgeError::DeviceUnavailable("no controller connected".into()))
        });
        assert!(!poller.using_gamepad());
        let mut keys = InputState::new();
        keys.key_down(Key::D);
        keys.key_down(Key::Space);
        let record = poller.poll(&keys);
        assert_eq!(record.stick_x, AXIS_MAX);
        assert!(record.jump);
    }

    #[test]
    fn detected_controller_is_used() {
        let mut poller = InputPoller::detect_with(|| {
            let pad = ScriptedGamepad::new(vec![Some(PadState {
                west: true,
                ..PadState::default()
            })]);
            Ok(Box::new(pad) as Box<dyn GamepadSource>)
        });
        assert!(poller.using_gamepad());
        assert!(poller.poll(&InputState::new()).punch);
    }

    #[test]
    fn keyboard_only_poller_reads_keys() {
        let mut poller = InputPoller::keyboard_only();
        let mut keys = InputState::new();
        keys.key_down(Key::Up);
        assert_eq!(poller.poll(&keys).stick_y, -AXIS_MAX);
    }
}
