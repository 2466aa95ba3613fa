use msb_bridge::poller::{GamepadSource, PadState};
use msb_core::input::unit_to_axis;
use serde::Deserialize;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub frame_dt: f64,
    pub frames: Vec<ReplayFrame>,
}

/// Stick values are unit floats with Y positive pulling the stick down, the
/// same convention a physical controller reports.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub stick_x: f32,
    #[serde(default)]
    pub stick_y: f32,
    #[serde(default)]
    pub jump: bool,
    #[serde(default)]
    pub punch: bool,
    #[serde(default)]
    pub target: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<PadState> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let state = PadState {
                stick_x: unit_to_axis(frame.stick_x),
                stick_y: unit_to_axis(frame.stick_y),
                south: frame.jump,
                west: frame.punch,
                left_shoulder: frame.target,
            };
            for _ in 0..frame.repeat.max(1) {
                out.push(state);
            }
        }
        out
    }
}

/// Feeds a replay to the input poller as if it were a connected controller.
/// After the last frame it keeps reporting a neutral stick.
pub struct ReplayGamepad {
    pending: VecDeque<PadState>,
}

impl ReplayGamepad {
    pub fn new(replay: &ReplaySequence) -> Self {
        Self {
            pending: replay.expanded_inputs().into(),
        }
    }
}

impl GamepadSource for ReplayGamepad {
    fn name(&self) -> &str {
        "replay"
    }

    fn sample(&mut self) -> Option<PadState> {
        Some(self.pending.pop_front().unwrap_or_default())
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if !(replay.frame_dt.is_finite() && replay.frame_dt > 0.0) {
        return Err("Replay validation failed: frame_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    for (i, frame) in replay.frames.iter().enumerate() {
        if !(-1.0..=1.0).contains(&frame.stick_x) || !(-1.0..=1.0).contains(&frame.stick_y) {
            return Err(format!(
                "Replay validation failed: frame {i} stick is outside [-1, 1]"
            ));
        }
    }
    Ok(())
}

const fn default_dt() -> f64 {
    1.0 / 30.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "msb_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "stick_x": 1.0, "repeat": 3 },
                { "jump": true }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        assert!((replay.frame_dt - 1.0 / 30.0).abs() < 1e-12);
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].stick_x, i16::MAX);
        assert!(expanded[3].south);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay must fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn out_of_range_stick_is_rejected() {
        let path = temp_file_path("range");
        fs::write(&path, r#"{ "frames": [{ "stick_y": 1.5 }] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("stick out of range");
        assert!(err.contains("frame 0"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn gamepad_plays_back_then_goes_neutral() {
        let replay = ReplaySequence {
            frame_dt: default_dt(),
            frames: vec![ReplayFrame {
                stick_x: 0.0,
                stick_y: -1.0,
                jump: false,
                punch: true,
                target: false,
                repeat: 2,
            }],
        };
        let mut pad = ReplayGamepad::new(&replay);
        for _ in 0..2 {
            let sample = pad.sample().expect("sample");
            assert_eq!(sample.stick_y, i16::MIN);
            assert!(sample.west);
        }
        assert_eq!(pad.sample(), Some(PadState::default()));
    }
}
