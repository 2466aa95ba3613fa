//! The "Insert Mario" panel, drawn with egui.
//!
//! The panel never touches the session directly while drawing. `ui()` returns
//! a `PanelAction` when the button is pressed; the host runs it with
//! `run_action()` between frames and hands the result back through
//! `report()` so the last error stays on screen until the next attempt.

use std::path::{Path, PathBuf};

use msb_bridge::{CharacterSession, CharacterState, HostScene, ObjectId};
use msb_core::config::BridgeConfig;

const SCALE_RANGE: std::ops::RangeInclusive<f32> = 1.0..=500.0;
const ROM_EXTENSIONS: &[&str] = &["z64", "n64", "v64"];

#[derive(Debug, Clone, PartialEq)]
pub struct PanelStatus {
    pub state: CharacterState,
    pub using_gamepad: bool,
    pub fps: f64,
    pub health: Option<i16>,
}

impl PanelStatus {
    pub fn from_session(session: &CharacterSession) -> Self {
        Self {
            state: session.state(),
            using_gamepad: session.using_gamepad(),
            fps: session.stats().smoothed_fps,
            health: session.last_pose().map(|pose| pose.health),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    Insert {
        rom_path: PathBuf,
        config: BridgeConfig,
    },
}

pub struct InsertPanel {
    pub rom_path: String,
    pub scale_factor: f32,
    pub camera_follow: bool,
    base: BridgeConfig,
    last_error: Option<String>,
}

impl InsertPanel {
    pub fn new(base: BridgeConfig) -> Self {
        Self {
            rom_path: String::new(),
            scale_factor: base.scale_factor,
            camera_follow: base.camera_follow,
            base,
            last_error: None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Takes a path chosen in the file dialog; a cancelled dialog changes
    /// nothing.
    pub fn set_rom_path(&mut self, picked: Option<PathBuf>) {
        if let Some(path) = picked {
            self.rom_path = path.display().to_string();
            self.last_error = None;
        }
    }

    pub fn rom_exists(&self) -> bool {
        !self.rom_path.trim().is_empty() && Path::new(self.rom_path.trim()).is_file()
    }

    /// Builds the insert action from the current field values.
    pub fn insert_request(&self) -> Result<PanelAction, String> {
        let rom = self.rom_path.trim();
        if rom.is_empty() {
            return Err("Select a ROM file first".to_string());
        }
        let config = BridgeConfig {
            scale_factor: self.scale_factor,
            camera_follow: self.camera_follow,
            ..self.base.clone()
        };
        config.validate()?;
        Ok(PanelAction::Insert {
            rom_path: PathBuf::from(rom),
            config,
        })
    }

    pub fn report(&mut self, result: &msb_bridge::Result<ObjectId>) {
        match result {
            Ok(_) => self.last_error = None,
            Err(err) => {
                log::warn!("Insert failed: {err}");
                self.last_error = Some(err.to_string());
            }
        }
    }

    pub fn show(&mut self, ctx: &egui::Context, status: Option<&PanelStatus>) -> Option<PanelAction> {
        let mut action = None;
        egui::Window::new("LibSM64")
            .default_pos([10.0, 10.0])
            .show(ctx, |ui| {
                action = self.ui(ui, status);
            });
        action
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, status: Option<&PanelStatus>) -> Option<PanelAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.label("ROM");
            ui.text_edit_singleline(&mut self.rom_path);
            if ui.button("Browse…").clicked() {
                let picked = rfd::FileDialog::new()
                    .set_title("Select SM64 US ROM")
                    .add_filter("N64 ROM", ROM_EXTENSIONS)
                    .pick_file();
                self.set_rom_path(picked);
            }
        });
        if !self.rom_path.trim().is_empty() && !self.rom_exists() {
            ui.colored_label(egui::Color32::YELLOW, "File not found");
        }

        ui.add(egui::Slider::new(&mut self.scale_factor, SCALE_RANGE).text("Scale"));
        ui.checkbox(&mut self.camera_follow, "Camera follow");

        if ui.button("Insert Mario").clicked() {
            match self.insert_request() {
                Ok(request) => action = Some(request),
                Err(err) => self.last_error = Some(err),
            }
        }

        if let Some(err) = &self.last_error {
            ui.colored_label(egui::Color32::RED, err);
        }

        if let Some(status) = status {
            ui.separator();
            ui.label(format!("State: {:?}", status.state));
            ui.label(if status.using_gamepad {
                "Input: game controller"
            } else {
                "Input: keyboard"
            });
            ui.label(format!("FPS: {:.1}", status.fps));
            if let Some(health) = status.health {
                ui.label(format!("Health: {:#06x}", health));
            }
        }

        action
    }
}

/// Applies a panel action to the session.
pub fn run_action(
    action: PanelAction,
    session: &mut CharacterSession,
    host: &mut dyn HostScene,
) -> msb_bridge::Result<ObjectId> {
    match action {
        PanelAction::Insert { rom_path, config } => {
            session.set_config(config);
            session.insert(host, &rom_path)
        }
    }
}
