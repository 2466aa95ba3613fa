//! Character lifecycle: insertion, per-frame ticks, teardown.
//!
//! ```text
//! Uninitialized --insert--> Inserted --tick--> Running
//!       ^                      |                  |
//!       |                      +----teardown------+--> TornDown --insert--> Inserted
//!       +-- insert failed (state unchanged)
//! ```
//!
//! Insertion does all of its fallible host-side work (ROM validation,
//! collision export) before the first native call, so a bad ROM or tag never
//! leaves the library half set up. A session owns at most one character and
//! one initialised library at a time; inserting again replaces the character.

use std::path::Path;

use glam::Vec3;
use msb_core::config::BridgeConfig;
use msb_core::time::FrameStats;
use msb_core::transform::SimSpace;
use msb_native::{CharacterHandle, NativeError, SimulationLibrary, TextureAtlas};

use crate::asset::{load_rom, RomValidator};
use crate::error::{BridgeError, Result};
use crate::geometry::{export_collision, CollisionBuffer};
use crate::host::{HostScene, ObjectId};
use crate::poller::InputPoller;
use crate::pose::{PoseWriter, WriteReport};
use crate::step::{PoseResult, StepDriver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterState {
    Uninitialized,
    Inserted,
    Running,
    TornDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No live character.
    Idle,
    /// The character object disappeared from the scene and was torn down.
    Removed,
    Stepped(WriteReport),
}

struct LiveCharacter {
    handle: CharacterHandle,
    object: ObjectId,
    driver: StepDriver,
    saved_frame_rate: u32,
}

pub struct CharacterSession {
    config: BridgeConfig,
    library: Box<dyn SimulationLibrary>,
    poller: InputPoller,
    validator: RomValidator,
    writer: PoseWriter,
    state: CharacterState,
    library_live: bool,
    live: Option<LiveCharacter>,
    spawn_point: Option<Vec3>,
    texture: Option<TextureAtlas>,
    collision: Option<CollisionBuffer>,
    last_pose: Option<PoseResult>,
    stats: FrameStats,
}

impl CharacterSession {
    pub fn new(
        config: BridgeConfig,
        library: Box<dyn SimulationLibrary>,
        poller: InputPoller,
    ) -> Self {
        Self {
            writer: PoseWriter::new(config.camera_follow),
            stats: FrameStats::new(config.tick_rate),
            config,
            library,
            poller,
            validator: RomValidator::us(),
            state: CharacterState::Uninitialized,
            library_live: false,
            live: None,
            spawn_point: None,
            texture: None,
            collision: None,
            last_pose: None,
        }
    }

    pub fn with_rom_validator(mut self, validator: RomValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Takes effect on the next insertion; camera follow applies at once.
    pub fn set_config(&mut self, config: BridgeConfig) {
        self.writer = PoseWriter::new(config.camera_follow);
        self.config = config;
    }

    pub fn state(&self) -> CharacterState {
        self.state
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn handle(&self) -> Option<CharacterHandle> {
        self.live.as_ref().map(|live| live.handle)
    }

    pub fn object(&self) -> Option<ObjectId> {
        self.live.as_ref().map(|live| live.object)
    }

    pub fn spawn_point(&self) -> Option<Vec3> {
        self.spawn_point
    }

    pub fn texture(&self) -> Option<&TextureAtlas> {
        self.texture.as_ref()
    }

    pub fn collision(&self) -> Option<&CollisionBuffer> {
        self.collision.as_ref()
    }

    pub fn last_pose(&self) -> Option<&PoseResult> {
        self.last_pose.as_ref()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn using_gamepad(&self) -> bool {
        self.poller.using_gamepad()
    }

    /// Inserts a character at the host spawn point. Replaces any character
    /// this session already owns.
    pub fn insert(&mut self, host: &mut dyn HostScene, rom_path: &Path) -> Result<ObjectId> {
        self.config.validate().map_err(BridgeError::Config)?;

        let rom = load_rom(rom_path, &self.validator)?;
        let spawn = host.spawn_point();
        let space = SimSpace::new(spawn, self.config.scale_factor);
        let collision = export_collision(&host.tagged_meshes(), &space)?;

        if self.live.is_some() || self.library_live {
            log::info!("Replacing the existing character");
            self.teardown(host);
        }
        if let Some(stale) = host.object_by_name(&self.config.character_name) {
            host.remove_object(stale);
        }

        let texture = self.library.global_init(rom.bytes())?;
        self.library_live = true;

        if let Err(err) = self.library.load_static_collision(collision.surfaces()) {
            self.shutdown_library();
            return Err(err.into());
        }

        // The character starts at the simulation origin, which is the spawn
        // point in host space.
        let handle = match self.library.create_character([0, 0, 0]) {
            Ok(handle) => handle,
            Err(NativeError::CreateFailed(_)) => {
                log::warn!("No ground under spawn point {spawn}");
                self.shutdown_library();
                return Err(BridgeError::NoGroundAtSpawn);
            }
            Err(err) => {
                self.shutdown_library();
                return Err(err.into());
            }
        };

        let object = host.create_object(&self.config.character_name);
        let saved_frame_rate = host.frame_rate();
        host.set_frame_rate(self.config.tick_rate);

        log::info!(
            "Inserted '{}' as {} at {} ({} collision triangles)",
            self.config.character_name,
            handle,
            spawn,
            collision.len()
        );

        self.live = Some(LiveCharacter {
            handle,
            object,
            driver: StepDriver::new(space, self.config.dead_zone),
            saved_frame_rate,
        });
        self.spawn_point = Some(spawn);
        self.texture = Some(texture);
        self.collision = Some(collision);
        self.last_pose = None;
        self.stats = FrameStats::new(self.config.tick_rate);
        self.state = CharacterState::Inserted;
        Ok(object)
    }

    /// One host frame: poll, step, write. `dt` is the host frame interval in
    /// seconds and is forwarded as is.
    pub fn tick(&mut self, host: &mut dyn HostScene, dt: f64) -> Result<TickOutcome> {
        let Some(live) = self.live.as_mut() else {
            return Ok(TickOutcome::Idle);
        };
        let object = live.object;
        let handle = live.handle;

        if !host.object_exists(object) {
            log::info!("Character object was removed from the scene");
            self.teardown(host);
            return Ok(TickOutcome::Removed);
        }

        let dt = self.stats.record(dt);
        let input = self.poller.poll(host.keyboard());
        let view = host.view_direction();
        let stepped = live
            .driver
            .step(self.library.as_mut(), handle, &input, view, dt as f32);
        let pose = match stepped {
            Ok(pose) => pose,
            Err(err) => {
                log::error!("Simulation step failed, removing character: {err}");
                self.teardown(host);
                return Err(err);
            }
        };

        let report = self.writer.apply(host, object, &pose);
        self.last_pose = Some(pose);
        self.state = CharacterState::Running;
        Ok(TickOutcome::Stepped(report))
    }

    /// Releases the character and the library and restores the host frame
    /// rate. The host object itself is left alone.
    pub fn teardown(&mut self, host: &mut dyn HostScene) {
        if let Some(live) = self.live.take() {
            if let Err(err) = self.library.destroy_character(live.handle) {
                log::warn!("Failed to destroy character {}: {err}", live.handle);
            }
            host.set_frame_rate(live.saved_frame_rate);
        }
        self.shutdown_library();
        if self.state != CharacterState::Uninitialized {
            self.state = CharacterState::TornDown;
        }
    }

    fn shutdown_library(&mut self) {
        if !self.library_live {
            return;
        }
        self.library_live = false;
        if let Err(err) = self.library.global_terminate() {
            log::warn!("Failed to terminate simulation library: {err}");
        }
    }
}

impl Drop for CharacterSession {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            if let Err(err) = self.library.destroy_character(live.handle) {
                log::warn!("Failed to destroy character {}: {err}", live.handle);
            }
        }
        self.shutdown_library();
    }
}
