//! Test doubles for the simulation library and game controllers.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec3;
use msb_native::{
    CharacterFrame, CharacterHandle, CharacterInput, GeometryFrame, HandleArena, NativeError,
    SimPartPose, SimulationLibrary, Surface, TextureAtlas,
};

use crate::poller::{GamepadSource, PadState};

/// Everything the fake saw, shared so a test can keep inspecting it after the
/// fake has been boxed into a session.
#[derive(Debug, Default)]
pub struct FakeLog {
    pub init_calls: usize,
    pub terminate_calls: usize,
    pub uploads: Vec<Vec<u8>>,
    pub created: usize,
    pub steps: usize,
    pub destroyed: usize,
    pub last_input: Option<CharacterInput>,
    pub parts: Vec<SimPartPose>,
    pub fail_create: bool,
}

pub struct FakeSimulation {
    log: Rc<RefCell<FakeLog>>,
    initialized: bool,
    characters: HandleArena<Vec3>,
}

impl FakeSimulation {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(FakeLog::default())),
            initialized: false,
            characters: HandleArena::new(),
        }
    }

    pub fn log(&self) -> Rc<RefCell<FakeLog>> {
        Rc::clone(&self.log)
    }
}

impl SimulationLibrary for FakeSimulation {
    fn global_init(&mut self, _rom: &[u8]) -> Result<TextureAtlas, NativeError> {
        if self.initialized {
            return Err(NativeError::AlreadyInitialized);
        }
        self.initialized = true;
        self.log.borrow_mut().init_calls += 1;
        Ok(TextureAtlas {
            width: 4,
            height: 2,
            rgba: vec![255; 4 * 4 * 2],
        })
    }

    fn global_terminate(&mut self) -> Result<(), NativeError> {
        if !self.initialized {
            return Err(NativeError::NotInitialized);
        }
        let leaked = self.characters.drain().len();
        let mut log = self.log.borrow_mut();
        log.destroyed += leaked;
        log.terminate_calls += 1;
        self.initialized = false;
        Ok(())
    }

    fn load_static_collision(&mut self, surfaces: &[Surface]) -> Result<(), NativeError> {
        if !self.initialized {
            return Err(NativeError::NotInitialized);
        }
        self.log
            .borrow_mut()
            .uploads
            .push(bytemuck::cast_slice(surfaces).to_vec());
        Ok(())
    }

    fn create_character(&mut self, position: [i16; 3]) -> Result<CharacterHandle, NativeError> {
        if !self.initialized {
            return Err(NativeError::NotInitialized);
        }
        let mut log = self.log.borrow_mut();
        if log.fail_create || log.uploads.is_empty() {
            return Err(NativeError::CreateFailed(position));
        }
        log.created += 1;
        Ok(self.characters.insert(Vec3::new(
            position[0] as f32,
            position[1] as f32,
            position[2] as f32,
        )))
    }

    fn step_character(
        &mut self,
        handle: CharacterHandle,
        input: &CharacterInput,
        _dt: f32,
        with_full_geometry: bool,
    ) -> Result<CharacterFrame, NativeError> {
        let position = self
            .characters
            .get_mut(handle)
            .ok_or(NativeError::StaleHandle(handle))?;
        let velocity = Vec3::new(input.stick_x, 0.0, input.stick_y) * 10.0;
        *position += velocity;

        let mut log = self.log.borrow_mut();
        log.steps += 1;
        log.last_input = Some(*input);

        let p = position.to_array();
        let positions = vec![p, [p[0] + 1.0, p[1], p[2]], [p[0], p[1] + 1.0, p[2]]];
        Ok(CharacterFrame {
            position: *position,
            velocity,
            face_angle: 0.0,
            health: 0x880,
            parts: log.parts.clone(),
            geometry: Some(GeometryFrame {
                normals: vec![[0.0, 1.0, 0.0]; 3],
                colors: if with_full_geometry {
                    vec![[1.0, 0.0, 0.0]; 3]
                } else {
                    Vec::new()
                },
                uvs: if with_full_geometry {
                    vec![[0.0, 0.0]; 3]
                } else {
                    Vec::new()
                },
                positions,
            }),
        })
    }

    fn destroy_character(&mut self, handle: CharacterHandle) -> Result<(), NativeError> {
        self.characters
            .remove(handle)
            .ok_or(NativeError::StaleHandle(handle))?;
        self.log.borrow_mut().destroyed += 1;
        Ok(())
    }
}

/// Plays back a fixed list of samples, then reports zero input.
pub struct ScriptedGamepad {
    samples: VecDeque<Option<PadState>>,
}

impl ScriptedGamepad {
    pub fn new(samples: Vec<Option<PadState>>) -> Self {
        Self {
            samples: samples.into(),
        }
    }
}

impl GamepadSource for ScriptedGamepad {
    fn name(&self) -> &str {
        "scripted"
    }

    fn sample(&mut self) -> Option<PadState> {
        self.samples
            .pop_front()
            .unwrap_or(Some(PadState::default()))
    }
}
