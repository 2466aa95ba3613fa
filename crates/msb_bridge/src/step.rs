//! One simulation step per host frame.
//!
//! The host interval is passed straight through: no accumulator and no
//! sub-stepping. The library's own output is converted from simulation space
//! into host space here so the pose writer only deals with host transforms.

use glam::Vec3;
use msb_core::input::InputRecord;
use msb_core::transform::{SimSpace, Transform};
use msb_native::{CharacterFrame, CharacterHandle, CharacterInput, SimulationLibrary};
use serde::Serialize;

use crate::error::Result;
use crate::host::MeshFrame;

/// Ticks that request colours and UVs along with positions. Later ticks
/// refresh positions only.
pub const FULL_MESH_TICKS: u64 = 15;

/// The library reports velocity per tick at this fixed rate.
const LIBRARY_TICK_RATE: f32 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartPose {
    pub name: String,
    pub local: Transform,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoseResult {
    pub root: Transform,
    pub parts: Vec<PartPose>,
    pub mesh: Option<MeshFrame>,
    /// Host units per second.
    pub velocity: Vec3,
    pub health: i16,
}

pub struct StepDriver {
    space: SimSpace,
    dead_zone: f32,
    ticks: u64,
}

impl StepDriver {
    pub fn new(space: SimSpace, dead_zone: f32) -> Self {
        Self {
            space,
            dead_zone,
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn step(
        &mut self,
        lib: &mut dyn SimulationLibrary,
        handle: CharacterHandle,
        input: &InputRecord,
        view_direction: Vec3,
        dt: f32,
    ) -> Result<PoseResult> {
        let full_mesh = self.ticks < FULL_MESH_TICKS;
        let native_input = self.to_native_input(input, view_direction);
        let frame = lib.step_character(handle, &native_input, dt, full_mesh)?;
        self.ticks += 1;
        log::trace!(
            "Step {} for {}: sim position {:?}",
            self.ticks,
            handle,
            frame.position
        );
        Ok(self.to_pose(frame))
    }

    fn to_native_input(&self, input: &InputRecord, view: Vec3) -> CharacterInput {
        let (stick_x, stick_y) = input.stick_unit(self.dead_zone);
        CharacterInput {
            // Host viewport forward, projected onto the simulation ground plane.
            cam_look_x: view.x,
            cam_look_z: -view.y,
            stick_x,
            stick_y,
            button_a: input.jump,
            button_b: input.punch,
            button_z: input.target,
        }
    }

    fn to_pose(&self, frame: CharacterFrame) -> PoseResult {
        let space = &self.space;
        let root = Transform::from_translation_rotation(
            space.to_host_point(frame.position),
            space.yaw_to_host_rotation(frame.face_angle),
        );
        let parts = frame
            .parts
            .into_iter()
            .map(|part| PartPose {
                name: part.name,
                local: space.to_host_local(part.local),
            })
            .collect();
        let mesh = frame.geometry.map(|geometry| MeshFrame {
            positions: geometry
                .positions
                .iter()
                .map(|p| space.to_host_point(Vec3::from_array(*p)))
                .collect(),
            colors: geometry.colors,
            uvs: geometry.uvs,
        });
        PoseResult {
            root,
            parts,
            mesh,
            velocity: space.to_host_vector(frame.velocity) * LIBRARY_TICK_RATE,
            health: frame.health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSimulation;
    use msb_core::input::AXIS_MAX;

    fn setup() -> (FakeSimulation, CharacterHandle) {
        let mut lib = FakeSimulation::new();
        lib.global_init(&[0u8; 16]).expect("init");
        lib.load_static_collision(&[msb_native::Surface::default()])
            .expect("collision");
        let handle = lib.create_character([0, 0, 0]).expect("create");
        (lib, handle)
    }

    #[test]
    fn zero_input_keeps_root_at_origin() {
        let (mut lib, handle) = setup();
        let origin = Vec3::new(4.0, -1.0, 2.0);
        let mut driver = StepDriver::new(SimSpace::new(origin, 50.0), 0.2);
        let pose = driver
            .step(&mut lib, handle, &InputRecord::default(), Vec3::Y, 1.0 / 30.0)
            .expect("step");
        assert!((pose.root.translation - origin).length() < 1e-5);
        assert_eq!(driver.ticks(), 1);
    }

    #[test]
    fn mesh_is_full_then_positions_only() {
        let (mut lib, handle) = setup();
        let mut driver = StepDriver::new(SimSpace::new(Vec3::ZERO, 50.0), 0.2);
        let mut last = None;
        for _ in 0..FULL_MESH_TICKS {
            last = driver
                .step(&mut lib, handle, &InputRecord::default(), Vec3::Y, 1.0 / 30.0)
                .expect("step")
                .mesh;
        }
        assert!(!last.expect("mesh").colors.is_empty());
        let later = driver
            .step(&mut lib, handle, &InputRecord::default(), Vec3::Y, 1.0 / 30.0)
            .expect("step")
            .mesh
            .expect("mesh");
        assert!(later.colors.is_empty());
        assert!(!later.positions.is_empty());
    }

    #[test]
    fn input_is_converted_with_dead_zone_and_camera() {
        let (mut lib, handle) = setup();
        let log = lib.log();
        let mut driver = StepDriver::new(SimSpace::new(Vec3::ZERO, 50.0), 0.2);
        let input = InputRecord {
            stick_x: AXIS_MAX,
            stick_y: 100,
            jump: true,
            ..InputRecord::default()
        };
        driver
            .step(&mut lib, handle, &input, Vec3::new(0.0, 1.0, 0.0), 1.0 / 30.0)
            .expect("step");
        let sent = log.borrow().last_input.expect("input recorded");
        assert!((sent.stick_x - 1.0).abs() < 1e-3);
        assert_eq!(sent.stick_y, 0.0);
        assert!(sent.button_a && !sent.button_b);
        assert_eq!(sent.cam_look_x, 0.0);
        assert_eq!(sent.cam_look_z, -1.0);
    }

    #[test]
    fn stale_handle_fails() {
        let (mut lib, handle) = setup();
        lib.destroy_character(handle).expect("destroy");
        let mut driver = StepDriver::new(SimSpace::new(Vec3::ZERO, 50.0), 0.2);
        let err = driver
            .step(&mut lib, handle, &InputRecord::default(), Vec3::Y, 1.0 / 30.0)
            .expect_err("stale handle");
        assert!(matches!(err, crate::BridgeError::Native(_)));
        assert_eq!(driver.ticks(), 0);
    }

    #[test]
    fn parts_are_converted_to_host_space() {
        let (mut lib, handle) = setup();
        lib.log().borrow_mut().parts = vec![msb_native::SimPartPose {
            name: "head".to_string(),
            local: Transform::from_translation_rotation(
                Vec3::new(0.0, 50.0, 0.0),
                glam::Quat::IDENTITY,
            ),
        }];
        let mut driver = StepDriver::new(SimSpace::new(Vec3::ZERO, 50.0), 0.2);
        let pose = driver
            .step(&mut lib, handle, &InputRecord::default(), Vec3::Y, 1.0 / 30.0)
            .expect("step");
        assert_eq!(pose.parts.len(), 1);
        assert!((pose.parts[0].local.translation - Vec3::Z).length() < 1e-5);
    }
}
