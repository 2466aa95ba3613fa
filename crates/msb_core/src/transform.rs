//! Transforms and the mapping between host space and simulation space.
//!
//! The host scene is Z-up in scene units; the simulation library is Y-up in
//! its own integer-ish units. `SimSpace` holds the origin (the spawn point in
//! host space) and the scale factor and converts in both directions:
//!
//! ```text
//! sim  = scale * (hx - ox,  hz - oz,  -(hy - oy))
//! host = origin + (sx, -sz, sy) / scale
//! ```
//!
//! Rotations change basis by a +90 degree turn about X, which carries the
//! simulation's up axis (+Y) onto the host's up axis (+Z).

use glam::{Mat4, Quat, Vec3};
use serde::Serialize;
use std::f32::consts::FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimSpace {
    pub origin: Vec3,
    pub scale: f32,
}

impl SimSpace {
    pub fn new(origin: Vec3, scale: f32) -> Self {
        Self { origin, scale }
    }

    fn basis() -> Quat {
        Quat::from_rotation_x(FRAC_PI_2)
    }

    pub fn to_sim_point(&self, host: Vec3) -> Vec3 {
        let rel = host - self.origin;
        Vec3::new(rel.x, rel.z, -rel.y) * self.scale
    }

    pub fn to_host_point(&self, sim: Vec3) -> Vec3 {
        self.origin + self.to_host_vector(sim)
    }

    /// Direction or offset conversion (no origin shift).
    pub fn to_host_vector(&self, sim: Vec3) -> Vec3 {
        Vec3::new(sim.x, -sim.z, sim.y) / self.scale
    }

    pub fn to_host_rotation(&self, sim: Quat) -> Quat {
        let basis = Self::basis();
        (basis * sim * basis.inverse()).normalize()
    }

    /// Host rotation for a simulation yaw (rotation about the sim up axis).
    pub fn yaw_to_host_rotation(&self, yaw: f32) -> Quat {
        self.to_host_rotation(Quat::from_rotation_y(yaw))
    }

    /// Converts a part-local transform expressed in simulation space.
    pub fn to_host_local(&self, sim: Transform) -> Transform {
        Transform {
            translation: self.to_host_vector(sim.translation),
            rotation: self.to_host_rotation(sim.rotation),
            scale: Vec3::new(sim.scale.x, sim.scale.z, sim.scale.y),
        }
    }
}
