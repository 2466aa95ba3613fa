//! Static collision export: tagged host meshes -> flat simulation surfaces.
//!
//! Export is all-or-nothing. Every tag and index is checked while the buffer
//! is built, and the buffer is only handed to the library once the whole scene
//! has been converted, so a bad tag never leaves a partial terrain uploaded.
//!
//! Coordinates go through `SimSpace` and are truncated to `i16`. Components
//! outside the representable range are clamped; a triangle with any vertex
//! outside the range on all three axes is dropped, since clamping it would
//! fold a distant triangle onto the edge of the world.

use msb_core::transform::SimSpace;
use msb_native::Surface;

use crate::error::{BridgeError, Result};
use crate::host::MeshRef;
use crate::surface::{SurfaceType, TerrainType};

const AXIS_BOUND: f32 = 0x7FFF as f32;

/// Immutable collision terrain ready for upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionBuffer {
    surfaces: Vec<Surface>,
    dropped: usize,
}

impl CollisionBuffer {
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Triangles skipped because they lay outside the simulation range.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// The exact bytes the library receives.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.surfaces)
    }
}

pub fn export_collision(meshes: &[MeshRef], space: &SimSpace) -> Result<CollisionBuffer> {
    let mut surfaces = Vec::new();
    let mut dropped = 0usize;

    for mesh in meshes {
        let terrain = match &mesh.terrain_tag {
            Some(tag) => TerrainType::from_tag(tag).ok_or_else(|| BridgeError::GeometryExport {
                object: mesh.object.clone(),
                reason: format!("unknown terrain type '{tag}'"),
            })?,
            None => TerrainType::Grass,
        };

        let mut material_codes = Vec::with_capacity(mesh.material_tags.len());
        for (slot, tag) in mesh.material_tags.iter().enumerate() {
            let code = match tag {
                Some(tag) => SurfaceType::from_tag(tag).ok_or_else(|| {
                    BridgeError::GeometryExport {
                        object: mesh.object.clone(),
                        reason: format!("unknown surface type '{tag}' on material slot {slot}"),
                    }
                })?,
                None => SurfaceType::Default,
            };
            material_codes.push(code);
        }

        for (tri_index, tri) in mesh.triangles.iter().enumerate() {
            let mut vertices = [[0i16; 3]; 3];
            let mut vertex_outside = false;
            for (corner, &vertex_index) in tri.indices.iter().enumerate() {
                let local = mesh.positions.get(vertex_index as usize).ok_or_else(|| {
                    BridgeError::GeometryExport {
                        object: mesh.object.clone(),
                        reason: format!(
                            "triangle {tri_index} references vertex {vertex_index} but the mesh has {}",
                            mesh.positions.len()
                        ),
                    }
                })?;
                let sim = space.to_sim_point(mesh.world.transform_point3(*local));
                let (x, in_x) = clamp_axis(sim.x);
                let (y, in_y) = clamp_axis(sim.y);
                let (z, in_z) = clamp_axis(sim.z);
                vertices[corner] = [x, y, z];
                if !in_x && !in_y && !in_z {
                    vertex_outside = true;
                }
            }

            if vertex_outside {
                dropped += 1;
                continue;
            }

            let surface_type = material_codes
                .get(tri.material)
                .copied()
                .unwrap_or(SurfaceType::Default);
            surfaces.push(Surface {
                surface_type: surface_type.code(),
                force: 0,
                terrain: terrain.code(),
                vertices,
            });
        }
    }

    log::info!(
        "Exported {} collision triangles from {} meshes ({} outside range)",
        surfaces.len(),
        meshes.len(),
        dropped
    );
    Ok(CollisionBuffer { surfaces, dropped })
}

/// Truncates toward zero and clamps to the symmetric `i16` range. The flag is
/// false when clamping changed the value.
fn clamp_axis(value: f32) -> (i16, bool) {
    if !value.is_finite() {
        return (0, false);
    }
    let v = value.trunc();
    if v < -AXIS_BOUND {
        (-0x7FFF, false)
    } else if v > AXIS_BOUND {
        (0x7FFF, false)
    } else {
        (v as i16, true)
    }
}
