//! Writes one frame's pose into the host scene.

use crate::host::{HostScene, ObjectId};
use crate::step::PoseResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub parts_written: usize,
    pub parts_missing: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PoseWriter {
    pub camera_follow: bool,
}

impl PoseWriter {
    pub fn new(camera_follow: bool) -> Self {
        Self { camera_follow }
    }

    /// Root first, then parts matched by exact object name among the root's
    /// descendants. A part the rig does not have is skipped. Exactly one redraw is requested.
    pub fn apply(&self, host: &mut dyn HostScene, root: ObjectId, pose: &PoseResult) -> WriteReport {
        host.set_world_transform(root, pose.root);

        let mut report = WriteReport::default();
        for part in &pose.parts {
            match host.child_by_name(root, &part.name) {
                Some(object) => {
                    host.set_local_transform(object, part.local);
                    report.parts_written += 1;
                }
                None => {
                    log::trace!("Rig has no part named '{}'", part.name);
                    report.parts_missing += 1;
                }
            }
        }

        if let Some(mesh) = &pose.mesh {
            host.write_mesh(root, mesh);
        }
        if self.camera_follow {
            host.focus_view(pose.root.translation);
        }
        host.request_redraw();
        report
    }
}
