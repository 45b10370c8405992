use std::f32::consts::FRAC_PI_2;

use crate::stage::{
    camera::{azimuth, wrap_angle, CameraPose},
    scene::BoneTarget,
    FrameContext,
};

use super::bone::BoneRig;

/// Eye target looking back at the camera.
///
/// Half the camera elevation becomes pitch, and the heading relative to the
/// baseline becomes yaw, mirrored because the character faces the camera.
pub fn eye_target(camera: &CameraPose) -> BoneTarget {
    BoneTarget {
        pitch: (camera.beta - FRAC_PI_2) / 2.0,
        yaw: -wrap_angle(azimuth(camera.forward) - camera.baseline_azimuth),
        roll: 0.0,
    }
}

/// Feeds the eye target once per rendered frame.
#[derive(Debug, Default)]
pub struct GazeTracker {
    last_frame: Option<u64>,
}

impl GazeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the written target, or `None` when this frame was already
    /// tracked.
    pub fn update(&mut self, frame: &FrameContext, rig: &mut BoneRig) -> Option<BoneTarget> {
        if self.last_frame == Some(frame.index) {
            return None;
        }
        self.last_frame = Some(frame.index);
        let target = eye_target(&frame.camera);
        rig.set_eye_target(target.pitch, target.yaw, target.roll);
        Some(target)
    }

    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glam::Vec3;

    use super::*;
    use crate::stage::camera::StageCamera;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn baseline_pose_looks_straight() {
        let camera = StageCamera::default();
        let target = eye_target(&camera.pose());
        assert!(target.pitch.abs() < EPSILON);
        assert!(target.yaw.abs() < EPSILON);
        assert_eq!(target.roll, 0.0);
    }

    #[test]
    fn pitch_is_half_the_elevation_offset() {
        let mut camera = StageCamera::default();
        for delta in [-0.6f32, -0.1, 0.3, 0.9] {
            camera.set_beta(FRAC_PI_2 + delta);
            let target = eye_target(&camera.pose());
            assert!((target.pitch - delta / 2.0).abs() < EPSILON);
            // Elevation alone doesn't turn the head.
            assert!(target.yaw.abs() < EPSILON);
        }
    }

    #[test]
    fn yaw_mirrors_the_heading() {
        let pose = CameraPose {
            forward: Vec3::new(1.0, 0.0, 1.0).normalize(),
            beta: FRAC_PI_2,
            baseline_azimuth: 0.0,
        };
        let target = eye_target(&pose);
        assert!((target.yaw + std::f32::consts::FRAC_PI_4).abs() < EPSILON);

        let baseline = CameraPose {
            baseline_azimuth: std::f32::consts::FRAC_PI_4,
            ..pose
        };
        assert!(eye_target(&baseline).yaw.abs() < EPSILON);
    }

    #[test]
    fn yaw_wraps_around_behind() {
        let pose = CameraPose {
            forward: Vec3::new(-0.1, 0.0, -1.0).normalize(),
            beta: FRAC_PI_2,
            baseline_azimuth: 3.0,
        };
        let yaw = eye_target(&pose).yaw;
        assert!(yaw.abs() <= std::f32::consts::PI);
        assert!(yaw.abs() < 0.5);
    }

    #[test]
    fn tracks_once_per_frame() {
        let mut tracker = GazeTracker::new();
        let mut rig = BoneRig::new();
        let frame = FrameContext {
            index: 1,
            delta: Duration::from_millis(16),
            camera: StageCamera::default().pose(),
        };
        assert!(tracker.update(&frame, &mut rig).is_some());
        assert!(tracker.update(&frame, &mut rig).is_none());
        let next = FrameContext { index: 2, ..frame };
        assert!(tracker.update(&next, &mut rig).is_some());
        assert_eq!(tracker.last_frame(), Some(2));
    }
}
