use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Vec3};

/// Horizontal heading of a direction, measured from +Z towards +X.
pub fn azimuth(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Wrap an angle into `(-π, π]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Camera state read once per frame by the gaze tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Unit vector from the camera towards its target.
    pub forward: Vec3,
    /// Elevation angle from the up axis; `π/2` looks level.
    pub beta: f32,
    /// Azimuth the camera faced when it was created.
    pub baseline_azimuth: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct CameraProjection {
    pub aspect: Option<f32>,
    pub yfov: f32,
    pub znear: f32,
    pub zfar: Option<f32>,
}

impl Default for CameraProjection {
    fn default() -> Self {
        Self {
            aspect: None,
            yfov: 75.0,
            znear: 0.01,
            zfar: None,
        }
    }
}

impl CameraProjection {
    pub fn matrix(&self, default_aspect: f32) -> Mat4 {
        let aspect = self.aspect.unwrap_or(default_aspect);
        if let Some(zfar) = self.zfar {
            Mat4::perspective_rh(self.yfov.to_radians(), aspect, self.znear, zfar)
        } else {
            Mat4::perspective_infinite_rh(self.yfov.to_radians(), aspect, self.znear)
        }
    }
}

/// Orbit camera around the panorama centre.
///
/// `alpha` is the longitude and `beta` the latitude measured from the up
/// axis, so the camera sits at
/// `target + radius * (cos α sin β, cos β, sin α sin β)`.
#[derive(Debug, Clone)]
pub struct StageCamera {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub target: Vec3,
    pub lower_beta_limit: f32,
    pub upper_beta_limit: f32,
    pub projection: CameraProjection,
    default_azimuth: f32,
}

impl Default for StageCamera {
    fn default() -> Self {
        Self::new(-FRAC_PI_2, FRAC_PI_2, 2.0, Vec3::new(0.0, 1.4, 0.0))
    }
}

impl StageCamera {
    pub fn new(alpha: f32, beta: f32, radius: f32, target: Vec3) -> Self {
        let mut camera = Self {
            alpha,
            beta,
            radius,
            target,
            lower_beta_limit: 0.01,
            upper_beta_limit: PI - 0.01,
            projection: CameraProjection::default(),
            default_azimuth: 0.0,
        };
        camera.beta = camera.clamp_beta(beta);
        camera.default_azimuth = azimuth(camera.forward());
        camera
    }

    fn clamp_beta(&self, beta: f32) -> f32 {
        beta.clamp(self.lower_beta_limit, self.upper_beta_limit)
    }

    pub fn position(&self) -> Vec3 {
        let (sin_alpha, cos_alpha) = self.alpha.sin_cos();
        let (sin_beta, cos_beta) = self.beta.sin_cos();
        self.target + self.radius * Vec3::new(cos_alpha * sin_beta, cos_beta, sin_alpha * sin_beta)
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize_or_zero()
    }

    /// Azimuth captured at construction. Later orbits don't move it.
    pub fn default_azimuth(&self) -> f32 {
        self.default_azimuth
    }

    pub fn orbit(&mut self, delta_alpha: f32, delta_beta: f32) {
        self.alpha = wrap_angle(self.alpha + delta_alpha);
        self.beta = self.clamp_beta(self.beta + delta_beta);
    }

    pub fn set_beta(&mut self, beta: f32) {
        self.beta = self.clamp_beta(beta);
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            forward: self.forward(),
            beta: self.beta,
            baseline_azimuth: self.default_azimuth,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn matrix(&self, default_aspect: f32) -> Mat4 {
        self.projection.matrix(default_aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn default_camera_looks_down_z() {
        let camera = StageCamera::default();
        assert!((camera.position() - Vec3::new(0.0, 1.4, -2.0)).length() < EPSILON);
        assert!((camera.forward() - Vec3::Z).length() < EPSILON);
        assert!(camera.default_azimuth().abs() < EPSILON);
    }

    #[test]
    fn baseline_survives_orbit() {
        let mut camera = StageCamera::new(0.3, 1.2, 3.0, Vec3::ZERO);
        let baseline = camera.default_azimuth();
        camera.orbit(1.0, 0.2);
        assert_eq!(camera.default_azimuth(), baseline);
        assert_eq!(camera.pose().baseline_azimuth, baseline);
        assert!((azimuth(camera.forward()) - baseline).abs() > 0.5);
    }

    #[test]
    fn beta_is_clamped() {
        let mut camera = StageCamera::default();
        camera.orbit(0.0, 10.0);
        assert_eq!(camera.beta, camera.upper_beta_limit);
        camera.set_beta(-1.0);
        assert_eq!(camera.beta, camera.lower_beta_limit);
    }

    #[test]
    fn wrap_angle_range() {
        assert!((wrap_angle(3.0 * PI - 0.5) - (PI - 0.5)).abs() < 1e-4);
        assert!((wrap_angle(-PI) - PI).abs() < EPSILON);
        assert!((wrap_angle(-FRAC_PI_2) + FRAC_PI_2).abs() < EPSILON);
        assert!((wrap_angle(TAU + 0.25) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn view_matrix_moves_target_in_front() {
        let camera = StageCamera::default();
        let target = camera.view_matrix().transform_point3(camera.target);
        assert!(target.z < 0.0);
        assert!(target.x.abs() < EPSILON && target.y.abs() < EPSILON);
    }
}
