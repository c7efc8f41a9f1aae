use glam::{Mat4, Vec3};
use lumi_common::ShadowSettings;

/// A shadow-casting light, orthographic unless `perspective` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalShadow {
    pub position: Vec3,
    pub target: Vec3,
    pub extent: f32,
    pub near: f32,
    pub far: f32,
    pub perspective: bool,
    pub fov_degrees: f32,
}

impl DirectionalShadow {
    pub fn from_settings(settings: &ShadowSettings) -> Self {
        Self {
            position: settings.light_position,
            target: settings.light_target,
            extent: settings.extent,
            near: settings.near,
            far: settings.far,
            perspective: settings.perspective,
            fov_degrees: settings.fov_degrees,
        }
    }

    /// Light projection with a 0..1 depth range.
    pub fn projection(&self) -> Mat4 {
        if self.perspective {
            return Mat4::perspective_rh(self.fov_degrees.to_radians(), 1.0, self.near, self.far);
        }
        let e = self.extent;
        Mat4::orthographic_rh(-e, e, -e, e, self.near, self.far)
    }

    /// Perspective depth is non-linear and must be linearized to be readable.
    pub fn linearize_depth(&self) -> bool {
        self.perspective
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// World space to light clip space.
    pub fn light_space_matrix(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
}

impl PointLight {
    pub const fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }

    /// The four-light rig used by the PBR grid.
    pub fn pbr_rig() -> [PointLight; 4] {
        let color = Vec3::splat(300.0);
        [
            PointLight::new(Vec3::new(-11.0, 13.0, 10.0), color),
            PointLight::new(Vec3::new(-11.0, 12.0, 10.0), color),
            PointLight::new(Vec3::new(-12.0, 13.0, 10.0), color),
            PointLight::new(Vec3::new(-12.0, 12.0, 10.0), color),
        ]
    }

    /// Swing the light along x as a function of time in seconds.
    pub fn animated(self, time: f32) -> Self {
        Self {
            position: self.position + Vec3::new((time * 5.0).sin() * 5.0, 0.0, 0.0),
            ..self
        }
    }
}
