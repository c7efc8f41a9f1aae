use glam::{Mat3, Mat4, Vec3};
use lumi_common::{CameraMovement, CameraSettings};

const MIN_ZOOM: f32 = 1.0;
const MAX_ZOOM: f32 = 45.0;
const PITCH_LIMIT: f32 = 89.0;

/// Fly camera driven by Euler angles.
///
/// Yaw and pitch are stored in degrees; `zoom` is the vertical field of view
/// in degrees and is what the scroll wheel changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub world_up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub speed: f32,
    pub sensitivity: f32,
    pub zoom: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}

impl Camera {
    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            position: settings.position,
            world_up: Vec3::Y,
            yaw: settings.yaw,
            pitch: settings.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            speed: settings.speed,
            sensitivity: settings.sensitivity,
            zoom: settings.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            near: settings.near,
            far: settings.far,
        }
    }

    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(self.world_up).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.front()).normalize()
    }

    /// Move along the camera axes; up/down follow the world up vector.
    pub fn process_keyboard(&mut self, direction: CameraMovement, dt: f32) {
        let velocity = self.speed * dt;
        let delta = match direction {
            CameraMovement::Forward => self.front(),
            CameraMovement::Backward => -self.front(),
            CameraMovement::Left => -self.right(),
            CameraMovement::Right => self.right(),
            CameraMovement::Up => self.world_up,
            CameraMovement::Down => -self.world_up,
        };
        self.position += delta * velocity;
    }

    /// Offsets are in screen units with y pointing up.
    pub fn process_mouse_movement(&mut self, dx: f32, dy: f32, constrain_pitch: bool) {
        self.yaw += dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
    }

    pub fn process_mouse_scroll(&mut self, dy: f32) {
        self.zoom = (self.zoom - dy).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), self.up())
    }

    /// View matrix with the translation removed, for drawing the skybox.
    pub fn rotation_only_view(&self) -> Mat4 {
        Mat4::from_mat3(Mat3::from_mat4(self.view_matrix()))
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.zoom.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let cam = Camera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 3.0));
        assert!(approx(cam.front(), Vec3::NEG_Z));
        assert!(approx(cam.right(), Vec3::X));
        assert!(approx(cam.up(), Vec3::Y));
        let vp = cam.view_projection(16.0 / 9.0);
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn keyboard_moves_by_speed_times_dt() {
        let mut cam = Camera::default();
        cam.process_keyboard(CameraMovement::Forward, 1.0);
        assert!(approx(cam.position, Vec3::new(0.0, 0.0, 0.5)));
        cam.process_keyboard(CameraMovement::Right, 2.0);
        assert!(approx(cam.position, Vec3::new(5.0, 0.0, 0.5)));
        cam.process_keyboard(CameraMovement::Up, 0.4);
        assert!(approx(cam.position, Vec3::new(5.0, 1.0, 0.5)));
    }

    #[test]
    fn opposite_moves_cancel() {
        let mut cam = Camera::default();
        let start = cam.position;
        cam.process_keyboard(CameraMovement::Left, 0.3);
        cam.process_keyboard(CameraMovement::Right, 0.3);
        cam.process_keyboard(CameraMovement::Down, 0.3);
        cam.process_keyboard(CameraMovement::Up, 0.3);
        assert!(approx(cam.position, start));
    }

    #[test]
    fn pitch_is_constrained() {
        let mut cam = Camera::default();
        cam.process_mouse_movement(0.0, 10_000.0, true);
        assert_eq!(cam.pitch, 89.0);
        cam.process_mouse_movement(0.0, -20_000.0, true);
        assert_eq!(cam.pitch, -89.0);

        cam.process_mouse_movement(0.0, -1_000.0, false);
        assert!(cam.pitch < -89.0);
    }

    #[test]
    fn mouse_movement_scales_by_sensitivity() {
        let mut cam = Camera::default();
        cam.process_mouse_movement(100.0, 0.0, true);
        assert!((cam.yaw - -80.0).abs() < 1e-4);
    }

    #[test]
    fn scroll_clamps_zoom() {
        let mut cam = Camera::default();
        cam.process_mouse_scroll(10.0);
        assert_eq!(cam.zoom, 35.0);
        cam.process_mouse_scroll(100.0);
        assert_eq!(cam.zoom, 1.0);
        cam.process_mouse_scroll(-100.0);
        assert_eq!(cam.zoom, 45.0);
    }

    #[test]
    fn rotation_only_view_drops_translation() {
        let mut cam = Camera::default();
        cam.position = Vec3::new(10.0, -4.0, 7.0);
        let view = cam.rotation_only_view();
        assert_eq!(view.w_axis, glam::Vec4::W);
        assert_eq!(view.transform_point3(Vec3::ZERO), Vec3::ZERO);
    }
}
