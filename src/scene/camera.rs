//! Camera: a transform plus a lazily-recomputed view matrix and basis.

use glam::{Mat4, Quat, Vec3};

use super::transform::Transform;

const DEFAULT_FORWARD: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const DEFAULT_LEFT: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const WORLD_UP: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// Pitch is clamped so the angle between `forward` and `WORLD_UP` always
/// lands in `[1deg, 179deg]`: since yaw rotates around `WORLD_UP` itself it
/// cannot change that angle, and pitch alone maps to it linearly as
/// `angle = 90deg + pitch_deg`. Clamping pitch to +/-89deg keeps the angle
/// inside the required bound with one degree to spare on each side.
const MIN_PITCH_DEG: f32 = -89.0;
const MAX_PITCH_DEG: f32 = 89.0;

#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: Transform,
    yaw: f32,
    pitch: f32,

    forward: Vec3,
    left: Vec3,
    up: Vec3,
    view_matrix: Mat4,
    view_matrix_inverse: Mat4,
    dirty: bool,
}

impl Camera {
    #[must_use]
    pub fn new() -> Self {
        let mut camera = Self {
            transform: Transform::new(),
            yaw: 0.0,
            pitch: 0.0,
            forward: DEFAULT_FORWARD,
            left: DEFAULT_LEFT,
            up: WORLD_UP,
            view_matrix: Mat4::IDENTITY,
            view_matrix_inverse: Mat4::IDENTITY,
            dirty: true,
        };
        camera.recompute();
        camera
    }

    fn recompute(&mut self) {
        let rotation = Quat::from_axis_angle(WORLD_UP, self.yaw)
            * Quat::from_axis_angle(DEFAULT_LEFT, self.pitch);
        self.transform.rotation = rotation;

        self.forward = (rotation * DEFAULT_FORWARD).normalize();
        self.left = (rotation * DEFAULT_LEFT).normalize();
        self.up = self.forward.cross(self.left).normalize();

        let eye = self.transform.position;
        self.view_matrix = Mat4::look_at_rh(eye, eye + self.forward, self.up);
        self.view_matrix_inverse = self.view_matrix.inverse();
        self.dirty = false;
    }

    fn ensure_fresh(&mut self) {
        if self.dirty {
            self.recompute();
        }
    }

    pub fn view_matrix(&mut self) -> Mat4 {
        self.ensure_fresh();
        self.view_matrix
    }

    pub fn view_matrix_inverse(&mut self) -> Mat4 {
        self.ensure_fresh();
        self.view_matrix_inverse
    }

    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    #[must_use]
    pub fn left(&self) -> Vec3 {
        self.left
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
        self.dirty = true;
    }

    pub fn add_yaw(&mut self, radians: f32) {
        self.yaw += radians;
        self.dirty = true;
    }

    pub fn add_pitch(&mut self, radians: f32) {
        self.pitch =
            (self.pitch + radians).clamp(MIN_PITCH_DEG.to_radians(), MAX_PITCH_DEG.to_radians());
        self.dirty = true;
    }

    /// Angle in radians between `forward` and world-up. Exposed for tests
    /// verifying the pitch clamp invariant.
    #[must_use]
    pub fn forward_up_angle(&self) -> f32 {
        self.forward.dot(WORLD_UP).clamp(-1.0, 1.0).acos()
    }

    pub fn move_forwards(&mut self, distance: f32) {
        self.transform.position += self.forward * distance;
        self.dirty = true;
    }

    pub fn move_backwards(&mut self, distance: f32) {
        self.move_forwards(-distance);
    }

    pub fn move_left(&mut self, distance: f32) {
        self.transform.position += self.left * distance;
        self.dirty = true;
    }

    pub fn move_right(&mut self, distance: f32) {
        self.move_left(-distance);
    }

    pub fn move_up(&mut self, distance: f32) {
        self.transform.position += WORLD_UP * distance;
        self.dirty = true;
    }

    pub fn move_down(&mut self, distance: f32) {
        self.move_up(-distance);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn default_basis_matches_convention() {
        let camera = Camera::new();
        assert!((camera.forward() - DEFAULT_FORWARD).length() < 1e-5);
        assert!((camera.left() - DEFAULT_LEFT).length() < 1e-5);
        assert!((camera.up() - WORLD_UP).length() < 1e-5);
    }

    #[test]
    fn pitch_clamp_stays_within_bounds() {
        let mut camera = Camera::new();
        for _ in 0..100 {
            camera.add_pitch(FRAC_PI_2);
        }
        let angle = camera.forward_up_angle();
        assert!(angle >= 1f32.to_radians() - 1e-4);
        assert!(angle <= 179f32.to_radians() + 1e-4);

        for _ in 0..100 {
            camera.add_pitch(-PI);
        }
        let angle = camera.forward_up_angle();
        assert!(angle >= 1f32.to_radians() - 1e-4);
        assert!(angle <= 179f32.to_radians() + 1e-4);
    }

    #[test]
    fn yaw_does_not_change_forward_up_angle() {
        let mut camera = Camera::new();
        camera.add_pitch(0.3);
        let before = camera.forward_up_angle();
        camera.add_yaw(2.1);
        let after = camera.forward_up_angle();
        assert!((before - after).abs() < 1e-4);
    }

    #[test]
    fn view_matrix_looks_down_forward_axis() {
        let mut camera = Camera::new();
        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        let view = camera.view_matrix();
        let inv = camera.view_matrix_inverse();
        let round_trip = view * inv;
        assert!((round_trip.x_axis.x - 1.0).abs() < 1e-4);
        assert!((round_trip.w_axis.length()) < 1e-3 || round_trip.w_axis.w > 0.99);
    }
}
