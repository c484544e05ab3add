//! Light GPU-data layouts and the light registry.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightData {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub _padding: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightData {
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

const FACE_DIRECTIONS: [Vec3; 6] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
];

const FACE_UPS: [Vec3; 6] = [
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
];

#[derive(Debug, Clone)]
pub struct PointLight {
    pub data: PointLightData,
    pub cast_shadows: bool,
    /// Set whenever the position changes; the shadow-atlas module checks
    /// this before re-rendering the six cube faces for this light.
    pub recalculate_shadowmap: bool,
}

impl PointLight {
    #[must_use]
    pub fn new(position: Vec3, color: [f32; 4], constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            data: PointLightData {
                position: [position.x, position.y, position.z, 1.0],
                color,
                constant,
                linear,
                quadratic,
                _padding: 0.0,
            },
            cast_shadows: false,
            recalculate_shadowmap: true,
        }
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.data.position[0], self.data.position[1], self.data.position[2])
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.data.position = [position.x, position.y, position.z, 1.0];
        self.recalculate_shadowmap = true;
    }

    /// View-projection matrices for each of the six cube faces, used by the
    /// point-light shadow atlas.
    #[must_use]
    pub fn light_space_matrices(&self, near: f32, far: f32) -> [Mat4; 6] {
        let eye = self.position();
        let proj = Mat4::perspective_rh(FRAC_PI_2, 1.0, near, far);
        std::array::from_fn(|i| proj * Mat4::look_at_rh(eye, eye + FACE_DIRECTIONS[i], FACE_UPS[i]))
    }
}

#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub data: DirectionalLightData,
    pub cast_shadows: bool,
    num_shadow_cascades: usize,
}

impl DirectionalLight {
    #[must_use]
    pub fn new(direction: Vec3, color: [f32; 4]) -> Self {
        let direction = direction.normalize();
        Self {
            data: DirectionalLightData { direction: [direction.x, direction.y, direction.z, 0.0], color },
            cast_shadows: false,
            num_shadow_cascades: 1,
        }
    }

    #[must_use]
    pub fn direction(&self) -> Vec3 {
        Vec3::new(self.data.direction[0], self.data.direction[1], self.data.direction[2])
    }

    pub fn enable_shadows(&mut self, num_shadow_cascades: usize) {
        self.cast_shadows = true;
        self.num_shadow_cascades = num_shadow_cascades.max(1);
    }

    #[must_use]
    pub fn num_shadow_cascades(&self) -> usize {
        self.num_shadow_cascades
    }

    /// The camera-relative light position used to build a cascade's view
    /// matrix, per the directional-shadow view matrix policy.
    #[must_use]
    pub fn light_camera_position(&self, camera_position: Vec3, far: f32) -> Vec3 {
        camera_position - self.direction() * (far / 2.0)
    }

    fn up_vector(&self) -> Vec3 {
        if self.direction().dot(Vec3::Y).abs() > 0.99 {
            Vec3::Z
        } else {
            Vec3::Y
        }
    }

    /// View-projection matrix for a single cascade.
    #[must_use]
    pub fn light_space_matrix(
        &self,
        camera_position: Vec3,
        half_extent: f32,
        near: f32,
        far: f32,
    ) -> Mat4 {
        let eye = self.light_camera_position(camera_position, far);
        let view = Mat4::look_at_rh(eye, camera_position, self.up_vector());
        let proj = Mat4::orthographic_rh(-half_extent, half_extent, -half_extent, half_extent, near, far);
        proj * view
    }

    /// All configured cascades' view-projection matrices.
    #[must_use]
    pub fn light_space_matrices(
        &self,
        camera_position: Vec3,
        half_extents: &[f32],
        near: f32,
        far: f32,
    ) -> Vec<Mat4> {
        (0..self.num_shadow_cascades)
            .map(|i| {
                let half_extent = half_extents.get(i).copied().unwrap_or(half_extents.last().copied().unwrap_or(10.0));
                self.light_space_matrix(camera_position, half_extent, near, far)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightResult {
    Success,
    Failed,
}

/// At most one directional light, plus a fixed-capacity set of point lights.
pub struct LightRegistry {
    directional: Option<DirectionalLight>,
    points: Vec<PointLight>,
    capacity: usize,
}

impl LightRegistry {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { directional: None, points: Vec::with_capacity(capacity), capacity }
    }

    pub fn add_directional(&mut self, light: DirectionalLight) -> LightResult {
        self.directional = Some(light);
        LightResult::Success
    }

    pub fn add_point(&mut self, light: PointLight) -> LightResult {
        if self.points.len() >= self.capacity {
            return LightResult::Failed;
        }
        self.points.push(light);
        LightResult::Success
    }

    #[must_use]
    pub fn directional(&self) -> Option<&DirectionalLight> {
        self.directional.as_ref()
    }

    #[must_use]
    pub fn points(&self) -> &[PointLight] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [PointLight] {
        &mut self.points
    }

    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Contiguous array of every point light's GPU data, ready for a single
    /// array-base uniform upload. The original source has a path that
    /// uploads only the first element by value; the array-base upload below
    /// is the authoritative behavior.
    #[must_use]
    pub fn point_data(&self) -> Vec<PointLightData> {
        self.points.iter().map(|p| p.data).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_exceeded_returns_failed_without_panicking() {
        let mut registry = LightRegistry::new(2);
        assert_eq!(registry.add_point(PointLight::new(Vec3::ZERO, [1.0; 4], 1.0, 0.0, 0.0)), LightResult::Success);
        assert_eq!(registry.add_point(PointLight::new(Vec3::ZERO, [1.0; 4], 1.0, 0.0, 0.0)), LightResult::Success);
        assert_eq!(registry.add_point(PointLight::new(Vec3::ZERO, [1.0; 4], 1.0, 0.0, 0.0)), LightResult::Failed);
        assert_eq!(registry.num_points(), 2);
    }

    #[test]
    fn set_position_requests_shadowmap_recalculation() {
        let mut light = PointLight::new(Vec3::ZERO, [1.0; 4], 1.0, 0.0, 0.0);
        light.recalculate_shadowmap = false;
        light.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(light.recalculate_shadowmap);
        assert_eq!(light.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn point_data_uploads_full_array_not_first_element() {
        let mut registry = LightRegistry::new(4);
        registry.add_point(PointLight::new(Vec3::new(1.0, 0.0, 0.0), [1.0; 4], 1.0, 0.0, 0.0));
        registry.add_point(PointLight::new(Vec3::new(2.0, 0.0, 0.0), [1.0; 4], 1.0, 0.0, 0.0));
        let data = registry.point_data();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1].position[0], 2.0);
    }

    #[test]
    fn directional_up_vector_flips_near_y_axis() {
        let mut parallel = DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0), [1.0; 4]);
        parallel.enable_shadows(1);
        let m = parallel.light_space_matrix(Vec3::ZERO, 10.0, 0.1, 100.0);
        assert!(m.is_finite());

        let mut oblique = DirectionalLight::new(Vec3::new(1.0, -0.2, -0.2), [1.0; 4]);
        oblique.enable_shadows(1);
        let m2 = oblique.light_space_matrix(Vec3::ZERO, 10.0, 0.1, 100.0);
        assert!(m2.is_finite());
    }
}
