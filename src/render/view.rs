//! Render views: a named camera + projection policy over a set of passes,
//! with per-frame visibility memoized against the frame number.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::RenderViewConfig;
use crate::resources::{GeometryId, ShaderRepository};

/// How a view's projection matrix is built. Kept as a tagged enum rather
/// than a trait object: the small, closed set of projection policies maps
/// naturally onto a match, with no need for dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionSource {
    Perspective,
    Orthographic,
    OrthographicUi,
    OrthographicShadow,
}

/// Where a view's view-matrix comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMatrixSource {
    SceneCamera,
    UiCamera,
    DirectionalLight,
    PointLightFace,
    Identity,
}

/// Coarse view category, used to pick sort/visibility policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    World,
    Ui,
    Skybox,
    DirectionalShadow,
    PointShadow,
    DepthPrepass,
    PostProcess,
}

impl ViewKind {
    /// Every view kind, used to eagerly register one built-in shader per
    /// kind at startup.
    pub const ALL: [ViewKind; 7] = [
        ViewKind::World,
        ViewKind::Ui,
        ViewKind::Skybox,
        ViewKind::DirectionalShadow,
        ViewKind::PointShadow,
        ViewKind::DepthPrepass,
        ViewKind::PostProcess,
    ];

    /// Name of the built-in shader substituted when a view is constructed
    /// against a shader name the shader repository doesn't know about.
    #[must_use]
    pub fn default_shader_name(self) -> &'static str {
        match self {
            Self::World => "default_world_shader",
            Self::Ui => "default_ui_shader",
            Self::Skybox => "default_skybox_shader",
            Self::DirectionalShadow => "default_directional_shadow_shader",
            Self::PointShadow => "default_point_shadow_shader",
            Self::DepthPrepass => "default_depth_prepass_shader",
            Self::PostProcess => "default_post_process_shader",
        }
    }
}

/// One draw item as seen by a view: the geometry/material pair plus the
/// transform-chain world matrix, supplied by the caller each frame (scene
/// graph traversal is outside this crate's scope).
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub geometry: GeometryId,
    pub material_name: String,
    pub world_matrix: Mat4,
    pub transparent: bool,
}

/// The same data, organized into the opaque/transparent draw lists a module
/// consumes.
#[derive(Debug, Clone)]
pub struct GeometryRenderData {
    pub geometry: GeometryId,
    pub material_name: String,
    pub model_matrix: Mat4,
}

#[derive(Default)]
struct VisibilityCache {
    last_frame: Option<u64>,
    opaque: Vec<GeometryRenderData>,
    transparent: Vec<GeometryRenderData>,
}

/// A render view: camera/projection state plus the pass chain it feeds.
pub struct RenderView {
    pub name: String,
    pub kind: ViewKind,
    pub shader_name: String,
    pub projection_source: ProjectionSource,
    pub view_matrix_source: ViewMatrixSource,
    pub passes: Vec<String>,
    pub camera_name: Option<String>,
    width: u32,
    height: u32,
    fov_radians: f32,
    near: f32,
    far: f32,
    projection_matrix: Mat4,
    projection_matrix_inverse: Mat4,
    cache: VisibilityCache,
}

impl RenderView {
    /// Resolves `requested` against `shaders`, substituting the built-in
    /// shader for `kind` and logging a warning when `requested` isn't
    /// registered — a view never fails to construct over a missing shader
    /// name, it degrades to the kind's built-in instead.
    fn resolve_shader_name(view_name: &str, kind: ViewKind, requested: String, shaders: &ShaderRepository) -> String {
        if shaders.get(&requested).is_some() {
            return requested;
        }
        let fallback = kind.default_shader_name();
        log::warn!(
            target: "forge_render::view",
            "view '{view_name}' requested shader '{requested}', which is not registered; substituting built-in '{fallback}'"
        );
        fallback.to_string()
    }

    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: ViewKind,
        shader_name: impl Into<String>,
        projection_source: ProjectionSource,
        view_matrix_source: ViewMatrixSource,
        width: u32,
        height: u32,
        fov_degrees: f32,
        near: f32,
        far: f32,
        shaders: &ShaderRepository,
    ) -> Self {
        let name = name.into();
        let shader_name = Self::resolve_shader_name(&name, kind, shader_name.into(), shaders);
        let mut view = Self {
            name,
            kind,
            shader_name,
            projection_source,
            view_matrix_source,
            passes: Vec::new(),
            camera_name: None,
            width,
            height,
            fov_radians: fov_degrees.to_radians(),
            near,
            far,
            projection_matrix: Mat4::IDENTITY,
            projection_matrix_inverse: Mat4::IDENTITY,
            cache: VisibilityCache::default(),
        };
        view.recompute_projection();
        view
    }

    /// Builds a view from a deserialized config, applying the projection
    /// defaults implied by each source when the config leaves them unset.
    #[must_use]
    pub fn from_config(config: &RenderViewConfig, shaders: &ShaderRepository) -> Self {
        let (default_near, default_far, default_fov) = match config.proj_source {
            ProjectionSource::Perspective => (0.1, 1000.0, 45.0),
            ProjectionSource::OrthographicUi => (-100.0, 100.0, 0.0),
            ProjectionSource::OrthographicShadow => (0.1, 250.0, 0.0),
            ProjectionSource::Orthographic => (0.1, 1000.0, 0.0),
        };
        let mut view = Self::new(
            config.name.clone(),
            config.kind,
            config.shader_name.clone(),
            config.proj_source,
            config.view_source,
            config.width,
            config.height,
            config.fov_degrees.unwrap_or(default_fov),
            config.near.unwrap_or(default_near),
            config.far.unwrap_or(default_far),
            shaders,
        );
        view.passes = config.passes.clone();
        view.camera_name = config.camera_name.clone();
        view
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn near(&self) -> f32 {
        self.near
    }

    #[must_use]
    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.recompute_projection();
        self.cache.last_frame = None;
    }

    fn recompute_projection(&mut self) {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        self.projection_matrix = match self.projection_source {
            ProjectionSource::OrthographicUi => Mat4::orthographic_rh(0.0, w, h, 0.0, self.near, self.far),
            ProjectionSource::OrthographicShadow => Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far),
            ProjectionSource::Orthographic => Mat4::orthographic_rh(-w / 2.0, w / 2.0, -h / 2.0, h / 2.0, self.near, self.far),
            ProjectionSource::Perspective => Mat4::perspective_rh(self.fov_radians, w / h, self.near, self.far),
        };
        self.projection_matrix_inverse = self.projection_matrix.inverse();
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[must_use]
    pub fn projection_matrix_inverse(&self) -> Mat4 {
        self.projection_matrix_inverse
    }

    /// Returns the memoized opaque/transparent draw lists for `frame_number`,
    /// rebuilding from `meshes` only on the first call this frame. The
    /// transparent list is sorted back-to-front from `camera_position` for
    /// world views; other view kinds keep submission order.
    pub fn visible_render_data(
        &mut self,
        frame_number: u64,
        meshes: &[MeshInstance],
        camera_position: Vec3,
    ) -> (&[GeometryRenderData], &[GeometryRenderData]) {
        if self.cache.last_frame != Some(frame_number) {
            self.rebuild_cache(meshes, camera_position);
            self.cache.last_frame = Some(frame_number);
        }
        (&self.cache.opaque, &self.cache.transparent)
    }

    fn rebuild_cache(&mut self, meshes: &[MeshInstance], camera_position: Vec3) {
        self.cache.opaque.clear();
        self.cache.transparent.clear();
        for mesh in meshes {
            let entry = GeometryRenderData {
                geometry: mesh.geometry,
                material_name: mesh.material_name.clone(),
                model_matrix: mesh.world_matrix,
            };
            if mesh.transparent {
                self.cache.transparent.push(entry);
            } else {
                self.cache.opaque.push(entry);
            }
        }
        if self.kind == ViewKind::World {
            self.cache.transparent.sort_by(|a, b| {
                let da = a.model_matrix.w_axis.truncate().distance_squared(camera_position);
                let db = b.model_matrix.w_axis.truncate().distance_squared(camera_position);
                db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(id: GeometryId, pos: Vec3, transparent: bool) -> MeshInstance {
        MeshInstance {
            geometry: id,
            material_name: "m".into(),
            world_matrix: Mat4::from_translation(pos),
            transparent,
        }
    }

    #[test]
    fn ui_projection_is_pixel_space_top_left_origin() {
        let shaders = ShaderRepository::new("shader");
        let view = RenderView::new(
            "ui",
            ViewKind::Ui,
            "ui_shader",
            ProjectionSource::OrthographicUi,
            ViewMatrixSource::UiCamera,
            1600,
            900,
            0.0,
            -100.0,
            100.0,
            &shaders,
        );
        let clip = view.projection_matrix() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.x < 0.0 && clip.y > 0.0);
    }

    #[test]
    fn missing_shader_falls_back_to_the_views_kind_default() {
        let shaders = ShaderRepository::new("shader");
        let view = RenderView::new(
            "hud",
            ViewKind::Ui,
            "nonexistent_shader",
            ProjectionSource::OrthographicUi,
            ViewMatrixSource::UiCamera,
            1600,
            900,
            0.0,
            -100.0,
            100.0,
            &shaders,
        );
        assert_eq!(view.shader_name, ViewKind::Ui.default_shader_name());
    }

    #[test]
    fn visibility_cache_is_memoized_per_frame_number() {
        let shaders = ShaderRepository::new("shader");
        let mut view = RenderView::new(
            "world",
            ViewKind::World,
            "world_shader",
            ProjectionSource::Perspective,
            ViewMatrixSource::SceneCamera,
            800,
            600,
            45.0,
            0.1,
            1000.0,
            &shaders,
        );
        let id = GeometryId::default();
        let meshes = vec![mesh(id, Vec3::ZERO, false)];
        let (opaque, _) = view.visible_render_data(1, &meshes, Vec3::ZERO);
        assert_eq!(opaque.len(), 1);

        let (opaque_again, _) = view.visible_render_data(1, &[], Vec3::ZERO);
        assert_eq!(opaque_again.len(), 1, "same frame number must not rebuild from an empty mesh list");

        let (opaque_next_frame, _) = view.visible_render_data(2, &[], Vec3::ZERO);
        assert_eq!(opaque_next_frame.len(), 0, "a new frame number must rebuild");
    }

    #[test]
    fn transparent_draws_sort_back_to_front_for_world_views() {
        let shaders = ShaderRepository::new("shader");
        let mut view = RenderView::new(
            "world",
            ViewKind::World,
            "world_shader",
            ProjectionSource::Perspective,
            ViewMatrixSource::SceneCamera,
            800,
            600,
            45.0,
            0.1,
            1000.0,
            &shaders,
        );
        let id = GeometryId::default();
        let meshes =
            vec![mesh(id, Vec3::new(1.0, 0.0, 0.0), true), mesh(id, Vec3::new(10.0, 0.0, 0.0), true)];
        let (_, transparent) = view.visible_render_data(1, &meshes, Vec3::ZERO);
        assert_eq!(transparent[0].model_matrix.w_axis.x, 10.0, "farthest item must be drawn first");
    }
}
