//! Combines the depth buffer and the directional cascade shadow map into a
//! single sampled shadow texture, full screen.

use glam::Mat4;

use crate::errors::Result;
use crate::render::module::{apply_instance_or_skip, ensure_material_instance, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
use crate::resources::{GeometryId, Shader};

pub struct ShadowmapSamplingModule {
    pass: PassInfo,
    screen_geometry: GeometryId,
    material_name: String,
    light_space_directional: Mat4,
}

impl ShadowmapSamplingModule {
    pub fn new(shader: &Shader, render_pass_name: impl Into<String>, screen_geometry: GeometryId, material_name: impl Into<String>) -> Self {
        let mut pass = PassInfo::new(shader.name.clone(), render_pass_name);
        for name in [
            "projection",
            "view",
            "projection_inv",
            "view_inv",
            "light_space_directional",
            "shadowmap_directional_texture",
        ] {
            if let Ok(index) = shader.get_uniform_index(name) {
                pass.setup_uniform_index(name, index);
            }
        }
        Self { pass, screen_geometry, material_name: material_name.into(), light_space_directional: Mat4::IDENTITY }
    }

    pub fn set_light_space_directional(&mut self, matrix: Mat4) {
        self.light_space_directional = matrix;
    }
}

impl RenderModule for ShadowmapSamplingModule {
    fn name(&self) -> &str {
        "shadowmap_sampling"
    }

    fn passes(&self) -> &[PassInfo] {
        std::slice::from_ref(&self.pass)
    }

    fn passes_mut(&mut self) -> &mut [PassInfo] {
        std::slice::from_mut(&mut self.pass)
    }

    fn apply_globals(&mut self, ctx: &mut ModuleContext, globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        if let Some(i) = self.pass.uniform_index("projection") {
            shader.set_uniform_mat4(ctx.backend, i, globals.projection_matrix.to_cols_array());
        }
        if let Some(i) = self.pass.uniform_index("view") {
            shader.set_uniform_mat4(ctx.backend, i, globals.view_matrix.to_cols_array());
        }
        if let Some(i) = self.pass.uniform_index("projection_inv") {
            shader.set_uniform_mat4(ctx.backend, i, globals.projection_matrix_inverse.to_cols_array());
        }
        if let Some(i) = self.pass.uniform_index("view_inv") {
            shader.set_uniform_mat4(ctx.backend, i, globals.view_matrix_inverse.to_cols_array());
        }
        if let Some(i) = self.pass.uniform_index("light_space_directional") {
            shader.set_uniform_mat4(ctx.backend, i, self.light_space_directional.to_cols_array());
        }
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut ModuleContext, _packet: &ModulePacket, _globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let instance_id = ensure_material_instance(ctx, &shader_name, &self.material_name)?;
        let geometry_handle = ctx
            .geometries
            .get(self.screen_geometry)
            .map(crate::resources::Geometry::handle)
            .ok_or_else(|| crate::errors::RenderError::not_found("geometry", "screen_rect"))?;

        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        shader.bind_instance(ctx.backend, instance_id);
        shader.set_local_scope();
        if !apply_instance_or_skip(shader, ctx.backend, &self.material_name)? {
            return Ok(());
        }

        ctx.backend.draw_geometry(geometry_handle, 0..1);
        Ok(())
    }
}
