//! Skybox: one cube geometry drawn with the camera's translation cleared
//! out of the view matrix, so the cube always surrounds the viewer.

use crate::errors::Result;
use crate::render::module::{apply_instance_or_skip, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
use crate::resources::{GeometryId, Shader};

pub struct SkyboxModule {
    pass: PassInfo,
    geometry: GeometryId,
    material_name: String,
}

impl SkyboxModule {
    pub fn new(shader: &Shader, render_pass_name: impl Into<String>, geometry: GeometryId, material_name: impl Into<String>) -> Self {
        let mut pass = PassInfo::new(shader.name.clone(), render_pass_name);
        for name in ["projection", "view"] {
            if let Ok(index) = shader.get_uniform_index(name) {
                pass.setup_uniform_index(name, index);
            }
        }
        Self { pass, geometry, material_name: material_name.into() }
    }
}

impl RenderModule for SkyboxModule {
    fn name(&self) -> &str {
        "skybox"
    }

    fn passes(&self) -> &[PassInfo] {
        std::slice::from_ref(&self.pass)
    }

    fn passes_mut(&mut self) -> &mut [PassInfo] {
        std::slice::from_mut(&mut self.pass)
    }

    fn apply_globals(&mut self, ctx: &mut ModuleContext, globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let mut view_no_translation = globals.view_matrix;
        view_no_translation.w_axis = glam::Vec4::new(0.0, 0.0, 0.0, 1.0);

        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        if let Some(i) = self.pass.uniform_index("projection") {
            shader.set_uniform_mat4(ctx.backend, i, globals.projection_matrix.to_cols_array());
        }
        if let Some(i) = self.pass.uniform_index("view") {
            shader.set_uniform_mat4(ctx.backend, i, view_no_translation.to_cols_array());
        }
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut ModuleContext, _packet: &ModulePacket, _globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let instance_id = crate::render::module::ensure_material_instance(ctx, &shader_name, &self.material_name)?;
        let geometry_handle = ctx
            .geometries
            .get(self.geometry)
            .map(crate::resources::Geometry::handle)
            .ok_or_else(|| crate::errors::RenderError::not_found("geometry", "skybox"))?;

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
