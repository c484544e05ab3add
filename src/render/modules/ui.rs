//! Orthographic UI pass: identity view, per-geometry model + material.

use glam::Mat4;

use crate::errors::Result;
use crate::render::module::{apply_instance_or_skip, ensure_material_instance, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
use crate::resources::Shader;

pub struct UiModule {
    pass: PassInfo,
    projection: Mat4,
    pending_packet: ModulePacket,
}

impl UiModule {
    pub fn new(shader: &Shader, render_pass_name: impl Into<String>, projection: Mat4) -> Self {
        let mut pass = PassInfo::new(shader.name.clone(), render_pass_name);
        for name in ["projection", "view", "model"] {
            if let Ok(index) = shader.get_uniform_index(name) {
                pass.setup_uniform_index(name, index);
            }
        }
        Self { pass, projection, pending_packet: ModulePacket::empty() }
    }

    pub fn on_resize(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    pub fn stage_packet(&mut self, packet: ModulePacket) {
        self.pending_packet = packet;
    }
}

impl RenderModule for UiModule {
    fn name(&self) -> &str {
        "ui"
    }

    fn build_packet(&mut self, _frame_number: u64) -> ModulePacket {
        std::mem::take(&mut self.pending_packet)
    }

    fn passes(&self) -> &[PassInfo] {
        std::slice::from_ref(&self.pass)
    }

    fn passes_mut(&mut self) -> &mut [PassInfo] {
        std::slice::from_mut(&mut self.pass)
    }

    fn apply_globals(&mut self, ctx: &mut ModuleContext, _globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        if let Some(i) = self.pass.uniform_index("projection") {
            shader.set_uniform_mat4(ctx.backend, i, self.projection.to_cols_array());
        }
        if let Some(i) = self.pass.uniform_index("view") {
            shader.set_uniform_mat4(ctx.backend, i, Mat4::IDENTITY.to_cols_array());
        }
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut ModuleContext, packet: &ModulePacket, _globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let model_index = self.pass.uniform_index("model");

        for item in &packet.opaque {
            let instance_id = ensure_material_instance(ctx, &shader_name, &item.material_name)?;
            let geometry_handle = ctx
                .geometries
                .get(item.geometry)
                .map(crate::resources::Geometry::handle)
                .ok_or_else(|| crate::errors::RenderError::not_found("geometry", "<unnamed>"))?;

            let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
            shader.bind_instance(ctx.backend, instance_id);
            if let Some(index) = model_index {
                shader.set_uniform_mat4(ctx.backend, index, item.model_matrix.to_cols_array());
            }
            shader.set_local_scope();
            if !apply_instance_or_skip(shader, ctx.backend, &item.material_name)? {
                continue;
            }

            ctx.backend.draw_geometry(geometry_handle, 0..1);
        }
        Ok(())
    }
}
