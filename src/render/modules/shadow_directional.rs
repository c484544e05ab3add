//! Directional-light cascaded shadow map.

use crate::backend::Rect;
use crate::errors::Result;
use crate::render::module::{apply_instance_or_skip, ensure_material_instance, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
use crate::resources::Shader;

pub struct ShadowmapDirectionalModule {
    pass: PassInfo,
    extent: f32,
    half_extents: Vec<f32>,
    light_space_matrix: glam::Mat4,
    pending_packet: ModulePacket,
}

impl ShadowmapDirectionalModule {
    pub fn new(shader: &Shader, render_pass_name: impl Into<String>, extent: f32, half_extents: Vec<f32>) -> Self {
        let mut pass = PassInfo::new(shader.name.clone(), render_pass_name);
        for name in ["light_space_matrix", "model"] {
            if let Ok(index) = shader.get_uniform_index(name) {
                pass.setup_uniform_index(name, index);
            }
        }
        Self { pass, extent, half_extents, light_space_matrix: glam::Mat4::IDENTITY, pending_packet: ModulePacket::empty() }
    }

    #[must_use]
    pub fn light_space_matrix(&self) -> glam::Mat4 {
        self.light_space_matrix
    }

    pub fn stage_packet(&mut self, packet: ModulePacket) {
        self.pending_packet = packet;
    }
}

impl RenderModule for ShadowmapDirectionalModule {
    fn name(&self) -> &str {
        "shadowmap_directional"
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

    fn apply_globals(&mut self, ctx: &mut ModuleContext, globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        ctx.backend.viewport_set(Rect { x: 0.0, y: 0.0, width: self.extent, height: self.extent });
        ctx.backend.scissors_set(Rect { x: 0.0, y: 0.0, width: self.extent, height: self.extent });

        let Some(light) = globals.lights.directional() else {
            return Ok(());
        };
        let half_extent = self.half_extents.first().copied().unwrap_or(10.0);
        self.light_space_matrix = light.light_space_matrix(globals.camera_position, half_extent, 0.1, 250.0);

        let shader_name = self.pass.shader_name.clone();
        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        if let Some(i) = self.pass.uniform_index("light_space_matrix") {
            shader.set_uniform_mat4(ctx.backend, i, self.light_space_matrix.to_cols_array());
        }
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut ModuleContext, packet: &ModulePacket, globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        if globals.lights.directional().is_none() {
            return Ok(());
        }
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

        ctx.backend.viewport_reset();
        ctx.backend.scissors_reset();
        Ok(())
    }
}
