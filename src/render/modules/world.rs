//! The main opaque/transparent geometry pass.

use crate::errors::Result;
use crate::render::module::{apply_instance_or_skip, ensure_material_instance, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
use crate::resources::Shader;

/// Globals = {projection, view, ambient_color, view_position, mode,
/// directional_light, num_point_lights, point_lights[], ssao_texture,
/// shadowmap_sampled_texture}. Per geometry: bind material instance, set
/// `model`, draw.
pub struct WorldModule {
    pass: PassInfo,
    pending_packet: ModulePacket,
}

impl WorldModule {
    /// Stages the packet the next `render` call should draw. Populated by
    /// the caller from a `RenderView`'s memoized visible render data before
    /// the frame orchestrator drives this module.
    pub fn stage_packet(&mut self, packet: ModulePacket) {
        self.pending_packet = packet;
    }
    pub fn new(shader: &Shader, render_pass_name: impl Into<String>) -> Result<Self> {
        let mut pass = PassInfo::new(shader.name.clone(), render_pass_name);
        for name in [
            "projection",
            "view",
            "ambient_color",
            "view_position",
            "mode",
            "directional_light",
            "num_point_lights",
            "point_lights",
            "ssao_texture",
            "shadowmap_sampled_texture",
            "model",
        ] {
            if let Ok(index) = shader.get_uniform_index(name) {
                pass.setup_uniform_index(name, index);
            }
        }
        Ok(Self { pass, pending_packet: ModulePacket::empty() })
    }
}

impl RenderModule for WorldModule {
    fn name(&self) -> &str {
        "world"
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
        let shader_name = self.pass.shader_name.clone();
        let directional = globals.lights.directional().map(|d| d.data).unwrap_or(crate::lighting::DirectionalLightData {
            direction: [0.0, -1.0, 0.0, 0.0],
            color: [0.0, 0.0, 0.0, 0.0],
        });

        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        if let Some(i) = self.pass.uniform_index("projection") {
            shader.set_uniform_mat4(ctx.backend, i, globals.projection_matrix.to_cols_array());
        }
        if let Some(i) = self.pass.uniform_index("view") {
            shader.set_uniform_mat4(ctx.backend, i, globals.view_matrix.to_cols_array());
        }
        if let Some(i) = self.pass.uniform_index("ambient_color") {
            shader.set_uniform_vec4(ctx.backend, i, globals.ambient_color);
        }
        if let Some(i) = self.pass.uniform_index("view_position") {
            shader.set_uniform_vec4(
                ctx.backend,
                i,
                [globals.camera_position.x, globals.camera_position.y, globals.camera_position.z, 1.0],
            );
        }
        if let Some(i) = self.pass.uniform_index("mode") {
            shader.set_uniform_f32(ctx.backend, i, 0.0);
        }
        if let Some(i) = self.pass.uniform_index("directional_light") {
            shader.set_uniform_bytes(ctx.backend, i, bytemuck::bytes_of(&directional));
        }
        if let Some(i) = self.pass.uniform_index("num_point_lights") {
            shader.set_uniform_f32(ctx.backend, i, globals.lights.num_points() as f32);
        }
        if let Some(i) = self.pass.uniform_index("point_lights") {
            shader.set_uniform_bytes(ctx.backend, i, bytemuck::cast_slice(globals.point_lights));
        }
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut ModuleContext, packet: &ModulePacket, _globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let model_index = self.pass.uniform_index("model");

        for item in packet.opaque.iter().chain(packet.transparent.iter()) {
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
