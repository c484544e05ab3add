//! G-buffer depth prepass: writes depth plus a smoothness channel ahead of
//! the main world pass, so AO/SSR have geometry to sample against.

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::render::module::{apply_instance_or_skip, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
use crate::resources::Shader;

/// Tracks this module's own material -> instance-id mapping, separate from
/// [`crate::resources::Material::instance_id`]: that field is scoped to the
/// material's own (world) shader, while the prepass binds instance state
/// against a different shader entirely.
pub struct DepthPrepassModule {
    pass: PassInfo,
    material_instances: FxHashMap<String, u32>,
    pending_packet: ModulePacket,
}

impl DepthPrepassModule {
    pub fn new(shader: &Shader, render_pass_name: impl Into<String>) -> Self {
        let mut pass = PassInfo::new(shader.name.clone(), render_pass_name);
        for name in ["projection", "view", "model", "smoothness"] {
            if let Ok(index) = shader.get_uniform_index(name) {
                pass.setup_uniform_index(name, index);
            }
        }
        Self { pass, material_instances: FxHashMap::default(), pending_packet: ModulePacket::empty() }
    }

    pub fn stage_packet(&mut self, packet: ModulePacket) {
        self.pending_packet = packet;
    }

    /// Lazily acquires this material's g-prepass instance id the first time
    /// it is drawn; later draws reuse the cached id.
    fn ensure_instance(&mut self, ctx: &mut ModuleContext, material_name: &str) -> Result<u32> {
        if let Some(&id) = self.material_instances.get(material_name) {
            return Ok(id);
        }
        let shader_name = self.pass.shader_name.clone();
        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        let id = shader.acquire_instance_resources(ctx.backend, &[])?;
        self.material_instances.insert(material_name.to_string(), id);
        Ok(id)
    }
}

impl RenderModule for DepthPrepassModule {
    fn name(&self) -> &str {
        "depth_prepass"
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
        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        if let Some(i) = self.pass.uniform_index("projection") {
            shader.set_uniform_mat4(ctx.backend, i, globals.projection_matrix.to_cols_array());
        }
        if let Some(i) = self.pass.uniform_index("view") {
            shader.set_uniform_mat4(ctx.backend, i, globals.view_matrix.to_cols_array());
        }
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut ModuleContext, packet: &ModulePacket, _globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let model_index = self.pass.uniform_index("model");
        let smoothness_index = self.pass.uniform_index("smoothness");

        for item in &packet.opaque {
            let instance_id = self.ensure_instance(ctx, &item.material_name)?;
            let smoothness = ctx.materials.get(&item.material_name).map_or(0.5, |material| material.smoothness);
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
            if let Some(index) = smoothness_index {
                shader.set_uniform_f32(ctx.backend, index, smoothness);
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
