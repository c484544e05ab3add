//! Point-light cube shadow maps, packed into a single 2D atlas.
//!
//! Six faces per light, eight faces per row at 1024px, row-major. Only
//! lights whose position changed since the last render are redrawn — the
//! atlas module holds an owned `&LightRegistry`, not a mutable one (frame
//! globals are shared read access across every module in a frame), so
//! "moved since last render" is tracked here via position diffing rather
//! than by clearing `PointLight::recalculate_shadowmap` directly.

use glam::Vec3;

use crate::backend::Rect;
use crate::errors::Result;
use crate::render::module::{apply_instance_or_skip, ensure_material_instance, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
use crate::resources::Shader;

const FACE_SIZE: f32 = 1024.0;
const FACES_PER_ROW: usize = 8;
const NEAR: f32 = 0.05;
const FAR: f32 = 50.0;

pub struct ShadowmapPointModule {
    pass: PassInfo,
    last_rendered_position: Vec<Option<Vec3>>,
    pending_packet: ModulePacket,
}

impl ShadowmapPointModule {
    pub fn new(shader: &Shader, render_pass_name: impl Into<String>) -> Self {
        let mut pass = PassInfo::new(shader.name.clone(), render_pass_name);
        for name in ["light_space_matrix", "light_position", "far_plane", "model"] {
            if let Ok(index) = shader.get_uniform_index(name) {
                pass.setup_uniform_index(name, index);
            }
        }
        Self { pass, last_rendered_position: Vec::new(), pending_packet: ModulePacket::empty() }
    }

    pub fn stage_packet(&mut self, packet: ModulePacket) {
        self.pending_packet = packet;
    }

    /// Pixel rect for cube face `face` of the light at atlas slot `light_index`.
    fn face_rect(light_index: usize, face: usize) -> Rect {
        let slot = light_index * 6 + face;
        let col = (slot % FACES_PER_ROW) as f32;
        let row = (slot / FACES_PER_ROW) as f32;
        Rect { x: col * FACE_SIZE, y: row * FACE_SIZE, width: FACE_SIZE, height: FACE_SIZE }
    }
}

impl RenderModule for ShadowmapPointModule {
    fn name(&self) -> &str {
        "shadowmap_point"
    }

    fn passes(&self) -> &[PassInfo] {
        std::slice::from_ref(&self.pass)
    }

    fn passes_mut(&mut self) -> &mut [PassInfo] {
        std::slice::from_mut(&mut self.pass)
    }

    fn apply_globals(&mut self, _ctx: &mut ModuleContext, _globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        Ok(())
    }

    fn build_packet(&mut self, _frame_number: u64) -> ModulePacket {
        std::mem::take(&mut self.pending_packet)
    }

    fn on_render(&mut self, ctx: &mut ModuleContext, packet: &ModulePacket, globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let model_index = self.pass.uniform_index("model");
        let light_space_index = self.pass.uniform_index("light_space_matrix");
        let light_position_index = self.pass.uniform_index("light_position");
        let far_plane_index = self.pass.uniform_index("far_plane");

        if self.last_rendered_position.len() < globals.lights.points().len() {
            self.last_rendered_position.resize(globals.lights.points().len(), None);
        }

        for (light_index, light) in globals.lights.points().iter().enumerate() {
            if !light.cast_shadows {
                continue;
            }
            if self.last_rendered_position[light_index] == Some(light.position()) {
                continue;
            }

            let matrices = light.light_space_matrices(NEAR, FAR);
            for (face, matrix) in matrices.iter().enumerate() {
                let rect = Self::face_rect(light_index, face);
                ctx.backend.viewport_set(rect);
                ctx.backend.scissors_set(rect);

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
                    if let Some(index) = light_space_index {
                        shader.set_uniform_mat4(ctx.backend, index, matrix.to_cols_array());
                    }
                    if let Some(index) = light_position_index {
                        let p = light.position();
                        shader.set_uniform_vec4(ctx.backend, index, [p.x, p.y, p.z, 1.0]);
                    }
                    if let Some(index) = far_plane_index {
                        shader.set_uniform_f32(ctx.backend, index, FAR);
                    }
                    shader.set_local_scope();
                    if !apply_instance_or_skip(shader, ctx.backend, &item.material_name)? {
                        continue;
                    }

                    ctx.backend.draw_geometry(geometry_handle, 0..1);
                }
            }

            self.last_rendered_position[light_index] = Some(light.position());
        }

        ctx.backend.viewport_reset();
        ctx.backend.scissors_reset();
        Ok(())
    }
}
