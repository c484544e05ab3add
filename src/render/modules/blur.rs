//! Separable box blur over the AO target, rendered at half resolution.

use crate::errors::Result;
use crate::render::module::{apply_instance_or_skip, ensure_material_instance, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
use crate::resources::{GeometryId, Shader};

pub struct BlurModule {
    pass: PassInfo,
    screen_geometry: GeometryId,
    material_name: String,
    texel_size: [f32; 2],
}

impl BlurModule {
    pub fn new(
        shader: &Shader,
        render_pass_name: impl Into<String>,
        screen_geometry: GeometryId,
        material_name: impl Into<String>,
        extent: (u32, u32),
    ) -> Self {
        let mut pass = PassInfo::new(shader.name.clone(), render_pass_name);
        for name in ["texel_size"] {
            if let Ok(index) = shader.get_uniform_index(name) {
                pass.setup_uniform_index(name, index);
            }
        }
        let half = Self::half_extent(extent);
        Self { pass, screen_geometry, material_name: material_name.into(), texel_size: [1.0 / half.0 as f32, 1.0 / half.1 as f32] }
    }

    #[must_use]
    pub fn half_extent(extent: (u32, u32)) -> (u32, u32) {
        (extent.0.max(2) / 2, extent.1.max(2) / 2)
    }

    pub fn on_resize(&mut self, extent: (u32, u32)) {
        let half = Self::half_extent(extent);
        self.texel_size = [1.0 / half.0 as f32, 1.0 / half.1 as f32];
    }
}

impl RenderModule for BlurModule {
    fn name(&self) -> &str {
        "blur"
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
        if let Some(i) = self.pass.uniform_index("texel_size") {
            shader.set_uniform_vec4(ctx.backend, i, [self.texel_size[0], self.texel_size[1], 0.0, 0.0]);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_extent_never_reaches_zero() {
        assert_eq!(BlurModule::half_extent((1, 1)), (1, 1));
        assert_eq!(BlurModule::half_extent((800, 600)), (400, 300));
    }
}
