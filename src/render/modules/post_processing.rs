//! Generic full-screen post-processing stage.
//!
//! `PostProcessing`, `PostProcessingEffects`, `SSR`, and `Volumetrics` in
//! the original source share one shape: a full-screen quad, a shader, and a
//! fixed set of input textures sampled from previous passes. They differ
//! only in which shader and which named inputs they bind, so one generic
//! module covers all four; each concrete stage is a `PostProcessModule`
//! constructed with its own label, shader, and input texture list.

use crate::backend::TextureMapHandle;
use crate::errors::Result;
use crate::render::module::{apply_instance_or_skip, ensure_material_instance, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
use crate::resources::{GeometryId, Shader, TextureMap, TextureUse};

pub struct PostProcessModule {
    label: &'static str,
    pass: PassInfo,
    screen_geometry: GeometryId,
    material_name: String,
    inputs: Vec<TextureMap>,
    input_uniform_names: Vec<String>,
}

impl PostProcessModule {
    pub fn new(
        label: &'static str,
        shader: &Shader,
        render_pass_name: impl Into<String>,
        screen_geometry: GeometryId,
        material_name: impl Into<String>,
        inputs: Vec<(String, TextureMap)>,
    ) -> Self {
        let mut pass = PassInfo::new(shader.name.clone(), render_pass_name);
        for name in ["projection", "view"] {
            if let Ok(index) = shader.get_uniform_index(name) {
                pass.setup_uniform_index(name, index);
            }
        }
        let mut input_uniform_names = Vec::with_capacity(inputs.len());
        let mut input_maps = Vec::with_capacity(inputs.len());
        for (uniform_name, map) in inputs {
            if let Ok(index) = shader.get_uniform_index(&uniform_name) {
                pass.setup_uniform_index(&uniform_name, index);
            }
            input_uniform_names.push(uniform_name);
            input_maps.push(map);
        }
        Self { label, pass, screen_geometry, material_name: material_name.into(), inputs: input_maps, input_uniform_names }
    }

    fn resolve_input_handles(&mut self, ctx: &mut ModuleContext) -> Result<Vec<TextureMapHandle>> {
        let mut handles = Vec::with_capacity(self.inputs.len());
        for map in &mut self.inputs {
            handles.push(map.acquire(ctx.backend)?);
        }
        Ok(handles)
    }
}

impl RenderModule for PostProcessModule {
    fn name(&self) -> &str {
        self.label
    }

    fn passes(&self) -> &[PassInfo] {
        std::slice::from_ref(&self.pass)
    }

    fn passes_mut(&mut self) -> &mut [PassInfo] {
        std::slice::from_mut(&mut self.pass)
    }

    fn apply_globals(&mut self, ctx: &mut ModuleContext, globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let handles = self.resolve_input_handles(ctx)?;
        let names = self.input_uniform_names.clone();
        let shader_name = self.pass.shader_name.clone();

        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        if let Some(i) = self.pass.uniform_index("projection") {
            shader.set_uniform_mat4(ctx.backend, i, globals.projection_matrix.to_cols_array());
        }
        if let Some(i) = self.pass.uniform_index("view") {
            shader.set_uniform_mat4(ctx.backend, i, globals.view_matrix.to_cols_array());
        }
        for (name, handle) in names.iter().zip(handles) {
            if let Some(index) = self.pass.uniform_index(name) {
                shader.set_sampler(ctx.backend, index, handle);
            }
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

/// Convenience constructor for a texture-sampling input bound at a given
/// use tag, matching what the other full-screen modules pass in.
#[must_use]
pub fn texture_input(uniform_name: impl Into<String>, texture: crate::backend::TextureHandle, use_tag: TextureUse) -> (String, TextureMap) {
    (uniform_name.into(), TextureMap::new(use_tag, texture))
}
