//! The render-module contract: a stateless-per-frame unit that owns a
//! sequence of (shader, render pass) bindings and draws into them.

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;

use crate::backend::RenderBackend;
use crate::errors::Result;
use crate::lighting::{LightRegistry, PointLightData};
use crate::render::pass::PassRegistry;
use crate::render::view::GeometryRenderData;
use crate::resources::{GeometryRepository, MaterialRepository, Repositories, Shader, ShaderRepository, TextureRepository};

/// Frame-wide inputs every module's globals may draw from: the active
/// view/projection pair, the camera position they were derived from, and
/// the current light registry. Distinct from [`ModulePacket`], which is
/// per-module visible geometry rather than shared frame state.
///
/// `point_lights` is bump-allocated once per frame by the frame orchestrator
/// (its `light_scratch` arena) rather than collected fresh by every module
/// that needs it; `WorldModule` is the only current consumer.
pub struct FrameGlobals<'a> {
    pub frame_number: u64,
    pub view_matrix: Mat4,
    pub view_matrix_inverse: Mat4,
    pub projection_matrix: Mat4,
    pub projection_matrix_inverse: Mat4,
    pub camera_position: Vec3,
    pub lights: &'a LightRegistry,
    pub point_lights: &'a [PointLightData],
    pub ambient_color: [f32; 4],
}

/// Per-frame draw data handed to a module. Heap-backed rather than arena
/// allocated: the per-frame state worth arena-allocating (the point-light
/// upload staging buffer) lives on the frame orchestrator instead, see
/// `FrameOrchestrator::light_scratch`.
#[derive(Default)]
pub struct ModulePacket {
    pub opaque: Vec<GeometryRenderData>,
    pub transparent: Vec<GeometryRenderData>,
}

impl ModulePacket {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One (shader, render pass) binding within a module, plus the per-pass
/// uniform name -> index table resolved once at module construction.
///
/// The 2-argument constructor used to delegate to the 3-argument one by
/// passing the shader name again as the render pass name, which meant a
/// module configured with only a shader and a render pass silently bound
/// its draw-instance name to the render pass instead of the shader. The
/// instance name now defaults to the shader name, as the rest of the
/// system assumes.
pub struct PassInfo {
    pub shader_name: String,
    pub instance_name: String,
    pub render_pass_name: String,
    uniform_index: FxHashMap<String, u16>,
}

impl PassInfo {
    #[must_use]
    pub fn new(shader_name: impl Into<String>, render_pass_name: impl Into<String>) -> Self {
        let shader_name = shader_name.into();
        Self {
            instance_name: shader_name.clone(),
            shader_name,
            render_pass_name: render_pass_name.into(),
            uniform_index: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_instance_name(
        shader_name: impl Into<String>,
        instance_name: impl Into<String>,
        render_pass_name: impl Into<String>,
    ) -> Self {
        Self {
            shader_name: shader_name.into(),
            instance_name: instance_name.into(),
            render_pass_name: render_pass_name.into(),
            uniform_index: FxHashMap::default(),
        }
    }

    pub fn setup_uniform_index(&mut self, name: &str, index: u16) {
        self.uniform_index.insert(name.to_string(), index);
    }

    #[must_use]
    pub fn uniform_index(&self, name: &str) -> Option<u16> {
        self.uniform_index.get(name).copied()
    }
}

/// Shared borrow of every repository plus the backend, handed to a module
/// for the duration of a `render` call.
pub struct ModuleContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    pub passes: &'a mut PassRegistry,
    pub shaders: &'a mut ShaderRepository,
    pub textures: &'a mut TextureRepository,
    pub geometries: &'a mut GeometryRepository,
    pub materials: &'a mut MaterialRepository,
    pub swap_image_index: usize,
    pub frame_in_flight_index: usize,
}

impl<'a> ModuleContext<'a> {
    pub fn new(repos: &'a mut Repositories, backend: &'a mut dyn RenderBackend, passes: &'a mut PassRegistry, swap_image_index: usize, frame_in_flight_index: usize) -> Self {
        Self {
            backend,
            passes,
            shaders: &mut repos.shaders,
            textures: &mut repos.textures,
            geometries: &mut repos.geometries,
            materials: &mut repos.materials,
            swap_image_index,
            frame_in_flight_index,
        }
    }

    pub fn begin_pass(&mut self, pass_name: &str) -> Result<()> {
        let pass = self.passes.get_mut(pass_name).ok_or_else(|| crate::errors::RenderError::not_found("render_pass", pass_name))?;
        let target_index = pass.target_index(self.swap_image_index, self.frame_in_flight_index);
        pass.begin(self.backend, target_index)
    }

    pub fn end_pass(&mut self, pass_name: &str) -> Result<()> {
        let pass = self.passes.get_mut(pass_name).ok_or_else(|| crate::errors::RenderError::not_found("render_pass", pass_name))?;
        pass.end(self.backend);
        Ok(())
    }

    pub fn use_shader(&mut self, shader_name: &str) -> Result<()> {
        let shader = self.shaders.get(shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name))?;
        shader.use_shader(self.backend);
        Ok(())
    }

    pub fn shader_needs_global_apply(&self, shader_name: &str, frame_number: u64) -> Result<bool> {
        let shader = self.shaders.get(shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name))?;
        Ok(shader.needs_global_apply(frame_number))
    }

    pub fn apply_shader_globals(&mut self, shader_name: &str, frame_number: u64) -> Result<()> {
        let shader = self.shaders.get_mut(shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name))?;
        shader.apply_global(self.backend, frame_number)
    }
}

/// Returns `material_name`'s per-instance shader id, lazily acquiring it
/// (and its texture map bindings) against `shader_name`'s instance-resource
/// scope the first time a given material is drawn. Covers the "a new
/// material appears mid-run" case named for the depth prepass, but applies
/// equally to any module that binds per-material instance state.
pub fn ensure_material_instance(ctx: &mut ModuleContext, shader_name: &str, material_name: &str) -> Result<u32> {
    if let Some(id) = ctx.materials.get(material_name).and_then(crate::resources::Material::instance_id) {
        return Ok(id);
    }

    let material = ctx
        .materials
        .get_mut(material_name)
        .ok_or_else(|| crate::errors::RenderError::not_found("material", material_name))?;
    let mut map_handles = Vec::with_capacity(material.maps.len());
    for map in &mut material.maps {
        map_handles.push(map.acquire(ctx.backend)?);
    }

    let shader = ctx.shaders.get_mut(shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name))?;
    let instance_id = shader.acquire_instance_resources(ctx.backend, &map_handles)?;

    let material = ctx.materials.get_mut(material_name).expect("checked present above");
    material.set_instance_id(instance_id);
    Ok(instance_id)
}

/// Flushes `shader`'s bound instance/local uniforms for the draw item named
/// by `label`. A draw-time failure here is isolated to this one item: it is
/// logged and the draw is skipped (returns `Ok(false)`) rather than aborting
/// the module's whole pass, unless the backend reports the failure as fatal,
/// in which case it still propagates.
pub fn apply_instance_or_skip(shader: &mut Shader, backend: &mut dyn RenderBackend, label: &str) -> Result<bool> {
    match shader.apply_instance(backend) {
        Ok(()) => Ok(true),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            log::warn!(target: "forge_render::render", "skipping draw for '{label}': {err}");
            Ok(false)
        }
    }
}

/// A unit of the render graph: builds its own packet, binds a shader once
/// per pass, applies global uniforms exactly once per shader per frame, and
/// draws.
pub trait RenderModule {
    fn name(&self) -> &str;

    /// Gathers this module's visible draw data for the current frame.
    /// Default: empty (modules that draw fixed full-screen geometry, like
    /// post-processing passes, never need one).
    fn build_packet(&mut self, _frame_number: u64) -> ModulePacket {
        ModulePacket::empty()
    }

    fn passes(&self) -> &[PassInfo];
    fn passes_mut(&mut self) -> &mut [PassInfo];

    /// Sets every global-scope uniform for the pass at `pass_index`. Called
    /// at most once per shader per frame, before `on_render`.
    fn apply_globals(&mut self, ctx: &mut ModuleContext, globals: &FrameGlobals, pass_index: usize) -> Result<()>;

    /// Binds instance/local uniforms and issues draw calls for the pass at
    /// `pass_index`.
    fn on_render(
        &mut self,
        ctx: &mut ModuleContext,
        packet: &ModulePacket,
        globals: &FrameGlobals,
        pass_index: usize,
    ) -> Result<()>;

    /// Transitions any render-target textures this module owns for the
    /// current frame. Default: nothing owned, nothing to transition.
    fn transition_targets(&mut self, _frame_number: u64) {}

    /// Drives every configured pass: transition owned targets, begin, bind
    /// shader, apply globals at most once per shader per frame, delegate to
    /// `on_render`, end.
    fn render(&mut self, ctx: &mut ModuleContext, packet: &ModulePacket, globals: &FrameGlobals) -> Result<()> {
        let frame_number = globals.frame_number;
        self.transition_targets(frame_number);
        for pass_index in 0..self.passes().len() {
            let (render_pass_name, shader_name) = {
                let info = &self.passes()[pass_index];
                (info.render_pass_name.clone(), info.shader_name.clone())
            };

            ctx.begin_pass(&render_pass_name)?;
            ctx.use_shader(&shader_name)?;

            if ctx.shader_needs_global_apply(&shader_name, frame_number)? {
                self.apply_globals(ctx, globals, pass_index)?;
                ctx.apply_shader_globals(&shader_name, frame_number)?;
            }

            self.on_render(ctx, packet, globals, pass_index)?;

            ctx.end_pass(&render_pass_name)?;
        }
        Ok(())
    }
}
