//! Shader uniform state machine.
//!
//! A shader exposes three uniform scopes (global, instance, local); uniform
//! names are resolved to indices once, at construction, and every draw-path
//! lookup afterwards goes through the integer index.

use rustc_hash::FxHashMap;

use crate::backend::{RenderBackend, ShaderHandle, TextureMapHandle};
use crate::config::ShaderConfig;
use crate::errors::{RenderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformScope {
    Global,
    Instance,
    Local,
}

pub struct Shader {
    pub name: String,
    pub(crate) handle: ShaderHandle,
    index_of: FxHashMap<String, u16>,
    bound_scope: UniformScope,
    /// Frame number `apply_global` was last invoked for. `None` before the
    /// first render. Compared by the module driver to guarantee at most one
    /// `apply_global` per (shader, frame).
    pub rendered_frame_number: Option<u64>,
}

impl Shader {
    #[must_use]
    pub fn new(name: impl Into<String>, handle: ShaderHandle, config: &ShaderConfig) -> Self {
        let mut index_of = FxHashMap::default();
        let mut next = 0u16;
        for decl in config
            .global_uniforms
            .iter()
            .chain(config.instance_uniforms.iter())
            .chain(config.local_uniforms.iter())
            .chain(config.samplers.iter())
        {
            index_of.entry(decl.name.clone()).or_insert_with(|| {
                let idx = next;
                next += 1;
                idx
            });
        }
        Self {
            name: name.into(),
            handle,
            index_of,
            bound_scope: UniformScope::Global,
            rendered_frame_number: None,
        }
    }

    /// Resolves a uniform name to its stable index. Intended to be called
    /// once per (shader, name) at module setup, never per-frame.
    pub fn get_uniform_index(&self, name: &str) -> Result<u16> {
        self.index_of
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::not_found("uniform", name.to_string()))
    }

    pub fn use_shader(&mut self, backend: &mut dyn RenderBackend) {
        backend.use_shader(self.handle);
    }

    pub fn bind_instance(&mut self, backend: &mut dyn RenderBackend, instance: u32) {
        backend.bind_instance(self.handle, instance);
        self.bound_scope = UniformScope::Instance;
    }

    #[must_use]
    pub fn bound_scope(&self) -> UniformScope {
        self.bound_scope
    }

    pub fn set_local_scope(&mut self) {
        self.bound_scope = UniformScope::Local;
    }

    pub fn set_global_scope(&mut self) {
        self.bound_scope = UniformScope::Global;
    }

    pub fn set_uniform_f32(&mut self, backend: &mut dyn RenderBackend, index: u16, value: f32) {
        backend.set_uniform_f32(self.handle, index, value);
    }

    pub fn set_uniform_vec4(&mut self, backend: &mut dyn RenderBackend, index: u16, value: [f32; 4]) {
        backend.set_uniform_vec4(self.handle, index, value);
    }

    pub fn set_uniform_mat4(&mut self, backend: &mut dyn RenderBackend, index: u16, value: [f32; 16]) {
        backend.set_uniform_mat4(self.handle, index, value);
    }

    pub fn set_uniform_bytes(&mut self, backend: &mut dyn RenderBackend, index: u16, bytes: &[u8]) {
        backend.set_uniform_bytes(self.handle, index, bytes);
    }

    pub fn set_sampler(&mut self, backend: &mut dyn RenderBackend, index: u16, map: TextureMapHandle) {
        backend.set_sampler(self.handle, index, map);
    }

    /// Whether `apply_global` must run for this frame, per the
    /// global-uniform-idempotence invariant.
    #[must_use]
    pub fn needs_global_apply(&self, frame_no: u64) -> bool {
        self.rendered_frame_number != Some(frame_no)
    }

    pub fn apply_global(&mut self, backend: &mut dyn RenderBackend, frame_no: u64) -> Result<()> {
        backend.apply_global(self.handle).map_err(|err| RenderError::ShaderApplyFailed {
            shader: self.name.clone(),
            reason: err.to_string(),
        })?;
        self.rendered_frame_number = Some(frame_no);
        Ok(())
    }

    pub fn apply_instance(&mut self, backend: &mut dyn RenderBackend) -> Result<()> {
        backend.apply_instance(self.handle).map_err(|err| RenderError::ShaderApplyFailed {
            shader: self.name.clone(),
            reason: err.to_string(),
        })
    }

    pub fn acquire_instance_resources(
        &mut self,
        backend: &mut dyn RenderBackend,
        maps: &[TextureMapHandle],
    ) -> Result<u32> {
        backend.acquire_instance_resources(self.handle, maps)
    }

    pub fn release_instance_resources(&mut self, backend: &mut dyn RenderBackend, instance: u32) {
        backend.release_instance_resources(self.handle, instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CullMode, UniformDecl, UniformKind};

    fn config() -> ShaderConfig {
        ShaderConfig {
            name: "world".into(),
            renderpass_name: "world_pass".into(),
            stage_sources: vec![],
            global_uniforms: vec![
                UniformDecl { name: "projection".into(), kind: UniformKind::Mat4, size: 64, array_length: 1 },
                UniformDecl { name: "view".into(), kind: UniformKind::Mat4, size: 64, array_length: 1 },
            ],
            instance_uniforms: vec![UniformDecl {
                name: "smoothness".into(),
                kind: UniformKind::Float,
                size: 4,
                array_length: 1,
            }],
            local_uniforms: vec![],
            samplers: vec![],
            cull_mode: CullMode::Back,
            depth_test: true,
            depth_write: true,
        }
    }

    #[test]
    fn uniform_indices_resolve_once_and_stay_stable() {
        let shader = Shader::new("world", 1, &config());
        let projection = shader.get_uniform_index("projection").unwrap();
        let view = shader.get_uniform_index("view").unwrap();
        assert_ne!(projection, view);
        assert_eq!(shader.get_uniform_index("projection").unwrap(), projection);
        assert!(shader.get_uniform_index("does_not_exist").is_err());
    }

    #[test]
    fn needs_global_apply_is_per_frame() {
        let mut shader = Shader::new("world", 1, &config());
        assert!(shader.needs_global_apply(1));
        shader.rendered_frame_number = Some(1);
        assert!(!shader.needs_global_apply(1));
        assert!(shader.needs_global_apply(2));
    }
}
