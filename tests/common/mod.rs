//! In-memory `RenderBackend` mock shared by the black-box frame-orchestrator
//! tests. Every GPU operation is a bookkeeping no-op; handles are just
//! incrementing counters and every call that matters to a test is recorded
//! so assertions can inspect it afterwards.

use std::ops::Range;

use forge_render::backend::{
    GeometryHandle, PassHandle, Rect, RenderBackend, ShaderHandle, TargetHandle, TextureDesc, TextureHandle,
    TextureMapHandle, VertexLayout,
};
use forge_render::config::ShaderConfig;
use forge_render::{RenderError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedDraw {
    pub geometry: GeometryHandle,
    pub instances: Range<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    F32(f32),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUniform {
    pub shader: ShaderHandle,
    pub index: u16,
    pub value: UniformValue,
}

#[derive(Default)]
pub struct MockBackend {
    pub begin_frame_calls: u32,
    pub end_frame_calls: u32,
    pub increment_frame_number_calls: u32,
    pub draws: Vec<RecordedDraw>,
    pub uniform_sets: Vec<RecordedUniform>,
    pub window_attachment_count: u32,
    pub frames_in_flight: u32,
    pub current_window_attachment_index: u32,
    /// When set, the next `begin_frame` returns this error instead of `Ok`.
    pub next_begin_frame_error: Option<RenderError>,
    next_handle: u32,
    destroyed_textures: Vec<TextureHandle>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self { window_attachment_count: 1, frames_in_flight: 2, ..Self::default() }
    }

    fn fresh_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    #[must_use]
    pub fn destroyed_textures(&self) -> &[TextureHandle] {
        &self.destroyed_textures
    }
}

impl RenderBackend for MockBackend {
    fn begin_frame(&mut self, _delta_time: f32) -> Result<()> {
        if let Some(err) = self.next_begin_frame_error.take() {
            return Err(err);
        }
        self.begin_frame_calls += 1;
        Ok(())
    }

    fn end_frame(&mut self, _delta_time: f32) -> Result<()> {
        self.end_frame_calls += 1;
        Ok(())
    }

    fn increment_frame_number(&mut self) {
        self.increment_frame_number_calls += 1;
    }

    fn current_window_attachment_index(&self) -> u32 {
        self.current_window_attachment_index
    }

    fn window_attachment_count(&self) -> u32 {
        self.window_attachment_count
    }

    fn frames_in_flight(&self) -> u32 {
        self.frames_in_flight
    }

    fn resized(&mut self, _width: u32, _height: u32) {}

    fn create_texture(&mut self, _desc: &TextureDesc, _data: Option<&[u8]>) -> Result<TextureHandle> {
        Ok(self.fresh_handle())
    }

    fn create_writable_texture(&mut self, _desc: &TextureDesc) -> Result<TextureHandle> {
        Ok(self.fresh_handle())
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.destroyed_textures.push(handle);
    }

    fn resize_texture(&mut self, _handle: TextureHandle, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    fn texture_write_data(&mut self, _handle: TextureHandle, _bytes: &[u8], _offset: u64) -> Result<()> {
        Ok(())
    }

    fn create_texture_map(&mut self, _texture: TextureHandle) -> Result<TextureMapHandle> {
        Ok(self.fresh_handle())
    }

    fn destroy_texture_map(&mut self, _handle: TextureMapHandle) {}

    fn create_geometry(&mut self, _name: &str, _vertex_layout: VertexLayout, _vertices: &[u8], _indices: &[u32]) -> Result<GeometryHandle> {
        Ok(self.fresh_handle())
    }

    fn destroy_geometry(&mut self, _handle: GeometryHandle) {}

    fn draw_geometry(&mut self, handle: GeometryHandle, instances: Range<u32>) {
        self.draws.push(RecordedDraw { geometry: handle, instances });
    }

    fn create_shader(&mut self, _config: &ShaderConfig) -> Result<ShaderHandle> {
        Ok(self.fresh_handle())
    }

    fn destroy_shader(&mut self, _handle: ShaderHandle) {}

    fn create_render_pass(&mut self, _name: &str) -> Result<PassHandle> {
        Ok(self.fresh_handle())
    }

    fn destroy_render_pass(&mut self, _handle: PassHandle) {}

    fn get_render_pass(&self, name: &str) -> Result<PassHandle> {
        Err(RenderError::not_found("render_pass", name.to_string()))
    }

    fn create_render_target(&mut self, _pass: PassHandle, _width: u32, _height: u32, _attachments: &[TextureHandle]) -> Result<TargetHandle> {
        Ok(self.fresh_handle())
    }

    fn destroy_render_target(&mut self, _handle: TargetHandle, _free_internal: bool) {}

    fn get_color_attachment(&self) -> TextureHandle {
        0
    }

    fn get_depth_attachment(&self) -> TextureHandle {
        0
    }

    fn get_window_attachment(&self, _index: u32) -> TextureHandle {
        0
    }

    fn get_depth_texture(&self) -> TextureHandle {
        0
    }

    fn viewport_set(&mut self, _rect: Rect) {}
    fn viewport_reset(&mut self) {}
    fn scissors_set(&mut self, _rect: Rect) {}
    fn scissors_reset(&mut self) {}

    fn begin_render_pass(&mut self, _pass: PassHandle, _target: TargetHandle, _clear_color: [f32; 4], _clear_depth: bool) {}
    fn end_render_pass(&mut self, _pass: PassHandle) {}

    fn use_shader(&mut self, _shader: ShaderHandle) {}

    fn set_uniform_f32(&mut self, shader: ShaderHandle, index: u16, value: f32) {
        self.uniform_sets.push(RecordedUniform { shader, index, value: UniformValue::F32(value) });
    }

    fn set_uniform_vec4(&mut self, shader: ShaderHandle, index: u16, value: [f32; 4]) {
        self.uniform_sets.push(RecordedUniform { shader, index, value: UniformValue::Vec4(value) });
    }

    fn set_uniform_mat4(&mut self, shader: ShaderHandle, index: u16, value: [f32; 16]) {
        self.uniform_sets.push(RecordedUniform { shader, index, value: UniformValue::Mat4(value) });
    }

    fn set_uniform_bytes(&mut self, shader: ShaderHandle, index: u16, bytes: &[u8]) {
        self.uniform_sets.push(RecordedUniform { shader, index, value: UniformValue::Bytes(bytes.to_vec()) });
    }

    fn set_sampler(&mut self, _shader: ShaderHandle, _index: u16, _map: TextureMapHandle) {}

    fn bind_instance(&mut self, _shader: ShaderHandle, _instance: u32) {}

    fn apply_global(&mut self, _shader: ShaderHandle) -> Result<()> {
        Ok(())
    }

    fn apply_instance(&mut self, _shader: ShaderHandle) -> Result<()> {
        Ok(())
    }

    fn acquire_instance_resources(&mut self, _shader: ShaderHandle, _maps: &[TextureMapHandle]) -> Result<u32> {
        Ok(self.fresh_handle())
    }

    fn release_instance_resources(&mut self, _shader: ShaderHandle, _instance: u32) {}
}
