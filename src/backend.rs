//! The device backend: the only external collaborator this crate depends on.
//!
//! A concrete Vulkan (or any other graphics API) implementation lives outside
//! this crate and is handed to the [`FrameOrchestrator`](crate::render::orchestrator::FrameOrchestrator)
//! as a `&mut dyn RenderBackend`. Every type here is a thin, backend-owned
//! handle or descriptor; the core never inspects their internals.

use crate::config::ShaderConfig;
use crate::errors::Result;

/// Opaque handle to a backend-owned texture.
pub type TextureHandle = u32;
/// Opaque handle to a backend-owned texture + sampler binding.
pub type TextureMapHandle = u32;
/// Opaque handle to a backend-owned vertex/index buffer pair.
pub type GeometryHandle = u32;
/// Opaque handle to a backend-compiled shader program.
pub type ShaderHandle = u32;
/// Opaque handle to a backend render pass object.
pub type PassHandle = u32;
/// Opaque handle to a backend framebuffer object.
pub type TargetHandle = u32;

/// Axis-aligned pixel rectangle, used for viewport/scissor overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Describes a texture at creation time. Mirrors the attributes named for
/// the `Texture` data-model entry.
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub mipmapped: bool,
    pub transparent: bool,
    pub writable: bool,
    pub cube: bool,
}

/// A single vertex attribute stream, kept backend-agnostic as raw bytes.
#[derive(Debug, Clone, Copy)]
pub struct VertexLayout {
    pub stride: u32,
}

/// Device-backend contract consumed by the render graph core.
///
/// Implementations own the swapchain, the frame-in-flight ring, and all
/// GPU resource lifetimes. This crate never talks to the graphics API
/// directly; it only calls through this trait.
pub trait RenderBackend {
    /// Begins a new frame. Transient failures (resize/out-of-date swapchain)
    /// must be reported as `Err(RenderError::BackendTransient { .. })`, never
    /// as `BackendFatal`.
    fn begin_frame(&mut self, delta_time: f32) -> Result<()>;
    /// Ends the frame, submitting recorded work. May block if the
    /// frame-in-flight ring is full.
    fn end_frame(&mut self, delta_time: f32) -> Result<()>;
    /// Advances the backend's internal frame counter. Called once per frame
    /// by the orchestrator after a successful `end_frame`.
    fn increment_frame_number(&mut self);
    /// Index of the swapchain image acquired for the current frame.
    fn current_window_attachment_index(&self) -> u32;
    /// Number of images in the swapchain.
    fn window_attachment_count(&self) -> u32;
    /// Number of frames the GPU may have in flight simultaneously.
    fn frames_in_flight(&self) -> u32;
    /// Notifies the backend that the surface was resized.
    fn resized(&mut self, width: u32, height: u32);

    fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> Result<TextureHandle>;
    fn create_writable_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle>;
    fn destroy_texture(&mut self, handle: TextureHandle);
    fn resize_texture(&mut self, handle: TextureHandle, width: u32, height: u32) -> Result<()>;
    fn texture_write_data(&mut self, handle: TextureHandle, bytes: &[u8], offset: u64) -> Result<()>;

    fn create_texture_map(&mut self, texture: TextureHandle) -> Result<TextureMapHandle>;
    fn destroy_texture_map(&mut self, handle: TextureMapHandle);

    fn create_geometry(
        &mut self,
        name: &str,
        vertex_layout: VertexLayout,
        vertices: &[u8],
        indices: &[u32],
    ) -> Result<GeometryHandle>;
    fn destroy_geometry(&mut self, handle: GeometryHandle);
    fn draw_geometry(&mut self, handle: GeometryHandle, instances: std::ops::Range<u32>);

    fn create_shader(&mut self, config: &ShaderConfig) -> Result<ShaderHandle>;
    fn destroy_shader(&mut self, handle: ShaderHandle);

    fn create_render_pass(&mut self, name: &str) -> Result<PassHandle>;
    fn destroy_render_pass(&mut self, handle: PassHandle);
    fn get_render_pass(&self, name: &str) -> Result<PassHandle>;
    fn create_render_target(
        &mut self,
        pass: PassHandle,
        width: u32,
        height: u32,
        attachments: &[TextureHandle],
    ) -> Result<TargetHandle>;
    fn destroy_render_target(&mut self, handle: TargetHandle, free_internal: bool);

    fn get_color_attachment(&self) -> TextureHandle;
    fn get_depth_attachment(&self) -> TextureHandle;
    fn get_window_attachment(&self, index: u32) -> TextureHandle;
    fn get_depth_texture(&self) -> TextureHandle;

    fn viewport_set(&mut self, rect: Rect);
    fn viewport_reset(&mut self);
    fn scissors_set(&mut self, rect: Rect);
    fn scissors_reset(&mut self);

    fn begin_render_pass(&mut self, pass: PassHandle, target: TargetHandle, clear_color: [f32; 4], clear_depth: bool);
    fn end_render_pass(&mut self, pass: PassHandle);

    fn use_shader(&mut self, shader: ShaderHandle);
    fn set_uniform_f32(&mut self, shader: ShaderHandle, index: u16, value: f32);
    fn set_uniform_vec4(&mut self, shader: ShaderHandle, index: u16, value: [f32; 4]);
    fn set_uniform_mat4(&mut self, shader: ShaderHandle, index: u16, value: [f32; 16]);
    fn set_uniform_bytes(&mut self, shader: ShaderHandle, index: u16, bytes: &[u8]);
    fn set_sampler(&mut self, shader: ShaderHandle, index: u16, map: TextureMapHandle);
    fn bind_instance(&mut self, shader: ShaderHandle, instance: u32);
    fn apply_global(&mut self, shader: ShaderHandle) -> Result<()>;
    fn apply_instance(&mut self, shader: ShaderHandle) -> Result<()>;
    fn acquire_instance_resources(&mut self, shader: ShaderHandle, maps: &[TextureMapHandle]) -> Result<u32>;
    fn release_instance_resources(&mut self, shader: ShaderHandle, instance: u32);
}
