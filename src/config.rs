//! Config surfaces consumed from an external resource loader.
//!
//! These types describe the *shape* the core expects, not an on-disk
//! encoding; an asset pipeline outside this crate's scope is responsible
//! for producing them (typically by deserializing from JSON via `serde_json`).

use serde::{Deserialize, Serialize};

use crate::render::pass::ClearFlags;
use crate::render::view::{ProjectionSource, ViewKind, ViewMatrixSource};

/// One uniform declaration within a shader scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniformDecl {
    pub name: String,
    pub kind: UniformKind,
    pub size: u32,
    #[serde(default = "one")]
    pub array_length: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Int,
    Sampler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// The shader config surface named in the external-interfaces section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderConfig {
    pub name: String,
    pub renderpass_name: String,
    pub stage_sources: Vec<String>,
    #[serde(default)]
    pub global_uniforms: Vec<UniformDecl>,
    #[serde(default)]
    pub instance_uniforms: Vec<UniformDecl>,
    #[serde(default)]
    pub local_uniforms: Vec<UniformDecl>,
    #[serde(default)]
    pub samplers: Vec<UniformDecl>,
    #[serde(default = "CullMode_back")]
    pub cull_mode: CullMode,
    #[serde(default = "truthy")]
    pub depth_test: bool,
    #[serde(default = "truthy")]
    pub depth_write: bool,
}

#[allow(non_snake_case)]
fn CullMode_back() -> CullMode {
    CullMode::Back
}

fn truthy() -> bool {
    true
}

/// The render-pass config surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderPassConfig {
    pub name: String,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub draw_offset: (f32, f32),
    #[serde(default)]
    pub clear_color: [f32; 4],
    #[serde(default)]
    pub clear_flags: ClearFlags,
    #[serde(default = "truthy")]
    pub depth_testing: bool,
    #[serde(default)]
    pub multisampling: bool,
}

/// The render-view config surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderViewConfig {
    pub name: String,
    pub shader_name: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "type")]
    pub kind: ViewKind,
    pub view_source: ViewMatrixSource,
    pub proj_source: ProjectionSource,
    #[serde(default)]
    pub passes: Vec<String>,
    #[serde(default)]
    pub fov_degrees: Option<f32>,
    #[serde(default)]
    pub near: Option<f32>,
    #[serde(default)]
    pub far: Option<f32>,
    #[serde(default)]
    pub camera_name: Option<String>,
}
