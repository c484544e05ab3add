//! Crate-wide error type.
//!
//! Mirrors the error kinds a core render-graph operation can fail with.
//! Nothing here panics; callers decide whether a given kind is fatal.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;

/// The kinds of failure a render-graph operation can report.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A repository lookup, a named render pass, or a uniform name was not found.
    #[error("not found: {kind} '{name}'")]
    NotFound { kind: &'static str, name: String },

    /// An empty or otherwise invalid name was supplied where one was required.
    #[error("invalid name for {kind}: {reason}")]
    NameInvalid { kind: &'static str, reason: String },

    /// Attempted to create a resource under a name already in use.
    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    /// The light registry has no free point-light slots.
    #[error("light registry at capacity ({capacity} point lights)")]
    CapacityExceeded { capacity: usize },

    /// A uniform set or scope flush failed on the backend.
    #[error("shader '{shader}' apply failed: {reason}")]
    ShaderApplyFailed { shader: String, reason: String },

    /// `begin_frame` reported a transient condition (resize / swapchain out of date).
    #[error("backend transient condition: {reason}")]
    BackendTransient { reason: String },

    /// Any other backend failure. Treated as fatal by the orchestrator.
    #[error("backend fatal error: {reason}")]
    BackendFatal { reason: String },
}

impl RenderError {
    #[must_use]
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound { kind, name: name.into() }
    }

    #[must_use]
    pub fn name_invalid(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::NameInvalid { kind, reason: reason.into() }
    }

    #[must_use]
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Duplicate { kind, name: name.into() }
    }

    /// Whether this error should terminate the whole frame loop, as opposed
    /// to being isolated to a single draw item, pass, or frame.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::BackendFatal { .. })
    }
}

/// Tag recorded alongside trace-level allocation logging. Purely diagnostic —
/// see the design notes on the original engine's tagged allocators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocTag {
    Renderer,
    GpuTexture,
    GpuBuffer,
    Shader,
    RenderView,
    RenderModule,
    Resource,
    Temp,
}

impl AllocTag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Renderer => "renderer",
            Self::GpuTexture => "gpu_texture",
            Self::GpuBuffer => "gpu_buffer",
            Self::Shader => "shader",
            Self::RenderView => "render_view",
            Self::RenderModule => "render_module",
            Self::Resource => "resource",
            Self::Temp => "temp",
        }
    }
}
