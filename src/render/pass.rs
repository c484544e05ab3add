//! Render passes: a named clear/depth/multisample policy over an ordered
//! set of render targets, chained via `prev`/`next` for dependency ordering.

use rustc_hash::FxHashMap;

use crate::backend::{PassHandle, Rect, RenderBackend};
use crate::config::RenderPassConfig;
use crate::errors::{RenderError, Result};
use crate::render::target::RenderTarget;

bitflags::bitflags! {
    /// Which attachments a pass begin clears. The `serde` feature on the
    /// `bitflags` crate gives this `Serialize`/`Deserialize` for free.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u8 {
        const COLOR = 0b001;
        const DEPTH = 0b010;
        const STENCIL = 0b100;
    }
}

impl Default for ClearFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// A render pass: its clear policy, ordering links to neighboring passes,
/// and the render targets it can begin against.
pub struct RenderPass {
    pub name: String,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub draw_offset: (f32, f32),
    pub clear_color: [f32; 4],
    pub clear_flags: ClearFlags,
    pub depth_testing: bool,
    pub multisampling: bool,
    pub(crate) handle: PassHandle,
    /// Window-bound passes select their target by swapchain image index;
    /// offscreen passes select by frame-in-flight index.
    pub window_bound: bool,
    targets: Vec<RenderTarget>,
    active: bool,
}

impl RenderPass {
    #[must_use]
    pub fn new(name: impl Into<String>, handle: PassHandle, config: &RenderPassConfig, window_bound: bool) -> Self {
        Self {
            name: name.into(),
            prev: config.prev.clone(),
            next: config.next.clone(),
            draw_offset: config.draw_offset,
            clear_color: config.clear_color,
            clear_flags: config.clear_flags,
            depth_testing: config.depth_testing,
            multisampling: config.multisampling,
            handle,
            window_bound,
            targets: Vec::new(),
            active: false,
        }
    }

    #[must_use]
    pub fn handle(&self) -> PassHandle {
        self.handle
    }

    pub fn add_render_target(&mut self, target: RenderTarget) {
        self.targets.push(target);
    }

    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Resolves which render-target slot a module should begin against for
    /// this frame, given the backend's current swap image and frame-in-flight
    /// index.
    #[must_use]
    pub fn target_index(&self, swap_image_index: usize, frame_in_flight_index: usize) -> usize {
        let raw = if self.window_bound { swap_image_index } else { frame_in_flight_index };
        if self.targets.is_empty() { 0 } else { raw % self.targets.len() }
    }

    /// Begins the pass against the render target at `target_index`.
    ///
    /// # Panics
    /// Panics if called while the pass is already active (begin/end brackets
    /// must not nest or be called out of order); this is a programmer error,
    /// not a recoverable runtime condition.
    pub fn begin(&mut self, backend: &mut dyn RenderBackend, target_index: usize) -> Result<()> {
        assert!(!self.active, "render pass '{}' begin called while already active", self.name);
        let name = self.name.clone();
        let target = self
            .targets
            .get_mut(target_index)
            .ok_or_else(|| RenderError::not_found("render_target", format!("{name}[{target_index}]")))?;
        let target_handle = target.build(backend, self.handle)?;
        backend.begin_render_pass(self.handle, target_handle, self.clear_color, self.clear_flags.contains(ClearFlags::DEPTH));
        self.active = true;
        Ok(())
    }

    /// Ends the pass begun by a matching [`Self::begin`].
    ///
    /// # Panics
    /// Panics if called without an active `begin`.
    pub fn end(&mut self, backend: &mut dyn RenderBackend) {
        assert!(self.active, "render pass '{}' end called without a matching begin", self.name);
        backend.end_render_pass(self.handle);
        self.active = false;
    }

    pub fn set_viewport(&self, backend: &mut dyn RenderBackend, rect: Rect) {
        backend.viewport_set(rect);
    }

    pub fn reset_viewport(&self, backend: &mut dyn RenderBackend) {
        backend.viewport_reset();
    }

    pub fn set_scissors(&self, backend: &mut dyn RenderBackend, rect: Rect) {
        backend.scissors_set(rect);
    }

    pub fn reset_scissors(&self, backend: &mut dyn RenderBackend) {
        backend.scissors_reset();
    }
}

/// Name-keyed collection of the render passes a frame's modules beg in
/// against. Distinct from the generic [`crate::resources::Repository`]
/// because passes are not refcounted resources, just named singletons.
#[derive(Default)]
pub struct PassRegistry {
    passes: FxHashMap<String, RenderPass>,
}

impl PassRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pass: RenderPass) {
        self.passes.insert(pass.name.clone(), pass);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RenderPass> {
        self.passes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RenderPass> {
        self.passes.get_mut(name)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RenderPass> {
        self.passes.values_mut()
    }
}
