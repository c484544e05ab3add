//! Render targets: ordered texture attachments at a shared extent.

use smallvec::SmallVec;

use crate::backend::{PassHandle, RenderBackend, TargetHandle, TextureHandle};
use crate::errors::Result;

/// A framebuffer: attachments built lazily against a render pass, resized
/// together so the "all attachments share the same extent" invariant can
/// never be violated mid-resize.
#[derive(Debug)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
    pub attachments: SmallVec<[TextureHandle; 4]>,
    handle: Option<TargetHandle>,
}

impl RenderTarget {
    #[must_use]
    pub fn new(width: u32, height: u32, attachments: SmallVec<[TextureHandle; 4]>) -> Self {
        Self { width, height, attachments, handle: None }
    }

    #[must_use]
    pub fn handle(&self) -> Option<TargetHandle> {
        self.handle
    }

    pub fn build(&mut self, backend: &mut dyn RenderBackend, pass: PassHandle) -> Result<TargetHandle> {
        if let Some(handle) = self.handle {
            return Ok(handle);
        }
        let handle = backend.create_render_target(pass, self.width, self.height, &self.attachments)?;
        self.handle = Some(handle);
        Ok(handle)
    }

    /// Resizes every attachment together, rebuilding the backend target.
    pub fn resize(
        &mut self,
        backend: &mut dyn RenderBackend,
        pass: PassHandle,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if self.width == width && self.height == height {
            return Ok(());
        }
        if let Some(handle) = self.handle.take() {
            backend.destroy_render_target(handle, false);
        }
        self.width = width;
        self.height = height;
        self.build(backend, pass)?;
        Ok(())
    }
}
