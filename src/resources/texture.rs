//! Textures, packed per-frame-in-flight textures, and texture maps.

use crate::backend::{RenderBackend, TextureDesc, TextureHandle, TextureMapHandle};
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Flat2D,
    Cube,
    RenderTarget,
    Packed,
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub mipmapped: bool,
    pub transparent: bool,
    pub writable: bool,
    pub kind: TextureKind,
    pub(crate) handle: TextureHandle,
    /// Last frame number this render-target texture was transitioned for.
    /// `None` for non-render-target kinds, which have no transition state.
    transitioned_frame: Option<u64>,
}

impl Texture {
    #[must_use]
    pub fn new(name: impl Into<String>, desc: &TextureDesc, handle: TextureHandle, kind: TextureKind) -> Self {
        Self {
            name: name.into(),
            width: desc.width,
            height: desc.height,
            channels: desc.channels,
            mipmapped: desc.mipmapped,
            transparent: desc.transparent,
            writable: desc.writable,
            kind,
            handle,
            transitioned_frame: None,
        }
    }

    #[must_use]
    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// Transitions a render-target texture for `frame_no`. A no-op (and not
    /// reported as an error) when already transitioned this frame, per the
    /// "idempotent within a frame" invariant.
    pub fn transition_render_target(&mut self, frame_no: u64) -> bool {
        if self.transitioned_frame == Some(frame_no) {
            return false;
        }
        self.transitioned_frame = Some(frame_no);
        true
    }

    pub fn resize(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<()> {
        backend.resize_texture(self.handle, width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }
}

/// An F-ary array of textures, one per frame in flight, selected by
/// `frame_number mod F`.
#[derive(Debug)]
pub struct PackedTexture {
    pub name: String,
    slots: Vec<Texture>,
}

impl PackedTexture {
    #[must_use]
    pub fn new(name: impl Into<String>, slots: Vec<Texture>) -> Self {
        Self { name: name.into(), slots }
    }

    #[must_use]
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn get_at(&self, frame_index: usize) -> &Texture {
        &self.slots[frame_index % self.slots.len()]
    }

    pub fn get_at_mut(&mut self, frame_index: usize) -> &mut Texture {
        let len = self.slots.len();
        &mut self.slots[frame_index % len]
    }

    /// Transitions the slot selected by `frame_number mod F` for this frame.
    pub fn transition_for_frame(&mut self, frame_number: u64) -> bool {
        let len = self.slots.len();
        self.slots[(frame_number as usize) % len].transition_render_target(frame_number)
    }

    pub fn resize_all(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<()> {
        for slot in &mut self.slots {
            slot.resize(backend, width, height)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    BiLinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUse {
    Diffuse,
    Specular,
    Normal,
    Custom(u32),
}

/// Binds a texture to sampler settings. Owns the backend sampler/bind-group
/// object once acquired.
#[derive(Debug, Clone)]
pub struct TextureMap {
    pub use_tag: TextureUse,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub repeat_u: Repeat,
    pub repeat_v: Repeat,
    pub repeat_w: Repeat,
    pub(crate) texture: TextureHandle,
    pub(crate) handle: Option<TextureMapHandle>,
}

impl TextureMap {
    #[must_use]
    pub fn new(use_tag: TextureUse, texture: TextureHandle) -> Self {
        Self {
            use_tag,
            min_filter: Filter::BiLinear,
            mag_filter: Filter::BiLinear,
            repeat_u: Repeat::Repeat,
            repeat_v: Repeat::Repeat,
            repeat_w: Repeat::Repeat,
            texture,
            handle: None,
        }
    }

    pub fn acquire(&mut self, backend: &mut dyn RenderBackend) -> Result<TextureMapHandle> {
        if let Some(handle) = self.handle {
            return Ok(handle);
        }
        let handle = backend.create_texture_map(self.texture)?;
        self.handle = Some(handle);
        Ok(handle)
    }

    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(handle) = self.handle.take() {
            backend.destroy_texture_map(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_texture(name: &str, handle: TextureHandle) -> Texture {
        let desc = TextureDesc {
            name: name.to_string(),
            width: 4,
            height: 4,
            channels: 4,
            mipmapped: false,
            transparent: false,
            writable: false,
            cube: false,
        };
        Texture::new(name, &desc, handle, TextureKind::RenderTarget)
    }

    #[test]
    fn transition_is_idempotent_within_a_frame() {
        let mut tex = dummy_texture("t", 1);
        assert!(tex.transition_render_target(5));
        assert!(!tex.transition_render_target(5));
        assert!(tex.transition_render_target(6));
    }

    #[test]
    fn packed_texture_selects_slot_by_modulo() {
        let slots = vec![dummy_texture("a", 1), dummy_texture("b", 2), dummy_texture("c", 3)];
        let packed = PackedTexture::new("packed", slots);
        assert_eq!(packed.get_at(0).name, "a");
        assert_eq!(packed.get_at(3).name, "a");
        assert_eq!(packed.get_at(4).name, "b");
        assert_eq!(packed.get_at(5).name, "c");
    }
}
