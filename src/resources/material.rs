//! Material: a shader reference, ordered texture maps, and scalar params.

use smallvec::SmallVec;

use super::texture::TextureMap;

#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub shader_name: String,
    pub maps: SmallVec<[TextureMap; 4]>,
    pub diffuse_color: [f32; 4],
    pub smoothness: f32,
    /// Per-instance shader id used to bind this material's instance-scoped
    /// uniforms; `None` until the owning module acquires instance resources.
    pub(crate) instance_id: Option<u32>,
}

impl Material {
    #[must_use]
    pub fn new(name: impl Into<String>, shader_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader_name: shader_name.into(),
            maps: SmallVec::new(),
            diffuse_color: [1.0, 1.0, 1.0, 1.0],
            smoothness: 0.5,
            instance_id: None,
        }
    }

    #[must_use]
    pub fn instance_id(&self) -> Option<u32> {
        self.instance_id
    }

    pub fn set_instance_id(&mut self, id: u32) {
        self.instance_id = Some(id);
    }
}
