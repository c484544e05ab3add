//! The four reference-counted repositories plus the geometry store.

pub mod geometry;
pub mod material;
pub mod repository;
pub mod shader;
pub mod texture;

pub use geometry::{Geometry, GeometryId, GeometryRepository, Vertex2D, Vertex3D};
pub use material::Material;
pub use repository::Repository;
pub use shader::{Shader, UniformScope};
pub use texture::{Filter, PackedTexture, Repeat, Texture, TextureKind, TextureMap, TextureUse};

use crate::backend::{RenderBackend, TextureDesc};
use crate::config::{CullMode, ShaderConfig};
use crate::errors::Result;
use crate::render::view::ViewKind;
use crate::scene::Camera;

pub type TextureRepository = Repository<Texture>;
pub type MaterialRepository = Repository<Material>;
pub type ShaderRepository = Repository<Shader>;
pub type CameraRepository = Repository<Camera>;

/// Bundles all four repositories and eagerly creates the built-in defaults
/// named throughout the data model: `default_texture`, `default_material`,
/// `default_camera`, `default_geometry`, `default_2d_geometry`.
pub struct Repositories {
    pub textures: TextureRepository,
    pub shaders: ShaderRepository,
    pub geometries: GeometryRepository,
    pub materials: MaterialRepository,
    pub cameras: CameraRepository,
}

impl Repositories {
    pub fn new(backend: &mut dyn RenderBackend) -> Result<Self> {
        let mut textures = TextureRepository::new("texture");
        let placeholder_desc = TextureDesc {
            name: "default_texture".into(),
            width: 1,
            height: 1,
            channels: 4,
            mipmapped: false,
            transparent: false,
            writable: false,
            cube: false,
        };
        let placeholder_handle = backend.create_texture(&placeholder_desc, Some(&[255, 255, 255, 255]))?;
        textures.register_default(
            "default_texture",
            Texture::new("default_texture", &placeholder_desc, placeholder_handle, TextureKind::Flat2D),
        );

        let mut materials = MaterialRepository::new("material");
        materials.register_default("default_material", Material::new("default_material", "default_material"));

        let mut cameras = CameraRepository::new("camera");
        cameras.register_default("default_camera", Camera::new());

        let mut shaders = ShaderRepository::new("shader");
        for kind in ViewKind::ALL {
            register_default_shader(&mut shaders, backend, kind.default_shader_name())?;
        }

        let geometries = GeometryRepository::new(backend)?;

        Ok(Self { textures, shaders, geometries, materials, cameras })
    }
}

/// Registers one empty built-in shader under `name`: no uniforms, no
/// samplers, just enough for a view whose configured shader name couldn't
/// be found to still bind and draw against something.
fn register_default_shader(shaders: &mut ShaderRepository, backend: &mut dyn RenderBackend, name: &str) -> Result<()> {
    let config = ShaderConfig {
        name: name.to_string(),
        renderpass_name: String::new(),
        stage_sources: Vec::new(),
        global_uniforms: Vec::new(),
        instance_uniforms: Vec::new(),
        local_uniforms: Vec::new(),
        samplers: Vec::new(),
        cull_mode: CullMode::Back,
        depth_test: true,
        depth_write: true,
    };
    let handle = backend.create_shader(&config)?;
    shaders.register_default(name, Shader::new(name, handle, &config));
    Ok(())
}
