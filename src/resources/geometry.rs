//! Geometry repository: vertex/index buffers plus the built-in generators.
//!
//! Geometry is looked up by id (the common draw-path case) or by name (at
//! load time); unlike the name-only repositories in [`super::repository`]
//! it needs both indices, so it is not built on `Repository<T>`.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};

use crate::backend::{GeometryHandle, RenderBackend, VertexLayout};
use crate::errors::Result;

new_key_type! {
    pub struct GeometryId;
}

#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Vertex2D {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct Geometry {
    pub name: String,
    pub material_name: Option<String>,
    pub(crate) handle: GeometryHandle,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl Geometry {
    #[must_use]
    pub fn handle(&self) -> GeometryHandle {
        self.handle
    }
}

struct Entry {
    geometry: Geometry,
    refcount: u32,
    auto_release: bool,
}

pub struct GeometryRepository {
    slots: SlotMap<GeometryId, Entry>,
    by_name: FxHashMap<String, GeometryId>,
    default_names: FxHashSet<String>,
    default_geometry: GeometryId,
    default_2d_geometry: GeometryId,
}

impl GeometryRepository {
    /// Builds the repository and eagerly creates both built-in defaults
    /// (a unit cube and a fullscreen-rect "2D" geometry). Neither is ever
    /// released.
    pub fn new(backend: &mut dyn RenderBackend) -> Result<Self> {
        let mut slots = SlotMap::with_key();
        let mut by_name = FxHashMap::default();
        let mut default_names = FxHashSet::default();

        let cube = build_cube(backend, "default_geometry")?;
        let default_geometry = slots.insert(Entry { geometry: cube, refcount: 1, auto_release: false });
        by_name.insert("default_geometry".to_string(), default_geometry);
        default_names.insert("default_geometry".to_string());

        let rect = build_screen_rect(backend, "default_2d_geometry")?;
        let default_2d_geometry = slots.insert(Entry { geometry: rect, refcount: 1, auto_release: false });
        by_name.insert("default_2d_geometry".to_string(), default_2d_geometry);
        default_names.insert("default_2d_geometry".to_string());

        Ok(Self { slots, by_name, default_names, default_geometry, default_2d_geometry })
    }

    #[must_use]
    pub fn default_geometry(&self) -> GeometryId {
        self.default_geometry
    }

    #[must_use]
    pub fn default_2d_geometry(&self) -> GeometryId {
        self.default_2d_geometry
    }

    #[must_use]
    pub fn get(&self, id: GeometryId) -> Option<&Geometry> {
        self.slots.get(id).map(|entry| &entry.geometry)
    }

    /// Acquires by id, bumping its refcount. Unknown ids fall back to the
    /// default geometry, per the data-model contract.
    pub fn acquire_by_id(&mut self, id: GeometryId) -> GeometryId {
        if self.slots.contains_key(id) {
            self.slots[id].refcount += 1;
            id
        } else {
            log::warn!(target: "forge_render::repository", "unknown geometry id, substituting default");
            self.slots[self.default_geometry].refcount += 1;
            self.default_geometry
        }
    }

    /// Acquires by name, creating via `create` on first use.
    pub fn acquire_named(
        &mut self,
        name: &str,
        backend: &mut dyn RenderBackend,
        create: impl FnOnce(&mut dyn RenderBackend) -> Result<Geometry>,
    ) -> Result<GeometryId> {
        if name.is_empty() {
            return Ok(self.acquire_by_id(self.default_geometry));
        }
        if let Some(&id) = self.by_name.get(name) {
            self.slots[id].refcount += 1;
            return Ok(id);
        }
        if self.default_names.contains(&name.to_lowercase()) {
            log::warn!(target: "forge_render::repository", "refusing to override default geometry '{name}'");
            return Ok(self.acquire_by_id(self.default_geometry));
        }
        let geometry = create(backend)?;
        let id = self.slots.insert(Entry { geometry, refcount: 1, auto_release: true });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn release(&mut self, id: GeometryId, backend: &mut dyn RenderBackend) {
        let Some(entry) = self.slots.get_mut(id) else {
            log::warn!(target: "forge_render::repository", "release of unknown geometry id");
            return;
        };
        if entry.refcount == 0 {
            log::warn!(target: "forge_render::repository", "unbalanced geometry release");
            return;
        }
        entry.refcount -= 1;
        if entry.refcount == 0 && entry.auto_release {
            if let Some(removed) = self.slots.remove(id) {
                backend.destroy_geometry(removed.geometry.handle);
                self.by_name.retain(|_, v| *v != id);
            }
        }
    }
}

fn build_cube(backend: &mut dyn RenderBackend, name: &str) -> Result<Geometry> {
    const P: f32 = 0.5;
    let faces: [[[f32; 3]; 4]; 6] = [
        [[-P, -P, P], [P, -P, P], [P, P, P], [-P, P, P]],
        [[P, -P, -P], [-P, -P, -P], [-P, P, -P], [P, P, -P]],
        [[-P, P, P], [P, P, P], [P, P, -P], [-P, P, -P]],
        [[-P, -P, -P], [P, -P, -P], [P, -P, P], [-P, -P, P]],
        [[P, -P, P], [P, -P, -P], [P, P, -P], [P, P, P]],
        [[-P, -P, -P], [-P, -P, P], [-P, P, P], [-P, P, -P]],
    ];
    let normals: [[f32; 3]; 6] =
        [[0.0, 0.0, 1.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]];
    let uvs: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face_index, face) in faces.iter().enumerate() {
        let base = (vertices.len()) as u32;
        for (corner_index, corner) in face.iter().enumerate() {
            vertices.push(Vertex3D { position: *corner, normal: normals[face_index], uv: uvs[corner_index] });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let handle = backend.create_geometry(
        name,
        VertexLayout { stride: std::mem::size_of::<Vertex3D>() as u32 },
        bytemuck::cast_slice(&vertices),
        &indices,
    )?;

    Ok(Geometry {
        name: name.to_string(),
        material_name: None,
        handle,
        vertex_count: vertices.len() as u32,
        index_count: indices.len() as u32,
    })
}

fn build_screen_rect(backend: &mut dyn RenderBackend, name: &str) -> Result<Geometry> {
    let vertices = [
        Vertex2D { position: [-1.0, -1.0], uv: [0.0, 0.0] },
        Vertex2D { position: [1.0, -1.0], uv: [1.0, 0.0] },
        Vertex2D { position: [1.0, 1.0], uv: [1.0, 1.0] },
        Vertex2D { position: [-1.0, 1.0], uv: [0.0, 1.0] },
    ];
    let indices = [0u32, 1, 2, 0, 2, 3];

    let handle = backend.create_geometry(
        name,
        VertexLayout { stride: std::mem::size_of::<Vertex2D>() as u32 },
        bytemuck::cast_slice(&vertices),
        &indices,
    )?;

    Ok(Geometry {
        name: name.to_string(),
        material_name: None,
        handle,
        vertex_count: vertices.len() as u32,
        index_count: indices.len() as u32,
    })
}
