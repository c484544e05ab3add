//! Screen-space ambient occlusion, full screen.

use glam::Vec3;
use rand::Rng;

use crate::backend::{RenderBackend, TextureDesc, TextureHandle};
use crate::errors::Result;
use crate::render::module::{apply_instance_or_skip, ensure_material_instance, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
use crate::resources::{GeometryId, Shader};

const KERNEL_SIZE: usize = 20;
const NOISE_SIZE: u32 = 4;

/// 16 fixed 3-channel noise samples (z = 0, values centered on 128 so the
/// raw bytes map to roughly [-1, 1] after the usual `x*2-1` unpack in the
/// sampling shader).
const NOISE_DATA: [u8; NOISE_SIZE as usize * NOISE_SIZE as usize * 3] = [
    12, 201, 128, 233, 54, 128, 98, 167, 128, 5, 220, 128, 171, 33, 128, 64, 199, 128, 240, 12, 128, 88, 90, 128,
    19, 143, 128, 205, 76, 128, 132, 250, 128, 47, 8, 128, 160, 115, 128, 3, 222, 128, 221, 61, 128, 76, 188, 128,
];

fn generate_hemisphere_kernel() -> [[f32; 4]; KERNEL_SIZE] {
    let mut rng = rand::rng();
    std::array::from_fn(|i| {
        let sample = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(0.0..1.0),
        )
        .normalize_or_zero();
        let scale = (i as f32 / KERNEL_SIZE as f32).mul_add(0.9, 0.1);
        let sample = sample * scale;
        [sample.x, sample.y, sample.z, 0.0]
    })
}

pub struct AoModule {
    pass: PassInfo,
    screen_geometry: GeometryId,
    material_name: String,
    noise_texture: TextureHandle,
    kernel: [[f32; 4]; KERNEL_SIZE],
    noise_scale: [f32; 2],
    sample_radius: f32,
}

impl AoModule {
    pub fn new(
        shader: &Shader,
        render_pass_name: impl Into<String>,
        screen_geometry: GeometryId,
        material_name: impl Into<String>,
        backend: &mut dyn RenderBackend,
        extent: (u32, u32),
    ) -> Result<Self> {
        let mut pass = PassInfo::new(shader.name.clone(), render_pass_name);
        for name in ["noise_scale", "sample_radius", "kernel"] {
            if let Ok(index) = shader.get_uniform_index(name) {
                pass.setup_uniform_index(name, index);
            }
        }

        let desc = TextureDesc {
            name: "ao_noise".into(),
            width: NOISE_SIZE,
            height: NOISE_SIZE,
            channels: 3,
            mipmapped: false,
            transparent: false,
            writable: false,
            cube: false,
        };
        let noise_texture = backend.create_texture(&desc, Some(&NOISE_DATA))?;

        Ok(Self {
            pass,
            screen_geometry,
            material_name: material_name.into(),
            noise_texture,
            kernel: generate_hemisphere_kernel(),
            noise_scale: [extent.0 as f32 / 4.0, extent.1 as f32 / 4.0],
            sample_radius: 0.5,
        })
    }

    pub fn on_resize(&mut self, extent: (u32, u32)) {
        self.noise_scale = [extent.0 as f32 / 4.0, extent.1 as f32 / 4.0];
    }

    #[must_use]
    pub fn noise_texture(&self) -> TextureHandle {
        self.noise_texture
    }
}

impl RenderModule for AoModule {
    fn name(&self) -> &str {
        "ao"
    }

    fn passes(&self) -> &[PassInfo] {
        std::slice::from_ref(&self.pass)
    }

    fn passes_mut(&mut self) -> &mut [PassInfo] {
        std::slice::from_mut(&mut self.pass)
    }

    fn apply_globals(&mut self, ctx: &mut ModuleContext, _globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        if let Some(i) = self.pass.uniform_index("noise_scale") {
            shader.set_uniform_vec4(ctx.backend, i, [self.noise_scale[0], self.noise_scale[1], 0.0, 0.0]);
        }
        if let Some(i) = self.pass.uniform_index("sample_radius") {
            shader.set_uniform_f32(ctx.backend, i, self.sample_radius);
        }
        if let Some(i) = self.pass.uniform_index("kernel") {
            shader.set_uniform_bytes(ctx.backend, i, bytemuck::cast_slice(&self.kernel));
        }
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut ModuleContext, _packet: &ModulePacket, _globals: &FrameGlobals, _pass_index: usize) -> Result<()> {
        let shader_name = self.pass.shader_name.clone();
        let instance_id = ensure_material_instance(ctx, &shader_name, &self.material_name)?;
        let geometry_handle = ctx
            .geometries
            .get(self.screen_geometry)
            .map(crate::resources::Geometry::handle)
            .ok_or_else(|| crate::errors::RenderError::not_found("geometry", "screen_rect"))?;

        let shader = ctx.shaders.get_mut(&shader_name).ok_or_else(|| crate::errors::RenderError::not_found("shader", shader_name.clone()))?;
        shader.bind_instance(ctx.backend, instance_id);
        shader.set_local_scope();
        if !apply_instance_or_skip(shader, ctx.backend, &self.material_name)? {
            return Ok(());
        }

        ctx.backend.draw_geometry(geometry_handle, 0..1);
        Ok(())
    }
}
