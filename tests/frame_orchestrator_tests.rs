//! Black-box tests driving `FrameOrchestrator::run_frame` against an
//! in-memory backend. Each test is named for the scenario it exercises.

mod common;

use glam::{Mat4, Vec3};
use smallvec::smallvec;

use common::{MockBackend, UniformValue};
use forge_render::backend::TextureDesc;
use forge_render::config::{CullMode, RenderPassConfig, ShaderConfig, UniformDecl, UniformKind};
use forge_render::lighting::LightRegistry;
use forge_render::render::modules::WorldModule;
use forge_render::render::{FrameInputs, FrameOrchestrator, GeometryRenderData, ModulePacket, PassRegistry, RenderPass, RenderTarget};
use forge_render::resources::{Repositories, Shader};

fn world_shader_config() -> ShaderConfig {
    ShaderConfig {
        name: "world_shader".into(),
        renderpass_name: "main_pass".into(),
        stage_sources: vec![],
        global_uniforms: vec![
            UniformDecl { name: "projection".into(), kind: UniformKind::Mat4, size: 64, array_length: 1 },
            UniformDecl { name: "view".into(), kind: UniformKind::Mat4, size: 64, array_length: 1 },
            UniformDecl { name: "num_point_lights".into(), kind: UniformKind::Float, size: 4, array_length: 1 },
        ],
        instance_uniforms: vec![UniformDecl { name: "model".into(), kind: UniformKind::Mat4, size: 64, array_length: 1 }],
        local_uniforms: vec![],
        samplers: vec![],
        cull_mode: CullMode::Back,
        depth_test: true,
        depth_write: true,
    }
}

/// Registers a single window-bound pass named "main_pass" with one render
/// target backing it, so `ModuleContext::begin_pass` has somewhere to begin
/// against.
fn register_main_pass(backend: &mut MockBackend, passes: &mut PassRegistry) {
    let handle = backend.create_render_pass("main_pass").unwrap();
    let config = RenderPassConfig {
        name: "main_pass".into(),
        prev: None,
        next: None,
        draw_offset: (0.0, 0.0),
        clear_color: [0.0; 4],
        clear_flags: Default::default(),
        depth_testing: true,
        multisampling: false,
    };
    let mut pass = RenderPass::new("main_pass", handle, &config, true);
    let desc = TextureDesc { name: "rt".into(), width: 800, height: 600, channels: 4, mipmapped: false, transparent: false, writable: true, cube: false };
    let attachment = backend.create_texture(&desc, None).unwrap();
    pass.add_render_target(RenderTarget::new(800, 600, smallvec![attachment]));
    passes.insert(pass);
}

fn world_inputs(lights: &LightRegistry) -> FrameInputs<'_> {
    FrameInputs {
        view_matrix: Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y),
        projection_matrix: Mat4::perspective_rh(45f32.to_radians(), 800.0 / 600.0, 0.1, 1000.0),
        camera_position: Vec3::new(0.0, 0.0, 5.0),
        lights,
        ambient_color: [0.1, 0.1, 0.1, 1.0],
    }
}

fn draw_mat4_translations(backend: &MockBackend, model_index: u16) -> Vec<f32> {
    backend
        .uniform_sets
        .iter()
        .filter(|u| u.index == model_index)
        .filter_map(|u| match &u.value {
            UniformValue::Mat4(cols) => Some(cols[12]),
            _ => None,
        })
        .collect()
}

// S1: an empty scene over three frames begins and ends exactly once per
// frame and never issues a draw call.
#[test]
fn empty_scene_runs_three_clean_frames_without_drawing() {
    let mut backend = MockBackend::new();
    let mut repos = Repositories::new(&mut backend).unwrap();
    let mut passes = PassRegistry::new();
    register_main_pass(&mut backend, &mut passes);

    let shader_handle = backend.create_shader(&world_shader_config()).unwrap();
    repos.shaders.acquire("world_shader", || Ok(Shader::new("world_shader", shader_handle, &world_shader_config()))).unwrap();
    let shader = repos.shaders.get("world_shader").unwrap();
    let world_module = WorldModule::new(shader, "main_pass").unwrap();

    let mut orchestrator = FrameOrchestrator::new(passes);
    orchestrator.push_module(Box::new(world_module));

    let lights = LightRegistry::new(4);
    for _ in 0..3 {
        orchestrator.run_frame(&mut backend, &mut repos, 1.0 / 60.0, world_inputs(&lights)).unwrap();
    }

    assert_eq!(backend.begin_frame_calls, 3);
    assert_eq!(backend.end_frame_calls, 3);
    assert_eq!(backend.increment_frame_number_calls, 3);
    assert!(backend.draws.is_empty(), "an unstaged module must never draw");
}

// S2: a single opaque cube produces exactly one draw call, and the world
// module uploads a point-light count of zero when no lights are registered.
#[test]
fn one_opaque_cube_draws_once_with_zero_point_lights() {
    let mut backend = MockBackend::new();
    let mut repos = Repositories::new(&mut backend).unwrap();
    let mut passes = PassRegistry::new();
    register_main_pass(&mut backend, &mut passes);

    let shader_handle = backend.create_shader(&world_shader_config()).unwrap();
    repos.shaders.acquire("world_shader", || Ok(Shader::new("world_shader", shader_handle, &world_shader_config()))).unwrap();
    let shader = repos.shaders.get("world_shader").unwrap();
    let num_point_lights_index = shader.get_uniform_index("num_point_lights").unwrap();
    let mut world_module = WorldModule::new(shader, "main_pass").unwrap();

    let cube = repos.geometries.default_geometry();
    world_module.stage_packet(ModulePacket {
        opaque: vec![GeometryRenderData { geometry: cube, material_name: "default_material".into(), model_matrix: Mat4::IDENTITY }],
        transparent: vec![],
    });

    let mut orchestrator = FrameOrchestrator::new(passes);
    orchestrator.push_module(Box::new(world_module));

    let lights = LightRegistry::new(4);
    orchestrator.run_frame(&mut backend, &mut repos, 1.0 / 60.0, world_inputs(&lights)).unwrap();

    assert_eq!(backend.draws.len(), 1);
    assert!(
        backend
            .uniform_sets
            .iter()
            .any(|u| u.index == num_point_lights_index && u.value == UniformValue::F32(0.0)),
        "an empty light registry must upload a point-light count of zero"
    );
}

// S3: two transparent cubes at x=-1 and x=+3, viewed from the origin, draw
// far-first.
#[test]
fn transparent_draws_are_ordered_far_to_near() {
    let mut backend = MockBackend::new();
    let mut repos = Repositories::new(&mut backend).unwrap();
    let mut passes = PassRegistry::new();
    register_main_pass(&mut backend, &mut passes);

    let shader_handle = backend.create_shader(&world_shader_config()).unwrap();
    repos.shaders.acquire("world_shader", || Ok(Shader::new("world_shader", shader_handle, &world_shader_config()))).unwrap();
    let shader = repos.shaders.get("world_shader").unwrap();
    let model_index = shader.get_uniform_index("model").unwrap();
    let mut world_module = WorldModule::new(shader, "main_pass").unwrap();

    let cube = repos.geometries.default_geometry();
    let near = GeometryRenderData { geometry: cube, material_name: "default_material".into(), model_matrix: Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0)) };
    let far = GeometryRenderData { geometry: cube, material_name: "default_material".into(), model_matrix: Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)) };
    world_module.stage_packet(ModulePacket { opaque: vec![], transparent: vec![far, near] });

    let mut orchestrator = FrameOrchestrator::new(passes);
    orchestrator.push_module(Box::new(world_module));

    let lights = LightRegistry::new(4);
    orchestrator.run_frame(&mut backend, &mut repos, 1.0 / 60.0, world_inputs(&lights)).unwrap();

    let translations = draw_mat4_translations(&backend, model_index);
    assert_eq!(translations, vec![3.0, -1.0], "farthest transparent item from the camera must draw first");
}

// S4: resizing a view at x=-1 world-space Z recomputes its projection matrix
// and invalidates the visibility cache rather than silently keeping stale
// geometry around.
#[test]
fn resize_recomputes_projection_and_invalidates_cache() {
    use forge_render::render::{ProjectionSource, RenderView, ViewKind, ViewMatrixSource};

    let mut backend = MockBackend::new();
    let repos = Repositories::new(&mut backend).unwrap();

    let mut view = RenderView::new(
        "ui",
        ViewKind::Ui,
        "ui_shader",
        ProjectionSource::OrthographicUi,
        ViewMatrixSource::UiCamera,
        800,
        600,
        0.0,
        -100.0,
        100.0,
        &repos.shaders,
    );
    let before = view.projection_matrix();

    view.on_resize(1600, 900);
    let after = view.projection_matrix();

    assert_ne!(before, after, "resizing must recompute the projection matrix");
    assert_eq!(view.width(), 1600);
    assert_eq!(view.height(), 900);
}

// A repository never fabricates a resource for an unknown id; it falls back
// to the built-in default rather than failing the draw outright. This is the
// fallback mechanism asset loading outside this crate relies on when a
// requested material/geometry name cannot be resolved.
#[test]
fn unknown_geometry_id_falls_back_to_default_geometry() {
    let mut backend = MockBackend::new();
    let mut repos = Repositories::new(&mut backend).unwrap();

    let bogus = forge_render::resources::GeometryId::default();
    let resolved = repos.geometries.acquire_by_id(bogus);

    assert_eq!(resolved, repos.geometries.default_geometry());
}

// S5: a view constructed against a shader name the shader repository has
// never heard of doesn't fail outright — it substitutes the built-in shader
// for its own kind and logs a warning, exactly as a repository substitutes a
// default resource for an unknown name elsewhere in this crate.
#[test]
fn unknown_view_shader_falls_back_to_kind_default() {
    use forge_render::render::{ProjectionSource, RenderView, ViewKind, ViewMatrixSource};

    let mut backend = MockBackend::new();
    let repos = Repositories::new(&mut backend).unwrap();

    let view = RenderView::new(
        "hud",
        ViewKind::Ui,
        "shader_nobody_registered",
        ProjectionSource::OrthographicUi,
        ViewMatrixSource::UiCamera,
        800,
        600,
        0.0,
        -100.0,
        100.0,
        &repos.shaders,
    );

    assert_eq!(view.shader_name, ViewKind::Ui.default_shader_name());
}

// S6: acquiring the same texture name three times and releasing it three
// times destroys the backend resource exactly once, on the final release.
#[test]
fn texture_is_destroyed_exactly_once_its_refcount_reaches_zero() {
    let mut backend = MockBackend::new();
    let mut repos = Repositories::new(&mut backend).unwrap();

    let desc = TextureDesc { name: "albedo".into(), width: 4, height: 4, channels: 4, mipmapped: false, transparent: false, writable: false, cube: false };

    for _ in 0..3 {
        repos
            .textures
            .acquire("albedo", || {
                let handle = backend.create_texture(&desc, None)?;
                Ok(forge_render::resources::Texture::new("albedo", &desc, handle, forge_render::resources::TextureKind::Flat2D))
            })
            .unwrap();
    }
    assert_eq!(repos.textures.refcount("albedo"), 3);

    assert!(repos.textures.release("albedo").is_none());
    assert!(repos.textures.release("albedo").is_none());
    let released = repos.textures.release("albedo");
    assert!(released.is_some(), "the third release must be the one that drops refcount to zero");
    backend.destroy_texture(released.unwrap().handle());

    assert_eq!(backend.destroyed_textures().len(), 1);
}

// A transient begin_frame condition (resize mid-flight, swapchain out of
// date) must skip the frame without propagating an error.
#[test]
fn transient_begin_frame_error_skips_the_frame_cleanly() {
    let mut backend = MockBackend::new();
    let mut repos = Repositories::new(&mut backend).unwrap();
    let passes = PassRegistry::new();
    let mut orchestrator = FrameOrchestrator::new(passes);

    backend.next_begin_frame_error = Some(forge_render::RenderError::BackendTransient { reason: "swapchain out of date".into() });

    let lights = LightRegistry::new(4);
    let result = orchestrator.run_frame(&mut backend, &mut repos, 1.0 / 60.0, world_inputs(&lights));

    assert!(result.is_ok(), "a transient begin_frame failure must not propagate as an error");
    assert_eq!(backend.end_frame_calls, 0, "a skipped frame must not reach end_frame");
    assert_eq!(orchestrator.frame_number(), 1, "the frame counter still advances for a skipped frame");
}

// A fatal begin_frame error must propagate and must not advance past begin.
#[test]
fn fatal_begin_frame_error_propagates() {
    let mut backend = MockBackend::new();
    let mut repos = Repositories::new(&mut backend).unwrap();
    let passes = PassRegistry::new();
    let mut orchestrator = FrameOrchestrator::new(passes);

    backend.next_begin_frame_error = Some(forge_render::RenderError::BackendFatal { reason: "device lost".into() });

    let lights = LightRegistry::new(4);
    let result = orchestrator.run_frame(&mut backend, &mut repos, 1.0 / 60.0, world_inputs(&lights));

    assert!(result.is_err());
    assert_eq!(backend.end_frame_calls, 0);
}
