//! The frame orchestrator: drives one frame across every registered module
//! in static order.

use bumpalo::Bump;
use glam::{Mat4, Vec3};

use crate::backend::RenderBackend;
use crate::errors::{RenderError, Result};
use crate::lighting::LightRegistry;
use crate::render::module::{FrameGlobals, ModuleContext, RenderModule};
use crate::render::pass::PassRegistry;
use crate::resources::Repositories;

/// Frame-wide camera/lighting state the caller assembles each frame and
/// hands to [`FrameOrchestrator::run_frame`]. Geometry itself is not part of
/// this: modules that draw geometry are staged separately (see
/// `WorldModule::stage_packet` and its siblings) before `run_frame` is called.
pub struct FrameInputs<'a> {
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
    pub camera_position: Vec3,
    pub lights: &'a LightRegistry,
    pub ambient_color: [f32; 4],
}

/// Drives the configured modules once per frame. Owns the render-pass
/// registry and the per-frame scratch arena; does not own the backend,
/// repositories, or scene state, all of which are borrowed for the duration
/// of a single `run_frame` call.
pub struct FrameOrchestrator {
    modules: Vec<Box<dyn RenderModule>>,
    passes: PassRegistry,
    frame_number: u64,
    light_scratch: Bump,
}

impl FrameOrchestrator {
    #[must_use]
    pub fn new(passes: PassRegistry) -> Self {
        Self { modules: Vec::new(), passes, frame_number: 0, light_scratch: Bump::new() }
    }

    pub fn push_module(&mut self, module: Box<dyn RenderModule>) {
        self.modules.push(module);
    }

    #[must_use]
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    #[must_use]
    pub fn passes(&self) -> &PassRegistry {
        &self.passes
    }

    pub fn passes_mut(&mut self) -> &mut PassRegistry {
        &mut self.passes
    }

    /// Drives one frame: increments the frame counter, begins the frame on
    /// the backend (skipping the remaining work on a transient/resize
    /// condition rather than propagating it), gathers each module's packet
    /// and renders it in configured order, then ends the frame.
    ///
    /// Modules are driven in the order they were pushed; callers are
    /// responsible for pushing them in the shadows -> depth prepass -> AO ->
    /// blur -> world -> skybox -> post -> UI order named for the module set.
    pub fn run_frame(&mut self, backend: &mut dyn RenderBackend, repos: &mut Repositories, delta_time: f32, inputs: FrameInputs) -> Result<()> {
        self.frame_number += 1;
        let frame_number = self.frame_number;

        if let Err(err) = backend.begin_frame(delta_time) {
            return match err {
                RenderError::BackendTransient { reason } => {
                    log::warn!(target: "forge_render::orchestrator", "frame {frame_number} skipped: {reason}");
                    Ok(())
                }
                fatal => {
                    log::error!(target: "forge_render::orchestrator", "begin_frame failed: {fatal}");
                    Err(fatal)
                }
            };
        }

        let swap_image_index = backend.current_window_attachment_index() as usize;
        let frames_in_flight = backend.frames_in_flight().max(1);
        let frame_in_flight_index = (frame_number % u64::from(frames_in_flight)) as usize;

        let point_lights = self.light_scratch.alloc_slice_copy(&inputs.lights.point_data());

        let globals = FrameGlobals {
            frame_number,
            view_matrix: inputs.view_matrix,
            view_matrix_inverse: inputs.view_matrix.inverse(),
            projection_matrix: inputs.projection_matrix,
            projection_matrix_inverse: inputs.projection_matrix.inverse(),
            camera_position: inputs.camera_position,
            lights: inputs.lights,
            point_lights,
            ambient_color: inputs.ambient_color,
        };

        for module in &mut self.modules {
            let packet = module.build_packet(frame_number);
            let mut ctx = ModuleContext::new(repos, backend, &mut self.passes, swap_image_index, frame_in_flight_index);
            module.render(&mut ctx, &packet, &globals)?;
        }

        if let Err(err) = backend.end_frame(delta_time) {
            log::error!(target: "forge_render::orchestrator", "end_frame failed: {err}");
            return Err(err);
        }
        backend.increment_frame_number();
        self.light_scratch.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_frame_zero_with_no_modules() {
        let orchestrator = FrameOrchestrator::new(PassRegistry::new());
        assert_eq!(orchestrator.frame_number(), 0);
        assert!(orchestrator.passes().get("anything").is_none());
    }
}
