//! Concrete render modules, in the static order the frame orchestrator
//! drives them: shadows -> depth prepass -> AO -> blur -> world -> skybox
//! -> post (SSR/volumetrics/effects) -> UI.

pub mod ao;
pub mod blur;
pub mod depth_prepass;
pub mod post_processing;
pub mod shadow_directional;
pub mod shadow_point;
pub mod shadow_sampling;
pub mod skybox;
pub mod ui;
pub mod world;

pub use ao::AoModule;
pub use blur::BlurModule;
pub use depth_prepass::DepthPrepassModule;
pub use post_processing::{texture_input, PostProcessModule};
pub use shadow_directional::ShadowmapDirectionalModule;
pub use shadow_point::ShadowmapPointModule;
pub use shadow_sampling::ShadowmapSamplingModule;
pub use skybox::SkyboxModule;
pub use ui::UiModule;
pub use world::WorldModule;
