//! The render graph: passes, targets, views, the module contract and its
//! concrete implementations, and the frame orchestrator that drives them.

pub mod module;
pub mod modules;
pub mod orchestrator;
pub mod pass;
pub mod target;
pub mod view;

pub use module::{apply_instance_or_skip, ensure_material_instance, FrameGlobals, ModuleContext, ModulePacket, PassInfo, RenderModule};
pub use orchestrator::{FrameInputs, FrameOrchestrator};
pub use pass::{ClearFlags, PassRegistry, RenderPass};
pub use target::RenderTarget;
pub use view::{GeometryRenderData, MeshInstance, ProjectionSource, RenderView, ViewKind, ViewMatrixSource};
