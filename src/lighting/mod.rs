//! Lighting data and the light registry.

pub mod light;

pub use light::{DirectionalLight, DirectionalLightData, LightRegistry, LightResult, PointLight, PointLightData};
