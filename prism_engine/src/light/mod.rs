//! Light module
//!
//! Explicit lights, the standard image-based light and the manager that
//! writes them into a render state and issues the light passes.

mod light;
mod light_ibl;
mod light_manager;

pub use light::{Light, DirectionalLight, PointLight, SpotLight, AmbientLight};
pub use light_ibl::{LightIbl, IBL_BACKGROUND_PASS};
pub use light_manager::{LightManager, LightKey};
