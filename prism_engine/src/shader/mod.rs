//! Shader management module
//!
//! Shader registry with stable ids, parameter annotation parsing and the
//! drivers that feed render state into annotated shaders.

mod shader_manager;
pub mod shader_parameter_parser;
pub mod shader_driver;
mod shader_driver_general;
mod shader_driver_light;
mod shader_driver_manager;

pub use shader_manager::{ManagerState, ShaderManager, ShaderRef};
pub use shader_parameter_parser::{ShaderParameter, ShaderParameterParser, SHADER_PARAMETER_TAG};
pub use shader_driver::{ShaderDriver, ShaderDriverPrototype, StageLocation};
pub use shader_driver_general::{
    ShaderDriverGeneral, WORLD_VIEW_PROJECTION, INVERSE_VIEW_MATRIX, WORLD_MATRIX, EYE_POSITION,
};
pub use shader_driver_light::{
    ShaderDriverLight, BRDF_LUT, IBL_SPECULAR_TEXTURE, IBL_DIFFUSE_TEXTURE, IBL_TEXTURE_SIZE,
};
pub use shader_driver_manager::ShaderDriverManager;
