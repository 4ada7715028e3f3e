//! Resource module
//!
//! Resource factories (models, textures, shaders), their on-disk formats and
//! the handle-based manager that deduplicates loads by path.

mod type_code;
pub mod factory;
pub mod header;
pub mod text_parser;
pub mod loader;
pub mod model;
pub mod model_factory;
pub mod texture;
pub mod texture_factory;
pub mod shader;
pub mod shader_factory;
mod resource_table;
mod resource_manager;

pub use type_code::ResourceTypeCode;
pub use factory::{ResourceFactory, FactoryId, DecoderTable, DecodeFn, TEXT_FORMAT, BINARY_FORMAT};
pub use loader::{ResourceLoader, FileSystemLoader, MemoryLoader, ResourcePath};
pub use model::{Model, Mesh, Vertex, AABB};
pub use model_factory::{ModelFactory, MeshData};
pub use texture::Texture;
pub use texture_factory::{TextureFactory, TextureData};
pub use shader::{Shader, ShaderId, ShaderStageCode};
pub use shader_factory::{ShaderFactory, ShaderSource};
pub use resource_manager::{
    check_type_codes, ModelKey, ResourceManager, TextureKey, MODEL_KIND, SHADER_KIND, TEXTURE_KIND,
};
