/// GraphicsDevice trait - the GPU command layer seen by the resource core

use std::sync::{Arc, Mutex};
use glam::{Mat4, Vec2, Vec3, Vec4};
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, Shader, ShaderDesc, Texture, TextureDesc,
};

/// Value written to a shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

/// Graphics device trait
///
/// Creates opaque GPU objects and records the state changes issued by the
/// managers. Backends (Vulkan, OpenGL, ...) implement this; the engine only
/// holds `Arc<dyn ...>` handles to what it creates.
pub trait GraphicsDevice: Send {
    /// Compile/upload one shader module
    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>>;

    /// Create a texture, uploading `desc.data` when present
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a buffer, uploading `desc.data` when present
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Make the given modules the active program
    fn bind_shader(&mut self, stages: &[Arc<dyn Shader>]) -> Result<()>;

    /// Write a uniform of the given module
    fn set_uniform(&mut self, shader: &dyn Shader, location: u32, value: UniformValue) -> Result<()>;

    /// Bind a texture to a sampler of the given module
    fn bind_texture(&mut self, shader: &dyn Shader, location: u32, texture: &dyn Texture) -> Result<()>;

    /// Generate the full mip chain of a texture from level 0
    fn generate_mipmaps(&mut self, texture: &dyn Texture) -> Result<()>;

    /// Draw a fullscreen pass (background, sky, ...)
    fn draw_fullscreen(&mut self, label: &str) -> Result<()>;
}

/// Shared device handle held by factories and managers
pub type SharedDevice = Arc<Mutex<dyn GraphicsDevice>>;
