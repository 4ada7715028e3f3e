/// Mock graphics device for unit tests (no GPU required)
///
/// Records every call as a readable command string so tests can assert on
/// ordering (`draw_fullscreen ibl_background` before foreground passes, ...).

use std::sync::{Arc, Mutex};
use crate::graphics_device::{
    GraphicsDevice, Buffer, BufferDesc, BufferUsage, Shader, ShaderDesc, ShaderStage,
    Texture, TextureDesc, TextureInfo, UniformValue, SharedDevice,
};
use crate::error::Result;
use crate::engine_bail;

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub name: String,
    pub size: u64,
    pub usage: BufferUsage,
}

impl Buffer for MockBuffer {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub name: String,
    pub info: TextureInfo,
}

impl Texture for MockTexture {
    fn name(&self) -> &str {
        &self.name
    }

    fn info(&self) -> TextureInfo {
        self.info
    }
}

// ============================================================================
// Mock Shader
// ============================================================================

/// Mock shader module
///
/// A name has a location when it appears in the source; the location is its
/// byte offset, so lookups are stable and distinct per name.
#[derive(Debug)]
pub struct MockShader {
    pub name: String,
    pub stage: ShaderStage,
    pub source: String,
}

impl Shader for MockShader {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn uniform_location(&self, name: &str) -> Option<u32> {
        self.source.find(name).map(|offset| offset as u32)
    }

    fn texture_location(&self, name: &str) -> Option<u32> {
        self.source.find(name).map(|offset| offset as u32)
    }
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

pub struct MockGraphicsDevice {
    /// Every call, in order
    pub commands: Vec<String>,
    /// Uniform writes (shader name, location, value)
    pub uniforms: Vec<(String, u32, UniformValue)>,
    /// Command prefix that fails instead of succeeding (e.g. "create_texture")
    pub fail_on: Option<&'static str>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self { commands: Vec::new(), uniforms: Vec::new(), fail_on: None }
    }

    /// Mock wrapped as the shared handle factories expect, plus a typed clone for assertions
    pub fn shared() -> (SharedDevice, Arc<Mutex<MockGraphicsDevice>>) {
        let mock = Arc::new(Mutex::new(Self::new()));
        let device: SharedDevice = mock.clone();
        (device, mock)
    }

    /// Commands starting with `prefix`
    pub fn commands_with(&self, prefix: &str) -> Vec<String> {
        self.commands.iter().filter(|c| c.starts_with(prefix)).cloned().collect()
    }

    fn record(&mut self, command: String) -> Result<()> {
        if let Some(prefix) = self.fail_on {
            if command.starts_with(prefix) {
                engine_bail!("prism::mock", "{} rejected by mock device", command);
            }
        }
        self.commands.push(command);
        Ok(())
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_shader(&mut self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        self.record(format!("create_shader {}", desc.name))?;
        Ok(Arc::new(MockShader {
            name: desc.name,
            stage: desc.stage,
            source: String::from_utf8_lossy(&desc.code).into_owned(),
        }))
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        self.record(format!("create_texture {} {}x{}", desc.name, desc.width, desc.height))?;
        Ok(Arc::new(MockTexture { info: TextureInfo::from_desc(&desc), name: desc.name }))
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        self.record(format!("create_buffer {} {}", desc.name, desc.size))?;
        Ok(Arc::new(MockBuffer { name: desc.name, size: desc.size, usage: desc.usage }))
    }

    fn bind_shader(&mut self, stages: &[Arc<dyn Shader>]) -> Result<()> {
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        self.record(format!("bind_shader {}", names.join(",")))
    }

    fn set_uniform(&mut self, shader: &dyn Shader, location: u32, value: UniformValue) -> Result<()> {
        self.record(format!("set_uniform {}@{}", shader.name(), location))?;
        self.uniforms.push((shader.name().to_string(), location, value));
        Ok(())
    }

    fn bind_texture(&mut self, shader: &dyn Shader, location: u32, texture: &dyn Texture) -> Result<()> {
        self.record(format!("bind_texture {}@{}={}", shader.name(), location, texture.name()))
    }

    fn generate_mipmaps(&mut self, texture: &dyn Texture) -> Result<()> {
        self.record(format!("generate_mipmaps {}", texture.name()))
    }

    fn draw_fullscreen(&mut self, label: &str) -> Result<()> {
        self.record(format!("draw_fullscreen {}", label))
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
