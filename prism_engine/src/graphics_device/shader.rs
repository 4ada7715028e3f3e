/// Shader trait, shader stages and shader descriptor

use bitflags::bitflags;

/// Pipeline stage a shader module runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Compute,
}

impl ShaderStage {
    pub fn name(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Pixel => "pixel",
            ShaderStage::Compute => "compute",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vertex" => Some(ShaderStage::Vertex),
            "pixel" => Some(ShaderStage::Pixel),
            "compute" => Some(ShaderStage::Compute),
            _ => None,
        }
    }

    /// Numeric code stored in binary shader payloads
    pub fn code(&self) -> u32 {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Pixel => 1,
            ShaderStage::Compute => 2,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(ShaderStage::Vertex),
            1 => Some(ShaderStage::Pixel),
            2 => Some(ShaderStage::Compute),
            _ => None,
        }
    }

    /// Stage as a single-bit set
    pub fn as_flag(&self) -> ShaderStages {
        match self {
            ShaderStage::Vertex => ShaderStages::VERTEX,
            ShaderStage::Pixel => ShaderStages::PIXEL,
            ShaderStage::Compute => ShaderStages::COMPUTE,
        }
    }
}

bitflags! {
    /// Set of stages present in a shader resource
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        const VERTEX  = 1 << 0;
        const PIXEL   = 1 << 1;
        const COMPUTE = 1 << 2;
    }
}

/// Descriptor for creating a shader module
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    /// Debug name
    pub name: String,
    pub stage: ShaderStage,
    /// Source text or precompiled bytecode, backend-defined
    pub code: Vec<u8>,
    pub entry_point: String,
}

/// Shader module trait
///
/// Implemented by backend-specific shader types. Locations are backend
/// handles for named uniforms and texture samplers; None means the module
/// does not declare that name.
pub trait Shader: Send + Sync {
    fn name(&self) -> &str;
    fn stage(&self) -> ShaderStage;
    fn uniform_location(&self, name: &str) -> Option<u32>;
    fn texture_location(&self, name: &str) -> Option<u32>;
}
