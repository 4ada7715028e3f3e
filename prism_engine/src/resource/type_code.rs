/// Four-character resource type codes

use std::fmt;

/// Four-character tag identifying a resource kind
///
/// Factories report it, binary payloads start with it, and the resource
/// manager refuses two factories sharing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceTypeCode(pub [u8; 4]);

impl ResourceTypeCode {
    /// Models (meshes + vertex/index data)
    pub const MODEL: ResourceTypeCode = ResourceTypeCode(*b"LMDL");
    /// Shader programs
    pub const SHADER: ResourceTypeCode = ResourceTypeCode(*b"SHAD");
    /// Textures
    pub const TEXTURE: ResourceTypeCode = ResourceTypeCode(*b"LTEX");

    pub const fn new(tag: [u8; 4]) -> Self {
        Self(tag)
    }

    /// Packed little-endian value (`a | b << 8 | c << 16 | d << 24`)
    pub const fn as_u32(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_le_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for ResourceTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "type_code_tests.rs"]
mod tests;
