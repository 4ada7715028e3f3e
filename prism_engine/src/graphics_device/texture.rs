/// Texture trait, texture descriptor and pixel formats

/// Pixel formats understood by the texture factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8,
    R8,
    R16F,
    R32F,
    R16G16B16A16F,
    R32G32B32A32F,
}

impl TextureFormat {
    /// Every supported format, in binary code order
    pub const ALL: [TextureFormat; 6] = [
        TextureFormat::R8G8B8A8,
        TextureFormat::R8,
        TextureFormat::R16F,
        TextureFormat::R32F,
        TextureFormat::R16G16B16A16F,
        TextureFormat::R32G32B32A32F,
    ];

    /// Size of one pixel in bytes
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::R16F => 2,
            TextureFormat::R8G8B8A8 | TextureFormat::R32F => 4,
            TextureFormat::R16G16B16A16F => 8,
            TextureFormat::R32G32B32A32F => 16,
        }
    }

    /// Canonical name used in text descriptions
    pub fn name(&self) -> &'static str {
        match self {
            TextureFormat::R8G8B8A8 => "R8G8B8A8",
            TextureFormat::R8 => "R8",
            TextureFormat::R16F => "R16F",
            TextureFormat::R32F => "R32F",
            TextureFormat::R16G16B16A16F => "R16G16B16A16F",
            TextureFormat::R32G32B32A32F => "R32G32B32A32F",
        }
    }

    /// Parse a format name
    ///
    /// Accepts the canonical names and the legacy channel orders
    /// (`A8R8G8B8`, `A16B16G16R16F`, `A32B32G32R32F`). Packed 24-bit
    /// `R8G8B8` has no GPU equivalent and is rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "R8G8B8A8" | "A8R8G8B8" => Some(TextureFormat::R8G8B8A8),
            "R8" => Some(TextureFormat::R8),
            "R16F" => Some(TextureFormat::R16F),
            "R32F" => Some(TextureFormat::R32F),
            "R16G16B16A16F" | "A16B16G16R16F" => Some(TextureFormat::R16G16B16A16F),
            "R32G32B32A32F" | "A32B32G32R32F" => Some(TextureFormat::R32G32B32A32F),
            _ => None,
        }
    }

    /// Numeric code stored in binary texture payloads
    pub fn code(&self) -> u32 {
        Self::ALL.iter().position(|format| format == self).unwrap_or(0) as u32 + 1
    }

    pub fn from_code(code: u32) -> Option<Self> {
        let index = code.checked_sub(1)? as usize;
        Self::ALL.get(index).copied()
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Debug name
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Depth for volume textures, 1 otherwise
    pub depth: u32,
    pub format: TextureFormat,
    /// Mip levels present in `data` (at least 1)
    pub mip_levels: u32,
    /// Six faces per mip level
    pub cubemap: bool,
    /// Optional initial data (tightly packed mip chain)
    pub data: Option<Vec<u8>>,
}

/// Texture properties reported by a device texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: TextureFormat,
    pub mip_levels: u32,
    pub cubemap: bool,
}

impl TextureInfo {
    /// Info matching a descriptor
    pub fn from_desc(desc: &TextureDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            depth: desc.depth,
            format: desc.format,
            mip_levels: desc.mip_levels,
            cubemap: desc.cubemap,
        }
    }
}

/// Texture resource trait
///
/// Implemented by backend-specific texture types.
/// The texture is automatically destroyed when dropped.
pub trait Texture: Send + Sync {
    fn name(&self) -> &str;
    fn info(&self) -> TextureInfo;
}
