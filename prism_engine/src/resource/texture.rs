/// Texture resource: pooled pixel data plus the GPU texture created from it

use std::sync::Arc;
use crate::graphics_device::{self, TextureFormat, TextureInfo};
use crate::memory::PoolBlock;
use crate::resource::factory::FactoryId;
use crate::resource::header::{BinaryWriter, ResourceHeader};
use crate::resource::ResourceTypeCode;

/// Binary flag: six faces per mip level
pub const TEXTURE_FLAG_CUBEMAP: u32 = 1 << 0;

/// Byte size of a tightly packed mip chain
///
/// Returns None for zero dimensions, zero or excessive mip counts and
/// sizes that overflow `usize`.
pub fn mip_chain_size(
    width: u32,
    height: u32,
    depth: u32,
    format: TextureFormat,
    mip_levels: u32,
    cubemap: bool,
) -> Option<usize> {
    if width == 0 || height == 0 || depth == 0 || mip_levels == 0 {
        return None;
    }
    let largest = width.max(height).max(depth);
    let max_levels = 32 - largest.leading_zeros();
    if mip_levels > max_levels {
        return None;
    }

    let faces: usize = if cubemap { 6 } else { 1 };
    let mut total: usize = 0;
    for level in 0..mip_levels {
        let w = (width >> level).max(1) as usize;
        let h = (height >> level).max(1) as usize;
        let d = (depth >> level).max(1) as usize;
        let level_size = w
            .checked_mul(h)?
            .checked_mul(d)?
            .checked_mul(format.bytes_per_pixel() as usize)?
            .checked_mul(faces)?;
        total = total.checked_add(level_size)?;
    }
    Some(total)
}

/// Texture resource
///
/// Created by `TextureFactory::create` or `TextureFactory::create_empty`,
/// destroyed by `TextureFactory::release`.
pub struct Texture {
    pub(crate) origin: FactoryId,
    pub(crate) name: String,
    pub(crate) info: TextureInfo,
    pub(crate) pixels: PoolBlock,
    pub(crate) device_texture: Arc<dyn graphics_device::Texture>,
}

impl Texture {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &TextureInfo {
        &self.info
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn format(&self) -> TextureFormat {
        self.info.format
    }

    pub fn is_cubemap(&self) -> bool {
        self.info.cubemap
    }

    /// CPU-side copy of the uploaded mip chain
    pub fn pixels(&self) -> &[u8] {
        self.pixels.as_slice()
    }

    /// GPU texture bound by lights and shader drivers
    pub fn device_texture(&self) -> &Arc<dyn graphics_device::Texture> {
        &self.device_texture
    }

    /// Bake into the binary layout accepted by `TextureFactory` ("binary")
    ///
    /// Payload: name, width, height, depth, format code, mip count, flags,
    /// then the mip chain as a length-prefixed blob.
    pub fn encode_binary(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_string(&self.name);
        writer.write_u32(self.info.width);
        writer.write_u32(self.info.height);
        writer.write_u32(self.info.depth);
        writer.write_u32(self.info.format.code());
        writer.write_u32(self.info.mip_levels);
        writer.write_u32(if self.info.cubemap { TEXTURE_FLAG_CUBEMAP } else { 0 });
        writer.write_blob(self.pixels.as_slice());
        ResourceHeader::encode(ResourceTypeCode::TEXTURE, 0, &writer.into_bytes())
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
