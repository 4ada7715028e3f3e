/// Texture factory: text and binary texture decoding
///
/// Text layout:
///
/// ```text
/// FILETYPE TEXTURE
/// DATA {
///     NAME checker
///     WIDTH 2
///     HEIGHT 2
///     DEPTH 1                 # optional, defaults to 1
///     FORMAT R8G8B8A8
///     PIXELS [ 255 255 ... ]  # optional raw bytes of level 0, zero-filled if absent
/// }
/// ```

use crate::error::{Error, Result};
use crate::graphics_device::{TextureDesc, TextureFormat, TextureInfo, SharedDevice};
use crate::memory::{alloc_zeroed, release_block, store_bytes, PoolBlock, SharedAllocator};
use crate::resource::factory::{DecodeFn, DecoderTable, FactoryId, BINARY_FORMAT, TEXT_FORMAT};
use crate::resource::header::{BinaryReader, ResourceHeader};
use crate::resource::text_parser::TextDocument;
use crate::resource::texture::{mip_chain_size, Texture, TEXTURE_FLAG_CUBEMAP};
use crate::resource::{ResourceFactory, ResourceTypeCode};
use crate::{engine_debug, engine_error, engine_warn};

/// Decoded texture before pool and GPU allocation
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: TextureFormat,
    pub mip_levels: u32,
    pub cubemap: bool,
    pub pixels: Vec<u8>,
}

pub struct TextureFactory {
    id: FactoryId,
    device: SharedDevice,
    allocator: SharedAllocator,
    decoders: DecoderTable<TextureFactory, Texture>,
}

impl TextureFactory {
    /// Factory with the `text` and `binary` decoders registered
    pub fn new(device: SharedDevice, allocator: SharedAllocator) -> Self {
        let mut decoders = DecoderTable::new();
        decoders.register(TEXT_FORMAT, Self::decode_text);
        decoders.register(BINARY_FORMAT, Self::decode_binary);
        Self { id: FactoryId::next(), device, allocator, decoders }
    }

    pub fn register_format(&mut self, format: &str, decode: DecodeFn<TextureFactory, Texture>) {
        self.decoders.register(format, decode);
    }

    pub fn formats(&self) -> Vec<&str> {
        self.decoders.formats()
    }

    /// Zero-filled single-level texture (render targets, lookup tables, ...)
    pub fn create_empty(&self, name: &str, width: u32, height: u32, format: TextureFormat) -> Option<Texture> {
        match self.build_zeroed(name, width, height, 1, format) {
            Ok(texture) => Some(texture),
            Err(err) => {
                engine_warn!("prism::TextureFactory", "Failed to create empty texture '{}': {}", name, err);
                None
            }
        }
    }

    // ===== DECODERS =====

    fn decode_text(&self, data: &[u8]) -> Result<Texture> {
        let doc = TextDocument::from_bytes(data)?;
        doc.expect_file_type("TEXTURE")?;
        let node = doc.node("DATA")
            .ok_or_else(|| Error::InvalidResource("missing DATA block".to_string()))?;

        let dimension = |key: &str| -> Result<u32> {
            node.child(key)
                .and_then(|n| n.parse::<u32>())
                .ok_or_else(|| Error::InvalidResource(format!("missing or invalid {}", key)))
        };
        let width = dimension("WIDTH")?;
        let height = dimension("HEIGHT")?;
        let depth = match node.child("DEPTH") {
            Some(_) => dimension("DEPTH")?,
            None => 1,
        };

        let format_name = node.child("FORMAT")
            .and_then(|n| n.as_str())
            .ok_or_else(|| Error::InvalidResource("missing FORMAT".to_string()))?;
        let format = TextureFormat::from_name(format_name)
            .ok_or_else(|| Error::InvalidResource(format!("unsupported format {}", format_name)))?;

        let size = mip_chain_size(width, height, depth, format, 1, false)
            .ok_or_else(|| Error::InvalidResource(format!("invalid size {}x{}x{}", width, height, depth)))?;

        let name = node.child("NAME")
            .and_then(|n| n.as_str())
            .unwrap_or("texture")
            .to_string();

        let Some(pixels) = node.child("PIXELS") else {
            return self.build_zeroed(&name, width, height, depth, format);
        };
        let pixels: Vec<u8> = pixels.parse_list()
            .ok_or_else(|| Error::InvalidResource("PIXELS must be a list of bytes".to_string()))?;
        if pixels.len() != size {
            return Err(Error::InvalidResource(format!(
                "PIXELS has {} bytes, {}x{}x{} {} needs {}",
                pixels.len(), width, height, depth, format.name(), size)));
        }

        self.build(TextureData { name, width, height, depth, format, mip_levels: 1, cubemap: false, pixels })
    }

    fn decode_binary(&self, data: &[u8]) -> Result<Texture> {
        let (_, payload) = ResourceHeader::parse(data, ResourceTypeCode::TEXTURE)?;
        let mut reader = BinaryReader::new(payload);

        let name = reader.read_string()?;
        let width = reader.read_u32()?;
        let height = reader.read_u32()?;
        let depth = reader.read_u32()?;
        let format_code = reader.read_u32()?;
        let format = TextureFormat::from_code(format_code)
            .ok_or_else(|| Error::InvalidResource(format!("unknown format code {}", format_code)))?;
        let mip_levels = reader.read_u32()?;
        let cubemap = reader.read_u32()? & TEXTURE_FLAG_CUBEMAP != 0;
        let pixels = reader.read_blob()?.to_vec();
        reader.finish()?;

        let expected = mip_chain_size(width, height, depth, format, mip_levels, cubemap)
            .ok_or_else(|| Error::InvalidResource(format!(
                "invalid texture shape {}x{}x{} with {} mips", width, height, depth, mip_levels)))?;
        if pixels.len() != expected {
            return Err(Error::InvalidResource(format!(
                "pixel data is {} bytes, mip chain needs {}", pixels.len(), expected)));
        }

        self.build(TextureData { name, width, height, depth, format, mip_levels, cubemap, pixels })
    }

    // ===== CONSTRUCTION =====

    /// Store pixels in the pool and create the GPU texture
    pub fn build(&self, data: TextureData) -> Result<Texture> {
        let expected = mip_chain_size(data.width, data.height, data.depth, data.format, data.mip_levels, data.cubemap)
            .ok_or_else(|| Error::InvalidResource("invalid texture shape".to_string()))?;
        if data.pixels.len() != expected {
            return Err(Error::InvalidResource(format!(
                "pixel data is {} bytes, expected {}", data.pixels.len(), expected)));
        }

        let pixels = store_bytes(&self.allocator, &data.pixels)?;
        let desc = TextureDesc {
            name: data.name,
            width: data.width,
            height: data.height,
            depth: data.depth,
            format: data.format,
            mip_levels: data.mip_levels,
            cubemap: data.cubemap,
            data: Some(data.pixels),
        };
        self.create_device_texture(desc, pixels)
    }

    /// Single-level zero-filled texture; the pool block is reserved before
    /// anything else so the allocator budget bounds the request
    fn build_zeroed(&self, name: &str, width: u32, height: u32, depth: u32, format: TextureFormat) -> Result<Texture> {
        let size = mip_chain_size(width, height, depth, format, 1, false)
            .ok_or_else(|| Error::InvalidResource(format!("invalid size {}x{}x{}", width, height, depth)))?;
        let pixels = alloc_zeroed(&self.allocator, size)?;
        let desc = TextureDesc {
            name: name.to_string(),
            width,
            height,
            depth,
            format,
            mip_levels: 1,
            cubemap: false,
            data: None,
        };
        self.create_device_texture(desc, pixels)
    }

    fn create_device_texture(&self, desc: TextureDesc, pixels: PoolBlock) -> Result<Texture> {
        let name = desc.name.clone();
        let info = TextureInfo::from_desc(&desc);

        let device_texture = self.device.lock()
            .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))
            .and_then(|mut device| device.create_texture(desc));
        let device_texture = match device_texture {
            Ok(texture) => texture,
            Err(err) => {
                release_block(&self.allocator, pixels);
                return Err(err);
            }
        };

        engine_debug!("prism::TextureFactory", "Created texture '{}' {}x{} {}",
            name, info.width, info.height, info.format.name());

        Ok(Texture { origin: self.id, name, info, pixels, device_texture })
    }
}

impl ResourceFactory for TextureFactory {
    type Resource = Texture;

    fn create(&self, format: &str, data: &[u8]) -> Option<Texture> {
        if data.is_empty() {
            engine_warn!("prism::TextureFactory", "Rejected empty '{}' texture data", format);
            return None;
        }
        let Some(decode) = self.decoders.get(format) else {
            engine_warn!("prism::TextureFactory", "Unknown texture format '{}'", format);
            return None;
        };
        decode(self, data)
            .map_err(|err| engine_warn!("prism::TextureFactory", "Failed to decode '{}' texture: {}", format, err))
            .ok()
    }

    fn release(&self, texture: Texture) {
        debug_assert_eq!(texture.origin, self.id, "texture released through a foreign factory");
        if texture.origin != self.id {
            engine_error!("prism::TextureFactory", "Refusing to release texture '{}' created by another factory", texture.name);
            return;
        }
        release_block(&self.allocator, texture.pixels);
    }

    fn resource_type_code(&self) -> ResourceTypeCode {
        ResourceTypeCode::TEXTURE
    }
}

#[cfg(test)]
#[path = "texture_factory_tests.rs"]
mod tests;
