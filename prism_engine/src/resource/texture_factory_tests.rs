/// Unit tests for TextureFactory and mip chain sizing

use std::sync::{Arc, Mutex};
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::TextureFormat;
use crate::memory::{PoolAllocator, SharedAllocator};
use crate::resource::header::{BinaryWriter, ResourceHeader};
use crate::resource::texture::mip_chain_size;
use crate::resource::texture_factory::{TextureData, TextureFactory};
use crate::resource::{ResourceFactory, ResourceTypeCode};

fn fixture() -> (TextureFactory, Arc<Mutex<MockGraphicsDevice>>, Arc<Mutex<PoolAllocator>>) {
    let (device, mock) = MockGraphicsDevice::shared();
    let pool = Arc::new(Mutex::new(PoolAllocator::new()));
    let allocator: SharedAllocator = pool.clone();
    (TextureFactory::new(device, allocator), mock, pool)
}

const CHECKER: &str = "
FILETYPE TEXTURE
DATA {
    NAME checker
    WIDTH 2
    HEIGHT 1
    FORMAT A8R8G8B8
    PIXELS [ 255 255 255 255   0 0 0 255 ]
}
";

// ============================================================================
// MIP CHAIN SIZE
// ============================================================================

#[test]
fn test_mip_chain_size() {
    assert_eq!(mip_chain_size(4, 4, 1, TextureFormat::R8G8B8A8, 1, false), Some(64));
    // 4x4 + 2x2 + 1x1
    assert_eq!(mip_chain_size(4, 4, 1, TextureFormat::R8G8B8A8, 3, false), Some((16 + 4 + 1) * 4));
    assert_eq!(mip_chain_size(2, 2, 1, TextureFormat::R16F, 1, true), Some(2 * 2 * 2 * 6));
    assert_eq!(mip_chain_size(8, 2, 1, TextureFormat::R8, 4, false), Some(16 + 4 + 2 + 1));
}

#[test]
fn test_mip_chain_size_rejects_bad_shapes() {
    assert_eq!(mip_chain_size(0, 4, 1, TextureFormat::R8, 1, false), None);
    assert_eq!(mip_chain_size(4, 4, 1, TextureFormat::R8, 0, false), None);
    assert_eq!(mip_chain_size(4, 4, 1, TextureFormat::R8, 4, false), None);
}

// ============================================================================
// TEXT PATH
// ============================================================================

#[test]
fn test_create_text_texture() {
    let (factory, device, pool) = fixture();
    let texture = factory.create("text", CHECKER.as_bytes()).unwrap();

    assert_eq!(texture.name(), "checker");
    assert_eq!(texture.width(), 2);
    assert_eq!(texture.height(), 1);
    assert_eq!(texture.format(), TextureFormat::R8G8B8A8);
    assert_eq!(texture.pixels(), &[255, 255, 255, 255, 0, 0, 0, 255]);
    assert_eq!(texture.device_texture().name(), "checker");
    assert_eq!(device.lock().unwrap().commands, vec!["create_texture checker 2x1"]);

    factory.release(texture);
    assert_eq!(pool.lock().unwrap().live_blocks(), 0);
}

#[test]
fn test_text_texture_without_pixels_is_zero_filled() {
    let (factory, _device, _pool) = fixture();
    let text = "FILETYPE TEXTURE DATA { WIDTH 4 HEIGHT 4 DEPTH 1 FORMAT R32F }";
    let texture = factory.create("text", text.as_bytes()).unwrap();
    assert_eq!(texture.pixels().len(), 4 * 4 * 4);
    assert!(texture.pixels().iter().all(|&b| b == 0));
    assert_eq!(texture.name(), "texture");
    factory.release(texture);
}

#[test]
fn test_text_texture_rejects_bad_content() {
    let (factory, device, pool) = fixture();
    let cases = [
        "FILETYPE MODEL DATA { WIDTH 1 HEIGHT 1 FORMAT R8 }",
        "FILETYPE TEXTURE",
        "FILETYPE TEXTURE DATA { HEIGHT 1 FORMAT R8 }",
        "FILETYPE TEXTURE DATA { WIDTH 0 HEIGHT 1 FORMAT R8 }",
        "FILETYPE TEXTURE DATA { WIDTH 1 HEIGHT 1 FORMAT R8G8B8 }",
        "FILETYPE TEXTURE DATA { WIDTH 1 HEIGHT 1 FORMAT R8 PIXELS [ 1 2 ] }",
        "FILETYPE TEXTURE DATA { WIDTH 1 HEIGHT 1 FORMAT R8 PIXELS [ 300 ] }",
    ];
    for case in cases {
        assert!(factory.create("text", case.as_bytes()).is_none(), "accepted: {}", case);
    }
    assert!(device.lock().unwrap().commands.is_empty());
    assert_eq!(pool.lock().unwrap().live_blocks(), 0);
}

// ============================================================================
// BINARY PATH
// ============================================================================

#[test]
fn test_binary_bake_is_accepted_by_binary_path() {
    let (factory, _device, pool) = fixture();
    let texture = factory.create("text", CHECKER.as_bytes()).unwrap();
    let baked = texture.encode_binary();
    assert_eq!(&baked[..4], b"LTEX");

    let copy = factory.create("binary", &baked).unwrap();
    assert_eq!(copy.name(), "checker");
    assert_eq!(copy.info(), texture.info());
    assert_eq!(copy.pixels(), texture.pixels());

    factory.release(texture);
    factory.release(copy);
    assert_eq!(pool.lock().unwrap().live_blocks(), 0);
}

#[test]
fn test_binary_cubemap_with_mips() {
    let (factory, _device, _pool) = fixture();
    let size = mip_chain_size(2, 2, 1, TextureFormat::R8, 2, true).unwrap();

    let mut writer = BinaryWriter::new();
    writer.write_string("sky");
    for value in [2, 2, 1, TextureFormat::R8.code(), 2, 1] {
        writer.write_u32(value);
    }
    writer.write_blob(&vec![7u8; size]);
    let data = ResourceHeader::encode(ResourceTypeCode::TEXTURE, 0, &writer.into_bytes());

    let texture = factory.create("binary", &data).unwrap();
    assert!(texture.is_cubemap());
    assert_eq!(texture.info().mip_levels, 2);
    assert_eq!(texture.pixels().len(), (4 + 1) * 6);
    factory.release(texture);
}

#[test]
fn test_binary_rejects_wrong_pixel_size_and_tag() {
    let (factory, _device, pool) = fixture();
    let mut writer = BinaryWriter::new();
    writer.write_string("bad");
    for value in [2, 2, 1, TextureFormat::R8.code(), 1, 0] {
        writer.write_u32(value);
    }
    writer.write_blob(&[0u8; 3]);
    let payload = writer.into_bytes();

    let data = ResourceHeader::encode(ResourceTypeCode::TEXTURE, 0, &payload);
    assert!(factory.create("binary", &data).is_none());

    let foreign = ResourceHeader::encode(ResourceTypeCode::MODEL, 0, &payload);
    assert!(factory.create("binary", &foreign).is_none());
    assert!(factory.create("binary", &data[..10]).is_none());
    assert_eq!(pool.lock().unwrap().live_blocks(), 0);
}

// ============================================================================
// EMPTY TEXTURES / CONTRACT
// ============================================================================

#[test]
fn test_create_empty() {
    let (factory, device, _pool) = fixture();
    let texture = factory.create_empty("brdf_lut", 8, 8, TextureFormat::R16G16B16A16F).unwrap();
    assert_eq!(texture.pixels().len(), 8 * 8 * 8);
    assert_eq!(device.lock().unwrap().commands, vec!["create_texture brdf_lut 8x8"]);
    factory.release(texture);

    assert!(factory.create_empty("zero", 0, 8, TextureFormat::R8).is_none());
}

#[test]
fn test_device_failure_releases_pixels() {
    let (factory, device, pool) = fixture();
    device.lock().unwrap().fail_on = Some("create_texture");
    assert!(factory.create("text", CHECKER.as_bytes()).is_none());
    assert_eq!(pool.lock().unwrap().live_blocks(), 0);
}

#[test]
fn test_build_validates_pixel_length() {
    let (factory, _device, _pool) = fixture();
    let data = TextureData {
        name: "t".to_string(),
        width: 1,
        height: 1,
        depth: 1,
        format: TextureFormat::R32G32B32A32F,
        mip_levels: 1,
        cubemap: false,
        pixels: vec![0; 4],
    };
    assert!(factory.build(data).is_err());
    assert_eq!(factory.resource_type_code(), ResourceTypeCode::TEXTURE);
    assert!(factory.create("text", b"").is_none());
    assert!(factory.create("png", CHECKER.as_bytes()).is_none());
}

// ============================================================================
// OVERSIZED REQUESTS
// ============================================================================

fn budgeted_fixture(budget: usize) -> (TextureFactory, Arc<Mutex<MockGraphicsDevice>>, Arc<Mutex<PoolAllocator>>) {
    let (device, mock) = MockGraphicsDevice::shared();
    let pool = Arc::new(Mutex::new(PoolAllocator::with_budget(budget)));
    let allocator: SharedAllocator = pool.clone();
    (TextureFactory::new(device, allocator), mock, pool)
}

#[test]
fn test_oversized_text_texture_is_rejected_by_budget() {
    let (factory, device, pool) = budgeted_fixture(1 << 20);
    // 1M x 1M RGBA32F is 16 TiB of zero fill
    let text = "
FILETYPE TEXTURE
DATA {
    NAME huge
    WIDTH 1048576
    HEIGHT 1048576
    FORMAT R32G32B32A32F
}
";
    assert!(factory.create("text", text.as_bytes()).is_none());
    assert_eq!(pool.lock().unwrap().live_blocks(), 0);
    assert!(device.lock().unwrap().commands.is_empty());
}

#[test]
fn test_oversized_empty_texture_is_rejected() {
    let (factory, device, pool) = budgeted_fixture(1 << 20);
    assert!(factory.create_empty("huge", 1 << 20, 1 << 20, TextureFormat::R32G32B32A32F).is_none());
    assert!(device.lock().unwrap().commands.is_empty());

    // Within budget still works
    let texture = factory.create_empty("small", 16, 16, TextureFormat::R8).unwrap();
    assert_eq!(pool.lock().unwrap().live_bytes(), 256);
    factory.release(texture);
}
