/// Unit tests for ShaderFactory (text sections, binary, driver binding)

use std::sync::{Arc, Mutex};
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{ShaderStage, ShaderStages};
use crate::memory::{PoolAllocator, SharedAllocator};
use crate::resource::shader_factory::{ShaderFactory, ShaderSource};
use crate::resource::{ResourceFactory, ResourceTypeCode};
use crate::shader::ShaderDriverManager;

const BASIC: &str = "
// transform only
@shader basic
@vertex
// SHADER_PARAMETER [name=WorldViewProjection]
uniform mat4 u_wvp;
void main() { gl_Position = u_wvp * a_position; }
@pixel
void main() { out_color = vec4(1.0); }
";

const PLAIN: &str = "@shader plain\n@vertex\nvoid main() {}\n@pixel\nvoid main() {}\n";

struct Fixture {
    factory: ShaderFactory,
    device: Arc<Mutex<MockGraphicsDevice>>,
    pool: Arc<Mutex<PoolAllocator>>,
}

fn fixture() -> Fixture {
    let (device, mock) = MockGraphicsDevice::shared();
    let pool = Arc::new(Mutex::new(PoolAllocator::new()));
    let allocator: SharedAllocator = pool.clone();
    let drivers = Arc::new(ShaderDriverManager::with_default_drivers());
    Fixture { factory: ShaderFactory::new(device, allocator, drivers), device: mock, pool }
}

// ============================================================================
// TEXT PATH
// ============================================================================

#[test]
fn test_create_text_shader() {
    let fx = fixture();
    let shader = fx.factory.create("text", BASIC.as_bytes()).unwrap();

    assert_eq!(shader.name(), "basic");
    assert_eq!(shader.id(), None);
    assert_eq!(shader.stages(), ShaderStages::VERTEX | ShaderStages::PIXEL);
    assert_eq!(shader.module(ShaderStage::Vertex).unwrap().name(), "basic.vertex");
    assert!(shader.module(ShaderStage::Compute).is_none());
    assert_eq!(shader.driver_name(), Some("general"));
    assert_eq!(
        fx.device.lock().unwrap().commands_with("create_shader"),
        vec!["create_shader basic.vertex", "create_shader basic.pixel"],
    );

    fx.factory.release(shader);
    assert_eq!(fx.pool.lock().unwrap().live_blocks(), 0);
}

#[test]
fn test_shader_without_parameters_has_no_driver() {
    let fx = fixture();
    let shader = fx.factory.create("text", PLAIN.as_bytes()).unwrap();
    assert!(!shader.has_driver());
    assert_eq!(shader.driver_name(), None);
    fx.factory.release(shader);
}

#[test]
fn test_text_shader_rejections() {
    let fx = fixture();
    let cases = [
        "@shader x\nvoid main() {}\n@vertex\nvoid main() {}\n",
        "@shader x\n@vertex\nvoid main() {}\n@vertex\nvoid main() {}\n",
        "@shader x\n@vertex\n\n@pixel\nvoid main() {}\n",
        "@shader x\n@geometry\nvoid main() {}\n",
        "@shader x\n",
    ];
    for case in cases {
        assert!(fx.factory.create("text", case.as_bytes()).is_none(), "accepted: {}", case);
    }
    assert!(fx.factory.create("text", &[]).is_none());
    assert!(fx.factory.create("text", &[0xff, 0xfe]).is_none());
    assert!(fx.factory.create("hlsl", PLAIN.as_bytes()).is_none());
    assert_eq!(fx.pool.lock().unwrap().live_blocks(), 0);
}

#[test]
fn test_create_from_source() {
    let fx = fixture();
    let vertex = "// SHADER_PARAMETER [name=EyePosition]\nuniform vec3 u_eye;\nvoid main() {}";
    let shader = fx.factory.create_from_source("inline", vertex, "void main() {}").unwrap();
    assert_eq!(shader.name(), "inline");
    assert_eq!(shader.stage(ShaderStage::Pixel).unwrap().code(), b"void main() {}");
    assert_eq!(shader.driver_name(), Some("general"));
    fx.factory.release(shader);
}

// ============================================================================
// BINARY PATH
// ============================================================================

#[test]
fn test_binary_matches_text() {
    let fx = fixture();
    let text = fx.factory.create("text", BASIC.as_bytes()).unwrap();
    let baked = text.encode_binary();
    let binary = fx.factory.create("binary", &baked).unwrap();

    assert_eq!(binary.name(), text.name());
    assert_eq!(binary.stages(), text.stages());
    assert_eq!(binary.driver_name(), text.driver_name());
    assert_eq!(
        binary.stage(ShaderStage::Vertex).unwrap().code(),
        text.stage(ShaderStage::Vertex).unwrap().code(),
    );

    fx.factory.release(text);
    fx.factory.release(binary);
    assert_eq!(fx.pool.lock().unwrap().live_blocks(), 0);
}

#[test]
fn test_binary_rejects_other_type_codes() {
    let fx = fixture();
    let shader = fx.factory.create("text", PLAIN.as_bytes()).unwrap();
    let mut baked = shader.encode_binary();
    baked[..4].copy_from_slice(ResourceTypeCode::TEXTURE.as_bytes());
    assert!(fx.factory.create("binary", &baked).is_none());

    let truncated = &shader.encode_binary()[..20];
    assert!(fx.factory.create("binary", truncated).is_none());
    fx.factory.release(shader);
}

// ============================================================================
// FAILURE PATHS
// ============================================================================

#[test]
fn test_device_failure_rolls_back() {
    let fx = fixture();
    fx.device.lock().unwrap().fail_on = Some("create_shader plain.pixel");
    assert!(fx.factory.create("text", PLAIN.as_bytes()).is_none());
    assert_eq!(fx.pool.lock().unwrap().live_blocks(), 0);
}

#[test]
fn test_build_direct_source() {
    let fx = fixture();
    let shader = fx.factory.build(ShaderSource {
        name: "compute".to_string(),
        stages: vec![(ShaderStage::Compute, b"void main() {}".to_vec())],
        driver_code: String::new(),
    }).unwrap();
    assert_eq!(shader.stages(), ShaderStages::COMPUTE);
    assert_eq!(fx.factory.resource_type_code(), ResourceTypeCode::SHADER);
    fx.factory.release(shader);
}

#[test]
fn test_custom_format() {
    fn decode_glsl_pair(factory: &ShaderFactory, data: &[u8]) -> crate::error::Result<crate::resource::Shader> {
        let text = String::from_utf8_lossy(data);
        let (vertex, pixel) = text.split_once("----").unwrap_or((&*text, ""));
        factory.build(ShaderSource {
            name: "pair".to_string(),
            stages: vec![
                (ShaderStage::Vertex, vertex.as_bytes().to_vec()),
                (ShaderStage::Pixel, pixel.as_bytes().to_vec()),
            ],
            driver_code: text.to_string(),
        })
    }

    let mut fx = fixture();
    fx.factory.register_format("pair", decode_glsl_pair);
    assert_eq!(fx.factory.formats(), vec!["binary", "pair", "text"]);
    let shader = fx.factory.create("pair", b"void main() {}----void main() {}").unwrap();
    assert_eq!(shader.name(), "pair");
    fx.factory.release(shader);
}
