/// Unit tests for ModelFactory (text, binary, failure paths)

use std::sync::{Arc, Mutex};
use glam::Vec3;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::Buffer;
use crate::memory::{PoolAllocator, SharedAllocator};
use crate::resource::header::ResourceHeader;
use crate::resource::model_factory::{MeshData, ModelFactory};
use crate::resource::{ResourceFactory, ResourceTypeCode, Vertex};

// ============================================================================
// HELPERS
// ============================================================================

const QUAD: &str = "
FILETYPE MODEL
MESHES {
    MESH {
        NAME quad
        MATERIAL default
        VERTICES [
            -1 -1 0   0 0 1   0 0
             1 -1 0   0 0 1   1 0
             1  1 0   0 0 1   1 1
            -1  1 0   0 0 1   0 1
        ]
        INDICES [ 0 1 2 2 3 0 ]
    }
}
";

struct Fixture {
    factory: ModelFactory,
    device: Arc<Mutex<MockGraphicsDevice>>,
    pool: Arc<Mutex<PoolAllocator>>,
}

fn fixture() -> Fixture {
    let (device, mock) = MockGraphicsDevice::shared();
    let pool = Arc::new(Mutex::new(PoolAllocator::new()));
    let allocator: SharedAllocator = pool.clone();
    Fixture { factory: ModelFactory::new(device, allocator), device: mock, pool }
}

fn live_blocks(fx: &Fixture) -> usize {
    fx.pool.lock().unwrap().live_blocks()
}

// ============================================================================
// TEXT PATH
// ============================================================================

#[test]
fn test_create_text_model() {
    let fx = fixture();
    let model = fx.factory.create("text", QUAD.as_bytes()).unwrap();

    assert_eq!(model.mesh_count(), 1);
    let mesh = model.mesh("quad").unwrap();
    assert_eq!(mesh.material(), "default");
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.index_count(), 6);
    assert_eq!(mesh.indices(), vec![0, 1, 2, 2, 3, 0]);
    assert_eq!(mesh.vertices()[2].uv, [1.0, 1.0]);
    assert_eq!(mesh.bounds().min, Vec3::new(-1.0, -1.0, 0.0));
    assert_eq!(mesh.bounds().max, Vec3::new(1.0, 1.0, 0.0));
    assert_eq!(mesh.vertex_buffer().size(), 4 * 32);

    let commands = fx.device.lock().unwrap().commands.clone();
    assert_eq!(commands, vec!["create_buffer quad.vertices 128", "create_buffer quad.indices 24"]);
    assert_eq!(live_blocks(&fx), 2);

    fx.factory.release(model);
    assert_eq!(live_blocks(&fx), 0);
}

#[test]
fn test_text_model_rejects_bad_content() {
    let fx = fixture();
    let cases = [
        "FILETYPE TEXTURE MESHES { }",
        "FILETYPE MODEL",
        "FILETYPE MODEL MESHES { }",
        "FILETYPE MODEL MESHES { MESH { VERTICES [ 0 0 0 ] INDICES [ ] } }",
        "FILETYPE MODEL MESHES { MESH { VERTICES [ 0 0 0 0 0 0 0 0 ] INDICES [ 0 0 1 ] } }",
        "FILETYPE MODEL MESHES { MESH { VERTICES [ 0 0 0 0 0 0 0 0 ] INDICES [ 0 0 ] } }",
        "FILETYPE MODEL MESHES { MESH { VERTICES [ 0 0 0 0 0 0 0 x ] INDICES [ 0 0 0 ] } }",
        "FILETYPE MODEL MESHES {",
    ];
    for case in cases {
        assert!(fx.factory.create("text", case.as_bytes()).is_none(), "accepted: {}", case);
    }
    assert_eq!(live_blocks(&fx), 0);
    assert!(fx.device.lock().unwrap().commands.is_empty());
}

#[test]
fn test_deeply_nested_text_model_is_rejected() {
    let fx = fixture();
    let text = format!("FILETYPE MODEL\nMESHES {}x", "{ A ".repeat(200_000));
    assert!(fx.factory.create("text", text.as_bytes()).is_none());
    assert_eq!(live_blocks(&fx), 0);
}

// ============================================================================
// BINARY PATH
// ============================================================================

#[test]
fn test_binary_bake_is_accepted_by_binary_path() {
    let fx = fixture();
    let text_model = fx.factory.create("text", QUAD.as_bytes()).unwrap();
    let baked = text_model.encode_binary();
    assert_eq!(&baked[..4], b"LMDL");

    let binary_model = fx.factory.create("binary", &baked).unwrap();
    let (a, b) = (&text_model.meshes()[0], &binary_model.meshes()[0]);
    assert_eq!(a.name(), b.name());
    assert_eq!(a.vertices(), b.vertices());
    assert_eq!(a.indices(), b.indices());

    fx.factory.release(text_model);
    fx.factory.release(binary_model);
    assert_eq!(live_blocks(&fx), 0);
}

#[test]
fn test_binary_rejects_wrong_tag_and_truncation() {
    let fx = fixture();
    let model = fx.factory.create("text", QUAD.as_bytes()).unwrap();
    let baked = model.encode_binary();
    fx.factory.release(model);

    let mut wrong_tag = baked.clone();
    wrong_tag[..4].copy_from_slice(b"SHAD");
    assert!(fx.factory.create("binary", &wrong_tag).is_none());

    assert!(fx.factory.create("binary", &baked[..ResourceHeader::SIZE - 1]).is_none());

    // Header claims the full payload but the tail is missing
    assert!(fx.factory.create("binary", &baked[..baked.len() - 4]).is_none());

    // Consistent header around a truncated payload
    let payload = &baked[ResourceHeader::SIZE..baked.len() - 4];
    let short = ResourceHeader::encode(ResourceTypeCode::MODEL, 0, payload);
    assert!(fx.factory.create("binary", &short).is_none());

    assert_eq!(live_blocks(&fx), 0);
}

// ============================================================================
// CONTRACT
// ============================================================================

#[test]
fn test_empty_data_and_unknown_format() {
    let fx = fixture();
    assert!(fx.factory.create("text", &[]).is_none());
    assert!(fx.factory.create("fbx", QUAD.as_bytes()).is_none());
    assert_eq!(fx.factory.formats(), vec!["binary", "text"]);
    assert_eq!(fx.factory.resource_type_code(), ResourceTypeCode::MODEL);
}

#[test]
fn test_device_failure_releases_partial_allocations() {
    let fx = fixture();
    fx.device.lock().unwrap().fail_on = Some("create_buffer quad.indices");
    assert!(fx.factory.create("text", QUAD.as_bytes()).is_none());
    assert_eq!(live_blocks(&fx), 0);
}

#[test]
fn test_budget_exhaustion_fails_cleanly() {
    let (device, _mock) = MockGraphicsDevice::shared();
    let pool = Arc::new(Mutex::new(PoolAllocator::with_budget(130)));
    let allocator: SharedAllocator = pool.clone();
    let factory = ModelFactory::new(device, allocator);

    // 128 vertex bytes fit, the 24 index bytes do not
    assert!(factory.create("text", QUAD.as_bytes()).is_none());
    assert_eq!(pool.lock().unwrap().live_blocks(), 0);
}

#[test]
fn test_registered_custom_format() {
    fn decode_triangle(factory: &ModelFactory, _data: &[u8]) -> crate::error::Result<crate::resource::Model> {
        let vertex = |x: f32, y: f32| Vertex { position: [x, y, 0.0], normal: [0.0, 0.0, 1.0], uv: [x, y] };
        factory.build(vec![MeshData {
            name: "tri".to_string(),
            material: String::new(),
            vertices: vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)],
            indices: vec![0, 1, 2],
        }])
    }

    let mut fx = fixture();
    fx.factory.register_format("triangle", decode_triangle);
    let model = fx.factory.create("triangle", b"anything").unwrap();
    assert_eq!(model.mesh("tri").unwrap().index_count(), 3);
    fx.factory.release(model);
}
