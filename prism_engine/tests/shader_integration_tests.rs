//! Integration tests for shader sets, the shader registry and driver binding
//!
//! No GPU required.
//!
//! Run with: cargo test --test shader_integration_tests


use std::sync::Arc;
use glam::{Mat4, Vec3};
use prism_engine::prism::{Engine, EngineConfig, Error};
use prism_engine::prism::resource::{MemoryLoader, ResourceFactory};
use gpu_test_utils::{lines_with, recording_device, Journal};

const BASIC: &str = "
@shader basic
@vertex
// SHADER_PARAMETER [name=WorldViewProjection]
uniform mat4 u_wvp;
void main() {}
@pixel
void main() {}
";

const PBR: &str = "
@shader pbr
@vertex
// SHADER_PARAMETER [name=WorldViewProjection]
uniform mat4 u_wvp;
void main() {}
@pixel
// SHADER_PARAMETER [name=IBLDiffuseTexture]
uniform samplerCube diffuseMap;
// SHADER_PARAMETER [name=IBLSpecularTexture]
uniform samplerCube specularMap;
// SHADER_PARAMETER [name=IBLTextureSize]
uniform float iblSize;
void main() {}
";

const SHADER_SET: &str = "
FILETYPE SHADERSET
SHADERS {
    SHADER { NAME basic FILE basic.shader.text }
    SHADER { NAME pbr FILE pbr.shader.binary }
    SHADER { NAME basic FILE basic.shader.text }
}
";

/// Engine with `basic` (text) and `pbr` (baked binary) loaded from a set
fn engine() -> (Engine, Journal) {
    let (device, journal) = recording_device();
    let mut baker = Engine::with_loader(EngineConfig::default(), device.clone(), Arc::new(MemoryLoader::new())).unwrap();
    let factory = baker.shader_manager().factory();
    let shader = factory.create("text", PBR.as_bytes()).unwrap();
    let baked = shader.encode_binary();
    factory.release(shader);
    baker.shutdown();

    let loader = MemoryLoader::new()
        .with("shaders/all.set.text", SHADER_SET)
        .with("shaders/basic.shader.text", BASIC)
        .with("shaders/pbr.shader.binary", baked);
    let mut engine = Engine::with_loader(EngineConfig::default(), device, Arc::new(loader)).unwrap();
    assert_eq!(engine.load_shader_set("shaders/all.set.text").unwrap(), 2);
    journal.lock().unwrap().clear();
    (engine, journal)
}

// ============================================================================
// REGISTRY TESTS
// ============================================================================

#[test]
fn test_integration_shader_set_assigns_distinct_ids() {
    let (engine, _journal) = engine();
    let shaders = engine.shader_manager();

    assert_eq!(shaders.shader_names(), vec!["basic", "pbr"]);
    let basic = shaders.shader_id("basic").unwrap();
    let pbr = shaders.shader_id("pbr").unwrap();
    assert_ne!(basic, pbr);

    // Id and name lookups agree
    assert_eq!(shaders.shader_by_id(basic).unwrap().name(), "basic");
    assert_eq!(shaders.shader("pbr").unwrap().id(), Some(pbr));
}

#[test]
fn test_integration_shader_drivers_follow_parameters() {
    let (engine, _journal) = engine();
    let shaders = engine.shader_manager();

    assert_eq!(shaders.shader("basic").unwrap().driver_name(), Some("general"));
    assert_eq!(shaders.shader("pbr").unwrap().driver_name(), Some("general"));

    let light_first = EngineConfig {
        shader_driver_priority: vec!["light".to_string(), "general".to_string()],
        ..EngineConfig::default()
    };
    let (device, _journal) = recording_device();
    let reordered = Engine::with_loader(light_first, device, Arc::new(MemoryLoader::new())).unwrap();
    let shader = reordered.shader_manager().factory().create("text", PBR.as_bytes()).unwrap();
    assert_eq!(shader.driver_name(), Some("light"));
    reordered.shader_manager().factory().release(shader);
}

// ============================================================================
// ACTIVE SHADER TESTS
// ============================================================================

#[test]
fn test_integration_bind_missing_keeps_previous() {
    let (engine, journal) = engine();
    let shaders = engine.shader_manager();

    let pbr = shaders.bind_shader("pbr").unwrap();
    assert!(matches!(shaders.bind_shader("missing"), Err(Error::NotFound(_))));
    assert_eq!(shaders.active_shader_id(), Some(pbr));
    assert_eq!(lines_with(&journal, "bind_shader"), vec!["bind_shader pbr.vertex,pbr.pixel"]);
}

#[test]
fn test_integration_bind_by_id_and_name_converge() {
    let (engine, journal) = engine();
    let shaders = engine.shader_manager();
    let basic = shaders.shader_id("basic").unwrap();

    assert_eq!(shaders.bind_shader(basic).unwrap(), basic);
    assert_eq!(shaders.bind_shader("basic").unwrap(), basic);
    assert_eq!(lines_with(&journal, "bind_shader").len(), 2);
}

#[test]
fn test_integration_active_drivers_upload_uniforms() {
    let (engine, journal) = engine();
    let shaders = engine.shader_manager();
    shaders.bind_shader("basic").unwrap();

    let mut rs = engine.new_render_state();
    rs.set_camera(Mat4::from_translation(Vec3::Z), Mat4::IDENTITY, Vec3::ZERO);
    shaders.apply_active_drivers(&rs).unwrap();

    let uniforms = lines_with(&journal, "set_uniform");
    assert_eq!(uniforms.len(), 1);
    assert!(uniforms[0].starts_with("set_uniform basic.vertex@"));
}

#[test]
fn test_integration_unload_and_reload() {
    let (mut engine, _journal) = engine();
    let old = engine.shader_manager().shader_id("basic").unwrap();

    engine.shader_manager_mut().unload_shader("basic").unwrap();
    assert!(engine.shader_manager().shader_id("basic").is_none());

    engine.load_shader_set("shaders/all.set.text").unwrap();
    let new = engine.shader_manager().shader_id("basic").unwrap();
    assert!(new.value() > old.value());
}
