//! Unit tests for the Engine context
//!
//! Tests construction from config, the frame phases, shutdown and the logging APIs.
//!
//! IMPORTANT: the logger is a global OnceLock shared across all tests.
//! Tests that replace it are marked with #[serial].

use std::sync::{Arc, Mutex};
use glam::Vec3;
use serial_test::serial;
use crate::prism::{Engine, EngineConfig, Error};
use crate::prism::log::{Logger, LogEntry, LogSeverity};
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockTexture};
use crate::graphics_device::{TextureFormat, TextureInfo};
use crate::gui::Panel;
use crate::light::DirectionalLight;
use crate::resource::{MemoryLoader, ResourceLoader};
use crate::shader::ManagerState;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        let mut entries = self.entries.lock().unwrap();
        entries.push(format!("{:?} {}: {}", entry.severity, entry.source, entry.message));
    }
}

const BASIC: &str = "
@shader basic
@vertex
// SHADER_PARAMETER [name=WorldViewProjection]
uniform mat4 u_wvp;
void main() {}
@pixel
void main() {}
";

const TRIANGLE: &str = "
FILETYPE MODEL
MESHES {
    MESH {
        NAME tri
        MATERIAL default
        VERTICES [ 0 0 0  0 0 1  0 0   1 0 0  0 0 1  1 0   0 1 0  0 0 1  0 1 ]
        INDICES [ 0 1 2 ]
    }
}
";

fn loader() -> Arc<dyn ResourceLoader> {
    Arc::new(MemoryLoader::new()
        .with("shaders/default.set.text", "FILETYPE SHADERSET SHADERS { SHADER { NAME basic FILE basic.shader.text } }")
        .with("shaders/basic.shader.text", BASIC)
        .with("tri.model.text", TRIANGLE))
}

fn engine_with(config: EngineConfig) -> (Engine, Arc<Mutex<MockGraphicsDevice>>) {
    let (device, mock) = MockGraphicsDevice::shared();
    (Engine::with_loader(config, device, loader()).unwrap(), mock)
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_engine_defaults() {
    let (engine, _device) = engine_with(EngineConfig::default());
    assert_eq!(engine.shader_manager().state(), ManagerState::Initialized);
    assert_eq!(engine.shader_manager().factory().drivers().driver_names(), vec!["general", "light"]);
    assert!(engine.gui_manager().is_some());
    assert_eq!(engine.new_render_state().max_lights(), 8);
    assert_eq!(engine.allocator().lock().unwrap().budget(), None);
}

#[test]
fn test_engine_config_is_applied() {
    let config = EngineConfig {
        enable_gui: false,
        max_lights: 2,
        memory_budget: Some(4096),
        shader_driver_priority: vec!["light".to_string()],
        ..EngineConfig::default()
    };
    let (engine, _device) = engine_with(config);
    assert!(engine.gui_manager().is_none());
    assert_eq!(engine.new_render_state().max_lights(), 2);
    assert_eq!(engine.allocator().lock().unwrap().budget(), Some(4096));
    assert_eq!(engine.shader_manager().factory().drivers().driver_names(), vec!["light"]);
}

#[test]
fn test_unknown_driver_fails_construction() {
    let (device, _mock) = MockGraphicsDevice::shared();
    let config = EngineConfig {
        shader_driver_priority: vec!["general".to_string(), "volumetric".to_string()],
        ..EngineConfig::default()
    };
    let result = Engine::with_loader(config, device, loader());
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_file_system_engine_reports_missing_files() {
    let (device, _mock) = MockGraphicsDevice::shared();
    let config = EngineConfig {
        asset_root: std::env::temp_dir().join("prism_engine_missing_assets"),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, device).unwrap();
    assert!(engine.load_shader_set("shaders/default.set.text").is_err());
    assert!(engine.resource_manager_mut().load_model("tri.model.text").is_err());
}

// ============================================================================
// FRAME
// ============================================================================

#[test]
fn test_frame_phases() {
    let (mut engine, device) = engine_with(EngineConfig::default());
    assert_eq!(engine.load_shader_set("shaders/default.set.text").unwrap(), 1);
    let tri = engine.resource_manager_mut().load_model("tri.model.text").unwrap();

    let specular: Arc<dyn crate::graphics_device::Texture> = Arc::new(MockTexture {
        name: "sky".to_string(),
        info: TextureInfo {
            width: 64,
            height: 64,
            depth: 1,
            format: TextureFormat::R16G16B16A16F,
            mip_levels: 7,
            cubemap: true,
        },
    });
    engine.light_manager_mut().standard_ibl_mut().set_specular(Some(specular));
    engine.light_manager_mut().add_light(Box::new(DirectionalLight::new("sun", Vec3::NEG_Y)));
    if let Some(gui) = engine.gui_manager_mut() {
        gui.set_root(Box::new(Panel::new("hud")));
    }

    let mut render_state = engine.new_render_state();
    engine.update().unwrap();
    let model = engine.resource_manager().model(tri).unwrap();
    engine.apply_light(&mut render_state, &model.meshes()[0]);
    assert_eq!(render_state.lights.len(), 1);
    assert_eq!(render_state.environment.as_ref().unwrap().specular.as_ref().unwrap().info().width, 64);

    engine.shader_manager().bind_shader("basic").unwrap();
    engine.shader_manager().apply_active_drivers(&render_state).unwrap();
    engine.draw(&render_state).unwrap();

    let commands = device.lock().unwrap().commands.clone();
    let position = |prefix: &str| commands.iter().position(|c| c.starts_with(prefix)).unwrap();
    assert!(position("generate_mipmaps sky") < position("bind_shader"));
    assert!(position("set_uniform") < position("draw_fullscreen ibl_background"));
}

#[test]
fn test_shutdown_releases_everything() {
    let (mut engine, _device) = engine_with(EngineConfig::default());
    engine.load_shader_set("shaders/default.set.text").unwrap();
    engine.resource_manager_mut().load_model("tri.model.text").unwrap();
    engine.light_manager_mut().add_light(Box::new(DirectionalLight::new("sun", Vec3::NEG_Y)));
    assert!(engine.allocator().lock().unwrap().live_blocks() > 0);

    engine.shutdown();
    assert!(engine.is_shut_down());
    assert_eq!(engine.allocator().lock().unwrap().live_blocks(), 0);
    assert_eq!(engine.shader_manager().state(), ManagerState::Terminated);
    assert_eq!(engine.light_manager().light_count(), 0);
    assert!(engine.gui_manager().is_none());

    // Idempotent
    engine.shutdown();
}

#[test]
fn test_drop_runs_shutdown() {
    let (mut engine, _device) = engine_with(EngineConfig::default());
    engine.resource_manager_mut().load_model("tri.model.text").unwrap();
    let pool = engine.allocator().clone();
    drop(engine);
    assert_eq!(pool.lock().unwrap().live_blocks(), 0);
}

// ============================================================================
// LOGGING
// ============================================================================

#[test]
#[serial]
fn test_set_logger_captures_engine_logs() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    Engine::log(LogSeverity::Info, "prism::test", "plain message".to_string());
    Engine::log_detailed(LogSeverity::Error, "prism::test", "detailed message".to_string(), "engine.rs", 7);

    let captured = entries.lock().unwrap().clone();
    assert!(captured.contains(&"Info prism::test: plain message".to_string()));
    assert!(captured.contains(&"Error prism::test: detailed message".to_string()));

    Engine::reset_logger();
    Engine::log(LogSeverity::Info, "prism::test", "after reset".to_string());
    assert!(!entries.lock().unwrap().iter().any(|e| e.contains("after reset")));
}

#[test]
#[serial]
fn test_construction_failure_is_logged() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    let (device, _mock) = MockGraphicsDevice::shared();
    let config = EngineConfig { shader_driver_priority: vec!["bogus".to_string()], ..EngineConfig::default() };
    assert!(Engine::with_loader(config, device, loader()).is_err());
    Engine::reset_logger();

    assert!(entries.lock().unwrap().iter().any(|e| e.starts_with("Error prism::Engine") && e.contains("bogus")));
}

#[test]
#[serial]
fn test_install_logger_replaces_custom_logger() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    let config = EngineConfig { install_logger: true, log_level: LogSeverity::Error, ..EngineConfig::default() };
    let (_engine, _device) = engine_with(config);
    Engine::log(LogSeverity::Warn, "prism::test", "filtered".to_string());
    Engine::reset_logger();

    assert!(!entries.lock().unwrap().iter().any(|e| e.contains("filtered")));
}
