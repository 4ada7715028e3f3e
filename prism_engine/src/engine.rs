/// Prism Engine - explicit context owning every resource manager
///
/// One `Engine` value replaces process-wide manager singletons: it builds the
/// pool allocator, the three resource factories and the shader, light and
/// GUI managers, and drives them through the frame loop. Logging is the only
/// global state (see `Engine::set_logger`).

use std::sync::{OnceLock, RwLock, Arc, Mutex};
use std::time::SystemTime;
use glam::Vec2;
use crate::config::EngineConfig;
use crate::error::{Result, Error};
use crate::graphics_device::SharedDevice;
use crate::gui::GuiManager;
use crate::light::LightManager;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::memory::{PoolAllocator, SharedAllocator};
use crate::render_state::RenderState;
use crate::resource::{
    check_type_codes, FileSystemLoader, Mesh, ModelFactory, ResourceFactory, ResourceLoader,
    ResourceManager, ShaderFactory, TextureFactory,
};
use crate::shader::{ShaderDriverManager, ShaderManager};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn default_logger() -> RwLock<Box<dyn Logger>> {
    RwLock::new(Box::new(DefaultLogger::default()))
}

/// Engine context
///
/// # Example
///
/// ```no_run
/// use prism_engine::prism::{Engine, EngineConfig};
/// use prism_engine::prism::graphics_device::SharedDevice;
///
/// # fn run(device: SharedDevice) -> prism_engine::prism::Result<()> {
/// let mut engine = Engine::new(EngineConfig::default(), device)?;
/// engine.load_shader_set("shaders/default.set.text")?;
/// let plane = engine.resource_manager_mut().load_model("plane.model.text")?;
///
/// let mut render_state = engine.new_render_state();
/// engine.update()?;
/// if let Some(model) = engine.resource_manager().model(plane) {
///     for mesh in model.meshes() {
///         engine.apply_light(&mut render_state, mesh);
///         engine.shader_manager().bind_shader("basic")?;
///         engine.shader_manager().apply_active_drivers(&render_state)?;
///     }
/// }
/// engine.draw(&render_state)?;
/// engine.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    config: EngineConfig,
    device: SharedDevice,
    allocator: Arc<Mutex<PoolAllocator>>,
    resource_manager: ResourceManager,
    shader_manager: ShaderManager,
    light_manager: LightManager,
    gui_manager: Option<GuiManager>,
    shut_down: bool,
}

impl Engine {
    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("prism::Engine", "Initialization failed: {}", msg);
            }
            _ => {
                crate::engine_error!("prism::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    /// Engine reading resources from `config.asset_root`, with the
    /// configured path tags
    pub fn new(config: EngineConfig, device: SharedDevice) -> Result<Self> {
        let mut loader = FileSystemLoader::new(config.asset_root.clone());
        for (tag, replacement) in &config.path_tags {
            loader.add_path_tag(tag, replacement);
        }
        Self::with_loader(config, device, Arc::new(loader))
    }

    /// Engine reading resources through a custom loader
    ///
    /// # Errors
    ///
    /// `InitializationFailed` for an unknown driver name in
    /// `shader_driver_priority` or two factories sharing a type code.
    pub fn with_loader(config: EngineConfig, device: SharedDevice, loader: Arc<dyn ResourceLoader>) -> Result<Self> {
        if config.install_logger {
            Self::set_logger(DefaultLogger::new(config.log_level));
        }

        let pool = match config.memory_budget {
            Some(budget) => PoolAllocator::with_budget(budget),
            None => PoolAllocator::new(),
        };
        let allocator = Arc::new(Mutex::new(pool));
        let shared: SharedAllocator = allocator.clone();

        let drivers = ShaderDriverManager::from_priority(&config.shader_driver_priority)
            .map_err(Self::log_and_return_error)?;

        let model_factory = ModelFactory::new(device.clone(), shared.clone());
        let texture_factory = TextureFactory::new(device.clone(), shared.clone());
        let shader_factory = ShaderFactory::new(device.clone(), shared, Arc::new(drivers));
        check_type_codes(&[
            model_factory.resource_type_code(),
            texture_factory.resource_type_code(),
            shader_factory.resource_type_code(),
        ]).map_err(Self::log_and_return_error)?;

        let resource_manager = ResourceManager::new(model_factory, texture_factory, loader)
            .map_err(Self::log_and_return_error)?;
        let mut shader_manager = ShaderManager::new(shader_factory);
        shader_manager.init().map_err(Self::log_and_return_error)?;

        let light_manager = LightManager::new(device.clone());
        let gui_manager = config.enable_gui.then(GuiManager::new);

        crate::engine_info!("prism::Engine", "Engine created (max lights {}, gui {}, budget {:?})",
            config.max_lights, config.enable_gui, config.memory_budget);

        Ok(Self {
            config,
            device,
            allocator,
            resource_manager,
            shader_manager,
            light_manager,
            gui_manager,
            shut_down: false,
        })
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    /// Pool every resource payload is allocated from
    pub fn allocator(&self) -> &Arc<Mutex<PoolAllocator>> {
        &self.allocator
    }

    pub fn resource_manager(&self) -> &ResourceManager {
        &self.resource_manager
    }

    pub fn resource_manager_mut(&mut self) -> &mut ResourceManager {
        &mut self.resource_manager
    }

    pub fn shader_manager(&self) -> &ShaderManager {
        &self.shader_manager
    }

    pub fn shader_manager_mut(&mut self) -> &mut ShaderManager {
        &mut self.shader_manager
    }

    pub fn light_manager(&self) -> &LightManager {
        &self.light_manager
    }

    pub fn light_manager_mut(&mut self) -> &mut LightManager {
        &mut self.light_manager
    }

    /// None when the engine was created with `enable_gui = false`
    pub fn gui_manager(&self) -> Option<&GuiManager> {
        self.gui_manager.as_ref()
    }

    pub fn gui_manager_mut(&mut self) -> Option<&mut GuiManager> {
        self.gui_manager.as_mut()
    }

    /// Render state sized for the configured light count
    pub fn new_render_state(&self) -> RenderState {
        RenderState::new(self.config.max_lights)
    }

    // ===== OPERATIONS =====

    /// Load a shader-set file through the engine's resource loader
    pub fn load_shader_set(&mut self, filename: &str) -> Result<usize> {
        let loader = self.resource_manager.loader().clone();
        self.shader_manager.load_shader_set(filename, loader.as_ref())
    }

    /// Update phase: lights, then GUI
    pub fn update(&mut self) -> Result<()> {
        self.light_manager.update()?;
        if let Some(gui) = &mut self.gui_manager {
            gui.update();
        }
        Ok(())
    }

    /// Fill `render_state` with the lights reaching `mesh`
    pub fn apply_light(&self, render_state: &mut RenderState, mesh: &Mesh) {
        self.light_manager.apply_light(render_state, mesh);
    }

    /// Draw phase: light background, light foreground, then GUI on top
    pub fn draw(&mut self, render_state: &RenderState) -> Result<()> {
        self.light_manager.draw_background(render_state)?;
        self.light_manager.draw_foreground(render_state)?;
        if let Some(gui) = &self.gui_manager {
            let mut device = self.device.lock()
                .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))?;
            gui.draw(&mut *device);
        }
        Ok(())
    }

    /// Forward a viewport size change to the GUI
    pub fn resize(&mut self, size: Vec2) {
        if let Some(gui) = &mut self.gui_manager {
            gui.resize(size);
        }
    }

    /// Release every shader, model and texture and drop lights and widgets
    ///
    /// Safe to call more than once; also run on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.shader_manager.term();
        self.resource_manager.release_all();
        self.light_manager.clear();
        self.gui_manager = None;

        if let Ok(pool) = self.allocator.lock() {
            if pool.live_blocks() > 0 {
                crate::engine_warn!("prism::Engine", "{} pool blocks ({} bytes) still live after shutdown",
                    pool.live_blocks(), pool.live_bytes());
            }
        }
        crate::engine_info!("prism::Engine", "Engine shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    // ===== LOGGING =====

    /// Set a custom logger
    ///
    /// Replaces the current logger (`DefaultLogger` by default).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use prism_engine::prism::Engine;
    /// use prism_engine::prism::log::{Logger, LogEntry};
    ///
    /// struct FileLogger;
    ///
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(default_logger);
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger, every severity)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(default_logger);
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(default_logger);
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(default_logger);
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
