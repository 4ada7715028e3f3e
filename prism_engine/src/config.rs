/// Engine configuration

use std::path::PathBuf;
use crate::log::LogSeverity;

/// Name of the built-in driver that binds transform uniforms
pub const GENERAL_DRIVER: &str = "general";

/// Name of the built-in driver that binds image-based lighting textures
pub const LIGHT_DRIVER: &str = "light";

/// Engine configuration
///
/// Passed once to `Engine::new`; every manager reads the fields it needs
/// at construction time.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory every relative resource path is resolved against
    pub asset_root: PathBuf,
    /// `<tag>` substitutions applied to resource paths (tag name, replacement)
    pub path_tags: Vec<(String, String)>,
    /// Maximum live bytes in the pool allocator (None = unbounded)
    pub memory_budget: Option<usize>,
    /// Shader driver names, tried in this order when binding a driver to a shader
    pub shader_driver_priority: Vec<String>,
    /// Maximum number of explicit lights written into a render state
    pub max_lights: usize,
    /// Create the GUI manager
    pub enable_gui: bool,
    /// Minimum severity printed by the default console logger
    pub log_level: LogSeverity,
    /// Install a `DefaultLogger` filtered at `log_level` when the engine is created
    pub install_logger: bool,
}

impl EngineConfig {
    /// Replacement registered for a path tag, if any
    pub fn path_tag(&self, tag: &str) -> Option<&str> {
        self.path_tags
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, value)| value.as_str())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            path_tags: Vec::new(),
            memory_budget: None,
            shader_driver_priority: vec![GENERAL_DRIVER.to_string(), LIGHT_DRIVER.to_string()],
            max_lights: 8,
            enable_gui: true,
            log_level: if cfg!(debug_assertions) { LogSeverity::Debug } else { LogSeverity::Info },
            install_logger: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
