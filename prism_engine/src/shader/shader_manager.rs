/// Shader manager: shader registry with stable ids and the active bind
///
/// Shader-set file layout (`FILETYPE SHADERSET`):
///
/// ```text
/// FILETYPE SHADERSET
/// SHADERS {
///     SHADER { NAME basic FILE basic.shader.text }
///     SHADER { NAME pbr FILE pbr.shader.binary FORMAT binary }
///     SHADER { NAME unlit VS unlit.vs PS unlit.ps }
/// }
/// ```
///
/// Paths are relative to the set file.

use std::cell::Cell;
use std::ptr;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::render_state::RenderState;
use crate::resource::loader::resolve_relative;
use crate::resource::text_parser::{TextDocument, TextNode};
use crate::resource::{ResourceFactory, ResourceLoader, ResourcePath, Shader, ShaderFactory, ShaderId};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Initialized,
    Terminated,
}

/// Any way of naming a registered shader
///
/// Every variant resolves to the same registry entry before binding.
#[derive(Clone, Copy)]
pub enum ShaderRef<'a> {
    Id(ShaderId),
    Name(&'a str),
    Shader(&'a Shader),
}

impl From<ShaderId> for ShaderRef<'_> {
    fn from(id: ShaderId) -> Self {
        ShaderRef::Id(id)
    }
}

impl<'a> From<&'a str> for ShaderRef<'a> {
    fn from(name: &'a str) -> Self {
        ShaderRef::Name(name)
    }
}

impl<'a> From<&'a String> for ShaderRef<'a> {
    fn from(name: &'a String) -> Self {
        ShaderRef::Name(name.as_str())
    }
}

impl<'a> From<&'a Shader> for ShaderRef<'a> {
    fn from(shader: &'a Shader) -> Self {
        ShaderRef::Shader(shader)
    }
}

pub struct ShaderManager {
    state: ManagerState,
    factory: ShaderFactory,
    shaders: FxHashMap<ShaderId, Shader>,
    names: FxHashMap<String, ShaderId>,
    next_id: u32,
    active: Cell<Option<ShaderId>>,
}

impl ShaderManager {
    pub fn new(factory: ShaderFactory) -> Self {
        Self {
            state: ManagerState::Uninitialized,
            factory,
            shaders: FxHashMap::default(),
            names: FxHashMap::default(),
            next_id: 1,
            active: Cell::new(None),
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn factory(&self) -> &ShaderFactory {
        &self.factory
    }

    pub fn init(&mut self) -> Result<()> {
        match self.state {
            ManagerState::Uninitialized => {
                self.state = ManagerState::Initialized;
                engine_info!("prism::ShaderManager", "Initialized (drivers: {:?})",
                    self.factory.drivers().driver_names());
                Ok(())
            }
            ManagerState::Initialized => {
                engine_warn!("prism::ShaderManager", "init called twice");
                Ok(())
            }
            ManagerState::Terminated => {
                Err(Error::InvalidState("ShaderManager cannot be re-initialized after term".to_string()))
            }
        }
    }

    /// Release every shader through the factory and clear the registry
    pub fn term(&mut self) {
        if self.state != ManagerState::Initialized {
            return;
        }
        let count = self.shaders.len();
        self.names.clear();
        self.active.set(None);
        for (_, shader) in self.shaders.drain() {
            self.factory.release(shader);
        }
        self.state = ManagerState::Terminated;
        engine_info!("prism::ShaderManager", "Terminated, released {} shaders", count);
    }

    fn ensure_initialized(&self, operation: &str) -> Result<()> {
        debug_assert!(self.state == ManagerState::Initialized,
            "ShaderManager::{} called while {:?}", operation, self.state);
        if self.state != ManagerState::Initialized {
            engine_error!("prism::ShaderManager", "{} called while {:?}", operation, self.state);
            return Err(Error::InvalidState(format!("ShaderManager is {:?}", self.state)));
        }
        Ok(())
    }

    // ===== REGISTRATION =====

    /// Register a shader under its name and assign it the next id
    ///
    /// A rejected shader is released through the factory; the registry is
    /// left unchanged. A shader built by another factory cannot be released
    /// here and is dropped, its pool blocks never returning to their allocator.
    pub fn add_shader(&mut self, mut shader: Shader) -> Result<ShaderId> {
        if shader.origin != self.factory.id() {
            engine_error!("prism::ShaderManager",
                "Shader '{}' was created by another factory, dropping it", shader.name());
            return Err(Error::InvalidResource(format!(
                "shader '{}' belongs to another factory", shader.name())));
        }
        if let Err(err) = self.ensure_initialized("add_shader") {
            self.factory.release(shader);
            return Err(err);
        }
        if shader.name().is_empty() {
            self.factory.release(shader);
            return Err(Error::InvalidResource("shader has no name".to_string()));
        }
        if self.names.contains_key(shader.name()) {
            engine_warn!("prism::ShaderManager", "Shader '{}' is already registered", shader.name());
            let err = Error::NameCollision(shader.name().to_string());
            self.factory.release(shader);
            return Err(err);
        }

        let id = ShaderId(self.next_id);
        self.next_id += 1;
        shader.id = Some(id);
        engine_debug!("prism::ShaderManager", "Registered shader '{}' as {}", shader.name(), id);
        self.names.insert(shader.name().to_string(), id);
        self.shaders.insert(id, shader);
        Ok(id)
    }

    /// Load every entry of a shader-set file; returns how many were registered
    ///
    /// Entries that fail to load or collide are logged and skipped.
    pub fn load_shader_set(&mut self, filename: &str, loader: &dyn ResourceLoader) -> Result<usize> {
        self.ensure_initialized("load_shader_set")?;
        let data = loader.read(filename)?;
        let doc = TextDocument::from_bytes(&data)?;
        doc.expect_file_type("SHADERSET")?;
        let entries = doc.node("SHADERS")
            .ok_or_else(|| Error::InvalidResource(format!("'{}' has no SHADERS block", filename)))?;

        let mut added = 0;
        for entry in entries.children_named("SHADER") {
            match self.load_set_entry(filename, entry, loader) {
                Ok(_) => added += 1,
                Err(err) => engine_warn!("prism::ShaderManager", "Skipping entry of '{}': {}", filename, err),
            }
        }
        engine_info!("prism::ShaderManager", "Loaded {} shaders from '{}'", added, filename);
        Ok(added)
    }

    fn load_set_entry(&mut self, filename: &str, entry: &TextNode, loader: &dyn ResourceLoader) -> Result<ShaderId> {
        let field = |key: &str| entry.child(key).and_then(|n| n.as_str());
        let name = field("NAME")
            .ok_or_else(|| Error::InvalidResource("SHADER entry without NAME".to_string()))?;

        let shader = match (field("FILE"), field("VS"), field("PS")) {
            (Some(file), _, _) => {
                let path = resolve_relative(filename, file);
                let format = match field("FORMAT") {
                    Some(format) => format.to_string(),
                    None => ResourcePath::parse(&path)?.format,
                };
                let data = loader.read(&path)?;
                self.factory.create(&format, &data)
            }
            (None, Some(vs), Some(ps)) => {
                let vertex = loader.read(&resolve_relative(filename, vs))?;
                let pixel = loader.read(&resolve_relative(filename, ps))?;
                self.factory.create_from_source(
                    name,
                    &String::from_utf8_lossy(&vertex),
                    &String::from_utf8_lossy(&pixel),
                )
            }
            _ => return Err(Error::InvalidResource(format!("shader '{}' names no FILE or VS/PS pair", name))),
        };

        let mut shader = shader.ok_or_else(|| Error::InvalidResource(format!("failed to create shader '{}'", name)))?;
        shader.set_name(name);
        self.add_shader(shader)
    }

    /// Remove a shader and release it; clears the active bind if it was active
    pub fn unload_shader(&mut self, name: &str) -> Result<()> {
        self.ensure_initialized("unload_shader")?;
        let id = self.names.remove(name)
            .ok_or_else(|| Error::NotFound(format!("shader '{}'", name)))?;
        if self.active.get() == Some(id) {
            self.active.set(None);
        }
        if let Some(shader) = self.shaders.remove(&id) {
            self.factory.release(shader);
        }
        Ok(())
    }

    // ===== LOOKUP =====

    pub fn shader_id(&self, name: &str) -> Option<ShaderId> {
        self.names.get(name).copied()
    }

    pub fn shader(&self, name: &str) -> Option<&Shader> {
        self.shader_id(name).and_then(|id| self.shaders.get(&id))
    }

    pub fn shader_by_id(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(&id)
    }

    /// Registered names, sorted
    pub fn shader_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    fn resolve(&self, shader: ShaderRef<'_>) -> Option<ShaderId> {
        match shader {
            ShaderRef::Id(id) => self.shaders.contains_key(&id).then_some(id),
            ShaderRef::Name(name) => self.shader_id(name),
            ShaderRef::Shader(shader) => {
                let id = shader.id()?;
                let registered = self.shaders.get(&id)?;
                ptr::eq(registered, shader).then_some(id)
            }
        }
    }

    // ===== ACTIVE BIND =====

    /// Bind a shader by id, name or reference
    ///
    /// A miss is an error and keeps the previous shader active.
    pub fn bind_shader<'a>(&self, shader: impl Into<ShaderRef<'a>>) -> Result<ShaderId> {
        self.ensure_initialized("bind_shader")?;
        let shader = shader.into();
        let Some(id) = self.resolve(shader) else {
            let description = match shader {
                ShaderRef::Id(id) => id.to_string(),
                ShaderRef::Name(name) => format!("'{}'", name),
                ShaderRef::Shader(shader) => format!("unregistered '{}'", shader.name()),
            };
            engine_warn!("prism::ShaderManager", "Cannot bind shader {}", description);
            return Err(Error::NotFound(format!("shader {}", description)));
        };
        self.set_active(id)?;
        Ok(id)
    }

    fn set_active(&self, id: ShaderId) -> Result<()> {
        let shader = self.shaders.get(&id)
            .ok_or_else(|| Error::NotFound(format!("shader {}", id)))?;
        self.factory.device()
            .lock()
            .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))?
            .bind_shader(&shader.modules())?;
        self.active.set(Some(id));
        Ok(())
    }

    pub fn active_shader_id(&self) -> Option<ShaderId> {
        self.active.get()
    }

    pub fn active_shader(&self) -> Option<&Shader> {
        self.active.get().and_then(|id| self.shaders.get(&id))
    }

    /// Run the active shader's driver against `render_state`
    ///
    /// Without an active shader this is a no-op.
    pub fn apply_active_drivers(&self, render_state: &RenderState) -> Result<()> {
        let Some(shader) = self.active_shader() else {
            return Ok(());
        };
        let mut device = self.factory.device()
            .lock()
            .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))?;
        shader.apply_drivers(render_state, &mut *device)
    }
}

impl Drop for ShaderManager {
    fn drop(&mut self) {
        self.term();
    }
}

#[cfg(test)]
#[path = "shader_manager_tests.rs"]
mod tests;
