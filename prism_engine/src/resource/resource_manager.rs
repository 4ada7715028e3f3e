/// Resource manager for models and textures
///
/// Loads resources by path through a `ResourceLoader`, decodes them with the
/// matching factory and hands out slotmap handles. Loading a path that is
/// already live returns the same handle and bumps its use count, so one
/// logical resource is never decoded twice.

use std::sync::Arc;
use slotmap::new_key_type;
use crate::error::{Error, Result};
use crate::graphics_device::TextureFormat;
use crate::resource::loader::{ResourceLoader, ResourcePath};
use crate::resource::resource_table::ResourceTable;
use crate::resource::{
    Model, ModelFactory, ResourceFactory, ResourceTypeCode, Texture, TextureFactory,
};
use crate::{engine_debug, engine_info, engine_warn};

/// Path kind routed to the model factory
pub const MODEL_KIND: &str = "model";
/// Path kind routed to the texture factory
pub const TEXTURE_KIND: &str = "texture";
/// Path kind of shader files
pub const SHADER_KIND: &str = "shader";

new_key_type! {
    /// Handle to a loaded model
    pub struct ModelKey;
    /// Handle to a loaded or created texture
    pub struct TextureKey;
}

/// Fail if two factories report the same type code
pub fn check_type_codes(codes: &[ResourceTypeCode]) -> Result<()> {
    for (i, code) in codes.iter().enumerate() {
        if codes[..i].contains(code) {
            return Err(Error::InitializationFailed(format!(
                "resource type code '{}' is registered twice", code)));
        }
    }
    Ok(())
}

pub struct ResourceManager {
    model_factory: ModelFactory,
    texture_factory: TextureFactory,
    loader: Arc<dyn ResourceLoader>,
    models: ResourceTable<ModelKey, Model>,
    textures: ResourceTable<TextureKey, Texture>,
}

impl ResourceManager {
    pub fn new(
        model_factory: ModelFactory,
        texture_factory: TextureFactory,
        loader: Arc<dyn ResourceLoader>,
    ) -> Result<Self> {
        check_type_codes(&[model_factory.resource_type_code(), texture_factory.resource_type_code()])?;
        Ok(Self {
            model_factory,
            texture_factory,
            loader,
            models: ResourceTable::new(),
            textures: ResourceTable::new(),
        })
    }

    pub fn loader(&self) -> &Arc<dyn ResourceLoader> {
        &self.loader
    }

    pub fn model_factory(&self) -> &ModelFactory {
        &self.model_factory
    }

    pub fn texture_factory(&self) -> &TextureFactory {
        &self.texture_factory
    }

    // ===== MODELS =====

    /// Load `name.model.format`, reusing the live model for a known path
    pub fn load_model(&mut self, path: &str) -> Result<ModelKey> {
        if let Some(key) = self.models.acquire(path) {
            engine_debug!("prism::ResourceManager", "Reusing model '{}'", path);
            return Ok(key);
        }

        let parsed = ResourcePath::parse(path)?;
        parsed.expect_kind(MODEL_KIND)?;
        let data = self.loader.read(path)?;
        let model = self.model_factory.create(&parsed.format, &data)
            .ok_or_else(|| Error::InvalidResource(format!("failed to decode model '{}'", path)))?;

        engine_info!("prism::ResourceManager", "Loaded model '{}' ({} meshes)", path, model.mesh_count());
        Ok(self.models.insert(Some(path.to_string()), model))
    }

    pub fn model(&self, key: ModelKey) -> Option<&Model> {
        self.models.get(key)
    }

    pub fn model_use_count(&self, key: ModelKey) -> Option<u32> {
        self.models.use_count(key)
    }

    /// Drop one use; the factory releases the model with the last one
    pub fn release_model(&mut self, key: ModelKey) -> Result<()> {
        match self.models.release(key) {
            Some(Some(model)) => {
                self.model_factory.release(model);
                Ok(())
            }
            Some(None) => Ok(()),
            None => {
                engine_warn!("prism::ResourceManager", "Release of unknown model handle {:?}", key);
                Err(Error::NotFound(format!("model handle {:?}", key)))
            }
        }
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    // ===== TEXTURES =====

    /// Load `name.texture.format`, reusing the live texture for a known path
    pub fn load_texture(&mut self, path: &str) -> Result<TextureKey> {
        if let Some(key) = self.textures.acquire(path) {
            engine_debug!("prism::ResourceManager", "Reusing texture '{}'", path);
            return Ok(key);
        }

        let parsed = ResourcePath::parse(path)?;
        parsed.expect_kind(TEXTURE_KIND)?;
        let data = self.loader.read(path)?;
        let texture = self.texture_factory.create(&parsed.format, &data)
            .ok_or_else(|| Error::InvalidResource(format!("failed to decode texture '{}'", path)))?;

        engine_info!("prism::ResourceManager", "Loaded texture '{}' {}x{}", path, texture.width(), texture.height());
        Ok(self.textures.insert(Some(path.to_string()), texture))
    }

    /// Zero-filled texture not backed by a file
    pub fn create_empty_texture(&mut self, name: &str, width: u32, height: u32, format: TextureFormat) -> Result<TextureKey> {
        let texture = self.texture_factory.create_empty(name, width, height, format)
            .ok_or_else(|| Error::InvalidResource(format!("failed to create empty texture '{}'", name)))?;
        Ok(self.textures.insert(None, texture))
    }

    pub fn texture(&self, key: TextureKey) -> Option<&Texture> {
        self.textures.get(key)
    }

    pub fn texture_use_count(&self, key: TextureKey) -> Option<u32> {
        self.textures.use_count(key)
    }

    /// Path a texture was loaded from (None for created textures)
    pub fn texture_path(&self, key: TextureKey) -> Option<&str> {
        self.textures.path(key)
    }

    pub fn release_texture(&mut self, key: TextureKey) -> Result<()> {
        match self.textures.release(key) {
            Some(Some(texture)) => {
                self.texture_factory.release(texture);
                Ok(())
            }
            Some(None) => Ok(()),
            None => {
                engine_warn!("prism::ResourceManager", "Release of unknown texture handle {:?}", key);
                Err(Error::NotFound(format!("texture handle {:?}", key)))
            }
        }
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Release every model and texture regardless of use counts
    pub fn release_all(&mut self) {
        let models = self.models.drain();
        let textures = self.textures.drain();
        if !models.is_empty() || !textures.is_empty() {
            engine_debug!("prism::ResourceManager",
                "Releasing {} models and {} textures", models.len(), textures.len());
        }
        for model in models {
            self.model_factory.release(model);
        }
        for texture in textures {
            self.texture_factory.release(texture);
        }
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
