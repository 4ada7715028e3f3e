/// Standard image-based light

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, Texture};
use crate::render_state::{Environment, RenderState};
use crate::engine_debug;

/// Label of the full-screen pass drawing the environment behind the scene
pub const IBL_BACKGROUND_PASS: &str = "ibl_background";

/// Image-based light: prefiltered specular cube, diffuse irradiance cube
/// and BRDF lookup table
///
/// The specular map's mip chain is generated on the first `update` after it
/// is set. Without a specular map the background pass is skipped.
pub struct LightIbl {
    name: String,
    specular: Option<Arc<dyn Texture>>,
    diffuse: Option<Arc<dyn Texture>>,
    brdf_lut: Option<Arc<dyn Texture>>,
    pub intensity: f32,
    mips_generated: bool,
}

impl LightIbl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            specular: None,
            diffuse: None,
            brdf_lut: None,
            intensity: 1.0,
            mips_generated: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_specular(&mut self, texture: Option<Arc<dyn Texture>>) {
        self.specular = texture;
        self.mips_generated = false;
    }

    pub fn set_diffuse(&mut self, texture: Option<Arc<dyn Texture>>) {
        self.diffuse = texture;
    }

    pub fn set_brdf_lut(&mut self, texture: Option<Arc<dyn Texture>>) {
        self.brdf_lut = texture;
    }

    pub fn specular(&self) -> Option<&Arc<dyn Texture>> {
        self.specular.as_ref()
    }

    pub fn diffuse(&self) -> Option<&Arc<dyn Texture>> {
        self.diffuse.as_ref()
    }

    pub fn brdf_lut(&self) -> Option<&Arc<dyn Texture>> {
        self.brdf_lut.as_ref()
    }

    pub fn mips_generated(&self) -> bool {
        self.mips_generated
    }

    /// True when at least one map is set
    pub fn is_active(&self) -> bool {
        self.specular.is_some() || self.diffuse.is_some() || self.brdf_lut.is_some()
    }

    pub fn update(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.mips_generated {
            return Ok(());
        }
        if let Some(specular) = &self.specular {
            device.generate_mipmaps(specular.as_ref())?;
            engine_debug!("prism::LightIbl", "Generated mipmaps for '{}'", specular.name());
            self.mips_generated = true;
        }
        Ok(())
    }

    pub fn draw_background(&self, _render_state: &RenderState, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.specular.is_none() {
            return Ok(());
        }
        device.draw_fullscreen(IBL_BACKGROUND_PASS)
    }

    /// Contribution written into render states, None while no map is set
    pub fn environment(&self) -> Option<Environment> {
        if !self.is_active() {
            return None;
        }
        Some(Environment {
            specular: self.specular.clone(),
            diffuse: self.diffuse.clone(),
            brdf_lut: self.brdf_lut.clone(),
            intensity: self.intensity,
        })
    }
}
