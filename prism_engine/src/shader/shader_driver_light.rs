/// Image-based lighting driver: BRDF lookup table, specular and diffuse maps

use std::sync::Arc;
use crate::config::LIGHT_DRIVER;
use crate::error::{Error, Result};
use glam::Vec2;
use crate::graphics_device::{GraphicsDevice, Texture, UniformValue};
use crate::render_state::{Environment, RenderState};
use crate::resource::Shader;
use crate::shader::shader_driver::{texture_locations, uniform_locations, StageLocation};
use crate::shader::{ShaderDriver, ShaderDriverPrototype, ShaderParameter, ShaderParameterParser};
use crate::engine_trace;

pub const BRDF_LUT: &str = "BRDFLUT";
pub const IBL_SPECULAR_TEXTURE: &str = "IBLSpecularTexture";
pub const IBL_DIFFUSE_TEXTURE: &str = "IBLDiffuseTexture";
pub const IBL_TEXTURE_SIZE: &str = "IBLTextureSize";

/// Prefix tried when a texture variable has no location of its own
const SAMPLER_PREFIX: &str = "sampler";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IblTexture {
    BrdfLut,
    Specular,
    Diffuse,
}

impl IblTexture {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            BRDF_LUT => Some(IblTexture::BrdfLut),
            IBL_SPECULAR_TEXTURE => Some(IblTexture::Specular),
            IBL_DIFFUSE_TEXTURE => Some(IblTexture::Diffuse),
            _ => None,
        }
    }

    fn pick<'a>(&self, environment: &'a Environment) -> Option<&'a Arc<dyn Texture>> {
        match self {
            IblTexture::BrdfLut => environment.brdf_lut.as_ref(),
            IblTexture::Specular => environment.specular.as_ref(),
            IblTexture::Diffuse => environment.diffuse.as_ref(),
        }
    }
}

pub struct ShaderDriverLight {
    textures: Vec<(IblTexture, StageLocation)>,
    texture_size: Vec<StageLocation>,
}

impl ShaderDriverLight {
    pub fn prototype() -> ShaderDriverPrototype {
        ShaderDriverPrototype::new(LIGHT_DRIVER, Self::claims, Self::instantiate)
    }

    /// Claims shaders sampling the diffuse irradiance map
    pub fn claims(parameters: &[ShaderParameter]) -> bool {
        ShaderParameterParser::has_parameter(parameters, IBL_DIFFUSE_TEXTURE)
    }

    pub fn instantiate(shader: &Shader, parameters: &[ShaderParameter]) -> Box<dyn ShaderDriver> {
        let mut textures = Vec::new();
        let mut texture_size = Vec::new();
        for parameter in parameters {
            if let Some(kind) = IblTexture::from_name(&parameter.name) {
                let mut locations = texture_locations(shader, &parameter.variable);
                if locations.is_empty() {
                    let fallback = format!("{}{}", SAMPLER_PREFIX, parameter.variable);
                    locations = texture_locations(shader, &fallback);
                }
                textures.extend(locations.into_iter().map(|location| (kind, location)));
            } else if parameter.name == IBL_TEXTURE_SIZE {
                texture_size.extend(uniform_locations(shader, &parameter.variable));
            }
        }
        Box::new(Self { textures, texture_size })
    }
}

impl ShaderDriver for ShaderDriverLight {
    fn name(&self) -> &str {
        LIGHT_DRIVER
    }

    fn apply(&self, shader: &Shader, render_state: &RenderState, device: &mut dyn GraphicsDevice) -> Result<()> {
        let Some(environment) = &render_state.environment else {
            engine_trace!("prism::ShaderDriverLight", "No environment for shader '{}'", shader.name());
            return Ok(());
        };

        for (kind, location) in &self.textures {
            let Some(texture) = kind.pick(environment) else {
                continue;
            };
            let module = shader.module(location.stage).ok_or_else(|| Error::InvalidResource(format!(
                "shader '{}' lost its {} stage", shader.name(), location.stage.name())))?;
            device.bind_texture(module.as_ref(), location.location, texture.as_ref())?;
        }

        // (width, height) of the specular map, left untouched without one
        let Some(specular) = &environment.specular else {
            return Ok(());
        };
        let info = specular.info();
        let size = Vec2::new(info.width as f32, info.height as f32);
        for location in &self.texture_size {
            if let Some(module) = shader.module(location.stage) {
                device.set_uniform(module.as_ref(), location.location, UniformValue::Vec2(size))?;
            }
        }
        Ok(())
    }
}
