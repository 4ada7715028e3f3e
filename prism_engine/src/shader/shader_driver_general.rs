/// Transform driver: world/view/projection matrices and eye position

use crate::config::GENERAL_DRIVER;
use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, UniformValue};
use crate::render_state::RenderState;
use crate::resource::Shader;
use crate::shader::shader_driver::{uniform_locations, StageLocation};
use crate::shader::{ShaderDriver, ShaderDriverPrototype, ShaderParameter, ShaderParameterParser};

pub const WORLD_VIEW_PROJECTION: &str = "WorldViewProjection";
pub const INVERSE_VIEW_MATRIX: &str = "InverseViewMatrix";
pub const WORLD_MATRIX: &str = "WorldMatrix";
pub const EYE_POSITION: &str = "EyePosition";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Semantic {
    WorldViewProjection,
    InverseView,
    World,
    EyePosition,
}

impl Semantic {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            WORLD_VIEW_PROJECTION => Some(Semantic::WorldViewProjection),
            INVERSE_VIEW_MATRIX => Some(Semantic::InverseView),
            WORLD_MATRIX => Some(Semantic::World),
            EYE_POSITION => Some(Semantic::EyePosition),
            _ => None,
        }
    }

    fn value(&self, state: &RenderState) -> UniformValue {
        match self {
            Semantic::WorldViewProjection => UniformValue::Mat4(state.world_view_projection()),
            Semantic::InverseView => UniformValue::Mat4(state.inverse_view()),
            Semantic::World => UniformValue::Mat4(state.world),
            Semantic::EyePosition => UniformValue::Vec3(state.eye_position),
        }
    }
}

pub struct ShaderDriverGeneral {
    bindings: Vec<(Semantic, StageLocation)>,
}

impl ShaderDriverGeneral {
    pub fn prototype() -> ShaderDriverPrototype {
        ShaderDriverPrototype::new(GENERAL_DRIVER, Self::claims, Self::instantiate)
    }

    /// Claims shaders declaring a transform or eye position parameter
    pub fn claims(parameters: &[ShaderParameter]) -> bool {
        ShaderParameterParser::has_parameter(parameters, WORLD_VIEW_PROJECTION)
            || ShaderParameterParser::has_parameter(parameters, EYE_POSITION)
    }

    pub fn instantiate(shader: &Shader, parameters: &[ShaderParameter]) -> Box<dyn ShaderDriver> {
        let mut bindings = Vec::new();
        for parameter in parameters {
            let Some(semantic) = Semantic::from_name(&parameter.name) else {
                continue;
            };
            for location in uniform_locations(shader, &parameter.variable) {
                bindings.push((semantic, location));
            }
        }
        Box::new(Self { bindings })
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}

impl ShaderDriver for ShaderDriverGeneral {
    fn name(&self) -> &str {
        GENERAL_DRIVER
    }

    fn apply(&self, shader: &Shader, render_state: &RenderState, device: &mut dyn GraphicsDevice) -> Result<()> {
        for (semantic, location) in &self.bindings {
            let module = shader.module(location.stage).ok_or_else(|| Error::InvalidResource(format!(
                "shader '{}' lost its {} stage", shader.name(), location.stage.name())))?;
            device.set_uniform(module.as_ref(), location.location, semantic.value(render_state))?;
        }
        Ok(())
    }
}
