/// Shader driver trait and driver prototypes

use crate::error::Result;
use crate::graphics_device::{self, GraphicsDevice, ShaderStage};
use crate::render_state::RenderState;
use crate::resource::Shader;
use crate::shader::ShaderParameter;

/// Parameter-binding behaviour attached to a shader
///
/// A driver resolves its uniform and sampler locations once, when it is
/// instantiated for a shader, and writes render state into them per draw.
pub trait ShaderDriver: Send {
    fn name(&self) -> &str;

    fn apply(&self, shader: &Shader, render_state: &RenderState, device: &mut dyn GraphicsDevice) -> Result<()>;
}

/// Predicate deciding whether a driver handles a shader's parameters
pub type ClaimFn = fn(&[ShaderParameter]) -> bool;

/// Builds a driver for a shader it claimed
pub type InstantiateFn = fn(&Shader, &[ShaderParameter]) -> Box<dyn ShaderDriver>;

/// Registered driver kind: name, claim predicate and constructor
#[derive(Clone)]
pub struct ShaderDriverPrototype {
    pub name: String,
    pub claims: ClaimFn,
    pub instantiate: InstantiateFn,
}

impl ShaderDriverPrototype {
    pub fn new(name: &str, claims: ClaimFn, instantiate: InstantiateFn) -> Self {
        Self { name: name.to_string(), claims, instantiate }
    }
}

/// Location of a variable inside one stage module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLocation {
    pub stage: ShaderStage,
    pub location: u32,
}

/// Every stage declaring `variable` as a uniform
pub fn uniform_locations(shader: &Shader, variable: &str) -> Vec<StageLocation> {
    locate(shader, |module| module.uniform_location(variable))
}

/// Every stage declaring `variable` as a sampler
pub fn texture_locations(shader: &Shader, variable: &str) -> Vec<StageLocation> {
    locate(shader, |module| module.texture_location(variable))
}

fn locate(
    shader: &Shader,
    lookup: impl Fn(&dyn graphics_device::Shader) -> Option<u32>,
) -> Vec<StageLocation> {
    shader.stages
        .iter()
        .filter_map(|s| {
            lookup(s.module.as_ref()).map(|location| StageLocation { stage: s.stage, location })
        })
        .collect()
}
