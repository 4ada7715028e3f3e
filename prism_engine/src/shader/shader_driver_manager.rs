/// Shader driver manager: ordered driver selection for new shaders

use crate::config::{GENERAL_DRIVER, LIGHT_DRIVER};
use crate::error::{Error, Result};
use crate::resource::Shader;
use crate::shader::{
    ShaderDriverGeneral, ShaderDriverLight, ShaderDriverPrototype, ShaderParameterParser,
};
use crate::{engine_debug, engine_trace};

/// Driver prototypes in priority order
///
/// `setup_shader_driver` binds the first prototype whose predicate claims
/// the shader's parameters, so a shader matching several drivers always
/// gets the earliest one.
pub struct ShaderDriverManager {
    prototypes: Vec<ShaderDriverPrototype>,
}

impl ShaderDriverManager {
    /// Manager without any driver
    pub fn new() -> Self {
        Self { prototypes: Vec::new() }
    }

    /// Built-in drivers, `general` before `light`
    pub fn with_default_drivers() -> Self {
        Self {
            prototypes: vec![ShaderDriverGeneral::prototype(), ShaderDriverLight::prototype()],
        }
    }

    /// Built-in prototype by name
    pub fn builtin(name: &str) -> Option<ShaderDriverPrototype> {
        match name {
            GENERAL_DRIVER => Some(ShaderDriverGeneral::prototype()),
            LIGHT_DRIVER => Some(ShaderDriverLight::prototype()),
            _ => None,
        }
    }

    /// Built-in drivers in the given order
    pub fn from_priority(names: &[String]) -> Result<Self> {
        let mut manager = Self::new();
        for name in names {
            let prototype = Self::builtin(name)
                .ok_or_else(|| Error::InitializationFailed(format!("unknown shader driver '{}'", name)))?;
            manager.register(prototype)?;
        }
        Ok(manager)
    }

    /// Append a prototype at the lowest priority
    pub fn register(&mut self, prototype: ShaderDriverPrototype) -> Result<()> {
        if self.prototypes.iter().any(|p| p.name == prototype.name) {
            return Err(Error::NameCollision(prototype.name));
        }
        self.prototypes.push(prototype);
        Ok(())
    }

    /// Registered driver names, in priority order
    pub fn driver_names(&self) -> Vec<&str> {
        self.prototypes.iter().map(|p| p.name.as_str()).collect()
    }

    /// Bind the first driver claiming the parameters annotated in `code`
    ///
    /// Returns the bound driver's name. No match leaves the shader without
    /// a driver, which is legal.
    pub fn setup_shader_driver(&self, shader: &mut Shader, code: &str) -> Option<String> {
        let parameters = ShaderParameterParser::parse(code);
        if parameters.is_empty() {
            engine_trace!("prism::ShaderDriverManager", "Shader '{}' declares no parameters", shader.name());
            return None;
        }

        let prototype = self.prototypes.iter().find(|p| (p.claims)(&parameters))?;
        let driver = (prototype.instantiate)(shader, &parameters);
        shader.set_driver(driver);
        engine_debug!("prism::ShaderDriverManager",
            "Bound driver '{}' to shader '{}'", prototype.name, shader.name());
        Some(prototype.name.clone())
    }
}

impl Default for ShaderDriverManager {
    fn default() -> Self {
        Self::with_default_drivers()
    }
}

#[cfg(test)]
#[path = "shader_driver_manager_tests.rs"]
mod tests;
