/// Shader resource: per-stage code and modules plus the bound parameter driver

use std::fmt;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{self, GraphicsDevice, ShaderStage, ShaderStages};
use crate::memory::PoolBlock;
use crate::render_state::RenderState;
use crate::resource::factory::FactoryId;
use crate::resource::header::{BinaryWriter, ResourceHeader};
use crate::resource::ResourceTypeCode;
use crate::shader::ShaderDriver;

/// Stable shader identifier assigned by the shader manager
///
/// Ids are handed out monotonically and never reused while the manager lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub(crate) u32);

impl ShaderId {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One compiled stage
pub struct ShaderStageCode {
    pub(crate) stage: ShaderStage,
    pub(crate) code: PoolBlock,
    pub(crate) module: Arc<dyn graphics_device::Shader>,
}

impl ShaderStageCode {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Source or bytecode the module was created from
    pub fn code(&self) -> &[u8] {
        self.code.as_slice()
    }

    pub fn module(&self) -> &Arc<dyn graphics_device::Shader> {
        &self.module
    }
}

/// Shader resource
///
/// Created by `ShaderFactory`, owned by the `ShaderManager` once added,
/// destroyed by `ShaderFactory::release`.
pub struct Shader {
    pub(crate) origin: FactoryId,
    pub(crate) name: String,
    pub(crate) id: Option<ShaderId>,
    pub(crate) stages: Vec<ShaderStageCode>,
    /// Text scanned for parameter annotations
    pub(crate) driver_code: String,
    pub(crate) driver: Option<Box<dyn ShaderDriver>>,
}

impl Shader {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id assigned by the shader manager, None while unregistered
    pub fn id(&self) -> Option<ShaderId> {
        self.id
    }

    pub fn stages(&self) -> ShaderStages {
        self.stages
            .iter()
            .fold(ShaderStages::empty(), |set, s| set | s.stage.as_flag())
    }

    pub fn stage(&self, stage: ShaderStage) -> Option<&ShaderStageCode> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Module of one stage
    pub fn module(&self, stage: ShaderStage) -> Option<&Arc<dyn graphics_device::Shader>> {
        self.stage(stage).map(|s| &s.module)
    }

    /// Every module, in stage order, as bound by `GraphicsDevice::bind_shader`
    pub fn modules(&self) -> Vec<Arc<dyn graphics_device::Shader>> {
        self.stages.iter().map(|s| s.module.clone()).collect()
    }

    pub fn driver_code(&self) -> &str {
        &self.driver_code
    }

    /// Name of the bound driver
    pub fn driver_name(&self) -> Option<&str> {
        self.driver.as_ref().map(|d| d.name())
    }

    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Push render state through the bound driver; no-op without one
    pub fn apply_drivers(&self, render_state: &RenderState, device: &mut dyn GraphicsDevice) -> Result<()> {
        match &self.driver {
            Some(driver) => driver.apply(self, render_state, device),
            None => Ok(()),
        }
    }

    pub(crate) fn set_driver(&mut self, driver: Box<dyn ShaderDriver>) {
        self.driver = Some(driver);
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Bake into the binary layout accepted by `ShaderFactory` ("binary")
    ///
    /// Payload: name, stage count, per stage its code and byte blob, then
    /// the annotation text used for driver selection.
    pub fn encode_binary(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_string(&self.name);
        writer.write_u32(self.stages.len() as u32);
        for stage in &self.stages {
            writer.write_u32(stage.stage.code());
            writer.write_blob(stage.code.as_slice());
        }
        writer.write_string(&self.driver_code);
        ResourceHeader::encode(ResourceTypeCode::SHADER, 0, &writer.into_bytes())
    }
}
