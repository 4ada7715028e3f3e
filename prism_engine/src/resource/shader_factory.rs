/// Shader factory: text and binary shader decoding plus driver setup
///
/// Text layout, one section per stage:
///
/// ```text
/// @shader basic
/// @vertex
/// // SHADER_PARAMETER [name=WorldViewProjection]
/// uniform mat4 u_wvp;
/// void main() { ... }
/// @pixel
/// void main() { ... }
/// ```
///
/// The binary layout is the one written by `Shader::encode_binary`.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{ShaderDesc, ShaderStage, SharedDevice};
use crate::memory::{release_block, store_bytes, SharedAllocator};
use crate::resource::factory::{DecodeFn, DecoderTable, FactoryId, BINARY_FORMAT, TEXT_FORMAT};
use crate::resource::header::{BinaryReader, ResourceHeader};
use crate::resource::shader::{Shader, ShaderStageCode};
use crate::resource::{ResourceFactory, ResourceTypeCode};
use crate::shader::ShaderDriverManager;
use crate::{engine_debug, engine_error, engine_warn};

/// Decoded shader before pool and GPU allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub name: String,
    pub stages: Vec<(ShaderStage, Vec<u8>)>,
    /// Text scanned for parameter annotations
    pub driver_code: String,
}

pub struct ShaderFactory {
    id: FactoryId,
    device: SharedDevice,
    allocator: SharedAllocator,
    drivers: Arc<ShaderDriverManager>,
    decoders: DecoderTable<ShaderFactory, Shader>,
}

impl ShaderFactory {
    /// Factory with the `text` and `binary` decoders registered
    pub fn new(device: SharedDevice, allocator: SharedAllocator, drivers: Arc<ShaderDriverManager>) -> Self {
        let mut decoders = DecoderTable::new();
        decoders.register(TEXT_FORMAT, Self::decode_text);
        decoders.register(BINARY_FORMAT, Self::decode_binary);
        Self { id: FactoryId::next(), device, allocator, drivers, decoders }
    }

    pub fn register_format(&mut self, format: &str, decode: DecodeFn<ShaderFactory, Shader>) {
        self.decoders.register(format, decode);
    }

    pub fn formats(&self) -> Vec<&str> {
        self.decoders.formats()
    }

    pub(crate) fn id(&self) -> FactoryId {
        self.id
    }

    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    pub fn drivers(&self) -> &ShaderDriverManager {
        &self.drivers
    }

    /// Vertex + pixel shader from source text
    pub fn create_from_source(&self, name: &str, vertex: &str, pixel: &str) -> Option<Shader> {
        let source = ShaderSource {
            name: name.to_string(),
            stages: vec![
                (ShaderStage::Vertex, vertex.as_bytes().to_vec()),
                (ShaderStage::Pixel, pixel.as_bytes().to_vec()),
            ],
            driver_code: format!("{}\n{}", vertex, pixel),
        };
        self.build(source)
            .map_err(|err| engine_warn!("prism::ShaderFactory", "Failed to create shader '{}': {}", name, err))
            .ok()
    }

    // ===== DECODERS =====

    fn decode_text(&self, data: &[u8]) -> Result<Shader> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::InvalidResource("shader text is not valid UTF-8".to_string()))?;

        let mut name = String::new();
        let mut stages: Vec<(ShaderStage, String)> = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if let Some(directive) = trimmed.strip_prefix('@') {
                let mut words = directive.split_whitespace();
                match (words.next(), words.next()) {
                    (Some("shader"), Some(shader_name)) => name = shader_name.to_string(),
                    (Some(stage_name), None) => {
                        let stage = ShaderStage::from_name(stage_name).ok_or_else(|| Error::InvalidResource(
                            format!("unknown directive @{} on line {}", stage_name, number + 1)))?;
                        if stages.iter().any(|(s, _)| *s == stage) {
                            return Err(Error::InvalidResource(format!(
                                "duplicate @{} section on line {}", stage_name, number + 1)));
                        }
                        stages.push((stage, String::new()));
                    }
                    _ => {
                        return Err(Error::InvalidResource(format!(
                            "malformed directive on line {}", number + 1)));
                    }
                }
                continue;
            }

            match stages.last_mut() {
                Some((_, body)) => {
                    body.push_str(line);
                    body.push('\n');
                }
                None if trimmed.is_empty() || trimmed.starts_with("//") => {}
                None => {
                    return Err(Error::InvalidResource(format!(
                        "code outside a stage section on line {}", number + 1)));
                }
            }
        }

        if stages.is_empty() {
            return Err(Error::InvalidResource("shader has no stage sections".to_string()));
        }
        if let Some((stage, _)) = stages.iter().find(|(_, body)| body.trim().is_empty()) {
            return Err(Error::InvalidResource(format!("empty @{} section", stage.name())));
        }

        let driver_code = stages.iter().map(|(_, body)| body.as_str()).collect::<Vec<_>>().join("\n");
        self.build(ShaderSource {
            name,
            stages: stages.into_iter().map(|(stage, body)| (stage, body.into_bytes())).collect(),
            driver_code,
        })
    }

    fn decode_binary(&self, data: &[u8]) -> Result<Shader> {
        let (_, payload) = ResourceHeader::parse(data, ResourceTypeCode::SHADER)?;
        let mut reader = BinaryReader::new(payload);

        let name = reader.read_string()?;
        let stage_count = reader.read_u32()?;
        let mut stages = Vec::new();
        for _ in 0..stage_count {
            let code = reader.read_u32()?;
            let stage = ShaderStage::from_code(code)
                .ok_or_else(|| Error::InvalidResource(format!("unknown stage code {}", code)))?;
            if stages.iter().any(|(s, _)| *s == stage) {
                return Err(Error::InvalidResource(format!("duplicate {} stage", stage.name())));
            }
            stages.push((stage, reader.read_blob()?.to_vec()));
        }
        let driver_code = reader.read_string()?;
        reader.finish()?;

        if stages.is_empty() {
            return Err(Error::InvalidResource("shader has no stages".to_string()));
        }

        self.build(ShaderSource { name, stages, driver_code })
    }

    // ===== CONSTRUCTION =====

    /// Create stage modules, store code in the pool and bind a driver
    pub fn build(&self, source: ShaderSource) -> Result<Shader> {
        let mut shader = Shader {
            origin: self.id,
            name: source.name,
            id: None,
            stages: Vec::with_capacity(source.stages.len()),
            driver_code: source.driver_code,
            driver: None,
        };

        for (stage, code) in source.stages {
            match self.build_stage(&shader.name, stage, code) {
                Ok(stage_code) => shader.stages.push(stage_code),
                Err(err) => {
                    self.free_stages(shader);
                    return Err(err);
                }
            }
        }

        let driver_code = std::mem::take(&mut shader.driver_code);
        self.drivers.setup_shader_driver(&mut shader, &driver_code);
        shader.driver_code = driver_code;

        engine_debug!("prism::ShaderFactory", "Created shader '{}' ({:?})", shader.name, shader.stages());
        Ok(shader)
    }

    fn build_stage(&self, name: &str, stage: ShaderStage, code: Vec<u8>) -> Result<ShaderStageCode> {
        let block = store_bytes(&self.allocator, &code)?;
        let module = self.device.lock()
            .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))
            .and_then(|mut device| device.create_shader(ShaderDesc {
                name: format!("{}.{}", name, stage.name()),
                stage,
                code,
                entry_point: "main".to_string(),
            }));
        match module {
            Ok(module) => Ok(ShaderStageCode { stage, code: block, module }),
            Err(err) => {
                release_block(&self.allocator, block);
                Err(err)
            }
        }
    }

    fn free_stages(&self, shader: Shader) {
        for stage in shader.stages {
            release_block(&self.allocator, stage.code);
        }
    }
}

impl ResourceFactory for ShaderFactory {
    type Resource = Shader;

    fn create(&self, format: &str, data: &[u8]) -> Option<Shader> {
        if data.is_empty() {
            engine_warn!("prism::ShaderFactory", "Rejected empty '{}' shader data", format);
            return None;
        }
        let Some(decode) = self.decoders.get(format) else {
            engine_warn!("prism::ShaderFactory", "Unknown shader format '{}'", format);
            return None;
        };
        decode(self, data)
            .map_err(|err| engine_warn!("prism::ShaderFactory", "Failed to decode '{}' shader: {}", format, err))
            .ok()
    }

    fn release(&self, shader: Shader) {
        debug_assert_eq!(shader.origin, self.id, "shader released through a foreign factory");
        if shader.origin != self.id {
            engine_error!("prism::ShaderFactory", "Refusing to release shader '{}' created by another factory", shader.name);
            return;
        }
        self.free_stages(shader);
    }

    fn resource_type_code(&self) -> ResourceTypeCode {
        ResourceTypeCode::SHADER
    }
}

#[cfg(test)]
#[path = "shader_factory_tests.rs"]
mod tests;
