/// Model factory: text and binary model decoding
///
/// Text layout:
///
/// ```text
/// FILETYPE MODEL
/// MESHES {
///     MESH {
///         NAME quad
///         MATERIAL default
///         VERTICES [ px py pz nx ny nz u v ... ]
///         INDICES [ 0 1 2 ... ]
///     }
/// }
/// ```
///
/// The binary layout is the one written by `Model::encode_binary`.

use std::sync::Arc;
use glam::Vec3;
use crate::error::{Error, Result};
use crate::graphics_device::{Buffer, BufferDesc, BufferUsage, SharedDevice};
use crate::memory::{release_block, store_bytes, SharedAllocator};
use crate::resource::factory::{DecodeFn, DecoderTable, FactoryId, BINARY_FORMAT, TEXT_FORMAT};
use crate::resource::header::{BinaryReader, ResourceHeader};
use crate::resource::model::{Mesh, Model, Vertex, AABB, VERTEX_FLOATS};
use crate::resource::text_parser::TextDocument;
use crate::resource::{ResourceFactory, ResourceTypeCode};
use crate::{engine_debug, engine_error, engine_warn};

/// Decoded mesh before pool and GPU allocation
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub material: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Reject empty meshes, partial triangles and out-of-range indices
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() {
            return Err(Error::InvalidResource(format!("mesh '{}' has no vertices", self.name)));
        }
        if self.indices.len() % 3 != 0 {
            return Err(Error::InvalidResource(format!(
                "mesh '{}' has {} indices, not a whole number of triangles",
                self.name, self.indices.len())));
        }
        let vertex_count = self.vertices.len() as u32;
        if let Some(bad) = self.indices.iter().find(|&&i| i >= vertex_count) {
            return Err(Error::InvalidResource(format!(
                "mesh '{}' index {} out of range ({} vertices)", self.name, bad, vertex_count)));
        }
        Ok(())
    }
}

pub struct ModelFactory {
    id: FactoryId,
    device: SharedDevice,
    allocator: SharedAllocator,
    decoders: DecoderTable<ModelFactory, Model>,
}

impl ModelFactory {
    /// Factory with the `text` and `binary` decoders registered
    pub fn new(device: SharedDevice, allocator: SharedAllocator) -> Self {
        let mut decoders = DecoderTable::new();
        decoders.register(TEXT_FORMAT, Self::decode_text);
        decoders.register(BINARY_FORMAT, Self::decode_binary);
        Self { id: FactoryId::next(), device, allocator, decoders }
    }

    /// Add or replace a decoder
    pub fn register_format(&mut self, format: &str, decode: DecodeFn<ModelFactory, Model>) {
        self.decoders.register(format, decode);
    }

    pub fn formats(&self) -> Vec<&str> {
        self.decoders.formats()
    }

    // ===== DECODERS =====

    fn decode_text(&self, data: &[u8]) -> Result<Model> {
        let doc = TextDocument::from_bytes(data)?;
        doc.expect_file_type("MODEL")?;
        let meshes_node = doc.node("MESHES")
            .ok_or_else(|| Error::InvalidResource("missing MESHES block".to_string()))?;

        let mut meshes = Vec::new();
        for (index, node) in meshes_node.children_named("MESH").enumerate() {
            let name = node.child("NAME")
                .and_then(|n| n.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh{}", index));
            let material = node.child("MATERIAL")
                .and_then(|n| n.as_str())
                .unwrap_or_default()
                .to_string();

            let floats: Vec<f32> = node.child("VERTICES")
                .and_then(|n| n.parse_list())
                .ok_or_else(|| Error::InvalidResource(format!("mesh '{}' has no numeric VERTICES", name)))?;
            if floats.len() % VERTEX_FLOATS != 0 {
                return Err(Error::InvalidResource(format!(
                    "mesh '{}' VERTICES length {} is not a multiple of {}",
                    name, floats.len(), VERTEX_FLOATS)));
            }
            let vertices = floats
                .chunks_exact(VERTEX_FLOATS)
                .map(|chunk| {
                    let mut values = [0f32; VERTEX_FLOATS];
                    values.copy_from_slice(chunk);
                    Vertex::from_floats(&values)
                })
                .collect();

            let indices = node.child("INDICES")
                .and_then(|n| n.parse_list())
                .ok_or_else(|| Error::InvalidResource(format!("mesh '{}' has no numeric INDICES", name)))?;

            meshes.push(MeshData { name, material, vertices, indices });
        }

        self.build(meshes)
    }

    fn decode_binary(&self, data: &[u8]) -> Result<Model> {
        let (_, payload) = ResourceHeader::parse(data, ResourceTypeCode::MODEL)?;
        let mut reader = BinaryReader::new(payload);

        let mesh_count = reader.read_u32()?;
        let mut meshes = Vec::new();
        for _ in 0..mesh_count {
            let name = reader.read_string()?;
            let material = reader.read_string()?;
            let vertex_count = reader.read_u32()? as usize;
            let index_count = reader.read_u32()? as usize;

            let vertex_len = vertex_count
                .checked_mul(VERTEX_FLOATS * 4)
                .ok_or_else(|| Error::InvalidResource("vertex count overflow".to_string()))?;
            let vertex_bytes = reader.read_bytes(vertex_len)?;
            let vertices = vertex_bytes
                .chunks_exact(VERTEX_FLOATS * 4)
                .map(|chunk| {
                    let mut floats = [0f32; VERTEX_FLOATS];
                    for (value, bytes) in floats.iter_mut().zip(chunk.chunks_exact(4)) {
                        *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    }
                    Vertex::from_floats(&floats)
                })
                .collect();

            let index_len = index_count
                .checked_mul(4)
                .ok_or_else(|| Error::InvalidResource("index count overflow".to_string()))?;
            let indices = reader.read_bytes(index_len)?
                .chunks_exact(4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();

            meshes.push(MeshData { name, material, vertices, indices });
        }
        reader.finish()?;

        self.build(meshes)
    }

    // ===== CONSTRUCTION =====

    /// Allocate pool blocks and GPU buffers for decoded meshes
    ///
    /// On failure everything allocated so far is released again.
    pub fn build(&self, meshes: Vec<MeshData>) -> Result<Model> {
        if meshes.is_empty() {
            return Err(Error::InvalidResource("model has no meshes".to_string()));
        }
        for mesh in &meshes {
            mesh.validate()?;
        }

        let mut model = Model { origin: self.id, meshes: Vec::with_capacity(meshes.len()) };
        for data in meshes {
            match self.build_mesh(data) {
                Ok(mesh) => model.meshes.push(mesh),
                Err(err) => {
                    self.free_meshes(model);
                    return Err(err);
                }
            }
        }
        Ok(model)
    }

    fn build_mesh(&self, data: MeshData) -> Result<Mesh> {
        let bounds = AABB::from_points(data.vertices.iter().map(|v| Vec3::from(v.position)))
            .ok_or_else(|| Error::InvalidResource(format!("mesh '{}' has no vertices", data.name)))?;

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&data.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&data.indices);

        let vertices = store_bytes(&self.allocator, vertex_bytes)?;
        let indices = match store_bytes(&self.allocator, index_bytes) {
            Ok(block) => block,
            Err(err) => {
                release_block(&self.allocator, vertices);
                return Err(err);
            }
        };

        let buffers = self.create_buffers(&data.name, vertex_bytes, index_bytes);
        let (vertex_buffer, index_buffer) = match buffers {
            Ok(buffers) => buffers,
            Err(err) => {
                release_block(&self.allocator, vertices);
                release_block(&self.allocator, indices);
                return Err(err);
            }
        };

        Ok(Mesh {
            vertex_count: data.vertices.len() as u32,
            index_count: data.indices.len() as u32,
            name: data.name,
            material: data.material,
            vertices,
            indices,
            bounds,
            vertex_buffer,
            index_buffer,
        })
    }

    fn create_buffers(
        &self,
        name: &str,
        vertex_bytes: &[u8],
        index_bytes: &[u8],
    ) -> Result<(Arc<dyn Buffer>, Arc<dyn Buffer>)> {
        let mut device = self.device.lock()
            .map_err(|_| Error::BackendError("Graphics device lock poisoned".to_string()))?;
        let vertex_buffer = device.create_buffer(BufferDesc {
            name: format!("{}.vertices", name),
            size: vertex_bytes.len() as u64,
            usage: BufferUsage::Vertex,
            data: Some(vertex_bytes.to_vec()),
        })?;
        let index_buffer = device.create_buffer(BufferDesc {
            name: format!("{}.indices", name),
            size: index_bytes.len() as u64,
            usage: BufferUsage::Index,
            data: Some(index_bytes.to_vec()),
        })?;
        Ok((vertex_buffer, index_buffer))
    }

    fn free_meshes(&self, model: Model) {
        for mesh in model.meshes {
            release_block(&self.allocator, mesh.vertices);
            release_block(&self.allocator, mesh.indices);
        }
    }
}

impl ResourceFactory for ModelFactory {
    type Resource = Model;

    fn create(&self, format: &str, data: &[u8]) -> Option<Model> {
        if data.is_empty() {
            engine_warn!("prism::ModelFactory", "Rejected empty '{}' model data", format);
            return None;
        }
        let Some(decode) = self.decoders.get(format) else {
            engine_warn!("prism::ModelFactory", "Unknown model format '{}'", format);
            return None;
        };
        match decode(self, data) {
            Ok(model) => {
                engine_debug!("prism::ModelFactory",
                    "Created model with {} meshes from '{}' data", model.mesh_count(), format);
                Some(model)
            }
            Err(err) => {
                engine_warn!("prism::ModelFactory", "Failed to decode '{}' model: {}", format, err);
                None
            }
        }
    }

    fn release(&self, model: Model) {
        debug_assert_eq!(model.origin, self.id, "model released through a foreign factory");
        if model.origin != self.id {
            engine_error!("prism::ModelFactory", "Refusing to release a model created by another factory");
            return;
        }
        self.free_meshes(model);
    }

    fn resource_type_code(&self) -> ResourceTypeCode {
        ResourceTypeCode::MODEL
    }
}

#[cfg(test)]
#[path = "model_factory_tests.rs"]
mod tests;
