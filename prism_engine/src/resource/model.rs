/// Model resource: named meshes with CPU-side pooled data and GPU buffers

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use crate::graphics_device::Buffer;
use crate::memory::PoolBlock;
use crate::resource::factory::FactoryId;
use crate::resource::header::{BinaryWriter, ResourceHeader};
use crate::resource::ResourceTypeCode;

/// Floats per vertex in text and binary encodings
pub const VERTEX_FLOATS: usize = 8;

// ===== VERTEX =====

/// Interleaved vertex: position, normal, texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn from_floats(f: &[f32; VERTEX_FLOATS]) -> Self {
        Self {
            position: [f[0], f[1], f[2]],
            normal: [f[3], f[4], f[5]],
            uv: [f[6], f[7]],
        }
    }

    pub fn to_floats(&self) -> [f32; VERTEX_FLOATS] {
        [
            self.position[0], self.position[1], self.position[2],
            self.normal[0], self.normal[1], self.normal[2],
            self.uv[0], self.uv[1],
        ]
    }
}

// ===== BOUNDS =====

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    /// Smallest box containing every point; None for an empty set
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<AABB> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(AABB { min, max })
    }

    /// Transform by a matrix (Arvo's method, exact for affine transforms)
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        AABB { min: new_min, max: new_max }
    }

    pub fn union(&self, other: &AABB) -> AABB {
        AABB { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Whether a sphere overlaps this box
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }
}

// ===== MESH =====

/// One drawable mesh of a model
pub struct Mesh {
    pub(crate) name: String,
    pub(crate) material: String,
    pub(crate) vertex_count: u32,
    pub(crate) index_count: u32,
    pub(crate) vertices: PoolBlock,
    pub(crate) indices: PoolBlock,
    pub(crate) bounds: AABB,
    pub(crate) vertex_buffer: Arc<dyn Buffer>,
    pub(crate) index_buffer: Arc<dyn Buffer>,
}

impl Mesh {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Local-space bounds
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Raw interleaved vertex bytes (pool-backed)
    pub fn vertex_bytes(&self) -> &[u8] {
        self.vertices.as_slice()
    }

    /// Vertices decoded from the pool bytes, which carry no alignment guarantee
    pub fn vertices(&self) -> Vec<Vertex> {
        self.vertices.as_slice()
            .chunks_exact(std::mem::size_of::<Vertex>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    pub fn indices(&self) -> Vec<u32> {
        self.indices.as_slice()
            .chunks_exact(std::mem::size_of::<u32>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    pub fn vertex_buffer(&self) -> &Arc<dyn Buffer> {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &Arc<dyn Buffer> {
        &self.index_buffer
    }
}

// ===== MODEL =====

/// Model resource
///
/// Created by `ModelFactory::create`, destroyed by `ModelFactory::release`.
pub struct Model {
    pub(crate) origin: FactoryId,
    pub(crate) meshes: Vec<Mesh>,
}

impl Model {
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Union of every mesh's bounds
    pub fn bounds(&self) -> Option<AABB> {
        self.meshes
            .iter()
            .map(|mesh| mesh.bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Bake into the binary layout accepted by `ModelFactory` ("binary")
    ///
    /// Payload: mesh count, then per mesh name, material, vertex count,
    /// index count, vertex floats and indices, all little-endian.
    pub fn encode_binary(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_u32(self.meshes.len() as u32);
        for mesh in &self.meshes {
            writer.write_string(&mesh.name);
            writer.write_string(&mesh.material);
            writer.write_u32(mesh.vertex_count);
            writer.write_u32(mesh.index_count);
            for vertex in mesh.vertices() {
                for value in vertex.to_floats() {
                    writer.write_bytes(&value.to_le_bytes());
                }
            }
            for index in mesh.indices() {
                writer.write_u32(index);
            }
        }
        ResourceHeader::encode(ResourceTypeCode::MODEL, 0, &writer.into_bytes())
    }
}
