/// GPU buffer handles holding mesh geometry

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

/// Buffer creation request issued by the model factory
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// `<mesh>.vertices` or `<mesh>.indices`
    pub name: String,
    pub size: u64,
    pub usage: BufferUsage,
    /// Upload data, `size` bytes long when present
    pub data: Option<Vec<u8>>,
}

/// Opaque buffer owned by the device backend; released on drop
pub trait Buffer: Send + Sync {
    fn name(&self) -> &str;
    fn size(&self) -> u64;
    fn usage(&self) -> BufferUsage;
}
