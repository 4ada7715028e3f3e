/// Graphics device module - opaque GPU handles consumed by the resource core

pub mod graphics_device;
pub mod texture;
pub mod buffer;
pub mod shader;

pub use graphics_device::*;
pub use texture::*;
pub use buffer::*;
pub use shader::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
