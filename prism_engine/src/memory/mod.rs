/// Pooled memory for CPU-side resource payloads

pub mod pool_allocator;

pub use pool_allocator::*;
