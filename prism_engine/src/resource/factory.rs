/// Resource factory contract and format dispatch
///
/// A factory turns `(format, bytes)` into a live resource and destroys it
/// again. Formats are looked up in a `DecoderTable` filled once at
/// construction, so supporting a new encoding is a `register_format` call.

use std::sync::atomic::{AtomicU32, Ordering};
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::resource::ResourceTypeCode;

/// Format name of the text decode path
pub const TEXT_FORMAT: &str = "text";

/// Format name of the binary decode path
pub const BINARY_FORMAT: &str = "binary";

// ===== FACTORY TRAIT =====

/// Format-aware constructor/destructor for one resource kind
pub trait ResourceFactory {
    /// Resource kind produced by this factory
    type Resource;

    /// Decode `data` according to `format`
    ///
    /// Returns None for unknown formats, empty or truncated buffers and any
    /// decode failure. A failed create leaves nothing allocated.
    fn create(&self, format: &str, data: &[u8]) -> Option<Self::Resource>;

    /// Destroy a resource returned by `create` on this factory
    fn release(&self, resource: Self::Resource);

    /// Type code identifying the resource kind
    fn resource_type_code(&self) -> ResourceTypeCode;
}

// ===== FACTORY IDENTITY =====

static NEXT_FACTORY_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a factory instance, stamped on every resource it creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactoryId(u32);

impl FactoryId {
    pub(crate) fn next() -> Self {
        Self(NEXT_FACTORY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

// ===== DECODER TABLE =====

/// Decode function: factory context + raw bytes to resource
pub type DecodeFn<F, R> = fn(&F, &[u8]) -> Result<R>;

/// Format name to decode function map
pub struct DecoderTable<F, R> {
    decoders: FxHashMap<String, DecodeFn<F, R>>,
}

impl<F, R> DecoderTable<F, R> {
    pub fn new() -> Self {
        Self { decoders: FxHashMap::default() }
    }

    /// Register (or replace) the decoder for `format`
    pub fn register(&mut self, format: &str, decode: DecodeFn<F, R>) {
        self.decoders.insert(format.to_string(), decode);
    }

    pub fn get(&self, format: &str) -> Option<DecodeFn<F, R>> {
        self.decoders.get(format).copied()
    }

    pub fn contains(&self, format: &str) -> bool {
        self.decoders.contains_key(format)
    }

    /// Registered format names, sorted
    pub fn formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }
}

impl<F, R> Default for DecoderTable<F, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
