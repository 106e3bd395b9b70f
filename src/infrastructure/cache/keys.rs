//! Versioned cache key schema.
//!
//! ```text
//! {namespace}:v{SCHEMA_VERSION}:link:{code}   positive entry (JSON CachedLink)
//! {namespace}:v{SCHEMA_VERSION}:404:{code}    negative entry (sentinel)
//! ```
//!
//! Bump [`SCHEMA_VERSION`] whenever the serialized shape of a cached value
//! changes, so old entries are never decoded with the new shape.

pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_NAMESPACE: &str = "shortener";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    prefix: String,
}

impl KeySchema {
    pub fn new(namespace: &str) -> Self {
        Self {
            prefix: format!("{}:v{}", namespace, SCHEMA_VERSION),
        }
    }

    pub fn link_key(&self, code: &str) -> String {
        format!("{}:link:{}", self.prefix, code)
    }

    pub fn not_found_key(&self, code: &str) -> String {
        format!("{}:404:{}", self.prefix, code)
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
