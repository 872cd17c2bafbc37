//! Opaque key generation and operation key naming

use crate::cache::types::CacheKey;
use std::fmt;
use uuid::Uuid;

/// Generate a fresh opaque key carrying 128 random bits
///
/// The bits come from the thread-local CSPRNG and are rendered in the
/// hyphenated UUID layout. No version bits are forced, so all 128 bits are
/// random.
pub fn generate_key() -> CacheKey {
    Uuid::from_bytes(rand::random::<[u8; 16]>())
        .hyphenated()
        .to_string()
}

/// Stable name of a tracked operation, independent of its arguments
///
/// The counter lives under the name itself; inputs and outputs live in the
/// `<name>:inputs` and `<name>:outputs` lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationId(String);

impl OperationId {
    /// Create an operation identity
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The operation name
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Backend key of the call counter
    pub fn counter_key(&self) -> String {
        self.0.clone()
    }

    /// Backend list holding serialized inputs
    pub fn inputs_key(&self) -> String {
        format!("{}:inputs", self.0)
    }

    /// Backend list holding serialized outputs
    pub fn outputs_key(&self) -> String {
        format!("{}:outputs", self.0)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for OperationId {
    fn from(name: String) -> Self {
        Self(name)
    }
}
