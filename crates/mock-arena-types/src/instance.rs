//! Opaque identities for mocked instances.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity token standing in for one mocked object.
///
/// The engine never sees real objects. Tokens are minted by the arena (for
/// explicit mock instances and for cascaded return values) and compared by
/// identity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceToken(u64);

impl InstanceToken {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}
