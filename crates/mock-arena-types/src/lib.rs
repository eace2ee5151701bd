//! Shared data types for the mock-arena workspace.
//!
//! - [`value`]: argument/return values and thrown-exception descriptors
//! - [`signature`]: declaring types, method signatures, return types
//! - [`instance`]: opaque mock-instance tokens
//! - [`invocation`]: the immutable record of one intercepted call
//! - [`env_utils`]: prefixed environment lookups used by configuration

pub mod env_utils;
pub mod instance;
pub mod invocation;
pub mod signature;
pub mod value;

pub use instance::InstanceToken;
pub use invocation::{Args, ExpectationId, Invocation, ThreadTag};
pub use signature::{MethodSig, ReturnType, TypeSig};
pub use value::{Thrown, Value, ValueKind};
