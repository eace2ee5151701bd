#![allow(unused_imports)]
//! Shared test utilities for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: declaring types and method signatures used across tests
//! - `assertions`: assertion helpers with readable failure messages

pub mod assertions;
pub mod fixtures;

pub use assertions::{assert_error_contains, assert_missing, assert_ok, assert_unexpected};
pub use fixtures::*;
