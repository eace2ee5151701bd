//! Mock Arena
//!
//! Behavior verification for test doubles:
//!
//! - **Expectations**: record call patterns with bounds and result policies
//! - **Replay**: match intercepted calls, enforce cardinality, cascade mock instances
//! - **Verification**: unordered, ordered and full verification blocks over the call log
//!
//! Everything for one test lives in an [`Arena`]. See [`mock_arena_core`] for the
//! engine and [`mock_arena_types`] for values, signatures and invocations.

#![allow(clippy::result_large_err)]

pub use mock_arena_core as core;
pub use mock_arena_types as types;

pub use mock_arena_core::{
    Arena, ArenaConfig, ArenaReport, ArenaResult, ArgumentMatcher, BlockReport, Bounds,
    CallPattern, DelegateCall, ErrorKind, MissingInvocation, Outcome, Phase, RecordingBlock,
    UnexpectedInvocation, UnexpectedKind, VerificationBlock, VerificationError, VerificationMode,
};
pub use mock_arena_types::{
    ExpectationId, InstanceToken, Invocation, MethodSig, ReturnType, Thrown, TypeSig, Value,
    ValueKind,
};

/// Everything a test usually needs.
pub mod prelude {
    pub use crate::{
        Arena, ArenaConfig, ArenaResult, ArgumentMatcher, CallPattern, InstanceToken, MethodSig,
        Outcome, ReturnType, Thrown, TypeSig, Value, ValueKind, VerificationBlock,
        VerificationError,
    };
}
