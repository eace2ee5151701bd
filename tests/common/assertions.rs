//! Custom assertion utilities for tests.

use mock_arena::{UnexpectedKind, VerificationError};

/// Assert that a result is Ok and return the inner value.
///
/// Provides a better error message than `.unwrap()` by including context.
#[allow(dead_code)]
pub fn assert_ok<T, E: std::fmt::Display>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("{} failed:\n{}", context, e),
    }
}

/// Assert that an error message contains expected text (case-insensitive).
#[allow(dead_code)]
pub fn assert_error_contains<E: std::fmt::Display>(error: &E, expected_text: &str, context: &str) {
    let error_str = error.to_string().to_lowercase();
    assert!(
        error_str.contains(&expected_text.to_lowercase()),
        "{}: error message should contain '{}', got:\n{}",
        context,
        expected_text,
        error
    );
}

/// Assert a `MissingInvocation` and return it.
#[allow(dead_code)]
pub fn assert_missing<T: std::fmt::Debug>(
    result: Result<T, VerificationError>,
    context: &str,
) -> mock_arena::MissingInvocation {
    match result {
        Err(VerificationError::MissingInvocation(e)) => e,
        other => panic!("{}: expected MissingInvocation, got {:?}", context, other),
    }
}

/// Assert an `UnexpectedInvocation` of the given kind and return it.
#[allow(dead_code)]
pub fn assert_unexpected<T: std::fmt::Debug>(
    result: Result<T, VerificationError>,
    kind: UnexpectedKind,
    context: &str,
) -> mock_arena::UnexpectedInvocation {
    match result {
        Err(VerificationError::UnexpectedInvocation(e)) if e.kind == kind => e,
        other => panic!("{}: expected {:?} UnexpectedInvocation, got {:?}", context, kind, other),
    }
}
