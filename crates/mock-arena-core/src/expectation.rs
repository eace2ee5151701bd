//! Expectations: a call pattern plus cardinality and result policy.

use mock_arena_types::{ExpectationId, Invocation, Thrown, Value};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::arena::Arena;
use crate::call::CallPattern;
use crate::errors::{ArenaResult, VerificationError};

/// Inclusive invocation-count bounds. `max: None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u32,
    pub max: Option<u32>,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::exactly(1)
    }
}

impl Bounds {
    pub const fn exactly(n: u32) -> Self {
        Self { min: n, max: Some(n) }
    }

    pub const fn at_least(n: u32) -> Self {
        Self { min: n, max: None }
    }

    pub fn between(min: u32, max: u32) -> ArenaResult<Self> {
        if max < min {
            return Err(VerificationError::illegal_state(format!(
                "invalid bounds: max {} is below min {}",
                max, min
            )));
        }
        Ok(Self { min, max: Some(max) })
    }

    pub fn allows(&self, count: u32) -> bool {
        self.max.map_or(true, |max| count <= max)
    }

    pub fn is_satisfied_by(&self, count: u32) -> bool {
        count >= self.min
    }

    pub fn is_never(&self) -> bool {
        self.max == Some(0)
    }

    /// Bounds for a block repeated `iterations` times.
    pub fn scaled(&self, iterations: u32) -> Self {
        Self {
            min: self.min.saturating_mul(iterations),
            max: self.max.map(|max| max.saturating_mul(iterations)),
        }
    }
}

fn times(n: u32) -> &'static str {
    if n == 1 {
        "time"
    } else {
        "times"
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (_, Some(0)) => f.write_str("never"),
            (min, Some(max)) if min == max => write!(f, "exactly {} {}", min, times(min)),
            (min, None) => write!(f, "at least {} {}", min, times(min)),
            (0, Some(max)) => write!(f, "at most {} {}", max, times(max)),
            (min, Some(max)) => write!(f, "between {} and {} times", min, max),
        }
    }
}

/// Bounds under construction, remembering which ends were set explicitly.
///
/// `times(n)` fixes both ends. `min_times(n)` leaves the maximum unbounded
/// unless a maximum was given. `max_times(n)` pulls an implicit minimum down
/// to `n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cardinality {
    bounds: Bounds,
    min_set: bool,
    max_set: bool,
}

impl Cardinality {
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn times(&mut self, n: u32) -> ArenaResult<()> {
        self.bounds = Bounds::exactly(n);
        self.min_set = true;
        self.max_set = true;
        Ok(())
    }

    pub fn min_times(&mut self, n: u32) -> ArenaResult<()> {
        if self.max_set {
            if let Some(max) = self.bounds.max {
                if n > max {
                    return Err(VerificationError::illegal_state(format!(
                        "invalid bounds: min {} exceeds max {}",
                        n, max
                    )));
                }
            }
        } else {
            self.bounds.max = None;
        }
        self.bounds.min = n;
        self.min_set = true;
        Ok(())
    }

    pub fn max_times(&mut self, n: u32) -> ArenaResult<()> {
        if self.min_set && n < self.bounds.min {
            return Err(VerificationError::illegal_state(format!(
                "invalid bounds: max {} is below min {}",
                n, self.bounds.min
            )));
        }
        if !self.min_set && self.bounds.min > n {
            self.bounds.min = n;
        }
        self.bounds.max = Some(n);
        self.max_set = true;
        Ok(())
    }
}

/// Arguments handed to a delegate.
pub struct DelegateCall<'a> {
    /// The arena, for calls the delegate makes into other mocks.
    pub arena: &'a Arena,
    pub invocation: &'a Invocation,
}

impl DelegateCall<'_> {
    pub fn args(&self) -> &[Value] {
        self.invocation.args()
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.invocation.args().get(index)
    }
}

type DelegateFn = dyn Fn(&DelegateCall<'_>) -> Result<Value, Thrown> + Send + Sync;

/// Test-supplied code computing a result from the actual arguments.
#[derive(Clone)]
pub struct Delegate(Arc<DelegateFn>);

impl Delegate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&DelegateCall<'_>) -> Result<Value, Thrown> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, call: &DelegateCall<'_>) -> Result<Value, Thrown> {
        (self.0)(call)
    }
}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Delegate(..)")
    }
}

#[derive(Debug, Clone)]
pub enum ResultDescriptor {
    Return(Value),
    Throw(Thrown),
    Delegate(Delegate),
}

/// A recorded expectation with its runtime counters.
#[derive(Debug, Clone)]
pub struct Expectation {
    id: ExpectationId,
    pattern: CallPattern,
    strict: bool,
    bounds: Bounds,
    results: VecDeque<ResultDescriptor>,
    message: Option<String>,
    count: u32,
    claimed: Vec<u64>,
}

impl Expectation {
    pub(crate) fn new(
        id: ExpectationId,
        pattern: CallPattern,
        strict: bool,
        bounds: Bounds,
        results: Vec<ResultDescriptor>,
        message: Option<String>,
    ) -> Self {
        Self {
            id,
            pattern,
            strict,
            bounds,
            results: results.into(),
            message,
            count: 0,
            claimed: Vec::new(),
        }
    }

    pub fn id(&self) -> ExpectationId {
        self.id
    }

    pub fn pattern(&self) -> &CallPattern {
        &self.pattern
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Sequence numbers of the invocations this expectation consumed.
    pub fn claimed(&self) -> &[u64] {
        &self.claimed
    }

    pub fn has_capacity(&self) -> bool {
        self.bounds.allows(self.count + 1)
    }

    pub fn is_satisfied(&self) -> bool {
        self.bounds.is_satisfied_by(self.count)
    }

    pub fn is_overflowed(&self) -> bool {
        !self.bounds.allows(self.count)
    }

    pub(crate) fn claim(&mut self, seq: u64) {
        self.count += 1;
        self.claimed.push(seq);
    }

    /// Pops the head of the result queue, repeating the last entry forever.
    pub(crate) fn next_result(&mut self) -> Option<ResultDescriptor> {
        if self.results.len() > 1 {
            self.results.pop_front()
        } else {
            self.results.front().cloned()
        }
    }
}
