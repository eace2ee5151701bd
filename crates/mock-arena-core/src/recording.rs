//! Recording blocks.

use mock_arena_types::{Thrown, Value};

use crate::call::CallPattern;
use crate::errors::{ArenaResult, VerificationError};
use crate::expectation::{Cardinality, Delegate, DelegateCall, ResultDescriptor};
use crate::store::ExpectationDraft;

#[derive(Debug)]
struct Pending {
    pattern: CallPattern,
    cardinality: Cardinality,
    results: Vec<ResultDescriptor>,
    message: Option<String>,
}

/// Collects expectations for one `expectations`/`strict_expectations` block.
///
/// Nothing reaches the arena unless the block's closure returns `Ok`.
#[derive(Debug)]
pub struct RecordingBlock {
    strict: bool,
    pending: Vec<Pending>,
}

impl RecordingBlock {
    pub(crate) fn new(strict: bool) -> Self {
        Self {
            strict,
            pending: Vec::new(),
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Starts a new expectation. Following calls attach to it.
    pub fn record(&mut self, pattern: CallPattern) -> ArenaResult<&mut Self> {
        pattern.validate()?;
        self.pending.push(Pending {
            pattern,
            cardinality: Cardinality::default(),
            results: Vec::new(),
            message: None,
        });
        Ok(self)
    }

    pub fn times(&mut self, n: u32) -> ArenaResult<&mut Self> {
        self.current("times")?.cardinality.times(n)?;
        Ok(self)
    }

    pub fn min_times(&mut self, n: u32) -> ArenaResult<&mut Self> {
        self.current("min_times")?.cardinality.min_times(n)?;
        Ok(self)
    }

    pub fn max_times(&mut self, n: u32) -> ArenaResult<&mut Self> {
        self.current("max_times")?.cardinality.max_times(n)?;
        Ok(self)
    }

    /// Appends one return value to the result queue.
    pub fn result(&mut self, value: impl Into<Value>) -> ArenaResult<&mut Self> {
        self.push_result("result", ResultDescriptor::Return(value.into()))
    }

    /// Appends consecutive return values; the last one repeats.
    pub fn returns<I, V>(&mut self, values: I) -> ArenaResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let current = self.current("returns")?;
        let before = current.results.len();
        current
            .results
            .extend(values.into_iter().map(|v| ResultDescriptor::Return(v.into())));
        if current.results.len() == before {
            return Err(VerificationError::illegal_state("returns needs at least one value"));
        }
        Ok(self)
    }

    pub fn throws(&mut self, thrown: Thrown) -> ArenaResult<&mut Self> {
        self.push_result("throws", ResultDescriptor::Throw(thrown))
    }

    pub fn delegate<F>(&mut self, f: F) -> ArenaResult<&mut Self>
    where
        F: Fn(&DelegateCall<'_>) -> Result<Value, Thrown> + Send + Sync + 'static,
    {
        self.push_result("delegate", ResultDescriptor::Delegate(Delegate::new(f)))
    }

    /// Shown first in any failure message about the current expectation.
    pub fn message(&mut self, message: impl Into<String>) -> ArenaResult<&mut Self> {
        self.current("message")?.message = Some(message.into());
        Ok(self)
    }

    fn push_result(&mut self, what: &str, result: ResultDescriptor) -> ArenaResult<&mut Self> {
        self.current(what)?.results.push(result);
        Ok(self)
    }

    fn current(&mut self, what: &str) -> ArenaResult<&mut Pending> {
        self.pending.last_mut().ok_or_else(|| {
            VerificationError::illegal_state(format!(
                "{} must follow a recorded invocation in the expectation block",
                what
            ))
        })
    }

    pub(crate) fn into_drafts(self) -> Vec<ExpectationDraft> {
        let strict = self.strict;
        self.pending
            .into_iter()
            .map(|p| ExpectationDraft {
                pattern: p.pattern,
                strict,
                bounds: p.cardinality.bounds(),
                results: p.results,
                message: p.message,
            })
            .collect()
    }
}
