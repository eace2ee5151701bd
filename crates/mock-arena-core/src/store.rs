//! Recorded expectations, in recording order.

use mock_arena_types::{ExpectationId, InstanceToken, MethodSig, TypeSig};

use crate::call::CallPattern;
use crate::errors::{ArenaResult, VerificationError};
use crate::expectation::{Bounds, Expectation, ResultDescriptor};

/// An expectation as produced by a recording block, before it gets an id.
#[derive(Debug, Clone)]
pub struct ExpectationDraft {
    pub pattern: CallPattern,
    pub strict: bool,
    pub bounds: Bounds,
    pub results: Vec<ResultDescriptor>,
    pub message: Option<String>,
}

#[derive(Debug, Default)]
pub struct ExpectationStore {
    expectations: Vec<Expectation>,
    /// Strict expectations in recording order.
    strict_order: Vec<ExpectationId>,
    /// Position in `strict_order` of the most recently matched strict expectation.
    strict_cursor: usize,
}

impl ExpectationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, draft: ExpectationDraft) -> ArenaResult<ExpectationId> {
        draft.pattern.validate()?;
        let id = ExpectationId(self.expectations.len() as u32);
        if draft.strict {
            self.strict_order.push(id);
        }
        self.expectations.push(Expectation::new(
            id,
            draft.pattern,
            draft.strict,
            draft.bounds,
            draft.results,
            draft.message,
        ));
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expectation> {
        self.expectations.iter()
    }

    pub fn get(&self, id: ExpectationId) -> Option<&Expectation> {
        self.expectations.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ExpectationId) -> ArenaResult<&mut Expectation> {
        self.expectations
            .get_mut(id.0 as usize)
            .ok_or_else(|| VerificationError::illegal_state(format!("unknown {}", id)))
    }

    /// Expectations targeting this call site, ignoring arguments.
    pub fn expectations_for<'a>(
        &'a self,
        type_sig: &'a TypeSig,
        method: &'a MethodSig,
        instance: Option<InstanceToken>,
    ) -> impl Iterator<Item = &'a Expectation> + 'a {
        self.expectations
            .iter()
            .filter(move |e| e.pattern().targets(type_sig, method, instance))
    }

    pub fn strict_order(&self) -> &[ExpectationId] {
        &self.strict_order
    }

    pub fn strict_cursor(&self) -> usize {
        self.strict_cursor
    }

    pub(crate) fn set_strict_cursor(&mut self, position: usize) {
        self.strict_cursor = position;
    }

    /// First expectation, in recording order, whose minimum is not met.
    pub fn first_unsatisfied(&self) -> Option<&Expectation> {
        self.expectations.iter().find(|e| !e.is_satisfied())
    }
}
