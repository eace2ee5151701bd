//! Verification blocks over the invocation log.
//!
//! All four modes share one claim set, so an invocation verified by one block
//! is not counted again by a later one.
//!
//! - `Unordered`: each statement claims up to `max` unclaimed matching calls.
//! - `Ordered`: as above, but only calls after the previous statement's last claim.
//! - `FullUnordered` / `FullOrdered`: additionally, every in-scope call must be
//!   claimed by a statement or attributed to a recorded expectation.

use mock_arena_types::{InstanceToken, Invocation, TypeSig, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::call::CallPattern;
use crate::errors::{
    ArenaResult, InvocationSummary, MissingInvocation, UnexpectedInvocation, UnexpectedKind,
    VerificationError,
};
use crate::expectation::Cardinality;
use crate::log::{InvocationLog, VerificationClaim};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    Unordered,
    Ordered,
    FullUnordered,
    FullOrdered,
}

impl VerificationMode {
    pub fn is_ordered(self) -> bool {
        matches!(self, VerificationMode::Ordered | VerificationMode::FullOrdered)
    }

    pub fn is_full(self) -> bool {
        matches!(self, VerificationMode::FullUnordered | VerificationMode::FullOrdered)
    }
}

/// Limits the leftover check of a full verification to some instances
/// and/or declaring types. Empty means everything is in scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restriction {
    instances: BTreeSet<InstanceToken>,
    types: BTreeSet<TypeSig>,
}

impl Restriction {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.types.is_empty()
    }

    pub fn covers(&self, inv: &Invocation) -> bool {
        self.is_empty()
            || inv.instance().is_some_and(|i| self.instances.contains(&i))
            || self.types.contains(inv.type_sig())
    }
}

#[derive(Debug, Clone)]
struct VerifyStatement {
    pattern: CallPattern,
    cardinality: Cardinality,
    message: Option<String>,
}

/// A verification block: a mode plus its verify statements.
///
/// Statements are added the same way expectations are recorded: `verify` a
/// call, then attach bounds or a message to it.
#[derive(Debug, Clone)]
pub struct VerificationBlock {
    mode: VerificationMode,
    restriction: Restriction,
    iterations: u32,
    statements: Vec<VerifyStatement>,
}

impl VerificationBlock {
    pub fn new(mode: VerificationMode) -> Self {
        Self {
            mode,
            restriction: Restriction::default(),
            iterations: 1,
            statements: Vec::new(),
        }
    }

    pub fn unordered() -> Self {
        Self::new(VerificationMode::Unordered)
    }

    pub fn ordered() -> Self {
        Self::new(VerificationMode::Ordered)
    }

    pub fn full() -> Self {
        Self::new(VerificationMode::FullUnordered)
    }

    pub fn full_ordered() -> Self {
        Self::new(VerificationMode::FullOrdered)
    }

    /// Adds an instance to the leftover-check scope.
    pub fn restricted_to(mut self, instance: InstanceToken) -> Self {
        self.restriction.instances.insert(instance);
        self
    }

    /// Adds a declaring type to the leftover-check scope.
    pub fn restricted_to_type(mut self, type_sig: impl Into<TypeSig>) -> Self {
        self.restriction.types.insert(type_sig.into());
        self
    }

    /// Multiplies every statement's bounds by `n`.
    pub fn iterations(mut self, n: u32) -> Self {
        self.iterations = n;
        self
    }

    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    pub fn restriction(&self) -> &Restriction {
        &self.restriction
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn verify(&mut self, pattern: CallPattern) -> ArenaResult<&mut Self> {
        pattern.validate()?;
        self.statements.push(VerifyStatement {
            pattern,
            cardinality: Cardinality::default(),
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

    /// Shown first in the failure message for the current statement.
    pub fn message(&mut self, message: impl Into<String>) -> ArenaResult<&mut Self> {
        self.current("message")?.message = Some(message.into());
        Ok(self)
    }

    fn current(&mut self, what: &str) -> ArenaResult<&mut VerifyStatement> {
        self.statements.last_mut().ok_or_else(|| {
            VerificationError::illegal_state(format!(
                "{} must follow a verified invocation in the verification block",
                what
            ))
        })
    }
}

/// What one verify statement claimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementOutcome {
    pub pattern: String,
    pub claimed: Vec<u64>,
    /// Argument lists of the claimed invocations, in claim order.
    pub arguments: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockReport {
    pub block: u32,
    pub mode: VerificationMode,
    pub statements: Vec<StatementOutcome>,
}

impl BlockReport {
    pub fn statement(&self, index: usize) -> Option<&StatementOutcome> {
        self.statements.get(index)
    }

    /// Captured argument lists of statement `index`; empty if out of range.
    pub fn captured(&self, index: usize) -> &[Vec<Value>] {
        self.statements
            .get(index)
            .map(|s| s.arguments.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_claimed(&self) -> usize {
        self.statements.iter().map(|s| s.claimed.len()).sum()
    }
}

/// Calls to the pattern's method whose arguments were rejected.
pub(crate) fn non_matching(log: &InvocationLog, pattern: &CallPattern) -> Vec<InvocationSummary> {
    log.entries()
        .iter()
        .filter(|inv| {
            pattern.targets(inv.type_sig(), inv.method(), inv.instance())
                && !pattern.accepts_args(inv.args())
        })
        .map(InvocationSummary::from)
        .collect()
}

/// Evaluates `block` and commits its claims. Nothing is claimed on failure.
pub(crate) fn evaluate(
    block: &VerificationBlock,
    index: u32,
    log: &mut InvocationLog,
) -> ArenaResult<BlockReport> {
    if block.iterations == 0 {
        return Err(VerificationError::illegal_state(
            "verification iterations must be at least 1",
        ));
    }
    let ordered = block.mode.is_ordered();
    let mut pending: HashSet<u64> = HashSet::new();
    let mut claims: Vec<VerificationClaim> = Vec::new();
    let mut outcomes = Vec::with_capacity(block.statements.len());
    let mut cursor = 0u64;

    for (position, statement) in block.statements.iter().enumerate() {
        let bounds = statement.cardinality.bounds().scaled(block.iterations);
        let pattern = &statement.pattern;
        let after_cursor = |inv: &&Invocation| !ordered || inv.seq() > cursor;

        if bounds.is_never() {
            let offenders: Vec<&Invocation> = log
                .entries()
                .iter()
                .filter(after_cursor)
                .filter(|inv| pattern.matches(inv))
                .collect();
            if let Some(first) = offenders.first() {
                return Err(UnexpectedInvocation {
                    kind: UnexpectedKind::Overflow,
                    invocation: InvocationSummary::from(*first),
                    expected: Some(pattern.describe()),
                    bounds: Some(bounds),
                    actual: offenders.len() as u32,
                    message: statement.message.clone(),
                }
                .into());
            }
            outcomes.push(StatementOutcome {
                pattern: pattern.describe(),
                claimed: Vec::new(),
                arguments: Vec::new(),
            });
            continue;
        }

        let limit = bounds.max.map_or(usize::MAX, |max| max as usize);
        let taken: Vec<&Invocation> = log
            .entries()
            .iter()
            .filter(after_cursor)
            .filter(|inv| !log.is_claimed(inv.seq()) && !pending.contains(&inv.seq()))
            .filter(|inv| pattern.matches(inv))
            .take(limit)
            .collect();

        if (taken.len() as u32) < bounds.min {
            let mut err = MissingInvocation::new(pattern.describe(), bounds, taken.len() as u32);
            if ordered {
                err.out_of_order = log
                    .entries()
                    .iter()
                    .filter(|inv| {
                        inv.seq() <= cursor
                            && !log.is_claimed(inv.seq())
                            && !pending.contains(&inv.seq())
                    })
                    .filter(|inv| pattern.matches(inv))
                    .map(InvocationSummary::from)
                    .collect();
            }
            err.instead_got = non_matching(log, pattern);
            err.message = statement.message.clone();
            return Err(err.into());
        }

        for inv in &taken {
            pending.insert(inv.seq());
            claims.push(VerificationClaim {
                seq: inv.seq(),
                block: index,
                statement: position,
            });
        }
        if ordered {
            if let Some(last) = taken.last() {
                cursor = last.seq();
            }
        }
        outcomes.push(StatementOutcome {
            pattern: pattern.describe(),
            claimed: taken.iter().map(|inv| inv.seq()).collect(),
            arguments: taken.iter().map(|inv| inv.args().to_vec()).collect(),
        });
    }

    if block.mode.is_full() {
        let leftover = log.entries().iter().find(|inv| {
            block.restriction.covers(inv)
                && inv.matched().is_none()
                && !log.is_claimed(inv.seq())
                && !pending.contains(&inv.seq())
        });
        if let Some(inv) = leftover {
            return Err(UnexpectedInvocation {
                kind: UnexpectedKind::Unverified,
                invocation: InvocationSummary::from(inv),
                expected: None,
                bounds: None,
                actual: 0,
                message: None,
            }
            .into());
        }
    }

    for claim in claims {
        log.claim(claim);
    }
    debug!(
        block = index,
        mode = ?block.mode,
        claimed = pending.len(),
        "verification block passed"
    );
    Ok(BlockReport {
        block: index,
        mode: block.mode,
        statements: outcomes,
    })
}
