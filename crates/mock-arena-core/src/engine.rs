//! Replay-time matching: resolves an intercepted call to at most one
//! expectation, enforces cardinality, and decides the call's outcome.
//!
//! ```text
//! candidates = expectations targeting (type, method, instance) whose matchers accept args
//!   instance-bound candidates present?  -> drop type-wide ones
//! strict candidates?  -> walk strict order from the cursor
//!   candidate with capacity     -> match, cursor moves there
//!   unsatisfied non-candidate   -> ordering violation
//! non-strict          -> (has capacity, fewest wildcards, earliest recorded)
//! nobody has capacity -> attribute to best candidate, overflow check fails
//! ```

use mock_arena_types::{
    Args, ExpectationId, InstanceToken, Invocation, MethodSig, ThreadTag, TypeSig, Value,
};
use std::collections::BTreeMap;
use std::thread::ThreadId;
use tracing::{debug, info, trace, warn};

use crate::arena::{ArenaState, Outcome, Phase};
use crate::cascade::{CascadeKey, Resolution};
use crate::config::ArenaConfig;
use crate::errors::{
    ArenaResult, InvocationSummary, UnexpectedInvocation, UnexpectedKind, VerificationError,
};
use crate::expectation::{Delegate, Expectation, ResultDescriptor};
use crate::metrics::ArenaMetrics;
use crate::store::ExpectationStore;

/// Where the selection step attributed a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Matched(ExpectationId),
    Unmatched,
    /// The call skipped over a strict expectation whose minimum is unmet.
    OrderViolation { expected: ExpectationId },
}

/// A call as delivered by the interception layer.
#[derive(Debug, Clone)]
pub(crate) struct InterceptedCall {
    pub type_sig: TypeSig,
    pub method: MethodSig,
    pub instance: Option<InstanceToken>,
    pub args: Args,
    pub thread: ThreadId,
}

/// What the arena must do once the lock is released.
pub(crate) enum Dispatch {
    Done(Outcome),
    /// Run the delegate outside the lock. The invocation's seq has already
    /// been pushed on the calling thread's nested stack.
    Delegate {
        delegate: Delegate,
        invocation: Invocation,
    },
}

enum StrictWalk {
    Fit { position: usize, id: ExpectationId },
    Full(ExpectationId),
    Violation(ExpectationId),
    NotReached,
}

/// Selects the expectation a call is attributed to.
///
/// Moves the strict cursor when a strict expectation is matched.
pub fn select(
    store: &mut ExpectationStore,
    type_sig: &TypeSig,
    method: &MethodSig,
    instance: Option<InstanceToken>,
    args: &[Value],
) -> Selection {
    let mut candidates: Vec<&Expectation> = store
        .expectations_for(type_sig, method, instance)
        .filter(|e| e.pattern().accepts_args(args))
        .collect();
    if candidates.iter().any(|e| e.pattern().is_instance_bound()) {
        candidates.retain(|e| e.pattern().is_instance_bound());
    }
    if candidates.is_empty() {
        trace!(method = %method, "no candidate expectation");
        return Selection::Unmatched;
    }

    let strict_ids: Vec<ExpectationId> = candidates
        .iter()
        .filter(|e| e.is_strict())
        .map(|e| e.id())
        .collect();
    let loose = candidates
        .iter()
        .filter(|e| !e.is_strict())
        .min_by_key(|e| (!e.has_capacity(), e.pattern().wildcard_count(), e.id()))
        .map(|e| (e.id(), e.has_capacity()));
    trace!(
        method = %method,
        candidates = candidates.len(),
        strict = strict_ids.len(),
        "selecting expectation"
    );

    if strict_ids.is_empty() {
        return loose.map_or(Selection::Unmatched, |(id, _)| Selection::Matched(id));
    }

    match (walk_strict(store, &strict_ids), loose) {
        (StrictWalk::Fit { position, id }, _) => {
            store.set_strict_cursor(position);
            Selection::Matched(id)
        }
        (_, Some((id, true))) => Selection::Matched(id),
        (StrictWalk::Full(id), _) => Selection::Matched(id),
        (StrictWalk::Violation(expected), _) => Selection::OrderViolation { expected },
        (StrictWalk::NotReached, _) => {
            // Only strict expectations already passed over accept the call.
            let expected = store
                .strict_order()
                .get(store.strict_cursor())
                .copied()
                .unwrap_or(strict_ids[0]);
            Selection::OrderViolation { expected }
        }
    }
}

fn walk_strict(store: &ExpectationStore, candidates: &[ExpectationId]) -> StrictWalk {
    let order = store.strict_order();
    let mut full = None;
    for (position, id) in order.iter().enumerate().skip(store.strict_cursor()) {
        let Some(expectation) = store.get(*id) else {
            continue;
        };
        if candidates.contains(id) {
            if expectation.has_capacity() {
                return StrictWalk::Fit { position, id: *id };
            }
            full.get_or_insert(*id);
            continue;
        }
        if !expectation.is_satisfied() {
            return match full {
                Some(id) => StrictWalk::Full(id),
                None => StrictWalk::Violation(*id),
            };
        }
    }
    match full {
        Some(id) => StrictWalk::Full(id),
        None => StrictWalk::NotReached,
    }
}

/// Replays one call under the arena lock.
pub(crate) fn replay(
    state: &mut ArenaState,
    config: &ArenaConfig,
    metrics: &ArenaMetrics,
    call: InterceptedCall,
) -> ArenaResult<Dispatch> {
    if call.args.len() != call.method.arity() {
        return Err(VerificationError::illegal_state(format!(
            "{}#{} intercepted with {} argument(s)",
            call.type_sig.simple_name(),
            call.method,
            call.args.len()
        )));
    }
    if state.phase == Phase::Recording {
        info!(arena = %state.arena_id, "entering replay phase");
        state.phase = Phase::Replay;
    }

    let seq = state.log.next_seq();
    let parent = state
        .nested
        .get(&call.thread)
        .and_then(|stack| stack.last().copied());

    let selection = select(
        &mut state.store,
        &call.type_sig,
        &call.method,
        call.instance,
        &call.args,
    );

    let mut matched = None;
    let mut result = None;
    let mut overflowed = None;
    let mut out_of_order = None;
    match selection {
        Selection::Matched(id) => {
            let expectation = state.store.get_mut(id)?;
            expectation.claim(seq);
            if expectation.is_overflowed() {
                overflowed = Some(id);
            }
            result = expectation.next_result();
            matched = Some(id);
        }
        Selection::OrderViolation { expected } => out_of_order = Some(expected),
        Selection::Unmatched => {}
    }
    metrics.record_invocation(matched.is_some());

    let invocation = Invocation::new(
        seq,
        call.type_sig,
        call.method,
        call.args,
        call.instance,
        ThreadTag::current(),
        matched,
        parent,
    );
    debug!(
        seq,
        call = %invocation.describe(),
        matched = ?matched,
        parent = ?parent,
        "replayed invocation"
    );
    state.log.append(invocation.clone());

    let failure = match (overflowed, out_of_order) {
        (Some(id), _) => {
            metrics.record_overflow();
            Some(unexpected(state, UnexpectedKind::Overflow, id, &invocation))
        }
        (None, Some(id)) => {
            metrics.record_ordering_failure();
            Some(unexpected(state, UnexpectedKind::OutOfOrder, id, &invocation))
        }
        (None, None) => None,
    };
    if let Some(err) = failure {
        warn!(
            seq,
            code = err.kind().code_string(),
            fail_fast = config.fail_fast,
            error = %err,
            "invocation failed expectation"
        );
        if config.fail_fast {
            state.delivered.push((call.thread, err.clone()));
            return Err(err);
        }
        state.held.push(err);
    }

    match result {
        Some(ResultDescriptor::Return(value)) => Ok(Dispatch::Done(Outcome::ReturnValue(value))),
        Some(ResultDescriptor::Throw(thrown)) => Ok(Dispatch::Done(Outcome::Throw(thrown))),
        Some(ResultDescriptor::Delegate(delegate)) => {
            let stack = state.nested.entry(call.thread).or_default();
            if stack.len() >= config.max_delegate_depth {
                if stack.is_empty() {
                    state.nested.remove(&call.thread);
                }
                return Err(VerificationError::illegal_state(format!(
                    "delegate nesting exceeds the configured depth of {} at {}",
                    config.max_delegate_depth,
                    invocation.describe()
                )));
            }
            stack.push(seq);
            Ok(Dispatch::Delegate {
                delegate,
                invocation,
            })
        }
        None => Ok(Dispatch::Done(default_outcome(
            state, config, metrics, &invocation,
        ))),
    }
}

fn unexpected(
    state: &ArenaState,
    kind: UnexpectedKind,
    id: ExpectationId,
    invocation: &Invocation,
) -> VerificationError {
    let expectation = state.store.get(id);
    UnexpectedInvocation {
        kind,
        invocation: InvocationSummary::from(invocation),
        expected: expectation.map(|e| e.pattern().describe()),
        bounds: match kind {
            UnexpectedKind::Overflow => expectation.map(|e| e.bounds()),
            _ => None,
        },
        actual: expectation.map_or(0, |e| e.count()),
        message: expectation.and_then(|e| e.message().map(str::to_string)),
    }
    .into()
}

/// Type default, or a cascaded instance for mockable return types.
fn default_outcome(
    state: &mut ArenaState,
    config: &ArenaConfig,
    metrics: &ArenaMetrics,
    invocation: &Invocation,
) -> Outcome {
    let returns = &invocation.method().returns;
    let target = match returns.cascade_target() {
        Some(target) if config.cascading => target.clone(),
        _ => return Outcome::ReturnValue(returns.default_value()),
    };

    let key = match invocation.matched() {
        Some(id) => CascadeKey::Expectation(id),
        None => CascadeKey::CallSite {
            type_sig: invocation.type_sig().clone(),
            method: invocation.method().clone(),
            instance: invocation.instance(),
        },
    };
    let ArenaState {
        cascades,
        instances,
        next_instance,
        ..
    } = state;
    let resolution = cascades.resolve(key, invocation.args(), || {
        mint_instance(next_instance, instances, target)
    });
    metrics.record_cascade(matches!(resolution, Resolution::Minted(_)));
    trace!(seq = invocation.seq(), token = %resolution.token(), "cascaded return value");
    Outcome::CascadeToken(resolution.token())
}

pub(crate) fn mint_instance(
    next: &mut u64,
    instances: &mut BTreeMap<InstanceToken, TypeSig>,
    type_sig: TypeSig,
) -> InstanceToken {
    *next += 1;
    let token = InstanceToken::new(*next);
    instances.insert(token, type_sig);
    token
}
