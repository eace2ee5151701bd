//! The arena: all state for one test execution behind a single lock.
//!
//! An arena moves through three phases:
//!
//! ```text
//! Recording ──(first intercepted call or end of an expectation block)──▶ Replay
//! Replay    ──(first verification block)──────────────────────────────▶ Verification
//! ```
//!
//! Expectation blocks are accepted until verification begins. Intercepted
//! calls are accepted in every phase and always appended to the same log.

use chrono::{DateTime, Utc};
use mock_arena_types::{
    ExpectationId, InstanceToken, Invocation, MethodSig, Thrown, TypeSig, Value,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::thread::ThreadId;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cascade::CascadeBindings;
use crate::config::ArenaConfig;
use crate::engine::{self, Dispatch, InterceptedCall};
use crate::errors::{ArenaResult, MissingInvocation, VerificationError};
use crate::expectation::{Delegate, DelegateCall};
use crate::log::InvocationLog;
use crate::metrics::ArenaMetrics;
use crate::recording::RecordingBlock;
use crate::report::{ArenaReport, ExpectationSummary};
use crate::store::ExpectationStore;
use crate::verification::{self, BlockReport, VerificationBlock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Recording,
    Replay,
    Verification,
}

/// Instruction handed back to the interception layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    ReturnValue(Value),
    Throw(Thrown),
    /// Return this mock instance.
    CascadeToken(InstanceToken),
}

impl Outcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::ReturnValue(v) => Some(v),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<InstanceToken> {
        match self {
            Outcome::CascadeToken(t) => Some(*t),
            Outcome::ReturnValue(Value::Instance(t)) => Some(*t),
            _ => None,
        }
    }

    pub fn thrown(&self) -> Option<&Thrown> {
        match self {
            Outcome::Throw(t) => Some(t),
            _ => None,
        }
    }
}

pub(crate) struct ArenaState {
    pub(crate) arena_id: Uuid,
    pub(crate) phase: Phase,
    pub(crate) store: ExpectationStore,
    pub(crate) log: InvocationLog,
    pub(crate) cascades: CascadeBindings,
    pub(crate) instances: BTreeMap<InstanceToken, TypeSig>,
    pub(crate) next_instance: u64,
    /// Failures not raised at the call (fail-fast disabled).
    pub(crate) held: Vec<VerificationError>,
    /// Failures raised at the call, with the thread that received them.
    pub(crate) delivered: Vec<(ThreadId, VerificationError)>,
    /// Per-thread stack of delegate invocations currently running.
    pub(crate) nested: HashMap<ThreadId, Vec<u64>>,
    pub(crate) blocks_evaluated: u32,
}

/// Shared state of one test execution.
///
/// Create one per test and drop it at the end. The arena is `Sync`: calls
/// may arrive from any thread, and sequence numbers follow lock acquisition.
pub struct Arena {
    id: Uuid,
    created_at: DateTime<Utc>,
    owner: ThreadId,
    config: ArenaConfig,
    metrics: ArenaMetrics,
    state: Mutex<ArenaState>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    pub fn with_config(config: ArenaConfig) -> Self {
        let id = Uuid::new_v4();
        debug!(arena = %id, ?config, "created arena");
        Self {
            id,
            created_at: Utc::now(),
            owner: std::thread::current().id(),
            config,
            metrics: ArenaMetrics::default(),
            state: Mutex::new(ArenaState {
                arena_id: id,
                phase: Phase::Recording,
                store: ExpectationStore::new(),
                log: InvocationLog::new(),
                cascades: CascadeBindings::new(),
                instances: BTreeMap::new(),
                next_instance: 0,
                held: Vec::new(),
                delivered: Vec::new(),
                nested: HashMap::new(),
                blocks_evaluated: 0,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ArenaMetrics {
        &self.metrics
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// Mints a token for an explicitly created mock instance.
    pub fn new_instance(&self, type_sig: impl Into<TypeSig>) -> InstanceToken {
        let mut state = self.state.lock();
        let ArenaState {
            instances,
            next_instance,
            ..
        } = &mut *state;
        engine::mint_instance(next_instance, instances, type_sig.into())
    }

    /// Declared type of a token minted by this arena.
    pub fn instance_type(&self, token: InstanceToken) -> Option<TypeSig> {
        self.state.lock().instances.get(&token).cloned()
    }

    /// Records a block of non-strict expectations.
    pub fn expectations<F>(&self, f: F) -> ArenaResult<Vec<ExpectationId>>
    where
        F: FnOnce(&mut RecordingBlock) -> ArenaResult<()>,
    {
        self.record_block(false, f)
    }

    /// Records a block of strict expectations: they must be met in order.
    pub fn strict_expectations<F>(&self, f: F) -> ArenaResult<Vec<ExpectationId>>
    where
        F: FnOnce(&mut RecordingBlock) -> ArenaResult<()>,
    {
        self.record_block(true, f)
    }

    fn record_block<F>(&self, strict: bool, f: F) -> ArenaResult<Vec<ExpectationId>>
    where
        F: FnOnce(&mut RecordingBlock) -> ArenaResult<()>,
    {
        self.ensure_recording_allowed(&self.state.lock())?;
        let mut block = RecordingBlock::new(strict);
        f(&mut block)?;

        let mut state = self.state.lock();
        self.ensure_recording_allowed(&state)?;
        let ids = block
            .into_drafts()
            .into_iter()
            .map(|draft| state.store.record(draft))
            .collect::<ArenaResult<Vec<_>>>()?;
        if state.phase == Phase::Recording {
            info!(arena = %self.id, expectations = ids.len(), strict, "entering replay phase");
            state.phase = Phase::Replay;
        } else {
            debug!(arena = %self.id, expectations = ids.len(), strict, "recorded expectations");
        }
        Ok(ids)
    }

    fn ensure_recording_allowed(&self, state: &ArenaState) -> ArenaResult<()> {
        if state.phase == Phase::Verification {
            return Err(VerificationError::illegal_state(
                "expectations cannot be recorded after verification has begun",
            ));
        }
        Ok(())
    }

    /// Entry point for the interception layer.
    ///
    /// Matches the call, applies cardinality checks and returns what the
    /// intercepted call site must do. Delegates run outside the lock and may
    /// call back into the arena.
    pub fn on_intercepted_call<I>(
        &self,
        type_sig: &TypeSig,
        method: &MethodSig,
        instance: Option<InstanceToken>,
        args: I,
    ) -> ArenaResult<Outcome>
    where
        I: IntoIterator<Item = Value>,
    {
        let thread = std::thread::current().id();
        let call = InterceptedCall {
            type_sig: type_sig.clone(),
            method: method.clone(),
            instance,
            args: args.into_iter().collect(),
            thread,
        };
        let dispatch = {
            let mut state = self.state.lock();
            engine::replay(&mut state, &self.config, &self.metrics, call)?
        };
        match dispatch {
            Dispatch::Done(outcome) => Ok(outcome),
            Dispatch::Delegate {
                delegate,
                invocation,
            } => Ok(self.run_delegate(&delegate, &invocation, thread)),
        }
    }

    fn run_delegate(&self, delegate: &Delegate, invocation: &Invocation, thread: ThreadId) -> Outcome {
        let _frame = NestedFrame {
            arena: self,
            thread,
        };
        self.metrics.record_delegate_run();
        let call = DelegateCall {
            arena: self,
            invocation,
        };
        match delegate.call(&call) {
            Ok(value) => Outcome::ReturnValue(value),
            Err(thrown) => Outcome::Throw(thrown),
        }
    }

    /// Unordered verification: every statement must find its calls somewhere.
    pub fn verifications<F>(&self, f: F) -> ArenaResult<BlockReport>
    where
        F: FnOnce(&mut VerificationBlock) -> ArenaResult<()>,
    {
        self.verify_block(VerificationBlock::unordered(), f)
    }

    /// Statements must be satisfied by calls in increasing sequence order.
    pub fn verifications_in_order<F>(&self, f: F) -> ArenaResult<BlockReport>
    where
        F: FnOnce(&mut VerificationBlock) -> ArenaResult<()>,
    {
        self.verify_block(VerificationBlock::ordered(), f)
    }

    /// Unordered, and no call may be left unaccounted for.
    pub fn full_verifications<F>(&self, f: F) -> ArenaResult<BlockReport>
    where
        F: FnOnce(&mut VerificationBlock) -> ArenaResult<()>,
    {
        self.verify_block(VerificationBlock::full(), f)
    }

    pub fn full_verifications_in_order<F>(&self, f: F) -> ArenaResult<BlockReport>
    where
        F: FnOnce(&mut VerificationBlock) -> ArenaResult<()>,
    {
        self.verify_block(VerificationBlock::full_ordered(), f)
    }

    /// Evaluates a preconfigured block (mode, restriction, iterations).
    ///
    /// Before the statements are evaluated, any held overflow or ordering
    /// failure is raised, then the first expectation whose minimum is unmet.
    pub fn verify_block<F>(&self, mut block: VerificationBlock, f: F) -> ArenaResult<BlockReport>
    where
        F: FnOnce(&mut VerificationBlock) -> ArenaResult<()>,
    {
        f(&mut block)?;

        let mut state = self.state.lock();
        if state.phase != Phase::Verification {
            info!(arena = %self.id, "entering verification phase");
            state.phase = Phase::Verification;
        }
        if let Some(err) = self.pending_failure(&mut state, false) {
            return Err(err);
        }
        let index = state.blocks_evaluated;
        state.blocks_evaluated += 1;
        let report = verification::evaluate(&block, index, &mut state.log)?;
        self.metrics
            .record_verification_block(report.total_claimed() as u64);
        Ok(report)
    }

    /// End-of-test check.
    ///
    /// Reports, in order: held failures, failures delivered to threads other
    /// than the one that created the arena (a worker may have swallowed
    /// them), and expectations whose minimum is unmet.
    pub fn finish(&self) -> ArenaResult<()> {
        let mut state = self.state.lock();
        match self.pending_failure(&mut state, true) {
            Some(err) => Err(err),
            None => {
                debug!(arena = %self.id, invocations = state.log.len(), "arena finished cleanly");
                Ok(())
            }
        }
    }

    fn pending_failure(&self, state: &mut ArenaState, include_foreign: bool) -> Option<VerificationError> {
        if !state.held.is_empty() {
            return Some(state.held.remove(0));
        }
        if include_foreign {
            let owner = self.owner;
            if let Some(pos) = state.delivered.iter().position(|(t, _)| *t != owner) {
                let (_, err) = state.delivered.remove(pos);
                return Some(err);
            }
        }
        let unsatisfied = state.store.first_unsatisfied()?;
        let mut err = MissingInvocation::new(
            unsatisfied.pattern().describe(),
            unsatisfied.bounds(),
            unsatisfied.count(),
        );
        err.instead_got = verification::non_matching(&state.log, unsatisfied.pattern());
        err.message = unsatisfied.message().map(str::to_string);
        Some(err.into())
    }

    /// Snapshot of the invocation log.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().log.entries().to_vec()
    }

    /// Current count of the given expectation.
    pub fn invocation_count(&self, id: ExpectationId) -> Option<u32> {
        self.state.lock().store.get(id).map(|e| e.count())
    }

    pub fn report(&self) -> ArenaReport {
        let state = self.state.lock();
        ArenaReport {
            arena_id: self.id.to_string(),
            created_at: self.created_at,
            phase: state.phase,
            invocations: state.log.entries().to_vec(),
            expectations: state.store.iter().map(ExpectationSummary::from).collect(),
            claims: state.log.claims().copied().collect(),
            metrics: self.metrics.snapshot(),
        }
    }
}

/// Pops the calling thread's delegate frame when the delegate returns or
/// unwinds.
struct NestedFrame<'a> {
    arena: &'a Arena,
    thread: ThreadId,
}

impl Drop for NestedFrame<'_> {
    fn drop(&mut self) {
        let mut state = self.arena.state.lock();
        if let Some(stack) = state.nested.get_mut(&self.thread) {
            stack.pop();
            if stack.is_empty() {
                state.nested.remove(&self.thread);
            }
        }
    }
}
