//! Cascaded instance bindings.
//!
//! A call returning a mockable type with no recorded result gets a mock
//! instance token. Tokens are bound per call site so that repeated ambiguous
//! calls (`a.getB()` twice) observe the same instance, while calls with
//! distinguishing arguments get distinct ones.

use mock_arena_types::{ExpectationId, InstanceToken, MethodSig, TypeSig, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CascadeKey {
    /// The call matched an expectation that had no result to give.
    Expectation(ExpectationId),
    /// The call matched nothing.
    CallSite {
        type_sig: TypeSig,
        method: MethodSig,
        instance: Option<InstanceToken>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Reused(InstanceToken),
    Minted(InstanceToken),
}

impl Resolution {
    pub fn token(self) -> InstanceToken {
        match self {
            Resolution::Reused(t) | Resolution::Minted(t) => t,
        }
    }
}

#[derive(Debug)]
struct Binding {
    snapshots: Vec<(Vec<Value>, InstanceToken)>,
    last: InstanceToken,
}

#[derive(Debug, Default)]
pub struct CascadeBindings {
    bindings: HashMap<CascadeKey, Binding>,
}

impl CascadeBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for `key` given the call's argument snapshot.
    ///
    /// An empty snapshot reuses the last token bound to the key. A snapshot
    /// seen before reuses its token. Anything else mints through `mint`.
    pub fn resolve(
        &mut self,
        key: CascadeKey,
        snapshot: &[Value],
        mint: impl FnOnce() -> InstanceToken,
    ) -> Resolution {
        if let Some(binding) = self.bindings.get_mut(&key) {
            if snapshot.is_empty() {
                return Resolution::Reused(binding.last);
            }
            if let Some((_, token)) = binding.snapshots.iter().find(|(s, _)| s == snapshot) {
                return Resolution::Reused(*token);
            }
            let token = mint();
            binding.snapshots.push((snapshot.to_vec(), token));
            binding.last = token;
            return Resolution::Minted(token);
        }

        let token = mint();
        self.bindings.insert(
            key,
            Binding {
                snapshots: vec![(snapshot.to_vec(), token)],
                last: token,
            },
        );
        Resolution::Minted(token)
    }

    pub fn len(&self) -> usize {
        self.bindings.values().map(|b| b.snapshots.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
