//! The per-arena invocation log and verification claims.

use mock_arena_types::Invocation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marks an invocation as accounted for by a verify statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationClaim {
    pub seq: u64,
    /// Index of the verification block, in evaluation order.
    pub block: u32,
    /// Index of the statement within its block.
    pub statement: usize,
}

#[derive(Debug, Default)]
pub struct InvocationLog {
    entries: Vec<Invocation>,
    claims: BTreeMap<u64, VerificationClaim>,
}

impl InvocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next appended invocation must carry. Starts at 1.
    pub fn next_seq(&self) -> u64 {
        self.entries.len() as u64 + 1
    }

    pub fn append(&mut self, invocation: Invocation) {
        debug_assert_eq!(invocation.seq(), self.next_seq());
        self.entries.push(invocation);
    }

    pub fn entries(&self) -> &[Invocation] {
        &self.entries
    }

    pub fn get(&self, seq: u64) -> Option<&Invocation> {
        seq.checked_sub(1).and_then(|i| self.entries.get(i as usize))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_claimed(&self, seq: u64) -> bool {
        self.claims.contains_key(&seq)
    }

    /// Records a claim. Claims are set-once: returns false if `seq` was
    /// already claimed.
    pub fn claim(&mut self, claim: VerificationClaim) -> bool {
        if self.claims.contains_key(&claim.seq) {
            return false;
        }
        self.claims.insert(claim.seq, claim);
        true
    }

    pub fn claims(&self) -> impl Iterator<Item = &VerificationClaim> {
        self.claims.values()
    }
}
