//! Counters for one arena's replay and verification activity.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Thread-safe counters. Clones share the same underlying values.
#[derive(Debug, Clone, Default)]
pub struct ArenaMetrics {
    /// Intercepted calls appended to the log
    pub invocations: Arc<AtomicU64>,
    /// Calls attributed to an expectation
    pub matched: Arc<AtomicU64>,
    /// Calls no expectation accepted
    pub unmatched: Arc<AtomicU64>,
    pub cascades_minted: Arc<AtomicU64>,
    pub cascades_reused: Arc<AtomicU64>,
    pub delegates_run: Arc<AtomicU64>,
    pub overflow_failures: Arc<AtomicU64>,
    pub ordering_failures: Arc<AtomicU64>,
    pub verification_blocks: Arc<AtomicU64>,
    /// Invocations claimed by verify statements
    pub verification_claims: Arc<AtomicU64>,
}

impl ArenaMetrics {
    pub fn record_invocation(&self, matched: bool) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        if matched {
            self.matched.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unmatched.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_cascade(&self, minted: bool) {
        if minted {
            self.cascades_minted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cascades_reused.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_delegate_run(&self) {
        self.delegates_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overflow(&self) {
        self.overflow_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ordering_failure(&self) {
        self.ordering_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_verification_block(&self, claims: u64) {
        self.verification_blocks.fetch_add(1, Ordering::Relaxed);
        self.verification_claims.fetch_add(claims, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invocations: self.invocations.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            unmatched: self.unmatched.load(Ordering::Relaxed),
            cascades_minted: self.cascades_minted.load(Ordering::Relaxed),
            cascades_reused: self.cascades_reused.load(Ordering::Relaxed),
            delegates_run: self.delegates_run.load(Ordering::Relaxed),
            overflow_failures: self.overflow_failures.load(Ordering::Relaxed),
            ordering_failures: self.ordering_failures.load(Ordering::Relaxed),
            verification_blocks: self.verification_blocks.load(Ordering::Relaxed),
            verification_claims: self.verification_claims.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub invocations: u64,
    pub matched: u64,
    pub unmatched: u64,
    pub cascades_minted: u64,
    pub cascades_reused: u64,
    pub delegates_run: u64,
    pub overflow_failures: u64,
    pub ordering_failures: u64,
    pub verification_blocks: u64,
    pub verification_claims: u64,
}

impl MetricsSnapshot {
    /// Share of invocations attributed to an expectation.
    pub fn match_rate(&self) -> f64 {
        if self.invocations == 0 {
            return 0.0;
        }
        self.matched as f64 / self.invocations as f64
    }

    pub fn format_report(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Arena Metrics Report".to_string());
        lines.push("=".repeat(50));
        lines.push("Replay:".to_string());
        lines.push(format!("  Invocations:     {}", self.invocations));
        lines.push(format!("  Matched:         {}", self.matched));
        lines.push(format!("  Unmatched:       {}", self.unmatched));
        lines.push(format!("  Match Rate:      {:.1}%", self.match_rate() * 100.0));
        lines.push(format!("  Delegates Run:   {}", self.delegates_run));
        lines.push(String::new());
        lines.push("Cascading:".to_string());
        lines.push(format!("  Minted:          {}", self.cascades_minted));
        lines.push(format!("  Reused:          {}", self.cascades_reused));
        lines.push(String::new());
        lines.push("Failures:".to_string());
        lines.push(format!("  Overflow:        {}", self.overflow_failures));
        lines.push(format!("  Ordering:        {}", self.ordering_failures));
        lines.push(String::new());
        lines.push("Verification:".to_string());
        lines.push(format!("  Blocks:          {}", self.verification_blocks));
        lines.push(format!("  Claims:          {}", self.verification_claims));
        lines.join("\n")
    }
}
