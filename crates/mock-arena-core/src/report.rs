//! Serializable snapshot of an arena, for debugging failed tests.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mock_arena_types::{ExpectationId, Invocation};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::arena::Phase;
use crate::expectation::{Bounds, Expectation};
use crate::log::VerificationClaim;
use crate::metrics::MetricsSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationSummary {
    pub id: ExpectationId,
    pub pattern: String,
    pub strict: bool,
    pub bounds: Bounds,
    pub actual: u32,
    pub claimed: Vec<u64>,
    pub satisfied: bool,
}

impl From<&Expectation> for ExpectationSummary {
    fn from(e: &Expectation) -> Self {
        Self {
            id: e.id(),
            pattern: e.pattern().describe(),
            strict: e.is_strict(),
            bounds: e.bounds(),
            actual: e.count(),
            claimed: e.claimed().to_vec(),
            satisfied: e.is_satisfied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaReport {
    pub arena_id: String,
    pub created_at: DateTime<Utc>,
    pub phase: Phase,
    pub invocations: Vec<Invocation>,
    pub expectations: Vec<ExpectationSummary>,
    pub claims: Vec<VerificationClaim>,
    pub metrics: MetricsSnapshot,
}

impl ArenaReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize arena report")
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write arena report to {}", path.display()))
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read arena report from {}", path.display()))?;
        serde_json::from_str(&data).context("Failed to parse arena report")
    }

    pub fn unsatisfied(&self) -> impl Iterator<Item = &ExpectationSummary> {
        self.expectations.iter().filter(|e| !e.satisfied)
    }
}
