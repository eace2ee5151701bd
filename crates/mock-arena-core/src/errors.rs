//! Verification failures and API misuse errors.
//!
//! Every failure the engine reports falls into one of three kinds:
//!
//! ```text
//! E101 MissingInvocation     fewer matching calls than a declared minimum
//! E201 UnexpectedInvocation  overflow, ordering violation, or unverified call
//! E301 IllegalState          misuse of the recording/verification API
//! ```
//!
//! The rendered messages are stable: they name the expected call, its bounds,
//! the observed count and the literal argument values involved.

use mock_arena_types::{Invocation, Thrown, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expectation::Bounds;

pub type ArenaResult<T> = Result<T, VerificationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingInvocation,
    UnexpectedInvocation,
    IllegalState,
}

impl ErrorKind {
    pub fn code_string(&self) -> &'static str {
        match self {
            ErrorKind::MissingInvocation => "E101",
            ErrorKind::UnexpectedInvocation => "E201",
            ErrorKind::IllegalState => "E301",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MissingInvocation => "MissingInvocation",
            ErrorKind::UnexpectedInvocation => "UnexpectedInvocation",
            ErrorKind::IllegalState => "IllegalState",
        };
        f.write_str(name)
    }
}

/// A logged invocation as cited in an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationSummary {
    pub seq: u64,
    /// `Type#method(params)` plus argument values.
    pub description: String,
    pub args: Vec<Value>,
}

impl From<&Invocation> for InvocationSummary {
    fn from(inv: &Invocation) -> Self {
        Self {
            seq: inv.seq(),
            description: inv.describe(),
            args: inv.args().to_vec(),
        }
    }
}

/// Fewer matching invocations than the declared minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingInvocation {
    /// Rendered call pattern that was expected.
    pub expected: String,
    pub bounds: Bounds,
    pub actual: u32,
    /// Matching calls that occurred, but before the position an ordered
    /// block required.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub out_of_order: Vec<InvocationSummary>,
    /// Calls to the same method whose arguments did not match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instead_got: Vec<InvocationSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MissingInvocation {
    pub fn new(expected: impl Into<String>, bounds: Bounds, actual: u32) -> Self {
        Self {
            expected: expected.into(),
            bounds,
            actual,
            out_of_order: Vec::new(),
            instead_got: Vec::new(),
            message: None,
        }
    }

    pub fn missing(&self) -> u32 {
        self.bounds.min.saturating_sub(self.actual).max(1)
    }
}

impl fmt::Display for MissingInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            writeln!(f, "{}", msg)?;
        }
        match self.missing() {
            1 => writeln!(f, "Missing invocation to:")?,
            n => writeln!(f, "Missing {} invocations to:", n)?,
        }
        write!(f, "{}", self.expected)?;
        write!(f, "\n   expected {}, got {}", self.bounds, self.actual)?;
        write_summaries(f, "found out of order", &self.out_of_order)?;
        write_summaries(f, "instead got", &self.instead_got)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnexpectedKind {
    /// More matching calls than the maximum allows.
    Overflow,
    /// A strict expectation was skipped, or a call arrived after its turn.
    OutOfOrder,
    /// A full verification found a call nothing accounted for.
    Unverified,
}

/// A call that should not have happened where it did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnexpectedInvocation {
    pub kind: UnexpectedKind,
    pub invocation: InvocationSummary,
    /// Rendered pattern of the expectation or statement involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    pub actual: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl fmt::Display for UnexpectedInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            writeln!(f, "{}", msg)?;
        }
        match self.kind {
            UnexpectedKind::Overflow => {
                write!(f, "Unexpected invocation to:\n{}", self.invocation.description)?;
                if let Some(bounds) = &self.bounds {
                    write!(f, "\n   expected {}, got {}", bounds, self.actual)?;
                }
                if let Some(expected) = &self.expected {
                    write!(f, "\non expectation:\n{}", expected)?;
                }
                Ok(())
            }
            UnexpectedKind::OutOfOrder => {
                write!(f, "Unexpected invocation of:\n{}", self.invocation.description)?;
                if let Some(expected) = &self.expected {
                    write!(f, "\nwhen was expecting an invocation of:\n{}", expected)?;
                }
                Ok(())
            }
            UnexpectedKind::Unverified => {
                write!(f, "Unexpected invocation to:\n{}", self.invocation.description)
            }
        }
    }
}

/// Misuse of the API: nothing was wrong with the code under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IllegalState {
    pub message: String,
}

impl fmt::Display for IllegalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum VerificationError {
    MissingInvocation(MissingInvocation),
    UnexpectedInvocation(UnexpectedInvocation),
    IllegalState(IllegalState),
}

impl VerificationError {
    pub fn illegal_state(message: impl Into<String>) -> Self {
        VerificationError::IllegalState(IllegalState {
            message: message.into(),
        })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VerificationError::MissingInvocation(_) => ErrorKind::MissingInvocation,
            VerificationError::UnexpectedInvocation(_) => ErrorKind::UnexpectedInvocation,
            VerificationError::IllegalState(_) => ErrorKind::IllegalState,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, VerificationError::MissingInvocation(_))
    }

    pub fn is_unexpected(&self) -> bool {
        matches!(self, VerificationError::UnexpectedInvocation(_))
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, VerificationError::IllegalState(_))
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationError::MissingInvocation(e) => e.fmt(f),
            VerificationError::UnexpectedInvocation(e) => e.fmt(f),
            VerificationError::IllegalState(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for VerificationError {}

impl From<MissingInvocation> for VerificationError {
    fn from(e: MissingInvocation) -> Self {
        VerificationError::MissingInvocation(e)
    }
}

impl From<UnexpectedInvocation> for VerificationError {
    fn from(e: UnexpectedInvocation) -> Self {
        VerificationError::UnexpectedInvocation(e)
    }
}

/// Lets a delegate propagate a nested arena failure with `?`.
impl From<VerificationError> for Thrown {
    fn from(e: VerificationError) -> Self {
        Thrown::new(e.kind().to_string(), e.to_string())
    }
}

fn write_summaries(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    items: &[InvocationSummary],
) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    write!(f, "\n{}:", title)?;
    for item in items {
        write!(f, "\n{}", item.description)?;
    }
    Ok(())
}
