//! The immutable record of one intercepted call.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::instance::InstanceToken;
use crate::signature::{MethodSig, TypeSig};
use crate::value::Value;

/// Argument list. Most intercepted methods take few arguments.
pub type Args = SmallVec<[Value; 4]>;

/// Recording-order index of an expectation within one arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectationId(pub u32);

impl fmt::Display for ExpectationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expectation#{}", self.0)
    }
}

/// Identity of the thread that made a call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadTag(String);

impl ThreadTag {
    /// Tag for the calling thread: its id, prefixed by its name when it has one.
    pub fn current() -> Self {
        let thread = std::thread::current();
        match thread.name() {
            Some(name) => Self(format!("{} ({:?})", name, thread.id())),
            None => Self(format!("{:?}", thread.id())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ThreadTag {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// One intercepted call, in arrival order.
///
/// Built by the arena under its lock and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    seq: u64,
    type_sig: TypeSig,
    method: MethodSig,
    args: Args,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instance: Option<InstanceToken>,
    thread: ThreadTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    matched: Option<ExpectationId>,
    /// Sequence number of the delegate invocation this call was made from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<u64>,
}

impl Invocation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seq: u64,
        type_sig: TypeSig,
        method: MethodSig,
        args: Args,
        instance: Option<InstanceToken>,
        thread: ThreadTag,
        matched: Option<ExpectationId>,
        parent: Option<u64>,
    ) -> Self {
        Self {
            seq,
            type_sig,
            method,
            args,
            instance,
            thread,
            matched,
            parent,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn type_sig(&self) -> &TypeSig {
        &self.type_sig
    }

    pub fn method(&self) -> &MethodSig {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn instance(&self) -> Option<InstanceToken> {
        self.instance
    }

    pub fn thread(&self) -> &ThreadTag {
        &self.thread
    }

    pub fn matched(&self) -> Option<ExpectationId> {
        self.matched
    }

    pub fn parent(&self) -> Option<u64> {
        self.parent
    }

    /// Renders `Type#method(params)` followed by the argument values.
    pub fn describe(&self) -> String {
        let mut out = format!("{}#{}", self.type_sig.simple_name(), self.method);
        if let Some(instance) = self.instance {
            out.push_str(&format!(" on {}", instance));
        }
        if !self.args.is_empty() {
            let rendered: Vec<String> = self.args.iter().map(ToString::to_string).collect();
            out.push_str(&format!("\n   with arguments: {}", rendered.join(", ")));
        }
        out
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.seq, self.describe())
    }
}
