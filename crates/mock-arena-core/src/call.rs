//! Call patterns shared by expectations and verify statements.

use mock_arena_types::{InstanceToken, Invocation, MethodSig, TypeSig, Value, ValueKind};

use crate::errors::{ArenaResult, VerificationError};
use crate::matchers::{self, ArgumentMatcher};

/// A declaring type, method, optional instance and argument matchers.
///
/// An empty matcher list means the call was recorded bare: any arguments match.
#[derive(Debug, Clone)]
pub struct CallPattern {
    type_sig: TypeSig,
    method: MethodSig,
    instance: Option<InstanceToken>,
    matchers: Vec<ArgumentMatcher>,
}

impl CallPattern {
    pub fn new(type_sig: impl Into<TypeSig>, method: MethodSig) -> Self {
        Self {
            type_sig: type_sig.into(),
            method,
            instance: None,
            matchers: Vec::new(),
        }
    }

    /// Only calls on this instance match.
    pub fn on(mut self, instance: InstanceToken) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Next argument must equal `value`.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.matchers.push(ArgumentMatcher::Equal(value.into()));
        self
    }

    pub fn with(mut self, matcher: ArgumentMatcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn any(self) -> Self {
        self.with(ArgumentMatcher::Any)
    }

    pub fn any_of(self, kind: ValueKind) -> Self {
        self.with(ArgumentMatcher::AnyOf(kind))
    }

    pub fn type_sig(&self) -> &TypeSig {
        &self.type_sig
    }

    pub fn method(&self) -> &MethodSig {
        &self.method
    }

    pub fn instance(&self) -> Option<InstanceToken> {
        self.instance
    }

    pub fn matchers(&self) -> &[ArgumentMatcher] {
        &self.matchers
    }

    pub fn is_instance_bound(&self) -> bool {
        self.instance.is_some()
    }

    /// Rejects matcher lists whose length differs from the method's arity.
    pub fn validate(&self) -> ArenaResult<()> {
        if !self.matchers.is_empty() && self.matchers.len() != self.method.arity() {
            return Err(VerificationError::illegal_state(format!(
                "{} takes {} argument(s) but {} matcher(s) were given",
                self.describe_signature(),
                self.method.arity(),
                self.matchers.len()
            )));
        }
        Ok(())
    }

    /// Same declaring type and method, and a compatible instance.
    pub fn targets(
        &self,
        type_sig: &TypeSig,
        method: &MethodSig,
        instance: Option<InstanceToken>,
    ) -> bool {
        if &self.type_sig != type_sig || &self.method != method {
            return false;
        }
        match self.instance {
            Some(bound) => instance == Some(bound),
            None => true,
        }
    }

    pub fn accepts_args(&self, args: &[Value]) -> bool {
        self.matchers.is_empty() || matchers::matches_all(&self.matchers, args)
    }

    pub fn matches(&self, inv: &Invocation) -> bool {
        self.targets(inv.type_sig(), inv.method(), inv.instance()) && self.accepts_args(inv.args())
    }

    /// Wildcard positions; a bare pattern counts every position.
    pub fn wildcard_count(&self) -> usize {
        if self.matchers.is_empty() {
            self.method.arity()
        } else {
            matchers::wildcard_count(&self.matchers)
        }
    }

    fn describe_signature(&self) -> String {
        format!("{}#{}", self.type_sig.simple_name(), self.method)
    }

    /// Renders the pattern the way failure messages cite it.
    pub fn describe(&self) -> String {
        let mut out = self.describe_signature();
        if !self.matchers.is_empty() {
            let rendered: Vec<String> = self.matchers.iter().map(ToString::to_string).collect();
            out.push_str(&format!("\n   with arguments: {}", rendered.join(", ")));
        }
        if let Some(instance) = self.instance {
            out.push_str(&format!("\n   on mock instance: {}", instance));
        }
        out
    }
}
