//! Argument matchers.
//!
//! A closed set of predicates over [`Value`]s. Adding a kind means adding a
//! variant and an arm in [`ArgumentMatcher::matches`]; there is no open
//! extension point besides [`ArgumentMatcher::Predicate`].

use mock_arena_types::{Value, ValueKind};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::errors::{ArenaResult, VerificationError};

#[derive(Clone)]
pub enum ArgumentMatcher {
    /// Structural equality; instance tokens compare by identity.
    Equal(Value),
    /// Any value of the given runtime kind.
    AnyOf(ValueKind),
    /// Anything at all, including null.
    Any,
    /// Numeric value within an absolute `delta` of `expected`.
    Near { expected: f64, delta: f64 },
    Prefix(String),
    Suffix(String),
    Substring(String),
    Null,
    NotNull,
    NotEqual(Value),
    /// Text value matched in full by a regular expression.
    Matches(FullMatch),
    Predicate(ArgPredicate),
}

/// A regular expression anchored at both ends.
#[derive(Clone)]
pub struct FullMatch {
    pattern: String,
    regex: Regex,
}

impl FullMatch {
    pub fn new(pattern: &str) -> ArenaResult<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            VerificationError::illegal_state(format!("invalid argument pattern /{}/: {}", pattern, e))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Test-supplied predicate with a description used in failure messages.
#[derive(Clone)]
pub struct ArgPredicate {
    description: String,
    test: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl ArgPredicate {
    pub fn new<F>(description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            test: Arc::new(test),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl ArgumentMatcher {
    pub fn equal(value: impl Into<Value>) -> Self {
        ArgumentMatcher::Equal(value.into())
    }

    pub fn not_equal(value: impl Into<Value>) -> Self {
        ArgumentMatcher::NotEqual(value.into())
    }

    pub fn near(expected: f64, delta: f64) -> Self {
        ArgumentMatcher::Near { expected, delta }
    }

    pub fn prefix(s: impl Into<String>) -> Self {
        ArgumentMatcher::Prefix(s.into())
    }

    pub fn suffix(s: impl Into<String>) -> Self {
        ArgumentMatcher::Suffix(s.into())
    }

    pub fn substring(s: impl Into<String>) -> Self {
        ArgumentMatcher::Substring(s.into())
    }

    /// Fails with `IllegalState` if the pattern does not compile.
    pub fn regex(pattern: &str) -> ArenaResult<Self> {
        Ok(ArgumentMatcher::Matches(FullMatch::new(pattern)?))
    }

    /// Predicates run while the arena is locked; they must not call back into it.
    pub fn predicate<F>(description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        ArgumentMatcher::Predicate(ArgPredicate::new(description, test))
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ArgumentMatcher::Equal(expected) => value == expected,
            ArgumentMatcher::AnyOf(kind) => value.kind() == *kind,
            ArgumentMatcher::Any => true,
            ArgumentMatcher::Near { expected, delta } => value
                .as_f64()
                .is_some_and(|actual| (actual - expected).abs() <= *delta),
            ArgumentMatcher::Prefix(p) => value.as_str().is_some_and(|s| s.starts_with(p.as_str())),
            ArgumentMatcher::Suffix(p) => value.as_str().is_some_and(|s| s.ends_with(p.as_str())),
            ArgumentMatcher::Substring(p) => value.as_str().is_some_and(|s| s.contains(p.as_str())),
            ArgumentMatcher::Null => value.is_null(),
            ArgumentMatcher::NotNull => !value.is_null(),
            ArgumentMatcher::NotEqual(other) => value != other,
            ArgumentMatcher::Matches(re) => value.as_str().is_some_and(|s| re.is_match(s)),
            ArgumentMatcher::Predicate(p) => (p.test)(value),
        }
    }

    /// Wildcards lower an expectation's specificity during selection.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, ArgumentMatcher::Any | ArgumentMatcher::AnyOf(_))
    }
}

/// Position-wise match of a matcher list against an argument list.
///
/// Arity was validated when the list was recorded, so a mismatch here is a bug
/// in the caller.
pub fn matches_all(matchers: &[ArgumentMatcher], args: &[Value]) -> bool {
    debug_assert_eq!(matchers.len(), args.len(), "matcher arity mismatch");
    matchers.len() == args.len() && matchers.iter().zip(args).all(|(m, v)| m.matches(v))
}

pub fn wildcard_count(matchers: &[ArgumentMatcher]) -> usize {
    matchers.iter().filter(|m| m.is_wildcard()).count()
}

impl fmt::Display for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentMatcher::Equal(v) => write!(f, "{}", v),
            ArgumentMatcher::AnyOf(kind) => write!(f, "any {}", kind),
            ArgumentMatcher::Any => f.write_str("any"),
            ArgumentMatcher::Near { expected, delta } => {
                write!(f, "a number within {:?} of {:?}", delta, expected)
            }
            ArgumentMatcher::Prefix(p) => write!(f, "a string starting with {:?}", p),
            ArgumentMatcher::Suffix(p) => write!(f, "a string ending with {:?}", p),
            ArgumentMatcher::Substring(p) => write!(f, "a string containing {:?}", p),
            ArgumentMatcher::Null => f.write_str("null"),
            ArgumentMatcher::NotNull => f.write_str("not null"),
            ArgumentMatcher::NotEqual(v) => write!(f, "not {}", v),
            ArgumentMatcher::Matches(re) => write!(f, "a string matching /{}/", re.pattern()),
            ArgumentMatcher::Predicate(p) => f.write_str(p.description()),
        }
    }
}

impl fmt::Debug for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArgumentMatcher({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_arena_types::InstanceToken;

    #[test]
    fn test_equal_is_structural() {
        let m = ArgumentMatcher::equal(vec![Value::from(1), Value::from("a")]);
        assert!(m.matches(&Value::List(vec![Value::Int(1), Value::Text("a".into())])));
        assert!(!m.matches(&Value::List(vec![Value::Int(1)])));
    }

    #[test]
    fn test_instance_identity() {
        let m = ArgumentMatcher::equal(InstanceToken::new(4));
        assert!(m.matches(&Value::Instance(InstanceToken::new(4))));
        assert!(!m.matches(&Value::Instance(InstanceToken::new(5))));
    }

    #[test]
    fn test_any_of_kind() {
        let m = ArgumentMatcher::AnyOf(ValueKind::Int);
        assert!(m.matches(&Value::Int(-3)));
        assert!(!m.matches(&Value::Float(1.0)));
        assert!(!m.matches(&Value::Null));
        assert!(ArgumentMatcher::Any.matches(&Value::Null));
    }

    #[test]
    fn test_near() {
        let m = ArgumentMatcher::near(10.0, 0.5);
        assert!(m.matches(&Value::Float(10.4)));
        assert!(m.matches(&Value::Int(10)));
        assert!(!m.matches(&Value::Float(10.6)));
        assert!(!m.matches(&Value::from("10")));
    }

    #[test]
    fn test_string_matchers() {
        let v = Value::from("order-1234");
        assert!(ArgumentMatcher::prefix("order-").matches(&v));
        assert!(ArgumentMatcher::suffix("34").matches(&v));
        assert!(ArgumentMatcher::substring("r-12").matches(&v));
        assert!(!ArgumentMatcher::prefix("x").matches(&v));
        assert!(!ArgumentMatcher::prefix("").matches(&Value::Int(1)));
    }

    #[test]
    fn test_null_and_not_equal() {
        assert!(ArgumentMatcher::Null.matches(&Value::Null));
        assert!(!ArgumentMatcher::Null.matches(&Value::Int(0)));
        assert!(ArgumentMatcher::NotNull.matches(&Value::Int(0)));
        assert!(ArgumentMatcher::not_equal(3).matches(&Value::Int(4)));
        assert!(!ArgumentMatcher::not_equal(3).matches(&Value::Int(3)));
    }

    #[test]
    fn test_regex_is_anchored() {
        let m = ArgumentMatcher::regex(r"[a-z]+\d").unwrap();
        assert!(m.matches(&Value::from("abc1")));
        assert!(!m.matches(&Value::from("abc12")));
        assert!(!m.matches(&Value::from("xabc1 ")));
        assert!(ArgumentMatcher::regex("(").unwrap_err().is_illegal_state());
    }

    #[test]
    fn test_predicate_and_display() {
        let even = ArgumentMatcher::predicate("an even number", |v| {
            matches!(v, Value::Int(i) if i % 2 == 0)
        });
        assert!(even.matches(&Value::Int(8)));
        assert!(!even.matches(&Value::Int(7)));
        assert_eq!(even.to_string(), "an even number");
        assert_eq!(ArgumentMatcher::prefix("ab").to_string(), "a string starting with \"ab\"");
    }

    #[test]
    fn test_matches_all_positionwise() {
        let ms = vec![ArgumentMatcher::equal(1), ArgumentMatcher::Any];
        assert!(matches_all(&ms, &[Value::Int(1), Value::Null]));
        assert!(!matches_all(&ms, &[Value::Null, Value::Int(1)]));
        assert_eq!(wildcard_count(&ms), 1);
    }
}
