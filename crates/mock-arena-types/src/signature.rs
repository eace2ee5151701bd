//! Declaring-type and method signatures.
//!
//! Signatures are supplied by the interception layer; nothing here discovers
//! them. A method signature carries its return type so the engine can produce
//! a type-appropriate default (or a cascaded instance) when no result was
//! recorded.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::Value;

/// Identity of a declaring type, e.g. `com.acme.Inventory`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeSig(String);

impl TypeSig {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, used when rendering call descriptions.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit(['.', ':']).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeSig {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeSig {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Declared return type of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReturnType {
    Void,
    Bool,
    Int,
    Float,
    Text,
    List,
    Map,
    /// Reference type. `mockable` marks types the interception layer can
    /// substitute, which makes them eligible for cascading.
    Object { type_sig: TypeSig, mockable: bool },
}

impl ReturnType {
    pub fn object(type_sig: impl Into<TypeSig>) -> Self {
        ReturnType::Object {
            type_sig: type_sig.into(),
            mockable: false,
        }
    }

    pub fn mockable(type_sig: impl Into<TypeSig>) -> Self {
        ReturnType::Object {
            type_sig: type_sig.into(),
            mockable: true,
        }
    }

    /// Value returned when nothing was recorded and no cascade applies.
    pub fn default_value(&self) -> Value {
        match self {
            ReturnType::Void => Value::Unit,
            ReturnType::Bool => Value::Bool(false),
            ReturnType::Int => Value::Int(0),
            ReturnType::Float => Value::Float(0.0),
            ReturnType::Text => Value::Null,
            ReturnType::List => Value::List(Vec::new()),
            ReturnType::Map => Value::Map(Default::default()),
            ReturnType::Object { .. } => Value::Null,
        }
    }

    /// Type to cascade into, if the return type is mockable.
    pub fn cascade_target(&self) -> Option<&TypeSig> {
        match self {
            ReturnType::Object {
                type_sig,
                mockable: true,
            } => Some(type_sig),
            _ => None,
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => f.write_str("void"),
            ReturnType::Bool => f.write_str("bool"),
            ReturnType::Int => f.write_str("int"),
            ReturnType::Float => f.write_str("float"),
            ReturnType::Text => f.write_str("String"),
            ReturnType::List => f.write_str("List"),
            ReturnType::Map => f.write_str("Map"),
            ReturnType::Object { type_sig, .. } => f.write_str(type_sig.simple_name()),
        }
    }
}

/// Method name, parameter type names and return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    pub returns: ReturnType,
}

impl MethodSig {
    /// A no-argument method returning nothing.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: ReturnType::Void,
        }
    }

    pub fn param(mut self, type_name: impl Into<String>) -> Self {
        self.params.push(type_name.into());
        self
    }

    pub fn returns(mut self, returns: ReturnType) -> Self {
        self.returns = returns;
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_display() {
        let sig = MethodSig::new("transfer")
            .param("String")
            .param("long")
            .returns(ReturnType::Bool);
        assert_eq!(sig.to_string(), "transfer(String, long)");
        assert_eq!(sig.arity(), 2);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ReturnType::Void.default_value(), Value::Unit);
        assert_eq!(ReturnType::Int.default_value(), Value::Int(0));
        assert_eq!(ReturnType::List.default_value(), Value::List(vec![]));
        assert_eq!(ReturnType::Text.default_value(), Value::Null);
        assert_eq!(ReturnType::mockable("a.B").default_value(), Value::Null);
    }

    #[test]
    fn test_cascade_target_only_for_mockable() {
        assert_eq!(
            ReturnType::mockable("shop.Cart").cascade_target(),
            Some(&TypeSig::new("shop.Cart"))
        );
        assert_eq!(ReturnType::object("java.lang.Object").cascade_target(), None);
        assert_eq!(ReturnType::Int.cascade_target(), None);
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(TypeSig::new("com.acme.Inventory").simple_name(), "Inventory");
        assert_eq!(TypeSig::new("shop::Cart").simple_name(), "Cart");
        assert_eq!(TypeSig::new("Plain").simple_name(), "Plain");
    }
}
