//! Environment lookups for arena configuration.
//!
//! All knobs share a prefix (`MOCK_ARENA_` by default). Reads go through an
//! [`EnvReader`], which can be seeded with overrides so tests do not have to
//! mutate the process environment.

use std::collections::HashMap;
use std::str::FromStr;

/// Values treated as `true` by [`EnvReader::bool_or`].
const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];
/// Values treated as `false` by [`EnvReader::bool_or`].
const FALSY: [&str; 4] = ["0", "false", "no", "off"];

#[derive(Debug, Clone)]
pub struct EnvReader {
    prefix: String,
    overrides: HashMap<String, String>,
}

impl Default for EnvReader {
    fn default() -> Self {
        Self::with_prefix("MOCK_ARENA_")
    }
}

impl EnvReader {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: HashMap::new(),
        }
    }

    /// Shadow one key (unprefixed) with a fixed value.
    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.overrides.insert(key.to_string(), value.into());
        self
    }

    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn raw(&self, key: &str) -> Option<String> {
        if let Some(v) = self.overrides.get(key) {
            return Some(v.clone());
        }
        std::env::var(self.full_key(key)).ok()
    }

    /// Parsed value, or `None` if unset or unparsable.
    pub fn var<T: FromStr>(&self, key: &str) -> Option<T> {
        self.raw(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn var_or<T: FromStr>(&self, key: &str, default: T) -> T {
        self.var(key).unwrap_or(default)
    }

    /// Boolean flag. Unrecognized spellings fall back to `default`.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        let Some(v) = self.raw(key) else {
            return default;
        };
        let v = v.trim().to_lowercase();
        if TRUTHY.contains(&v.as_str()) {
            true
        } else if FALSY.contains(&v.as_str()) {
            false
        } else {
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_take_precedence() {
        let env = EnvReader::with_prefix("MOCK_ARENA_TEST_UNSET_").set("DEPTH", " 12 ");
        assert_eq!(env.var::<u32>("DEPTH"), Some(12));
        assert_eq!(env.var_or::<u32>("OTHER", 5), 5);
    }

    #[test]
    fn test_bool_spellings() {
        let env = EnvReader::with_prefix("MOCK_ARENA_TEST_UNSET_")
            .set("A", "YES")
            .set("B", "off")
            .set("C", "maybe");
        assert!(env.bool_or("A", false));
        assert!(!env.bool_or("B", true));
        assert!(env.bool_or("C", true));
        assert!(!env.bool_or("MISSING", false));
    }

    #[test]
    fn test_process_env_lookup() {
        std::env::set_var("MOCK_ARENA_TEST_PROC_LIMIT", "64");
        let env = EnvReader::with_prefix("MOCK_ARENA_TEST_PROC_");
        assert_eq!(env.var::<u32>("LIMIT"), Some(64));
        std::env::remove_var("MOCK_ARENA_TEST_PROC_LIMIT");
    }
}
