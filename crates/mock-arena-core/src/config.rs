//! Arena configuration.
//!
//! | Variable                        | Default | Effect                                   |
//! |---------------------------------|---------|------------------------------------------|
//! | `MOCK_ARENA_FAIL_FAST`          | `true`  | raise overflow at the offending call      |
//! | `MOCK_ARENA_MAX_DELEGATE_DEPTH` | `32`    | nested delegate invocations per thread    |
//! | `MOCK_ARENA_CASCADE`            | `true`  | mint instances for mockable return types  |

use mock_arena_types::env_utils::EnvReader;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DELEGATE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// When false, overflow and ordering failures are held and reported at
    /// the next verification block or at `finish()`.
    pub fail_fast: bool,
    pub max_delegate_depth: usize,
    pub cascading: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            fail_fast: true,
            max_delegate_depth: DEFAULT_MAX_DELEGATE_DEPTH,
            cascading: true,
        }
    }
}

impl ArenaConfig {
    pub fn from_env() -> Self {
        Self::from_reader(&EnvReader::default())
    }

    pub fn from_reader(env: &EnvReader) -> Self {
        let defaults = Self::default();
        Self {
            fail_fast: env.bool_or("FAIL_FAST", defaults.fail_fast),
            max_delegate_depth: env.var_or("MAX_DELEGATE_DEPTH", defaults.max_delegate_depth),
            cascading: env.bool_or("CASCADE", defaults.cascading),
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_max_delegate_depth(mut self, depth: usize) -> Self {
        self.max_delegate_depth = depth;
        self
    }

    pub fn with_cascading(mut self, cascading: bool) -> Self {
        self.cascading = cascading;
        self
    }
}
