//! Expectation recording, replay matching and verification for test doubles.
//!
//! The interception layer (proxies, instrumentation) lives elsewhere: it turns
//! each redirected call into [`Arena::on_intercepted_call`] and applies the
//! returned [`Outcome`]. Mock objects are represented by opaque
//! [`InstanceToken`](mock_arena_types::InstanceToken)s.
//!
//! ## Modules
//!
//! - [`matchers`]: closed set of argument matchers
//! - [`call`]: call patterns shared by expectations and verify statements
//! - [`expectation`]: bounds, result policies, runtime counters
//! - [`store`]: expectations in recording order
//! - [`engine`]: replay-time selection and cardinality enforcement
//! - [`cascade`]: instance tokens for mockable return values
//! - [`log`]: invocation log and verification claims
//! - [`verification`]: the four verification block modes
//! - [`arena`]: phase controller owning all of the above behind one lock

pub mod arena;
pub mod call;
pub mod cascade;
pub mod config;
pub mod engine;
pub mod errors;
pub mod expectation;
pub mod log;
pub mod matchers;
pub mod metrics;
pub mod recording;
pub mod report;
pub mod store;
pub mod verification;

pub use arena::{Arena, Outcome, Phase};
pub use call::CallPattern;
pub use config::ArenaConfig;
pub use errors::{
    ArenaResult, ErrorKind, InvocationSummary, MissingInvocation, UnexpectedInvocation,
    UnexpectedKind, VerificationError,
};
pub use expectation::{Bounds, DelegateCall};
pub use matchers::ArgumentMatcher;
pub use metrics::{ArenaMetrics, MetricsSnapshot};
pub use recording::RecordingBlock;
pub use report::ArenaReport;
pub use verification::{BlockReport, StatementOutcome, VerificationBlock, VerificationMode};
