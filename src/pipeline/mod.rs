//! Intent pipeline.
//!
//! Every inbound message flows through:
//! 1. `MessageFilter::should_process()` — channel, author and prefix checks
//! 2. `IntentClassifier::classify()` — NLU backend, bounded by a timeout
//! 3. `DispatchPolicy::decide()` — per-category confidence thresholds
//!
//! The result is a `PipelineOutcome`; only `PipelineOutcome::Reply` leads to
//! an outbound message.

pub mod filter;
pub mod policy;
pub mod processor;
pub mod types;

pub use filter::{FilterDecision, MessageFilter, RejectReason};
pub use policy::{DispatchPolicy, DispatchRule, Reply};
pub use processor::MessageProcessor;
pub use types::PipelineOutcome;
