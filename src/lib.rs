//! Intent Responder: answers chat messages whose NLU-classified intent clears
//! a confidence threshold.

pub mod channels;
pub mod config;
pub mod error;
pub mod intent;
pub mod pipeline;
pub mod responder;
