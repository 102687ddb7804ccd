//! Co-parenting incident intake: a six-step wizard that validates a user's account of an
//! incident and hands it to a hosted language model for a structured report.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
