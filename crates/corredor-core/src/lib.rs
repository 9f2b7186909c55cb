//! Shared service plumbing for the corredor workspace.

pub mod health;
pub mod tracing;
