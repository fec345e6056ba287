//! Inbox triage — rule-driven Gmail cleanup daemon.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod scheduler;
