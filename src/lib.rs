//! archgrade - Cloud Architecture Submission Evaluator
//!
//! Scores cloud-architecture diagrams against challenges in three phases:
//! a mandatory constraint gate, architecture pattern rules, and an optional
//! LLM review.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod mcp;
pub mod models;
pub mod oracle;
pub mod services;

pub use context::FromRef;
