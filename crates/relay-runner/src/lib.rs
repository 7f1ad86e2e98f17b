//! Runner for executing agents

pub mod context;
pub mod runner;

pub use context::DefaultInvocationContext;
pub use runner::{EventStream, RunConfig, Runner, RunnerBuilder, text_deltas};
