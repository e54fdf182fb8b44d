//! Core components shared by ledgers and the registry

pub mod context;

pub use context::CallContext;
