//! Token registry
//!
//! The registry is the factory for ledgers: any caller may deploy a token,
//! and every deployment is recorded permanently, both in creation order and
//! under its creator. Only ownership of the registry itself is gated.

pub mod registry;

pub use registry::{Deployment, Registry, RegistryError, RegistryEvent, TokenRecord};
