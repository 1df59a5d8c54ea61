//! Collaborator traits and their in-memory implementations.
//!
//! This module defines interfaces for:
//!
//! - per-entity persistence ([`Adapter`], selected by [`EntityKind`])
//! - client registrations ([`ClientRegistry`])
//! - end-user accounts ([`AccountProvider`])
//! - token audiences ([`AudienceResolver`])

mod account;
mod adapter;
mod client;
mod memory;

pub use account::{
    AccountProvider, AudienceRequest, AudienceResolver, AudienceTarget, NoAudiences,
    StaticAudiences,
};
pub use adapter::{Adapter, Adapters, EntityKind};
pub use client::ClientRegistry;
pub use memory::{MemoryAccountProvider, MemoryAdapter, MemoryClientRegistry};
