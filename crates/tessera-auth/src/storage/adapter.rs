//! Persistence adapter contract.
//!
//! Every persisted engine entity (tokens, sessions, interaction
//! transactions) goes through an [`Adapter`] selected by [`EntityKind`].
//! Payloads are opaque JSON documents; the engine owns their shape.
//!
//! # Security Considerations
//!
//! - Token records are keyed by the SHA-256 hash of the token value
//! - `consume` must be an atomic check-and-set
//! - Records past their lifetime may be collected at any time

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::AuthResult;

/// Kinds of persisted entities, one adapter each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    AuthorizationCode,
    AccessToken,
    RefreshToken,
    ClientCredentials,
    Session,
    Interaction,
}

impl EntityKind {
    /// All kinds, in a stable order.
    pub const ALL: [EntityKind; 6] = [
        Self::AuthorizationCode,
        Self::AccessToken,
        Self::RefreshToken,
        Self::ClientCredentials,
        Self::Session,
        Self::Interaction,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "AuthorizationCode",
            Self::AccessToken => "AccessToken",
            Self::RefreshToken => "RefreshToken",
            Self::ClientCredentials => "ClientCredentials",
            Self::Session => "Session",
            Self::Interaction => "Interaction",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage backend for one entity kind.
///
/// # Implementations
///
/// - [`MemoryAdapter`](super::MemoryAdapter) - process-local, `dashmap` backed
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Inserts or replaces a record.
    ///
    /// # Arguments
    ///
    /// * `id` - Record identifier (token hash, session id or transaction uid)
    /// * `payload` - JSON document to store
    /// * `expires_in` - Lifetime after which the record may be collected
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored.
    async fn upsert(&self, id: &str, payload: Value, expires_in: Duration) -> AuthResult<()>;

    /// Finds a record by id.
    ///
    /// # Returns
    ///
    /// Returns `Some(payload)` if found. A consumed record carries a numeric
    /// `consumed` member holding the consumption time (unix seconds).
    /// Expiration is not enforced here; callers re-check it.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find(&self, id: &str) -> AuthResult<Option<Value>>;

    /// Marks a record as consumed.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if this call consumed the record, `Ok(false)` if it was
    /// already consumed or does not exist. Of any number of concurrent calls
    /// for one id, at most one returns `Ok(true)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn consume(&self, id: &str) -> AuthResult<bool>;

    /// Deletes a record. Deleting a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn destroy(&self, id: &str) -> AuthResult<()>;
}

/// One adapter per [`EntityKind`].
#[derive(Clone)]
pub struct Adapters {
    authorization_code: Arc<dyn Adapter>,
    access_token: Arc<dyn Adapter>,
    refresh_token: Arc<dyn Adapter>,
    client_credentials: Arc<dyn Adapter>,
    session: Arc<dyn Adapter>,
    interaction: Arc<dyn Adapter>,
}

impl Adapters {
    /// Builds the set by asking `factory` for each kind.
    pub fn from_factory(factory: impl Fn(EntityKind) -> Arc<dyn Adapter>) -> Self {
        Self {
            authorization_code: factory(EntityKind::AuthorizationCode),
            access_token: factory(EntityKind::AccessToken),
            refresh_token: factory(EntityKind::RefreshToken),
            client_credentials: factory(EntityKind::ClientCredentials),
            session: factory(EntityKind::Session),
            interaction: factory(EntityKind::Interaction),
        }
    }

    /// A fresh in-memory adapter for every kind.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_factory(|_| Arc::new(super::MemoryAdapter::new()))
    }

    #[must_use]
    pub fn get(&self, kind: EntityKind) -> &Arc<dyn Adapter> {
        match kind {
            EntityKind::AuthorizationCode => &self.authorization_code,
            EntityKind::AccessToken => &self.access_token,
            EntityKind::RefreshToken => &self.refresh_token,
            EntityKind::ClientCredentials => &self.client_credentials,
            EntityKind::Session => &self.session,
            EntityKind::Interaction => &self.interaction,
        }
    }
}

impl fmt::Debug for Adapters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapters").finish_non_exhaustive()
    }
}
