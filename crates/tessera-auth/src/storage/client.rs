//! Client registry trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

/// Read-only lookup of registered clients.
///
/// # Implementations
///
/// - [`MemoryClientRegistry`](super::MemoryClientRegistry) - static list from configuration
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Finds a client by its client ID.
    ///
    /// # Returns
    ///
    /// Returns `Some(client)` if registered, `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be queried.
    async fn find(&self, client_id: &str) -> AuthResult<Option<Client>>;
}
