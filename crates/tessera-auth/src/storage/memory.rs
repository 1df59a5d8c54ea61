//! In-memory implementations of the collaborator traits.
//!
//! Used by the tests and the bundled server. State lives for the lifetime of
//! the process.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use time::OffsetDateTime;

use super::{AccountProvider, Adapter, ClientRegistry};
use crate::AuthResult;
use crate::error::AuthError;
use crate::types::{Account, Client, ClientValidationError};

struct Entry {
    payload: Value,
    expires_at: OffsetDateTime,
    consumed_at: Option<i64>,
}

/// Process-local adapter backed by a sharded concurrent map.
///
/// `consume` holds the shard write lock for the duration of the
/// check-and-set, so concurrent consumers of one id are serialized.
#[derive(Default)]
pub struct MemoryAdapter {
    entries: DashMap<String, Entry>,
}

impl MemoryAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every record past its lifetime. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn upsert(&self, id: &str, payload: Value, expires_in: Duration) -> AuthResult<()> {
        let expires_in = time::Duration::try_from(expires_in)
            .map_err(|e| AuthError::storage(format!("invalid record lifetime: {e}")))?;
        self.entries.insert(
            id.to_string(),
            Entry {
                payload,
                expires_at: OffsetDateTime::now_utc() + expires_in,
                consumed_at: None,
            },
        );
        Ok(())
    }

    async fn find(&self, id: &str) -> AuthResult<Option<Value>> {
        Ok(self.entries.get(id).map(|entry| {
            let mut payload = entry.payload.clone();
            if let (Some(consumed), Value::Object(map)) = (entry.consumed_at, &mut payload) {
                map.insert("consumed".to_string(), Value::from(consumed));
            }
            payload
        }))
    }

    async fn consume(&self, id: &str) -> AuthResult<bool> {
        match self.entries.get_mut(id) {
            Some(mut entry) if entry.consumed_at.is_none() => {
                entry.consumed_at = Some(OffsetDateTime::now_utc().unix_timestamp());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn destroy(&self, id: &str) -> AuthResult<()> {
        self.entries.remove(id);
        Ok(())
    }
}

/// Static client registry.
#[derive(Debug, Default)]
pub struct MemoryClientRegistry {
    clients: HashMap<String, Client>,
}

impl MemoryClientRegistry {
    /// Builds the registry, validating every registration.
    ///
    /// # Errors
    ///
    /// Returns the first registration problem found.
    pub fn new(clients: impl IntoIterator<Item = Client>) -> Result<Self, ClientValidationError> {
        let mut map = HashMap::new();
        for client in clients {
            client.validate()?;
            map.insert(client.client_id.clone(), client);
        }
        Ok(Self { clients: map })
    }
}

#[async_trait]
impl ClientRegistry for MemoryClientRegistry {
    async fn find(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.get(client_id).cloned())
    }
}

/// Mutable account directory.
#[derive(Debug, Default)]
pub struct MemoryAccountProvider {
    accounts: DashMap<String, Account>,
}

impl MemoryAccountProvider {
    #[must_use]
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        let provider = Self::default();
        for account in accounts {
            provider.insert(account);
        }
        provider
    }

    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.account_id.clone(), account);
    }

    pub fn remove(&self, account_id: &str) {
        self.accounts.remove(account_id);
    }
}

#[async_trait]
impl AccountProvider for MemoryAccountProvider {
    async fn find_account(&self, account_id: &str) -> AuthResult<Option<Account>> {
        Ok(self.accounts.get(account_id).map(|a| a.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_upsert_find_destroy() {
        let adapter = MemoryAdapter::new();
        adapter
            .upsert("a", json!({"kind": "AccessToken"}), Duration::from_secs(60))
            .await
            .unwrap();

        let found = adapter.find("a").await.unwrap().unwrap();
        assert_eq!(found["kind"], "AccessToken");
        assert!(found.get("consumed").is_none());

        adapter.destroy("a").await.unwrap();
        assert!(adapter.find("a").await.unwrap().is_none());
        adapter.destroy("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_consume_once() {
        let adapter = MemoryAdapter::new();
        adapter
            .upsert("code", json!({}), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(adapter.consume("code").await.unwrap());
        assert!(!adapter.consume("code").await.unwrap());
        assert!(!adapter.consume("missing").await.unwrap());

        let found = adapter.find("code").await.unwrap().unwrap();
        assert!(found["consumed"].is_i64());
    }

    #[tokio::test]
    async fn test_concurrent_consume_single_winner() {
        let adapter = Arc::new(MemoryAdapter::new());
        adapter
            .upsert("rt", json!({}), Duration::from_secs(60))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let adapter = adapter.clone();
            handles.push(tokio::spawn(async move { adapter.consume("rt").await }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let adapter = MemoryAdapter::new();
        adapter
            .upsert("gone", json!({}), Duration::ZERO)
            .await
            .unwrap();
        adapter
            .upsert("kept", json!({}), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(adapter.cleanup_expired(), 1);
        assert_eq!(adapter.len(), 1);
        assert!(adapter.find("kept").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_client_registry_validates() {
        let mut client = Client::new("c");
        client.client_secret = Some("s".into());
        assert_eq!(
            MemoryClientRegistry::new([client.clone()]).unwrap_err(),
            ClientValidationError::NoRedirectUris
        );

        client.redirect_uris = vec!["https://c.example/cb".into()];
        let registry = MemoryClientRegistry::new([client]).unwrap();
        assert!(registry.find("c").await.unwrap().is_some());
        assert!(registry.find("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_account_provider() {
        let accounts = MemoryAccountProvider::new([Account::new("u1")]);
        assert!(accounts.find_account("u1").await.unwrap().is_some());
        accounts.remove("u1");
        assert!(accounts.find_account("u1").await.unwrap().is_none());
    }
}
