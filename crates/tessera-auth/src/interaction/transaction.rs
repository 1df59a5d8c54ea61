//! Suspended authorization requests.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::prompt::Prompt;
use super::result::InteractionResult;
use crate::AuthResult;
use crate::authorization::AuthorizationParams;
use crate::error::AuthError;
use crate::storage::{Adapter, Adapters, EntityKind};

/// An authorization request frozen while the end-user interacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub uid: String,

    pub params: AuthorizationParams,

    /// Prompt names unresolved at suspension time.
    pub prompts: Vec<String>,

    /// Session the request was started from.
    pub session_id: String,

    pub created_at: i64,

    pub expires_at: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<InteractionResult>,
}

impl Transaction {
    #[must_use]
    pub fn new(
        params: AuthorizationParams,
        prompts: &[Prompt],
        session_id: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            uid: Uuid::new_v4().to_string(),
            params,
            prompts: prompts.iter().map(|p| p.name().to_string()).collect(),
            session_id: session_id.into(),
            created_at: now,
            expires_at: now.saturating_add(ttl),
            result: None,
        }
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.iter().map(|name| Prompt::parse(name)).collect()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc().unix_timestamp()
    }

    #[must_use]
    pub fn expires(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.expires_at).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

/// Persists transactions through the interaction adapter.
#[derive(Clone)]
pub struct TransactionStore {
    adapter: Arc<dyn Adapter>,
}

impl TransactionStore {
    #[must_use]
    pub fn new(adapters: &Adapters) -> Self {
        Self {
            adapter: adapters.get(EntityKind::Interaction).clone(),
        }
    }

    /// Saves `transaction` for the rest of its lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RequestExpired` if the transaction is already
    /// past its lifetime, or an error if the adapter fails.
    pub async fn save(&self, transaction: &Transaction) -> AuthResult<()> {
        let remaining = transaction.expires_at - OffsetDateTime::now_utc().unix_timestamp();
        let remaining = u64::try_from(remaining)
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(AuthError::RequestExpired)?;
        let payload = serde_json::to_value(transaction)?;
        self.adapter
            .upsert(&transaction.uid, payload, Duration::from_secs(remaining))
            .await
    }

    /// Finds a live transaction; expired ones are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter fails or the payload is corrupt.
    pub async fn find(&self, uid: &str) -> AuthResult<Option<Transaction>> {
        let Some(payload) = self.adapter.find(uid).await? else {
            return Ok(None);
        };
        let transaction: Transaction = serde_json::from_value(payload)
            .map_err(|e| AuthError::storage(format!("corrupt interaction payload: {e}")))?;
        Ok((!transaction.is_expired()).then_some(transaction))
    }

    /// # Errors
    ///
    /// Returns an error if the adapter fails.
    pub async fn destroy(&self, uid: &str) -> AuthResult<()> {
        self.adapter.destroy(uid).await
    }
}
