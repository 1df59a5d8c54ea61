//! Browser sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{Adapter, Adapters, EntityKind};

/// What the session knows about one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAuthorization {
    /// Session id as exposed to this client (`sid` claim).
    pub sid: String,

    /// Grant the client's tokens are bound to.
    pub grant_id: String,

    /// Scope the end-user consented to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Interaction metadata stored for the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    /// Opaque value mirrored in the `_state.<client_id>` cookie.
    pub browser_state: String,
}

impl ClientAuthorization {
    fn new() -> Self {
        Self {
            sid: Uuid::new_v4().to_string(),
            grant_id: Uuid::new_v4().to_string(),
            scope: None,
            meta: None,
            browser_state: crate::token::generate_token(),
        }
    }
}

/// Per-browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Time of the last end-user authentication (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amr: Option<Vec<String>>,

    /// Transient sessions end with the browser session.
    #[serde(default)]
    pub transient: bool,

    /// unix seconds
    pub expires_at: i64,

    #[serde(default)]
    pub authorizations: HashMap<String, ClientAuthorization>,
}

impl Session {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: None,
            auth_time: None,
            acr: None,
            amr: None,
            transient: false,
            expires_at: OffsetDateTime::now_utc().unix_timestamp().saturating_add(ttl),
            authorizations: HashMap::new(),
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc().unix_timestamp()
    }

    /// Records an end-user authentication.
    ///
    /// Switching to another account drops every per-client authorization.
    pub fn login(
        &mut self,
        account_id: &str,
        auth_time: i64,
        acr: Option<String>,
        amr: Option<Vec<String>>,
        remember: bool,
    ) {
        if self.account_id.as_deref() != Some(account_id) {
            self.authorizations.clear();
        }
        self.account_id = Some(account_id.to_string());
        self.auth_time = Some(auth_time);
        self.acr = acr;
        self.amr = amr;
        self.transient = !remember;
    }

    /// `true` if the last authentication is older than `max_age` seconds.
    #[must_use]
    pub fn past_max_age(&self, max_age: i64, now: i64) -> bool {
        match self.auth_time {
            Some(auth_time) => auth_time.saturating_add(max_age) < now,
            None => true,
        }
    }

    /// The client's authorization, created on first use.
    pub fn authorization_for(&mut self, client_id: &str) -> &mut ClientAuthorization {
        self.authorizations
            .entry(client_id.to_string())
            .or_insert_with(ClientAuthorization::new)
    }

    #[must_use]
    pub fn expires(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.expires_at).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

/// Loads and saves sessions through the session adapter.
#[derive(Clone)]
pub struct SessionStore {
    adapter: Arc<dyn Adapter>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(adapters: &Adapters, ttl: Duration) -> Self {
        Self {
            adapter: adapters.get(EntityKind::Session).clone(),
            ttl,
        }
    }

    /// Loads the session for `id`, or starts a new one when the id is
    /// absent, unknown or expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter fails.
    pub async fn load(&self, id: Option<&str>) -> AuthResult<Session> {
        if let Some(id) = id
            && let Some(payload) = self.adapter.find(id).await?
        {
            match serde_json::from_value::<Session>(payload) {
                Ok(session) if !session.is_expired() => return Ok(session),
                Ok(_) => tracing::debug!("session expired, starting a new one"),
                Err(e) => tracing::warn!(error = %e, "discarding corrupt session payload"),
            }
        }
        Ok(Session::new(self.ttl))
    }

    /// Persists `session` until its expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be serialized or stored.
    pub async fn save(&self, session: &Session) -> AuthResult<()> {
        let remaining = session.expires_at - OffsetDateTime::now_utc().unix_timestamp();
        let remaining = u64::try_from(remaining)
            .map_err(|_| AuthError::internal("cannot save an expired session"))?;
        let payload = serde_json::to_value(session)?;
        self.adapter
            .upsert(&session.id, payload, Duration::from_secs(remaining))
            .await
    }
}
