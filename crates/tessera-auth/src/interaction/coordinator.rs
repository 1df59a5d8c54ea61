//! Suspending authorization requests for end-user interaction and resuming
//! them once the interaction reports a result.

use cookie::Cookie;
use serde::{Deserialize, Serialize};

use super::prompt::Prompt;
use super::result::InteractionResult;
use super::session::Session;
use super::transaction::Transaction;
use crate::AuthResult;
use crate::authorization::{
    self, AuthorizationContext, AuthorizationParams, ChainEnv, EndpointResponse, ValidationChain,
};
use crate::cookies::{CookieOptions, RequestCookies};
use crate::error::AuthError;
use crate::provider::Provider;

/// What the interaction UI needs to know about a pending request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionDetails {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub params: AuthorizationParams,
    /// Prompts the interaction has to resolve.
    pub prompts: Vec<String>,
    pub expires_at: i64,
}

/// Freezes the request into a transaction, sets the interaction cookie and
/// redirects to the interaction URL.
pub(crate) async fn suspend(
    provider: &Provider,
    ctx: &AuthorizationContext,
    session: &Session,
    prompts: &[Prompt],
) -> AuthResult<EndpointResponse> {
    let config = provider.config();
    let transaction = Transaction::new(
        ctx.params.clone(),
        prompts,
        session.id.as_str(),
        config.ttl.interaction,
    );
    provider.transactions().save(&transaction).await?;

    let options = CookieOptions::persistent(&config.cookies.resume_path, transaction.expires());
    let cookies = provider
        .cookies()
        .write(&config.cookies.interaction_name, &transaction.uid, &options)
        .map_err(|e| AuthError::internal(e.to_string()))?;

    tracing::info!(
        uid = %transaction.uid,
        client_id = ctx.params.client_id.as_deref().unwrap_or_default(),
        prompts = ?transaction.prompts,
        "authorization request suspended for interaction"
    );

    Ok(EndpointResponse::redirect(config.interaction_url_for(&transaction.uid)).with_cookies(cookies))
}

/// Resumes the transaction named by the interaction cookie.
///
/// The transaction is destroyed and the cookie cleared whatever the outcome.
pub(crate) async fn resume(provider: &Provider, cookies: &RequestCookies) -> EndpointResponse {
    let config = provider.config();
    let mut set_cookies = provider
        .cookies()
        .clear(&config.cookies.interaction_name, &config.cookies.resume_path);

    let Some(uid) = provider
        .cookies()
        .read(cookies, &config.cookies.interaction_name)
    else {
        tracing::warn!("resume without a valid interaction cookie");
        return EndpointResponse::local_error(&AuthError::RequestExpired);
    };

    let transactions = provider.transactions();
    let transaction = match transactions.find(uid).await {
        Ok(Some(transaction)) => transaction,
        Ok(None) => {
            tracing::warn!(uid, "resume of unknown or expired interaction");
            return EndpointResponse::local_error(&AuthError::RequestExpired)
                .with_cookies(set_cookies);
        }
        Err(err) => {
            tracing::error!(uid, error = %err, "failed to load interaction");
            return EndpointResponse::local_error(&err).with_cookies(set_cookies);
        }
    };
    if let Err(err) = transactions.destroy(&transaction.uid).await {
        tracing::error!(uid, error = %err, "failed to destroy interaction");
        return EndpointResponse::local_error(&err).with_cookies(set_cookies);
    }

    let mut ctx = AuthorizationContext::new(transaction.params.clone());
    let outcome =
        continue_transaction(provider, &mut ctx, &transaction, cookies, &mut set_cookies).await;
    let response = match outcome {
        Ok(response) => response,
        Err(err) => authorization::reject(&ctx, &err),
    };
    response.with_cookies(set_cookies)
}

async fn continue_transaction(
    provider: &Provider,
    ctx: &mut AuthorizationContext,
    transaction: &Transaction,
    cookies: &RequestCookies,
    set_cookies: &mut Vec<Cookie<'static>>,
) -> AuthResult<EndpointResponse> {
    let config = provider.config();
    let env = ChainEnv {
        config,
        clients: provider.clients(),
    };
    let result = transaction.result.clone().unwrap_or_default();

    if let Some(error) = &result.error {
        ValidationChain::resume().run(ctx, &env).await?;
        tracing::info!(uid = %transaction.uid, error = %error, "interaction aborted");
        return Err(AuthError::interaction_aborted(
            error.as_str(),
            result.error_description.clone(),
        ));
    }

    let session_id = provider
        .cookies()
        .read(cookies, &config.cookies.session_name)
        .unwrap_or(transaction.session_id.as_str());
    let mut session = provider.sessions().load(Some(session_id)).await?;

    if let Some(login) = &result.login {
        session.login(
            &login.account,
            login.ts.unwrap_or_else(Provider::now),
            login.acr.clone(),
            login.amr.clone(),
            login.remember,
        );
    }

    let consent_scope = result.consent.as_ref().and_then(|c| c.scope.clone());
    if let Some(scope) = &consent_scope {
        ctx.params.scope = Some(scope.clone());
    }
    if session.account_id.is_some()
        && let Some(client_id) = ctx.params.client_id.as_deref()
        && (result.meta.is_some() || consent_scope.is_some())
    {
        let authorization = session.authorization_for(client_id);
        if let Some(meta) = &result.meta {
            authorization.meta = Some(meta.clone());
        }
        if consent_scope.is_some() {
            authorization.scope = consent_scope;
        }
    }

    if session.account_id.is_some() {
        provider.sessions().save(&session).await?;
        set_cookies.extend(session_cookies(provider, &session)?);
    }

    ValidationChain::resume().run(ctx, &env).await?;

    if session.account_id.is_none() {
        return Err(AuthError::login_required("End-User authentication is required"));
    }
    if let Some(unresolved) = transaction
        .prompts()
        .into_iter()
        .find(|prompt| !result.resolves(prompt))
    {
        return Err(unresolved.unresolved_error());
    }

    tracing::info!(
        uid = %transaction.uid,
        client_id = ctx.params.client_id.as_deref().unwrap_or_default(),
        "interaction resumed"
    );
    authorization::issue(provider, ctx, &mut session).await
}

/// The session cookie: persistent when remembered, otherwise transient.
fn session_cookies(provider: &Provider, session: &Session) -> AuthResult<Vec<Cookie<'static>>> {
    let options = if session.transient {
        CookieOptions::transient("/")
    } else {
        CookieOptions::persistent("/", session.expires())
    };
    provider
        .cookies()
        .write(&provider.config().cookies.session_name, &session.id, &options)
        .map_err(|e| AuthError::internal(e.to_string()))
}

/// Returns the details of a pending interaction.
pub(crate) async fn details(provider: &Provider, uid: &str) -> AuthResult<InteractionDetails> {
    let transaction = provider
        .transactions()
        .find(uid)
        .await?
        .ok_or(AuthError::RequestExpired)?;

    Ok(InteractionDetails {
        client_id: transaction.params.client_id.clone(),
        uid: transaction.uid,
        params: transaction.params,
        prompts: transaction.prompts,
        expires_at: transaction.expires_at,
    })
}

/// Attaches `result` to a pending interaction and returns the resume URL.
pub(crate) async fn finished(
    provider: &Provider,
    uid: &str,
    result: InteractionResult,
) -> AuthResult<String> {
    let transactions = provider.transactions();
    let mut transaction = transactions
        .find(uid)
        .await?
        .ok_or(AuthError::RequestExpired)?;

    transaction.result = Some(result);
    transactions.save(&transaction).await?;

    tracing::info!(uid, "interaction finished");
    Ok(provider.config().cookies.resume_path.clone())
}
