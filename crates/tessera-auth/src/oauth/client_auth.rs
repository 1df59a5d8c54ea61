//! Client authentication for the token endpoint.
//!
//! # Authentication Methods
//!
//! - `none` - Public clients (client_id only)
//! - `client_secret_basic` - HTTP Basic Auth with client_id:client_secret
//! - `client_secret_post` - client_id and client_secret in the request body
//!
//! HTTP Basic takes priority when both are present. The method used must be
//! the one the client registered.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::ClientRegistry;
use crate::types::{Client, TokenEndpointAuthMethod};

/// Credentials as presented with a token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentedCredentials {
    Basic {
        client_id: String,
        client_secret: String,
    },
    Post {
        client_id: String,
        client_secret: String,
    },
    Public {
        client_id: String,
    },
    None,
}

impl PresentedCredentials {
    /// Extracts credentials from the `Authorization` header value and body
    /// parameters.
    #[must_use]
    pub fn from_request(
        authorization: Option<&str>,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Self {
        if let Some((client_id, client_secret)) = authorization.and_then(parse_basic_auth) {
            return Self::Basic {
                client_id,
                client_secret,
            };
        }
        match (client_id, client_secret) {
            (Some(id), Some(secret)) => Self::Post {
                client_id: id.to_string(),
                client_secret: secret.to_string(),
            },
            (Some(id), None) => Self::Public {
                client_id: id.to_string(),
            },
            _ => Self::None,
        }
    }

    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        match self {
            Self::Basic { client_id, .. }
            | Self::Post { client_id, .. }
            | Self::Public { client_id } => Some(client_id.as_str()),
            Self::None => None,
        }
    }

    fn method(&self) -> Option<TokenEndpointAuthMethod> {
        match self {
            Self::Basic { .. } => Some(TokenEndpointAuthMethod::ClientSecretBasic),
            Self::Post { .. } => Some(TokenEndpointAuthMethod::ClientSecretPost),
            Self::Public { .. } => Some(TokenEndpointAuthMethod::None),
            Self::None => None,
        }
    }
}

/// Resolves and authenticates the client presenting `credentials`.
///
/// # Errors
///
/// Returns `AuthError::InvalidClient` if no credentials are presented, the
/// client is unknown, the method differs from the registered one, or the
/// secret does not match.
pub async fn authenticate_client(
    credentials: &PresentedCredentials,
    registry: &dyn ClientRegistry,
) -> AuthResult<Client> {
    let (Some(client_id), Some(method)) = (credentials.client_id(), credentials.method()) else {
        return Err(AuthError::invalid_client("no client authentication mechanism provided"));
    };

    let client = registry
        .find(client_id)
        .await?
        .ok_or_else(|| AuthError::invalid_client("client not found"))?;

    if client.token_endpoint_auth_method != method {
        return Err(AuthError::invalid_client(format!(
            "the registered client token_endpoint_auth_method ({}) does not match the provided auth mechanism ({})",
            client.token_endpoint_auth_method.as_str(),
            method.as_str()
        )));
    }

    match credentials {
        PresentedCredentials::Basic { client_secret, .. }
        | PresentedCredentials::Post { client_secret, .. } => {
            if !client.verify_secret(client_secret) {
                return Err(AuthError::invalid_client("invalid secret provided"));
            }
        }
        PresentedCredentials::Public { .. } | PresentedCredentials::None => {}
    }

    Ok(client)
}

/// Parses an HTTP Basic `Authorization` header value.
#[must_use]
pub fn parse_basic_auth(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.trim().strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (client_id, client_secret) = credentials.split_once(':')?;
    Some((client_id.to_string(), client_secret.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryClientRegistry;

    fn registry() -> MemoryClientRegistry {
        let mut basic = Client::new("basic");
        basic.client_secret = Some("s3cret".into());
        basic.redirect_uris = vec!["https://rp.example.com/cb".into()];

        let mut post = basic.clone();
        post.client_id = "post".into();
        post.token_endpoint_auth_method = TokenEndpointAuthMethod::ClientSecretPost;

        let mut public = basic.clone();
        public.client_id = "public".into();
        public.client_secret = None;
        public.token_endpoint_auth_method = TokenEndpointAuthMethod::None;

        MemoryClientRegistry::new([basic, post, public]).unwrap()
    }

    fn basic_header(id: &str, secret: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
    }

    #[tokio::test]
    async fn test_basic_auth() {
        let header = basic_header("basic", "s3cret");
        let creds = PresentedCredentials::from_request(Some(&header), None, None);
        let client = authenticate_client(&creds, &registry()).await.unwrap();
        assert_eq!(client.client_id, "basic");
    }

    #[tokio::test]
    async fn test_basic_auth_wrong_secret() {
        let header = basic_header("basic", "wrong");
        let creds = PresentedCredentials::from_request(Some(&header), None, None);
        let result = authenticate_client(&creds, &registry()).await;
        assert!(matches!(result, Err(AuthError::InvalidClient { .. })));
    }

    #[tokio::test]
    async fn test_secret_post() {
        let creds = PresentedCredentials::from_request(None, Some("post"), Some("s3cret"));
        assert!(authenticate_client(&creds, &registry()).await.is_ok());
    }

    #[tokio::test]
    async fn test_method_must_match_registration() {
        let creds = PresentedCredentials::from_request(None, Some("basic"), Some("s3cret"));
        let result = authenticate_client(&creds, &registry()).await;
        assert!(matches!(result, Err(AuthError::InvalidClient { .. })));

        let creds = PresentedCredentials::from_request(None, Some("basic"), None);
        assert!(authenticate_client(&creds, &registry()).await.is_err());
    }

    #[tokio::test]
    async fn test_public_client() {
        let creds = PresentedCredentials::from_request(None, Some("public"), None);
        let client = authenticate_client(&creds, &registry()).await.unwrap();
        assert!(!client.is_confidential());
    }

    #[tokio::test]
    async fn test_unknown_client_and_no_credentials() {
        let creds = PresentedCredentials::from_request(None, Some("nobody"), None);
        assert!(matches!(
            authenticate_client(&creds, &registry()).await,
            Err(AuthError::InvalidClient { .. })
        ));

        let creds = PresentedCredentials::from_request(None, None, None);
        assert_eq!(creds, PresentedCredentials::None);
        assert!(authenticate_client(&creds, &registry()).await.is_err());
    }

    #[test]
    fn test_parse_basic_auth() {
        assert_eq!(
            parse_basic_auth(&basic_header("id", "pa:ss")),
            Some(("id".to_string(), "pa:ss".to_string()))
        );
        assert_eq!(parse_basic_auth("Bearer abc"), None);
        assert_eq!(parse_basic_auth("Basic !!!"), None);
        assert_eq!(parse_basic_auth(&format!("Basic {}", STANDARD.encode("nocolon"))), None);
    }
}
