//! Authorization and token issuance error types.
//!
//! Every rejection the engine produces is an [`AuthError`]. Each variant maps
//! to an OAuth 2.0 / OpenID Connect error code and carries the human readable
//! `error_description` that is delivered to the client, either by redirect or
//! as a local error page / JSON body.

use std::fmt;

/// Errors that can occur while admitting an authorization request, resuming
/// an interaction, or exchanging a grant at the token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request is missing a parameter, repeats one, or is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description delivered as `error_description`.
        message: String,
    },

    /// The client is unknown or failed to authenticate.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// The authorization code or refresh token is invalid, expired, consumed
    /// or bound to another client.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// The requested scope exceeds what may be granted.
    #[error("Invalid scope: {message}")]
    InvalidScope {
        /// Description of why the scope is invalid.
        message: String,
        /// The offending scope values, space separated.
        scope: String,
    },

    /// The provider does not support the requested response type.
    #[error("Unsupported response type: {message}")]
    UnsupportedResponseType {
        /// Description delivered as `error_description`.
        message: String,
    },

    /// The response type is supported but not whitelisted for the client.
    #[error("Restricted response type: {message}")]
    RestrictedResponseType {
        /// Description delivered as `error_description`.
        message: String,
    },

    /// No handler is registered for the requested grant type.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The unsupported grant type.
        grant_type: String,
    },

    /// The client may not use the requested grant type.
    #[error("Unauthorized client: {message}")]
    UnauthorizedClient {
        /// Description delivered as `error_description`.
        message: String,
    },

    /// The redirect URI is not whitelisted for the client.
    #[error("redirect_uri did not match any of the client's registered redirect_uris")]
    RedirectUriMismatch,

    /// End-user authentication is required.
    #[error("Login required: {message}")]
    LoginRequired {
        /// Description delivered as `error_description`.
        message: String,
    },

    /// End-user consent is required.
    #[error("Consent required: {message}")]
    ConsentRequired {
        /// Description delivered as `error_description`.
        message: String,
    },

    /// A custom interaction prompt is required.
    #[error("Interaction required: {message}")]
    InteractionRequired {
        /// Description delivered as `error_description`.
        message: String,
    },

    /// The interaction was finished with an error result.
    #[error("Interaction aborted: {error}")]
    InteractionAborted {
        /// Error code supplied by the interaction.
        error: String,
        /// Optional description supplied by the interaction.
        description: Option<String>,
    },

    /// The end-user or the provider denied the request.
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Description delivered as `error_description`.
        message: String,
    },

    /// The interaction transaction is gone, unsigned or past its lifetime.
    #[error("authorization request has expired")]
    RequestExpired,

    /// An error occurred while storing or retrieving engine state.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The provider configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates an `InvalidRequest` error naming missing parameters, in order.
    #[must_use]
    pub fn missing_parameters<S: AsRef<str>>(names: &[S]) -> Self {
        let joined = names.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
        Self::invalid_request(format!("missing required parameter(s) {joined}"))
    }

    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidScope` error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::InvalidScope {
            message: message.into(),
            scope: scope.into(),
        }
    }

    /// Creates a new `UnsupportedResponseType` error for the given value.
    #[must_use]
    pub fn unsupported_response_type(response_type: &str) -> Self {
        Self::UnsupportedResponseType {
            message: format!("response_type not supported. ({response_type})"),
        }
    }

    /// Creates a new `RestrictedResponseType` error.
    #[must_use]
    pub fn restricted_response_type() -> Self {
        Self::RestrictedResponseType {
            message: "response_type not allowed for this client".to_string(),
        }
    }

    /// Creates a new `UnsupportedGrantType` error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    /// Creates a new `UnauthorizedClient` error.
    #[must_use]
    pub fn unauthorized_client(message: impl Into<String>) -> Self {
        Self::UnauthorizedClient {
            message: message.into(),
        }
    }

    /// Creates a new `LoginRequired` error.
    #[must_use]
    pub fn login_required(message: impl Into<String>) -> Self {
        Self::LoginRequired {
            message: message.into(),
        }
    }

    /// Creates a new `ConsentRequired` error.
    #[must_use]
    pub fn consent_required(message: impl Into<String>) -> Self {
        Self::ConsentRequired {
            message: message.into(),
        }
    }

    /// Creates a new `InteractionRequired` error.
    #[must_use]
    pub fn interaction_required(message: impl Into<String>) -> Self {
        Self::InteractionRequired {
            message: message.into(),
        }
    }

    /// Creates the error for an interaction result carrying `error`.
    ///
    /// `access_denied` maps to [`AuthError::AccessDenied`]; any other code is
    /// passed through as `InteractionAborted`.
    #[must_use]
    pub fn interaction_aborted(error: impl Into<String>, description: Option<String>) -> Self {
        let error = error.into();
        if error == "access_denied" {
            return Self::access_denied(description.unwrap_or_default());
        }
        Self::InteractionAborted { error, description }
    }

    /// Creates a new `AccessDenied` error.
    #[must_use]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. }
        )
    }

    /// Returns `true` for the errors a `prompt=none` request or a resumed
    /// interaction reports when end-user action is still outstanding.
    #[must_use]
    pub fn is_interaction_error(&self) -> bool {
        matches!(
            self,
            Self::LoginRequired { .. }
                | Self::ConsentRequired { .. }
                | Self::InteractionRequired { .. }
        )
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRequest { .. }
            | Self::UnsupportedResponseType { .. }
            | Self::RestrictedResponseType { .. }
            | Self::UnsupportedGrantType { .. }
            | Self::RedirectUriMismatch => ErrorCategory::Validation,
            Self::InvalidClient { .. } | Self::InvalidGrant { .. } => ErrorCategory::Authentication,
            Self::InvalidScope { .. }
            | Self::UnauthorizedClient { .. }
            | Self::AccessDenied { .. } => ErrorCategory::Authorization,
            Self::LoginRequired { .. }
            | Self::ConsentRequired { .. }
            | Self::InteractionRequired { .. }
            | Self::InteractionAborted { .. }
            | Self::RequestExpired => ErrorCategory::Interaction,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 / OpenID Connect error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::InvalidScope { .. } => "invalid_scope",
            Self::UnsupportedResponseType { .. } => "unsupported_response_type",
            Self::RestrictedResponseType { .. } => "restricted_response_type",
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::UnauthorizedClient { .. } => "unauthorized_client",
            Self::RedirectUriMismatch => "redirect_uri_mismatch",
            Self::LoginRequired { .. } => "login_required",
            Self::ConsentRequired { .. } => "consent_required",
            Self::InteractionRequired { .. } => "interaction_required",
            Self::InteractionAborted { error, .. } => error.as_str(),
            Self::AccessDenied { .. } => "access_denied",
            Self::RequestExpired => "invalid_request",
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                "server_error"
            }
        }
    }

    /// Returns the `error_description` delivered to the client.
    ///
    /// Server errors never leak their internal message.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::InvalidRequest { message }
            | Self::InvalidClient { message }
            | Self::InvalidGrant { message }
            | Self::InvalidScope { message, .. }
            | Self::UnsupportedResponseType { message }
            | Self::RestrictedResponseType { message }
            | Self::UnauthorizedClient { message }
            | Self::LoginRequired { message }
            | Self::ConsentRequired { message }
            | Self::InteractionRequired { message }
            | Self::AccessDenied { message } => message.clone(),
            Self::UnsupportedGrantType { grant_type } => {
                format!("unsupported grant_type requested ({grant_type})")
            }
            Self::InteractionAborted { description, .. } => {
                description.clone().unwrap_or_default()
            }
            Self::RedirectUriMismatch | Self::RequestExpired => self.to_string(),
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                "oops something went wrong".to_string()
            }
        }
    }

    /// Returns the offending scope for `invalid_scope` errors.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        match self {
            Self::InvalidScope { scope, .. } => Some(scope),
            _ => None,
        }
    }

    /// Returns the HTTP status used when the error is rendered directly.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidClient { .. } => 401,
            _ if self.is_server_error() => 500,
            _ => 400,
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("payload serialization failed: {err}"))
    }
}

/// Categories of errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Client or grant authentication failures.
    Authentication,
    /// Scope or grant type permission failures.
    Authorization,
    /// Request validation errors.
    Validation,
    /// Outstanding or aborted end-user interaction.
    Interaction,
    /// Storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Validation => write!(f, "validation"),
            Self::Interaction => write!(f, "interaction"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Result type alias for engine operations.
pub type AuthResult<T> = Result<T, AuthError>;
