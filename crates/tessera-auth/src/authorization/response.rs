//! Authorization endpoint responses.
//!
//! The engine returns an [`EndpointResponse`] describing what the HTTP layer
//! should send: a redirect (to the client or to the interaction UI), an
//! auto-submitting `form_post` page, or a local error page. Cookies to set
//! travel alongside.

use cookie::Cookie;
use url::Url;

use super::context::RedirectTarget;
use crate::AuthResult;
use crate::error::AuthError;
use crate::types::ResponseMode;

/// What the HTTP layer sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// `302 Found` with `Location`.
    Redirect { location: String },

    /// `200 OK` with a page that POSTs `params` to `action`.
    FormPost {
        action: String,
        params: Vec<(String, String)>,
    },

    /// Error rendered by the provider itself.
    LocalError {
        status: u16,
        error: String,
        description: String,
    },
}

/// An endpoint outcome plus the cookies to set.
#[derive(Debug, Clone)]
pub struct EndpointResponse {
    pub body: ResponseBody,
    pub cookies: Vec<Cookie<'static>>,
}

impl EndpointResponse {
    #[must_use]
    pub fn new(body: ResponseBody) -> Self {
        Self {
            body,
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(ResponseBody::Redirect {
            location: location.into(),
        })
    }

    /// A local error page for `err`: 400, or 500 for server errors.
    #[must_use]
    pub fn local_error(err: &AuthError) -> Self {
        Self::new(ResponseBody::LocalError {
            status: if err.is_server_error() { 500 } else { 400 },
            error: err.oauth_error_code().to_string(),
            description: err.description(),
        })
    }

    #[must_use]
    pub fn with_cookies(mut self, cookies: impl IntoIterator<Item = Cookie<'static>>) -> Self {
        self.cookies.extend(cookies);
        self
    }

    /// The `Location` of a redirect response.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Redirect { location } => Some(location),
            _ => None,
        }
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&Cookie<'static>> {
        self.cookies.iter().rev().find(|c| c.name() == name)
    }
}

/// Delivers `params` to `redirect_uri` using `mode`.
///
/// # Errors
///
/// Returns an internal error if `redirect_uri` is not an absolute URL.
pub fn deliver(
    redirect_uri: &str,
    mode: ResponseMode,
    params: Vec<(String, String)>,
) -> AuthResult<ResponseBody> {
    let mut url = Url::parse(redirect_uri)
        .map_err(|e| AuthError::internal(format!("invalid redirect_uri: {e}")))?;

    match mode {
        ResponseMode::Query => {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        ResponseMode::Fragment => {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params.iter())
                .finish();
            url.set_fragment(Some(&encoded));
        }
        ResponseMode::FormPost => {
            return Ok(ResponseBody::FormPost {
                action: redirect_uri.to_string(),
                params,
            });
        }
    }

    Ok(ResponseBody::Redirect {
        location: url.into(),
    })
}

/// Error parameters for a redirect: `error`, `error_description`, and
/// `state` only if the request carried one.
#[must_use]
pub fn error_params(err: &AuthError, state: Option<&str>) -> Vec<(String, String)> {
    let mut params = vec![
        ("error".to_string(), err.oauth_error_code().to_string()),
        ("error_description".to_string(), err.description()),
    ];
    if let Some(scope) = err.scope() {
        params.push(("scope".to_string(), scope.to_string()));
    }
    if let Some(state) = state {
        params.push(("state".to_string(), state.to_string()));
    }
    params
}

/// Delivers `err` to a trusted target, falling back to a local page.
#[must_use]
pub fn error_response(target: Option<RedirectTarget>, err: &AuthError) -> EndpointResponse {
    let Some(target) = target else {
        return EndpointResponse::local_error(err);
    };
    let params = error_params(err, target.state.as_deref());
    match deliver(&target.redirect_uri, target.mode, params) {
        Ok(body) => EndpointResponse::new(body),
        Err(deliver_err) => {
            tracing::error!(error = %deliver_err, "failed to build error redirect");
            EndpointResponse::local_error(err)
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the auto-submitting `form_post` page.
#[must_use]
pub fn render_form_post(action: &str, params: &[(String, String)]) -> String {
    let inputs: String = params
        .iter()
        .map(|(name, value)| {
            format!(
                "<input type=\"hidden\" name=\"{}\" value=\"{}\"/>",
                escape_html(name),
                escape_html(value)
            )
        })
        .collect();
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Submitting Callback</title></head>\n\
         <body onload=\"javascript:document.forms[0].submit()\">\n\
         <form method=\"post\" action=\"{}\">{inputs}\
         <noscript><button type=\"submit\">Continue</button></noscript></form>\n\
         </body>\n</html>\n",
        escape_html(action)
    )
}

/// Renders a local error page.
#[must_use]
pub fn render_error_page(error: &str, description: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>oops! something went wrong</title></head>\n\
         <body>\n<h1>oops! something went wrong</h1>\n\
         <pre><strong>error</strong>: {}\n<strong>error_description</strong>: {}</pre>\n\
         </body>\n</html>\n",
        escape_html(error),
        escape_html(description)
    )
}
