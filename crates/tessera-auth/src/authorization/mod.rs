//! Authorization endpoint: request validation, responses and issuance.
//!
//! - [`params`]: the request parameters
//! - [`context`]: per-request state and the error delivery rule
//! - [`checks`]: the ordered validation chain
//! - [`response`]: redirect / form_post / local error responses
//! - [`issue`]: artifacts for admitted requests

pub mod checks;
pub mod context;
mod endpoint;
pub mod issue;
pub mod params;
pub mod response;

pub use checks::{AuthorizationCheck, ChainEnv, ValidationChain};
pub use context::{AuthorizationContext, RedirectTarget};
pub use issue::session_state;
pub use params::AuthorizationParams;
pub use response::{EndpointResponse, ResponseBody, render_error_page, render_form_post};

pub(crate) use endpoint::{authorize, reject};
pub(crate) use issue::issue;
