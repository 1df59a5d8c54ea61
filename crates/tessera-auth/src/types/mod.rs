//! Domain types shared across the engine.

mod account;
mod client;
mod response;
mod scope;

pub use account::{Account, ClaimsRequest};
pub use client::{Client, ClientValidationError, GrantType, SubjectType, TokenEndpointAuthMethod};
pub use response::{ResponseMode, ResponseType};
pub use scope::Scope;
