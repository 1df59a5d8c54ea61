//! End-user interaction: prompts, suspended transactions, browser sessions
//! and the coordinator that suspends and resumes authorization requests.

mod coordinator;
pub mod prompt;
pub mod result;
pub mod session;
pub mod transaction;

pub use coordinator::InteractionDetails;
pub use prompt::{Prompt, required_prompts};
pub use result::{ConsentResult, InteractionResult, LoginResult};
pub use session::{ClientAuthorization, Session, SessionStore};
pub use transaction::{Transaction, TransactionStore};

pub(crate) use coordinator::{details, finished, resume, suspend};
