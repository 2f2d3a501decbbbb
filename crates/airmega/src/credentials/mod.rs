//! Token pair storage.
//!
//! - [`TokenPair`]: the access/refresh credential plus issue time
//! - [`CredentialStore`]: persistence trait consumed by the session
//! - [`MemoryCredentialStore`], [`FileCredentialStore`]: bundled implementations

mod store;
mod types;

pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub(crate) use types::redact;
pub use types::{TOKEN_LIFETIME_MS, TokenPair};
