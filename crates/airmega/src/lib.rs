//! Cloud client for Coway Airmega air purifiers.
//!
//! - [`auth`]: account login against the vendor identity provider and token refresh
//! - [`credentials`]: token pair storage
//! - [`Session`]: the shared context that hands out fresh tokens
//! - [`protocol`]: message envelopes, device status/control and device discovery
//!
//! ```no_run
//! # async fn run() -> airmega::Result<()> {
//! use std::sync::Arc;
//! use airmega::{ClientConfig, DeviceClient, MemoryCredentialStore, Session};
//!
//! let session = Arc::new(Session::new(
//!     ClientConfig::default(),
//!     Arc::new(MemoryCredentialStore::new()),
//! )?);
//! session.login("user@example.com", "password").await?;
//!
//! let client = Arc::new(DeviceClient::new(session));
//! for device in client.devices().await? {
//!     println!("{}: {:?}", device, device.get_status().await?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod protocol;
mod session;

pub use config::ClientConfig;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TokenPair};
pub use error::{AirmegaError, Result};
pub use protocol::{Device, DeviceClient, DeviceStatus, FanSpeed, FilterRole, FilterStatus, Mode};
pub use session::Session;
