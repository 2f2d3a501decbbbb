//! Explicit session context.
//!
//! A [`Session`] is created once at process start and shared by every device
//! operation. `login` populates the credential store; `tokens` hands out the
//! stored pair, refreshing and persisting it first when it has expired. There
//! is no teardown.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::credentials::{CredentialStore, TokenPair};
use crate::error::{AirmegaError, Result};
use crate::http::default_client;

pub struct Session {
    client: Client,
    config: Arc<ClientConfig>,
    store: Arc<dyn CredentialStore>,
    authenticator: Authenticator,
    /// Collapses concurrent refreshes; a redundant refresh would still be harmless.
    refresh_lock: Mutex<()>,
}

impl Session {
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let client = default_client(&config)?;
        Ok(Self::with_client(client, config, store))
    }

    pub fn with_client(client: Client, config: ClientConfig, store: Arc<dyn CredentialStore>) -> Self {
        let config = Arc::new(config);
        let authenticator = Authenticator::new(client.clone(), Arc::clone(&config));
        Self {
            client,
            config,
            store,
            authenticator,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Replace the authenticator, e.g. to plug in a different page parser.
    pub fn with_authenticator(mut self, authenticator: Authenticator) -> Self {
        self.authenticator = authenticator;
        self
    }

    #[inline]
    pub fn http(&self) -> &Client {
        &self.client
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    #[inline]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Log in and persist the issued pair. A failed login stores nothing.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        let tokens = self.authenticator.login(username, password).await?;
        self.store.save(&tokens).await?;
        Ok(tokens)
    }

    /// Whether a previously persisted pair is available.
    pub async fn has_tokens(&self) -> Result<bool> {
        Ok(self.store.load().await?.is_some())
    }

    /// Current tokens, refreshed first if expired. Never returns a stale pair.
    pub async fn tokens(&self) -> Result<TokenPair> {
        let tokens = self.load_tokens().await?;
        if !tokens.is_expired_at(Utc::now()) {
            return Ok(tokens);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        let tokens = self.load_tokens().await?;
        if !tokens.is_expired_at(Utc::now()) {
            debug!("Tokens refreshed by a concurrent caller");
            return Ok(tokens);
        }

        info!("Auth tokens are expired, refreshing");
        let fresh = self.authenticator.refresh_tokens(&tokens).await?;
        self.store.save(&fresh).await?;
        Ok(fresh)
    }

    async fn load_tokens(&self) -> Result<TokenPair> {
        self.store
            .load()
            .await?
            .ok_or_else(|| AirmegaError::Token("no stored tokens, login required".into()))
    }
}
