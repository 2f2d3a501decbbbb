use std::sync::Arc;

use airmega::{AirmegaError, Device, DeviceClient, FanSpeed, FileCredentialStore, Mode, Session};
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::OutputManager;

#[derive(Debug, Clone, Copy)]
pub enum ControlAction {
    Power(bool),
    Mode(Mode),
    Fan(u8),
    Light(bool),
}

pub struct CommandExecutor {
    config: AppConfig,
    username: Option<String>,
    password: Option<String>,
    output: OutputManager,
}

impl CommandExecutor {
    pub fn new(
        config: AppConfig,
        username: Option<String>,
        password: Option<String>,
        format: OutputFormat,
    ) -> Self {
        let username = username.or_else(|| config.username.clone());
        let password = password.or_else(|| config.password.clone());
        Self {
            config,
            username,
            password,
            output: OutputManager::new(format),
        }
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
            _ => Err(CliError::MissingCredentials),
        }
    }

    /// Build a session from the token cache, logging in when the cache is
    /// empty or its tokens can no longer be refreshed.
    async fn session(&self, force_login: bool) -> Result<Arc<Session>> {
        let store = Arc::new(FileCredentialStore::new(self.config.token_cache_path()));
        let session = Arc::new(Session::new(self.config.client.clone(), store)?);

        let needs_login = if force_login || !session.has_tokens().await? {
            true
        } else {
            match session.tokens().await {
                Ok(_) => false,
                Err(e) if e.requires_relogin() => {
                    warn!("Cached tokens unusable ({}), logging in again", e);
                    true
                }
                Err(e) => return Err(e.into()),
            }
        };

        if needs_login {
            let (username, password) = self.credentials()?;
            session.login(username, password).await?;
            info!("Logged in as {}", username);
        }

        Ok(session)
    }

    async fn client(&self) -> Result<Arc<DeviceClient>> {
        let session = self.session(false).await?;
        Ok(Arc::new(DeviceClient::new(session)))
    }

    async fn find_device(&self, query: &str) -> Result<Device> {
        let devices = self.client().await?.devices().await?;
        devices
            .into_iter()
            .find(|d| d.id() == query || d.display_name().eq_ignore_ascii_case(query))
            .ok_or_else(|| CliError::DeviceNotFound(query.to_string()))
    }

    pub async fn login(&self) -> Result<()> {
        self.session(true).await?;
        println!(
            "Logged in, tokens cached at {}",
            self.config.token_cache_path().display()
        );
        Ok(())
    }

    pub async fn list_devices(&self) -> Result<()> {
        let devices = self.client().await?.devices().await?;
        println!("{}", self.output.format_devices(&devices)?);
        Ok(())
    }

    pub async fn status(&self, query: &str) -> Result<()> {
        let device = self.find_device(query).await?;
        let status = device.get_status().await?;
        println!("{}", self.output.format_status(&device, &status)?);
        Ok(())
    }

    pub async fn filters(&self, query: &str) -> Result<()> {
        let device = self.find_device(query).await?;
        let filters = device.get_filter_status().await?;
        println!("{}", self.output.format_filters(&device, &filters)?);
        Ok(())
    }

    pub async fn control(&self, query: &str, action: ControlAction) -> Result<()> {
        let device = self.find_device(query).await?;
        let result: std::result::Result<(), AirmegaError> = match action {
            ControlAction::Power(on) => device.set_power(on).await,
            ControlAction::Mode(mode) => device.set_mode(mode).await,
            ControlAction::Fan(speed) => device.set_fan_speed(FanSpeed::from(speed)).await,
            ControlAction::Light(on) => device.set_light(on).await,
        };
        result?;

        info!(device = %device, ?action, "Control sent");
        println!("✓ {} updated", device.display_name());
        Ok(())
    }
}
