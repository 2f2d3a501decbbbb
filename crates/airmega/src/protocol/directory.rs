//! Device discovery.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::client::DeviceClient;
use super::envelope;
use super::models::{DeviceStatus, FanSpeed, FilterStatus, Mode};
use crate::credentials::TokenPair;
use crate::error::{AirmegaError, Result};
use crate::http::post_envelope;

/// Handle to one purifier, bound to a shared [`DeviceClient`].
///
/// These six operations are the whole surface an accessory layer needs.
#[derive(Clone)]
pub struct Device {
    id: String,
    display_name: String,
    client: Arc<DeviceClient>,
}

impl Device {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        client: Arc<DeviceClient>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            client,
        }
    }

    /// Vendor barcode.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub async fn get_status(&self) -> Result<DeviceStatus> {
        self.client.get_status(&self.id).await
    }

    pub async fn get_filter_status(&self) -> Result<Vec<FilterStatus>> {
        self.client.get_filter_status(&self.id).await
    }

    pub async fn set_power(&self, on: bool) -> Result<()> {
        self.client.set_power(&self.id, on).await
    }

    pub async fn set_mode(&self, mode: Mode) -> Result<()> {
        self.client.set_mode(&self.id, mode).await
    }

    pub async fn set_fan_speed(&self, speed: FanSpeed) -> Result<()> {
        self.client.set_fan_speed(&self.id, speed).await
    }

    pub async fn set_light(&self, on: bool) -> Result<()> {
        self.client.set_light(&self.id, on).await
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}

/// List the account's devices using `tokens`.
pub async fn list_devices(client: &Arc<DeviceClient>, tokens: &TokenPair) -> Result<Vec<Device>> {
    let session = client.session();
    let message = envelope::device_list(tokens);
    let body = post_envelope(session.http(), session.config(), &message).await?;

    let devices: Vec<Device> = parse_device_list(&body)?
        .into_iter()
        .map(|(id, name)| Device::new(id, name, Arc::clone(client)))
        .collect();

    info!(count = devices.len(), "Found devices");
    Ok(devices)
}

impl DeviceClient {
    /// List devices with the session's current tokens.
    pub async fn devices(self: &Arc<Self>) -> Result<Vec<Device>> {
        let tokens = self.session().tokens().await?;
        list_devices(self, &tokens).await
    }
}

/// `(barcode, nickname)` for every entry of `body.deviceInfos`.
pub(crate) fn parse_device_list(response: &Value) -> Result<Vec<(String, String)>> {
    let infos = response
        .get("body")
        .and_then(|b| b.get("deviceInfos"))
        .and_then(|d| d.as_array())
        .ok_or_else(|| AirmegaError::protocol("no deviceInfos in device list response"))?;

    infos
        .iter()
        .map(|info| {
            let barcode = info
                .get("barcode")
                .and_then(|b| b.as_str())
                .filter(|b| !b.is_empty())
                .ok_or_else(|| AirmegaError::protocol("device entry without barcode"))?;
            let nickname = info
                .get("dvcNick")
                .and_then(|n| n.as_str())
                .filter(|n| !n.is_empty())
                .unwrap_or(barcode);
            debug!(barcode, nickname, "Device entry");
            Ok((barcode.to_string(), nickname.to_string()))
        })
        .collect()
}
