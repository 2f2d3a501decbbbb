//! Device status queries and control commands.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::envelope::{self, ControlCommand, MessageEnvelope};
use super::models::{
    AirQuality, DeviceStatus, FanSpeed, FilterRole, FilterStatus, LightState, Mode, wire_string,
    wire_u8,
};
use crate::config::endpoints;
use crate::credentials::TokenPair;
use crate::error::{AirmegaError, Result};
use crate::http::post_envelope;
use crate::session::Session;

/// Executes device operations with tokens from the shared [`Session`].
///
/// Control calls are always followed by a device refresh call; the backend
/// ignores a control command otherwise. The pair is serialized per device.
pub struct DeviceClient {
    session: Arc<Session>,
    control_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl DeviceClient {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            control_locks: DashMap::new(),
        }
    }

    #[inline]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    #[instrument(skip(self))]
    pub async fn get_status(&self, device_id: &str) -> Result<DeviceStatus> {
        let body = self
            .call(|tokens| envelope::device_query(endpoints::STATUS, device_id, tokens))
            .await?;
        parse_status(&body)
    }

    #[instrument(skip(self))]
    pub async fn get_filter_status(&self, device_id: &str) -> Result<Vec<FilterStatus>> {
        let body = self
            .call(|tokens| envelope::device_query(endpoints::FILTERS, device_id, tokens))
            .await?;
        parse_filters(&body)
    }

    pub async fn set_power(&self, device_id: &str, on: bool) -> Result<()> {
        self.send_control(device_id, ControlCommand::power(on)).await
    }

    pub async fn set_mode(&self, device_id: &str, mode: Mode) -> Result<()> {
        self.send_control(device_id, ControlCommand::mode(mode)?).await
    }

    pub async fn set_fan_speed(&self, device_id: &str, speed: FanSpeed) -> Result<()> {
        self.send_control(device_id, ControlCommand::fan_speed(speed)?)
            .await
    }

    pub async fn set_light(&self, device_id: &str, on: bool) -> Result<()> {
        self.send_control(device_id, ControlCommand::light(on)).await
    }

    /// Send a control command, then the mandatory device refresh.
    ///
    /// If the control call fails the refresh is not sent.
    #[instrument(skip(self), fields(function = %command.function_id, value = %command.command_value))]
    pub async fn send_control(&self, device_id: &str, command: ControlCommand) -> Result<()> {
        let lock = self.control_lock(device_id);
        let _guard = lock.lock().await;

        self.call(|tokens| envelope::control(device_id, &command, tokens))
            .await?;
        self.call(|tokens| envelope::device_refresh(device_id, tokens))
            .await?;

        debug!("Control applied");
        Ok(())
    }

    /// Fetch fresh tokens, build the envelope with them and send it.
    pub(crate) async fn call(
        &self,
        build: impl FnOnce(&TokenPair) -> MessageEnvelope,
    ) -> Result<Value> {
        let tokens = self.session.tokens().await?;
        let message = build(&tokens);
        post_envelope(self.session.http(), self.session.config(), &message).await
    }

    fn control_lock(&self, device_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.control_locks
            .entry(device_id.to_string())
            .or_default()
            .clone()
    }
}

/// Status fields other than `power` are read leniently: a value that is
/// missing or not numeric is logged and mapped to 0, which every status enum
/// keeps as an unknown value.
fn lenient_u8(entry: &Value, name: &str) -> u8 {
    match entry.get(name).and_then(wire_u8) {
        Some(value) => value,
        None => {
            warn!(field = name, value = ?entry.get(name), "Unreadable status field");
            0
        }
    }
}

/// Normalize the first element of `body.prodStatus`.
pub(crate) fn parse_status(response: &Value) -> Result<DeviceStatus> {
    let entry = response
        .get("body")
        .and_then(|b| b.get("prodStatus"))
        .and_then(|s| s.as_array())
        .ok_or_else(|| AirmegaError::protocol("no prodStatus in status response"))?
        .first()
        .ok_or_else(|| AirmegaError::protocol("empty prodStatus in status response"))?;

    let power = entry
        .get("power")
        .and_then(wire_u8)
        .ok_or_else(|| AirmegaError::protocol("status field power missing or invalid"))?;

    Ok(DeviceStatus {
        power: power != 0,
        light: LightState::from_wire(lenient_u8(entry, "light")),
        fan_speed: FanSpeed::from_wire(lenient_u8(entry, "airVolume")),
        mode: Mode::from_wire(lenient_u8(entry, "prodMode")),
        air_quality: AirQuality::from_wire(lenient_u8(entry, "dustPollution")),
    })
}

/// Map `body.filterList`, resolving roles by vendor code.
pub(crate) fn parse_filters(response: &Value) -> Result<Vec<FilterStatus>> {
    let list = response
        .get("body")
        .and_then(|b| b.get("filterList"))
        .and_then(|l| l.as_array())
        .ok_or_else(|| AirmegaError::protocol("no filterList in filter response"))?;

    list.iter()
        .map(|filter| {
            let vendor_code = filter
                .get("filterCode")
                .and_then(wire_string)
                .ok_or_else(|| AirmegaError::protocol("filter entry without filterCode"))?;
            let life_level = filter
                .get("filterPer")
                .and_then(wire_u8)
                .ok_or_else(|| AirmegaError::protocol("filter entry without filterPer"))?;
            let name = filter
                .get("filterName")
                .and_then(|n| n.as_str())
                .unwrap_or_default()
                .to_string();

            Ok(FilterStatus {
                role: FilterRole::from_code(&vendor_code),
                life_level_percent: life_level.min(100),
                vendor_code,
                name,
            })
        })
        .collect()
}
