//! Vendor message envelopes.
//!
//! Every call to the vendor API is a form POST with a single `message` field
//! holding `{"header": {...}, "body": {...}}` as JSON. Builders here are pure:
//! no I/O, no shared state. Envelopes embed the current tokens, so a fresh one
//! is built for every call.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::models::{FanSpeed, Mode};
use crate::config::{ClientConfig, device, endpoints};
use crate::credentials::{TokenPair, redact};
use crate::error::{AirmegaError, Result};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    pub trcode: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for MessageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageHeader")
            .field("trcode", &self.trcode)
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub header: MessageHeader,
    pub body: Value,
}

impl MessageEnvelope {
    #[inline]
    pub fn operation_code(&self) -> &str {
        &self.header.trcode
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Form fields of the POST carrying this envelope.
    pub fn form_fields(&self) -> Result<[(&'static str, String); 1]> {
        Ok([("message", self.to_json()?)])
    }

    /// The single control entry of a control envelope.
    pub fn control_command(&self) -> Option<ControlCommand> {
        let entry = self.body.get("funcList")?.as_array()?.first()?;
        serde_json::from_value(entry.clone()).ok()
    }
}

/// Build an envelope for `operation_code`. `None` tokens produce empty header
/// tokens, which is what the code-for-token exchange expects.
pub fn build_envelope(
    operation_code: &str,
    tokens: Option<&TokenPair>,
    body: Value,
) -> MessageEnvelope {
    let (access_token, refresh_token) = tokens
        .map(|t| (t.access_token.clone(), t.refresh_token.clone()))
        .unwrap_or_default();

    MessageEnvelope {
        header: MessageHeader {
            trcode: operation_code.to_string(),
            access_token,
            refresh_token,
        },
        body,
    }
}

/// Controllable device functions and their vendor function ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFunction {
    Power,
    Mode,
    FanSpeed,
    Light,
}

impl ControlFunction {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Power => "0001",
            Self::Mode => "0002",
            Self::FanSpeed => "0003",
            Self::Light => "0007",
        }
    }
}

/// One `{comdVal, funcId}` entry of a control envelope's `funcList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlCommand {
    #[serde(rename = "comdVal")]
    pub command_value: String,
    #[serde(rename = "funcId")]
    pub function_id: String,
}

impl ControlCommand {
    pub fn new(function: ControlFunction, value: impl Into<String>) -> Self {
        Self {
            command_value: value.into(),
            function_id: function.code().to_string(),
        }
    }

    pub fn power(on: bool) -> Self {
        Self::new(ControlFunction::Power, if on { "1" } else { "0" })
    }

    /// Only `Auto` and `Manual` can be set.
    pub fn mode(mode: Mode) -> Result<Self> {
        match mode {
            Mode::Auto | Mode::Manual => Ok(Self::new(ControlFunction::Mode, mode.as_wire())),
            Mode::Other(n) => Err(AirmegaError::protocol(format!(
                "mode {n} cannot be set"
            ))),
        }
    }

    /// Only the three named speeds can be set.
    pub fn fan_speed(speed: FanSpeed) -> Result<Self> {
        match speed {
            FanSpeed::Low | FanSpeed::Medium | FanSpeed::High => Ok(Self::new(
                ControlFunction::FanSpeed,
                speed.level().to_string(),
            )),
            FanSpeed::Other(n) => Err(AirmegaError::protocol(format!(
                "fan speed {n} cannot be set"
            ))),
        }
    }

    pub fn light(on: bool) -> Self {
        Self::new(ControlFunction::Light, if on { "2" } else { "0" })
    }
}

pub fn device_list(tokens: &TokenPair) -> MessageEnvelope {
    build_envelope(
        endpoints::DEVICE_LIST,
        Some(tokens),
        json!({
            "pageIndex": "0",
            "pageSize": "100",
        }),
    )
}

/// Status-shaped query; used for both the status and the filter endpoints.
pub fn device_query(operation_code: &str, device_id: &str, tokens: &TokenPair) -> MessageEnvelope {
    build_envelope(
        operation_code,
        Some(tokens),
        json!({
            "barcode": device_id,
            "dvcBrandCd": device::BRAND_CODE,
            "prodName": device::PRODUCT_NAME,
            "stationCd": "",
            "resetDttm": "",
            "deviceType": device::TYPE_CODE,
        }),
    )
}

pub fn control(device_id: &str, command: &ControlCommand, tokens: &TokenPair) -> MessageEnvelope {
    build_envelope(
        endpoints::CONTROL,
        Some(tokens),
        json!({
            "barcode": device_id,
            "dvcBrandCd": device::BRAND_CODE,
            "dvcTypeCd": device::TYPE_CODE,
            "prodName": device::PRODUCT_NAME,
            "funcList": [command],
        }),
    )
}

/// The refresh call that must follow every control call.
pub fn device_refresh(device_id: &str, tokens: &TokenPair) -> MessageEnvelope {
    build_envelope(
        endpoints::DEVICE_REFRESH,
        Some(tokens),
        json!({
            "barcode": device_id,
            "dvcBrandCd": device::BRAND_CODE,
            "prodName": device::PRODUCT_NAME,
            "dvcTypeCd": device::TYPE_CODE,
        }),
    )
}

pub fn token_exchange(auth_code: &str, config: &ClientConfig) -> MessageEnvelope {
    build_envelope(
        endpoints::TOKEN_REFRESH,
        None,
        json!({
            "authCode": auth_code,
            "isMobile": "M",
            "langCd": "en",
            "osType": 1,
            "redirectUrl": config.redirect_url,
            "serviceCode": config.service_code,
        }),
    )
}

pub fn token_refresh(tokens: &TokenPair, config: &ClientConfig) -> MessageEnvelope {
    build_envelope(
        endpoints::TOKEN_REFRESH,
        Some(tokens),
        json!({
            "isMobile": "M",
            "langCd": "en",
            "osType": 1,
            "redirectUrl": config.redirect_url,
            "serviceCode": config.service_code,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tokens() -> TokenPair {
        TokenPair::new("access-1", "refresh-1", Utc::now())
    }

    #[test]
    fn test_fan_speed_control_roundtrip() {
        let envelope = control("BARCODE1", &ControlCommand::fan_speed(FanSpeed::from(3)).unwrap(), &tokens());
        let parsed = MessageEnvelope::from_json(&envelope.to_json().unwrap()).unwrap();

        let command = parsed.control_command().unwrap();
        assert_eq!(command.function_id, "0003");
        assert_eq!(command.command_value, "3");
        assert_eq!(parsed.operation_code(), "CWIG0603");
    }

    #[test]
    fn test_control_wire_values() {
        assert_eq!(ControlCommand::power(true).command_value, "1");
        assert_eq!(ControlCommand::power(false).command_value, "0");
        assert_eq!(ControlCommand::mode(Mode::Auto).unwrap().command_value, "1");
        assert_eq!(ControlCommand::mode(Mode::Manual).unwrap().command_value, "2");
        assert_eq!(ControlCommand::light(true).command_value, "2");
        assert_eq!(ControlCommand::light(false).command_value, "0");
        assert_eq!(ControlCommand::light(true).function_id, "0007");
        assert_eq!(ControlCommand::mode(Mode::Auto).unwrap().function_id, "0002");
        assert_eq!(ControlCommand::power(true).function_id, "0001");
    }

    #[test]
    fn test_undefined_control_values_are_rejected() {
        assert!(matches!(
            ControlCommand::mode(Mode::Other(5)),
            Err(AirmegaError::Protocol(_))
        ));
        assert!(matches!(
            ControlCommand::fan_speed(FanSpeed::Other(0)),
            Err(AirmegaError::Protocol(_))
        ));
        assert!(ControlCommand::fan_speed(FanSpeed::from(200)).is_err());
    }

    #[test]
    fn test_header_uses_wire_names() {
        let value = serde_json::to_value(device_list(&tokens())).unwrap();
        assert_eq!(value["header"]["trcode"], "CWIG0304");
        assert_eq!(value["header"]["accessToken"], "access-1");
        assert_eq!(value["header"]["refreshToken"], "refresh-1");
        assert_eq!(value["body"]["pageSize"], "100");
    }

    #[test]
    fn test_token_exchange_has_empty_tokens() {
        let envelope = token_exchange("CODE", &ClientConfig::default());
        assert!(envelope.header.access_token.is_empty());
        assert!(envelope.header.refresh_token.is_empty());
        assert_eq!(envelope.body["authCode"], "CODE");
        assert_eq!(envelope.body["serviceCode"], "com.coway.IOCareKor");
    }

    #[test]
    fn test_refresh_envelope_targets_device() {
        let envelope = device_refresh("BARCODE1", &tokens());
        assert_eq!(envelope.operation_code(), "CWIG0602");
        assert_eq!(envelope.body["barcode"], "BARCODE1");
        assert!(envelope.control_command().is_none());
    }

    #[test]
    fn test_debug_hides_tokens() {
        let out = format!("{:?}", device_list(&tokens()));
        assert!(!out.contains("access-1"));
    }
}
