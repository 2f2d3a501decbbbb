//! Vendor constants and the client configuration.
//!
//! The operation codes, endpoints and user agent are fixed by the vendor
//! backend and must be reproduced byte-for-byte.

use serde::{Deserialize, Serialize};

pub const BASE_URI: &str = "https://iocareapp.coway.com/bizmob.iocare";
pub const USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 10_3_1 like Mac OS X) AppleWebKit/603.1.30 (KHTML, like Gecko) Version/10.0 Mobile/14E304 Safari/602.1 app";
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const ACCEPT_JSON: &str = "application/json, text/plain, */*";
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

pub mod auth {
    pub const OPENID_URL: &str =
        "https://id.coway.com/auth/realms/cw-account/protocol/openid-connect/auth";
    pub const REDIRECT_URL: &str =
        "https://iocareapp.coway.com/bizmob.iocare/redirect/redirect.html";
    pub const OPENID_CLIENT_ID: &str = "cwid-prd-iocare-20220930";
    pub const SERVICE_CODE: &str = "com.coway.IOCareKor";
    pub const LOGIN_FORM_ID: &str = "kc-form-login";
    pub const PASSWORD_CHANGE_FORM_ID: &str = "kc-passwd-update-form";
}

/// Operation codes (`trcode`) of the vendor API.
pub mod endpoints {
    pub const DEVICE_LIST: &str = "CWIG0304";
    pub const DEVICE_REFRESH: &str = "CWIG0602";
    pub const TOKEN_REFRESH: &str = "CWIL0100";
    pub const STATUS: &str = "CWIA0120";
    pub const CONTROL: &str = "CWIG0603";
    pub const FILTERS: &str = "CWIA0800";
}

/// Device constants shared by every device-scoped envelope.
pub mod device {
    pub const BRAND_CODE: &str = "MG";
    pub const PRODUCT_NAME: &str = "AIRMEGA";
    pub const TYPE_CODE: &str = "004";
}

pub mod filters {
    pub const PRE_FILTER_CODE: &str = "3121332";
    pub const MAIN_FILTER_CODE: &str = "3104756";
    /// Main filter code reported by older firmware.
    pub const LEGACY_MAIN_FILTER_CODE: &str = "3111735";
    /// Life level at or below which a filter should be replaced.
    pub const CHANGE_THRESHOLD_PERCENT: u8 = 20;
}

/// Client configuration.
///
/// Every field defaults to the production vendor value; overriding is only
/// useful against a mock backend or after vendor drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_uri: String,
    pub openid_url: String,
    pub redirect_url: String,
    pub openid_client_id: String,
    pub service_code: String,
    pub user_agent: String,
    pub login_form_id: String,
    pub password_change_form_id: String,
    /// Encrypt the password with the legacy block cipher before submission.
    pub legacy_password_cipher: bool,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_uri: BASE_URI.to_string(),
            openid_url: auth::OPENID_URL.to_string(),
            redirect_url: auth::REDIRECT_URL.to_string(),
            openid_client_id: auth::OPENID_CLIENT_ID.to_string(),
            service_code: auth::SERVICE_CODE.to_string(),
            user_agent: USER_AGENT.to_string(),
            login_form_id: auth::LOGIN_FORM_ID.to_string(),
            password_change_form_id: auth::PASSWORD_CHANGE_FORM_ID.to_string(),
            legacy_password_cipher: false,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Full URL of the vendor endpoint for an operation code.
    pub fn endpoint_url(&self, operation_code: &str) -> String {
        format!(
            "{}/{}.json",
            self.base_uri.trim_end_matches('/'),
            operation_code
        )
    }
}
