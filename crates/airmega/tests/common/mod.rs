#![allow(dead_code)]

use airmega::ClientConfig;
use serde_json::Value;
use wiremock::{MockServer, Request};

pub const AUTH_PATH: &str = "/auth/realms/cw-account/protocol/openid-connect/auth";
pub const LOGIN_ACTION_PATH: &str = "/auth/realms/cw-account/login-actions/authenticate";
pub const REQUIRED_ACTION_PATH: &str = "/auth/realms/cw-account/login-actions/required-action";

/// Point every endpoint at the mock server.
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_uri: server.uri(),
        openid_url: format!("{}{}", server.uri(), AUTH_PATH),
        ..ClientConfig::default()
    }
}

pub fn fixture(name: &str, server: &MockServer) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(path)
        .unwrap()
        .replace("{{server}}", &server.uri())
}

/// Decode the `message` form field of a vendor API request.
pub fn decode_message(request: &Request) -> Value {
    let message = url::form_urlencoded::parse(&request.body)
        .find(|(key, _)| key == "message")
        .map(|(_, value)| value.into_owned())
        .expect("request has no message field");
    serde_json::from_str(&message).unwrap()
}

pub fn form_field(request: &Request, name: &str) -> Option<String> {
    url::form_urlencoded::parse(&request.body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub async fn requests_to(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == path)
        .collect()
}
