//! HTTP transport setup and the envelope POST shared by every vendor call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, redirect};
use rustls_platform_verifier::BuilderVerifierExt;
use serde_json::Value;
use tracing::debug;

use crate::config::{ACCEPT_JSON, ClientConfig};
use crate::error::{AirmegaError, Result};
use crate::protocol::MessageEnvelope;

/// Build the HTTP client used for both the identity provider and the vendor API.
///
/// Redirects are not followed: the login flow reads the authorization code
/// from the `Location` header of the redirect itself.
pub fn default_client(config: &ClientConfig) -> Result<Client> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let tls_config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| AirmegaError::Config(format!("TLS protocol versions: {e}")))?
        .with_platform_verifier()
        .map_err(|e| AirmegaError::Config(format!("TLS verifier: {e}")))?
        .with_no_client_auth();

    let client = Client::builder()
        .use_preconfigured_tls(tls_config)
        .redirect(redirect::Policy::none())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// POST an envelope to its operation endpoint and return the decoded JSON reply.
pub(crate) async fn post_envelope(
    client: &Client,
    config: &ClientConfig,
    envelope: &MessageEnvelope,
) -> Result<Value> {
    let url = config.endpoint_url(envelope.operation_code());
    debug!(trcode = envelope.operation_code(), ?envelope, "Sending envelope");

    let response = client
        .post(&url)
        .header(USER_AGENT, &config.user_agent)
        .header(ACCEPT, ACCEPT_JSON)
        .form(&envelope.form_fields()?)
        .send()
        .await?
        .error_for_status()?;

    let text = response.text().await?;
    let body: Value = serde_json::from_str(&text).map_err(|e| {
        AirmegaError::protocol(format!(
            "{} returned invalid JSON: {}",
            envelope.operation_code(),
            e
        ))
    })?;

    debug!(trcode = envelope.operation_code(), "Got response");
    Ok(body)
}
