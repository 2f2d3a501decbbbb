//! Account login and token refresh against the vendor identity provider.
//!
//! Login is a strictly sequential flow where every step feeds the next:
//! 1. GET the OpenID authorization page, keep its cookies
//! 2. Find the login form and its action URL
//! 3. POST the credentials to that action
//! 4. Expect a redirect carrying `code`; a password-change page is deferred once
//! 5. Exchange the code for a token pair on the vendor API

use std::sync::Arc;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, LOCATION, USER_AGENT};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::cookies::SessionCookies;
use super::encoder::{CredentialEncoder, encoder_for};
use super::login_page::{HtmlFormParser, LoginPageParser};
use crate::config::{ACCEPT_HTML, ACCEPT_LANGUAGE as ACCEPT_LANGUAGE_VALUE, ClientConfig};
use crate::credentials::TokenPair;
use crate::error::{AirmegaError, Result};
use crate::http::post_envelope;
use crate::protocol::envelope;

/// Fallback for `Location` values that are not valid URLs.
static AUTH_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^&]+&code=(.*)").unwrap());

/// What the identity provider answered to a form submission.
#[derive(Debug)]
enum SubmitOutcome {
    Redirect { location: String, base: Url },
    PasswordChange { html: String, base: Url },
}

pub struct Authenticator {
    client: Client,
    config: Arc<ClientConfig>,
    parser: Box<dyn LoginPageParser>,
    encoder: Box<dyn CredentialEncoder>,
}

impl Authenticator {
    pub fn new(client: Client, config: Arc<ClientConfig>) -> Self {
        let encoder = encoder_for(&config);
        Self {
            client,
            config,
            parser: Box::new(HtmlFormParser),
            encoder,
        }
    }

    pub fn with_parser(mut self, parser: impl LoginPageParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_encoder(mut self, encoder: impl CredentialEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    /// Turn account credentials into a token pair. Nothing is persisted here.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        info!("Logging in");

        let (mut cookies, page_url, html) = self.request_login_page().await?;

        let action = self
            .parser
            .extract_form_action(&html, &self.config.login_form_id)
            .ok_or_else(|| AirmegaError::auth("login form or its action not found"))?;
        let action = resolve(&page_url, &action)?;

        let password = self.encoder.encode_password(password)?;
        let response = self
            .submit_credentials(&action, &cookies, username, &password)
            .await?;

        let outcome = match classify(response, &mut cookies).await? {
            SubmitOutcome::PasswordChange { html, base } => {
                warn!("Identity provider requested a password change, deferring");
                let response = self
                    .defer_password_change(&html, &base, &cookies, &password)
                    .await?;
                // Deferral happens at most once
                match classify(response, &mut cookies).await? {
                    SubmitOutcome::PasswordChange { .. } => {
                        return Err(AirmegaError::auth(
                            "password change requested again after deferral",
                        ));
                    }
                    redirect => redirect,
                }
            }
            redirect => redirect,
        };

        let SubmitOutcome::Redirect { location, base } = outcome else {
            return Err(AirmegaError::auth("missing code"));
        };
        let code = extract_auth_code(&location, Some(&base))
            .ok_or_else(|| AirmegaError::auth("missing code"))?;
        debug!("Got authorization code");

        let tokens = self.exchange_code(&code).await?;
        info!("Login succeeded");
        Ok(tokens)
    }

    /// Trade an expiring pair for a fresh one. No retry.
    #[instrument(skip_all)]
    pub async fn refresh_tokens(&self, old: &TokenPair) -> Result<TokenPair> {
        let message = envelope::token_refresh(old, &self.config);
        let body = post_envelope(&self.client, &self.config, &message)
            .await
            .map_err(|e| {
                // Network failures pass through; anything the server said is a token failure
                if matches!(&e, AirmegaError::Transport(err) if !err.is_status()) {
                    e
                } else {
                    AirmegaError::Token(format!("refresh failed: {e}"))
                }
            })?;

        let tokens = tokens_from_response(&body)
            .ok_or_else(|| AirmegaError::Token("refresh response carried no tokens".into()))?;
        info!("Token refresh succeeded");
        Ok(tokens)
    }

    async fn request_login_page(&self) -> Result<(SessionCookies, Url, String)> {
        let response = self
            .client
            .get(&self.config.openid_url)
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .query(&[
                ("auth_type", "0"),
                ("response_type", "code"),
                ("client_id", self.config.openid_client_id.as_str()),
                ("scope", "openid"),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AirmegaError::auth(format!(
                "login page returned HTTP {status}"
            )));
        }

        let cookies = SessionCookies::from_headers(response.headers());
        let url = response.url().clone();
        let html = response.text().await?;
        debug!(cookies = !cookies.is_empty(), "Fetched login page");

        Ok((cookies, url, html))
    }

    async fn submit_credentials(
        &self,
        action: &Url,
        cookies: &SessionCookies,
        username: &str,
        password: &str,
    ) -> Result<Response> {
        let form = [
            ("clientName", "IOCARE"),
            ("termAgreeStatus", ""),
            ("idp", ""),
            ("username", username),
            ("password", password),
            ("rememberMe", "on"),
        ];

        let response = self
            .client
            .post(action.clone())
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, ACCEPT_HTML)
            .header(COOKIE, cookies.header_value())
            .form(&form)
            .send()
            .await?;
        Ok(response)
    }

    async fn defer_password_change(
        &self,
        html: &str,
        base: &Url,
        cookies: &SessionCookies,
        password: &str,
    ) -> Result<Response> {
        let action = self
            .parser
            .extract_form_action(html, &self.config.password_change_form_id)
            .ok_or_else(|| AirmegaError::auth("password change form or its action not found"))?;
        let action = resolve(base, &action)?;

        let form = [
            ("cmd", "change_next_time"),
            ("checkPasswordNeededYn", "Y"),
            ("current_password", password),
            ("new_password", ""),
            ("password_confirm", ""),
        ];

        let response = self
            .client
            .post(action)
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, ACCEPT_HTML)
            .header(COOKIE, cookies.header_value())
            .form(&form)
            .send()
            .await?;
        Ok(response)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenPair> {
        let message = envelope::token_exchange(code, &self.config);
        let body = post_envelope(&self.client, &self.config, &message).await?;

        tokens_from_response(&body)
            .ok_or_else(|| AirmegaError::auth("token exchange returned no tokens"))
    }
}

/// Sort a submission response into redirect / password-change / error.
async fn classify(response: Response, cookies: &mut SessionCookies) -> Result<SubmitOutcome> {
    cookies.merge_headers(response.headers());
    let status = response.status();
    let base = response.url().clone();

    if status.is_redirection() {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AirmegaError::auth(format!("HTTP {status} without Location")))?
            .to_string();
        return Ok(SubmitOutcome::Redirect { location, base });
    }

    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));

    if status == reqwest::StatusCode::OK && is_html {
        let html = response.text().await?;
        return Ok(SubmitOutcome::PasswordChange { html, base });
    }

    Err(AirmegaError::auth(format!(
        "unexpected response to form submission: HTTP {status}"
    )))
}

fn resolve(base: &Url, target: &str) -> Result<Url> {
    base.join(target)
        .map_err(|e| AirmegaError::auth(format!("invalid form action {target:?}: {e}")))
}

/// Pull the `code` query parameter out of a redirect `Location`.
///
/// Relative locations are resolved against `base`. Values that do not parse
/// as URLs fall back to the `[^&]+&code=(.*)` pattern.
pub fn extract_auth_code(location: &str, base: Option<&Url>) -> Option<String> {
    let parsed = match base {
        Some(base) => base.join(location),
        None => Url::parse(location),
    };

    match parsed {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .filter(|code| !code.is_empty()),
        Err(_) => AUTH_CODE_REGEX
            .captures(location)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|code| !code.is_empty()),
    }
}

/// Read `header.accessToken` / `header.refreshToken`; both must be non-empty.
fn tokens_from_response(body: &Value) -> Option<TokenPair> {
    let header = body.get("header")?;
    let access = header.get("accessToken")?.as_str()?;
    let refresh = header.get("refreshToken")?.as_str()?;

    let tokens = TokenPair::new(access, refresh, Utc::now());
    tokens.is_complete().then_some(tokens)
}
