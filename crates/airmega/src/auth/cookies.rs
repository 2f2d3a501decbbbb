//! Session cookie tracking for the login flow.
//!
//! The identity provider keeps its login state in cookies; every step must
//! send back what the previous steps set.

use reqwest::header::{HeaderMap, SET_COOKIE};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    cookies: Vec<(String, String)>,
}

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = Self::new();
        cookies.merge_headers(headers);
        cookies
    }

    /// Apply `Set-Cookie` headers. Later values replace earlier ones and
    /// expired or emptied cookies are dropped.
    pub fn merge_headers(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(cookie_str) = value.to_str() else {
                continue;
            };
            self.apply_set_cookie(cookie_str);
        }
    }

    fn apply_set_cookie(&mut self, cookie_str: &str) {
        let mut parts = cookie_str.split(';');
        let Some((name, value)) = parts.next().and_then(|kv| kv.split_once('=')) else {
            return;
        };
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            return;
        }

        let expired = value.is_empty()
            || parts.any(|attr| attr.trim().eq_ignore_ascii_case("max-age=0"));

        self.cookies.retain(|(n, _)| n != name);
        if !expired {
            self.cookies.push((name.to_string(), value.to_string()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Value for a `Cookie` request header.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
