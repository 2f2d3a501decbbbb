//! Password encoding strategies for the credential submission step.
//!
//! The current backend takes the raw password as a form field over TLS. An
//! earlier protocol revision wanted an AES block of the form
//! `base64(iv):hex(ciphertext):base64(key)`; it is kept selectable through
//! [`ClientConfig::legacy_password_cipher`].

use aes::Aes128;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use cbc::cipher::{BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};

use crate::config::ClientConfig;
use crate::error::{AirmegaError, Result};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;

pub trait CredentialEncoder: Send + Sync {
    fn encode_password(&self, password: &str) -> Result<String>;
}

/// Sends the password unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPasswordEncoder;

impl CredentialEncoder for PlainPasswordEncoder {
    fn encode_password(&self, password: &str) -> Result<String> {
        Ok(password.to_string())
    }
}

/// AES-128-CBC password block with a throwaway key and IV shipped alongside.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyCipherEncoder;

impl LegacyCipherEncoder {
    pub fn encode_with(password: &str, key: &[u8; 16], iv: &[u8; 16]) -> Result<String> {
        let ciphertext = Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(|e| AirmegaError::Crypto(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(password.as_bytes());

        Ok(format!(
            "{}:{}:{}",
            STANDARD.encode(iv),
            hex::encode(ciphertext),
            STANDARD.encode(key)
        ))
    }
}

impl CredentialEncoder for LegacyCipherEncoder {
    fn encode_password(&self, password: &str) -> Result<String> {
        let key: [u8; 16] = rand::random();
        let iv: [u8; 16] = rand::random();
        Self::encode_with(password, &key, &iv)
    }
}

/// Pick the encoder the configuration asks for.
pub fn encoder_for(config: &ClientConfig) -> Box<dyn CredentialEncoder> {
    if config.legacy_password_cipher {
        Box::new(LegacyCipherEncoder)
    } else {
        Box::new(PlainPasswordEncoder)
    }
}
