use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

// Tokens saved by `credentials set` are sealed with PIPEFY_FLOW_MASTER_KEY
// (32 bytes, hex). Without it a fixed development key is used.
const DEFAULT_DEV_KEY: &[u8; 32] = b"pipefy-flow-development-key-0001";
const NONCE_LEN: usize = 12;

pub const MASTER_KEY_ENV: &str = "PIPEFY_FLOW_MASTER_KEY";

fn master_key() -> [u8; 32] {
    let Ok(key_hex) = std::env::var(MASTER_KEY_ENV) else {
        return *DEFAULT_DEV_KEY;
    };
    match hex::decode(key_hex.trim()).ok().and_then(|bytes| <[u8; 32]>::try_from(bytes).ok()) {
        Some(key) => key,
        None => {
            tracing::warn!("{} is not 32 bytes of hex, using development key", MASTER_KEY_ENV);
            *DEFAULT_DEV_KEY
        }
    }
}

fn cipher() -> Aes256Gcm {
    Aes256Gcm::new(&master_key().into())
}

/// Seals `token` as base64(nonce || ciphertext).
pub fn encrypt(token: &str) -> Result<String> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher()
        .encrypt(&nonce, token.as_bytes())
        .map_err(|_| anyhow!("Could not encrypt the API token"))?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(BASE64.encode(out))
}

pub fn decrypt(stored: &str) -> Result<String> {
    let raw = BASE64.decode(stored.trim()).context("Stored API token is not base64")?;
    if raw.len() <= NONCE_LEN {
        return Err(anyhow!("Stored API token is too short"));
    }

    let (nonce, sealed) = raw.split_at(NONCE_LEN);
    let token = cipher()
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| anyhow!("Could not decrypt the API token; was it saved with another master key?"))?;
    String::from_utf8(token).context("Decrypted API token is not UTF-8")
}
