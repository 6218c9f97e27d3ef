use anyhow::{anyhow, Result};
use base64::engine::general_purpose;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing x-line-signature header")]
    Missing,
    #[error("Malformed x-line-signature header")]
    Malformed,
    #[error("Invalid x-line-signature")]
    Mismatch,
}

/// Checks `x-line-signature`: base64(HMAC-SHA256(channel secret, body)).
#[derive(Clone)]
pub struct SignatureVerifier {
    mac: HmacSha256,
}
impl SignatureVerifier {
    pub fn new(channel_secret: &str) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
            .map_err(|e| anyhow!("Failed to create channel secret HMAC: {e}"))?;
        Ok(Self { mac })
    }

    pub fn verify(&self, signature: Option<&[u8]>, body: &[u8]) -> Result<(), SignatureError> {
        let signature = signature.ok_or(SignatureError::Missing)?;
        let expected = general_purpose::STANDARD
            .decode(signature)
            .map_err(|_| SignatureError::Malformed)?;

        let mut mac = self.mac.clone();
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }

    #[cfg(test)]
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(body);
        general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }
}
