//! Signed, encrypted, timestamped cookie values.
//!
//! Value layout (all base64 is URL-safe without padding):
//!
//! ```text
//! value  = base64( timestamp "|" sealed "|" base64(mac) )
//! sealed = base64( nonce[12] || AES-GCM(enc_key, nonce, json(session)) )
//! mac    = HMAC-SHA256( sign_key, name "|" timestamp "|" sealed )
//! ```
//!
//! The cookie name is bound into the MAC so a value cannot be replayed under
//! a different cookie. The MAC is checked before anything is decrypted.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;

use crate::error::CodecError;
use crate::schema;
use crate::session::Session;

type HmacSha256 = Hmac<Sha256>;

/// Minimum signing key length in bytes.
pub const MIN_SIGN_KEY_LEN: usize = 32;

/// Maximum length of an encoded cookie value.
pub const MAX_VALUE_LEN: usize = 4096;

/// How far in the future a timestamp may lie before it is rejected.
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 60;

const AEAD_NONCE_LEN: usize = 12;

enum Cipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl Cipher {
    fn new(key: &[u8]) -> Result<Self, CodecError> {
        let cipher = match key.len() {
            16 => Aes128Gcm::new_from_slice(key).map(Self::Aes128),
            32 => Aes256Gcm::new_from_slice(key).map(Self::Aes256),
            n => {
                return Err(CodecError::InvalidKey {
                    reason: format!("encryption key must be 16 or 32 bytes, got {n}"),
                });
            }
        };
        cipher.map_err(|e| CodecError::InvalidKey {
            reason: e.to_string(),
        })
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut nonce_bytes = [0u8; AEAD_NONCE_LEN];
        getrandom::fill(&mut nonce_bytes).map_err(|e| CodecError::Encrypt {
            reason: e.to_string(),
        })?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = match self {
            Self::Aes128(cipher) => cipher.encrypt(nonce, plaintext),
            Self::Aes256(cipher) => cipher.encrypt(nonce, plaintext),
        }
        .map_err(|e| CodecError::Encrypt {
            reason: e.to_string(),
        })?;

        let mut sealed = Vec::with_capacity(AEAD_NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CodecError> {
        if sealed.len() <= AEAD_NONCE_LEN {
            return Err(CodecError::Malformed {
                reason: "sealed payload too short".to_string(),
            });
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(AEAD_NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = match self {
            Self::Aes128(cipher) => cipher.decrypt(nonce, ciphertext),
            Self::Aes256(cipher) => cipher.decrypt(nonce, ciphertext),
        };
        plaintext.map_err(|_| CodecError::Decrypt)
    }
}

/// Encodes sessions into cookie values and back.
///
/// Built once per process from the configured keys; see
/// [`SessionManager`](crate::SessionManager) for the lazy construction.
pub struct SessionCodec {
    mac: HmacSha256,
    cipher: Cipher,
    max_age: i64,
}

impl SessionCodec {
    /// Creates a codec.
    ///
    /// `max_age` is the lifetime in seconds after which a value no longer
    /// decodes; zero disables the age check.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidKey`] if the signing key is shorter than
    /// [`MIN_SIGN_KEY_LEN`] or the encryption key is not 16 or 32 bytes.
    pub fn new(sign_key: &[u8], enc_key: &[u8], max_age: u64) -> Result<Self, CodecError> {
        if sign_key.len() < MIN_SIGN_KEY_LEN {
            return Err(CodecError::InvalidKey {
                reason: format!(
                    "signing key must be at least {MIN_SIGN_KEY_LEN} bytes, got {}",
                    sign_key.len()
                ),
            });
        }
        let mac = <HmacSha256 as Mac>::new_from_slice(sign_key).map_err(|e| CodecError::InvalidKey {
            reason: e.to_string(),
        })?;

        Ok(Self {
            mac,
            cipher: Cipher::new(enc_key)?,
            max_age: i64::try_from(max_age).unwrap_or(i64::MAX),
        })
    }

    /// Encodes `session` as the value of the cookie called `name`.
    ///
    /// # Errors
    ///
    /// Returns an internal (non-decode) [`CodecError`] if serialization or
    /// encryption fails, or the value would not fit in a cookie.
    pub fn encode(&self, name: &str, session: &Session) -> Result<String, CodecError> {
        self.encode_at(name, session, now())
    }

    /// Decodes the value of the cookie called `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] for which [`CodecError::is_decode`] holds if
    /// the value is malformed, forged, expired, or sealed under other keys.
    pub fn decode(&self, name: &str, value: &str) -> Result<Session, CodecError> {
        self.decode_at(name, value, now())
    }

    fn encode_at(&self, name: &str, session: &Session, timestamp: i64) -> Result<String, CodecError> {
        let payload = schema::encode(session).map_err(|e| CodecError::Serialize {
            reason: e.to_string(),
        })?;
        let sealed = URL_SAFE_NO_PAD.encode(self.cipher.seal(&payload)?);
        let mac = URL_SAFE_NO_PAD.encode(self.sign(name, timestamp, &sealed));

        let value = URL_SAFE_NO_PAD.encode(format!("{timestamp}|{sealed}|{mac}"));
        if value.len() > MAX_VALUE_LEN {
            return Err(CodecError::ValueTooLong {
                length: value.len(),
            });
        }
        Ok(value)
    }

    fn decode_at(&self, name: &str, value: &str, now: i64) -> Result<Session, CodecError> {
        if value.len() > MAX_VALUE_LEN {
            return Err(CodecError::Malformed {
                reason: format!("value is {} bytes", value.len()),
            });
        }

        let raw = URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|e| malformed(e.to_string()))?;
        let raw = String::from_utf8(raw).map_err(|e| malformed(e.to_string()))?;

        let mut parts = raw.splitn(3, '|');
        let (Some(timestamp), Some(sealed), Some(mac)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("expected three fields".to_string()));
        };
        let timestamp: i64 = timestamp
            .parse()
            .map_err(|_| malformed("invalid timestamp".to_string()))?;
        let mac = URL_SAFE_NO_PAD
            .decode(mac)
            .map_err(|e| malformed(e.to_string()))?;

        self.verify(name, timestamp, sealed, &mac)?;

        let age = now.saturating_sub(timestamp);
        if age < -MAX_CLOCK_SKEW_SECONDS {
            return Err(CodecError::TimestampInFuture { skew_seconds: -age });
        }
        if self.max_age > 0 && age > self.max_age {
            return Err(CodecError::Expired { age_seconds: age });
        }

        let sealed = URL_SAFE_NO_PAD
            .decode(sealed)
            .map_err(|e| malformed(e.to_string()))?;
        let payload = self.cipher.open(&sealed)?;

        schema::decode(&payload).map_err(|e| CodecError::Payload {
            reason: e.to_string(),
        })
    }

    fn signer(&self, name: &str, timestamp: i64, sealed: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b"|");
        mac.update(sealed.as_bytes());
        mac
    }

    fn sign(&self, name: &str, timestamp: i64, sealed: &str) -> Vec<u8> {
        self.signer(name, timestamp, sealed)
            .finalize()
            .into_bytes()
            .to_vec()
    }

    fn verify(&self, name: &str, timestamp: i64, sealed: &str, mac: &[u8]) -> Result<(), CodecError> {
        self.signer(name, timestamp, sealed)
            .verify_slice(mac)
            .map_err(|_| CodecError::InvalidMac)
    }
}

fn malformed(reason: String) -> CodecError {
    CodecError::Malformed { reason }
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
