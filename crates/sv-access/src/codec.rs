//! Stream token wire format.
//!
//! A token is `payload "." signature`, both URL-safe base64 without padding:
//!
//! ```text
//! payload   = b64("v1|<media_id>|<user_id>|<role>|<issued_at>|<expires_at>")
//! signature = b64(HMAC-SHA256(secret, payload))
//! ```
//!
//! Timestamps are unix seconds. The MAC covers the encoded payload text, so
//! any change to the token string invalidates it. The codec only checks
//! integrity; expiry is the caller's concern.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sv_core::{MediaId, Role, UserId};

type HmacSha256 = Hmac<Sha256>;

const VERSION: &str = "v1";

/// Why a token string failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("signature mismatch")]
    BadSignature,

    #[error("bad payload: {0}")]
    BadPayload(String),
}

/// Claims carried by a stream token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamClaims {
    pub media_id: MediaId,
    pub user_id: UserId,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StreamClaims {
    fn canonical(&self) -> String {
        format!(
            "{VERSION}|{}|{}|{}|{}|{}",
            self.media_id,
            self.user_id,
            self.role,
            self.issued_at.timestamp(),
            self.expires_at.timestamp()
        )
    }

    fn parse_canonical(s: &str) -> Result<Self, TokenError> {
        let parts: Vec<&str> = s.split('|').collect();
        let [version, media, user, role, iat, exp] = parts.as_slice() else {
            return Err(TokenError::BadPayload(format!(
                "expected 6 fields, got {}",
                parts.len()
            )));
        };
        if *version != VERSION {
            return Err(TokenError::BadPayload(format!("unknown version {version}")));
        }

        let bad = |what: &str| TokenError::BadPayload(format!("invalid {what}"));
        let ts = |raw: &str, what: &str| {
            raw.parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .ok_or_else(|| bad(what))
        };

        Ok(Self {
            media_id: media.parse().map_err(|_| bad("media id"))?,
            user_id: user.parse().map_err(|_| bad("user id"))?,
            role: role.parse().map_err(|_| bad("role"))?,
            issued_at: ts(iat, "issued_at")?,
            expires_at: ts(exp, "expires_at")?,
        })
    }
}

/// Signs and verifies stream tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenCodec {
    keyed: HmacSha256,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenCodec([REDACTED])")
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> sv_core::Result<Self> {
        let keyed = HmacSha256::new_from_slice(secret)
            .map_err(|e| sv_core::Error::Validation(format!("unusable token secret: {e}")))?;
        Ok(Self { keyed })
    }

    /// Codec keyed with 32 fresh random bytes.
    pub fn random() -> sv_core::Result<Self> {
        use rand::RngCore;
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(&key)
    }

    fn mac(&self) -> HmacSha256 {
        self.keyed.clone()
    }

    pub fn encode(&self, claims: &StreamClaims) -> String {
        let payload_b64 = URL_SAFE_NO_PAD.encode(claims.canonical());
        let mut mac = self.mac();
        mac.update(payload_b64.as_bytes());
        let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{payload_b64}.{sig_b64}")
    }

    /// Verify the signature in constant time, then decode the claims.
    pub fn decode(&self, token: &str) -> Result<StreamClaims, TokenError> {
        let (payload_b64, sig_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
        if payload_b64.is_empty() || sig_b64.is_empty() || sig_b64.contains('.') {
            return Err(TokenError::Malformed);
        }

        let sig = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = self.mac();
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        let text = String::from_utf8(payload)
            .map_err(|_| TokenError::BadPayload("not utf-8".into()))?;
        StreamClaims::parse_canonical(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims() -> StreamClaims {
        let issued_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        StreamClaims {
            media_id: MediaId::new(),
            user_id: UserId::new(),
            role: Role::Client,
            issued_at,
            expires_at: issued_at + Duration::seconds(300),
        }
    }

    #[test]
    fn encode_decode() {
        let codec = TokenCodec::new(b"0123456789abcdef0123456789abcdef").unwrap();
        let c = claims();
        let token = codec.encode(&c);
        assert_eq!(codec.decode(&token).unwrap(), c);
    }

    #[test]
    fn token_is_url_safe() {
        let codec = TokenCodec::random().unwrap();
        let token = codec.encode(&claims());
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
        assert_eq!(token.matches('.').count(), 1);
    }

    #[test]
    fn wrong_key_is_bad_signature() {
        let token = TokenCodec::new(b"key-one").unwrap().encode(&claims());
        let err = TokenCodec::new(b"key-two").unwrap().decode(&token).unwrap_err();
        assert_eq!(err, TokenError::BadSignature);
    }

    #[test]
    fn malformed_shapes() {
        let codec = TokenCodec::random().unwrap();
        for bad in ["", "abc", ".", "abc.", ".abc", "a.b.c", "a.!!!"] {
            assert!(codec.decode(bad).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn signed_garbage_payload_is_rejected() {
        let codec = TokenCodec::new(b"k").unwrap();
        let payload_b64 = URL_SAFE_NO_PAD.encode("v1|not-a-uuid|x|client|1|2");
        let mut mac = codec.mac();
        mac.update(payload_b64.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let err = codec.decode(&format!("{payload_b64}.{sig}")).unwrap_err();
        assert!(matches!(err, TokenError::BadPayload(_)));
    }

    #[test]
    fn debug_redacts_key() {
        let codec = TokenCodec::new(b"super-secret").unwrap();
        assert_eq!(format!("{codec:?}"), "TokenCodec([REDACTED])");
    }
}
