use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::KDF_CONTEXT_TOKEN_KEY;
use crate::error::TokenError;
use crate::types::UserId;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// The user the token was minted for.
    pub sub: UserId,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
    /// Unique token id.
    pub jti: Uuid,
}

/// Mints and checks session tokens.
///
/// A token is `base64url(claims_json) "." base64url(ed25519_signature)`, where
/// the signature covers the first segment as sent. Clients treat it as opaque.
#[derive(Clone)]
pub struct TokenSigner {
    signing_key: SigningKey,
    ttl: Duration,
}

impl TokenSigner {
    /// Random key. Tokens do not survive a restart.
    pub fn generate(ttl: Duration) -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
            ttl,
        }
    }

    /// Deterministic key derived from an operator secret (BLAKE3 KDF).
    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        let seed = blake3::derive_key(KDF_CONTEXT_TOKEN_KEY, secret);
        Self {
            signing_key: SigningKey::from_bytes(&seed),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn issue(&self, user: UserId) -> String {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: UserId, now: DateTime<Utc>) -> String {
        let claims = SessionClaims {
            sub: user,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: Uuid::new_v4(),
        };

        // Serializing a struct of plain fields cannot fail.
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let body = URL_SAFE_NO_PAD.encode(json);
        let signature = self.signing_key.sign(body.as_bytes());

        format!("{body}.{}", URL_SAFE_NO_PAD.encode(signature.to_bytes()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let (body, sig) = token.trim().split_once('.').ok_or(TokenError::Malformed)?;

        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|_| TokenError::Malformed)?;
        let signature = Signature::from_slice(&sig_bytes).map_err(|_| TokenError::Malformed)?;

        self.verifying_key()
            .verify(body.as_bytes(), &signature)
            .map_err(|_| TokenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| TokenError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::generate(Duration::hours(1))
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let user = UserId::new();

        let token = signer.issue(user);
        let claims = signer.verify(&token).unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_tokens_are_unique() {
        let signer = signer();
        let user = UserId::new();
        assert_ne!(signer.issue(user), signer.issue(user));
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let token = signer.issue_at(UserId::new(), Utc::now() - Duration::hours(2));
        assert_eq!(signer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = signer().issue(UserId::new());
        assert_eq!(signer().verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let signer = signer();
        let token = signer.issue(UserId::new());
        let (_, sig) = token.split_once('.').unwrap();

        let forged = SessionClaims {
            sub: UserId::new(),
            iat: 0,
            exp: i64::MAX,
            jti: Uuid::new_v4(),
        };
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        assert_eq!(
            signer.verify(&format!("{body}.{sig}")),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let signer = signer();
        assert_eq!(signer.verify("garbage"), Err(TokenError::Malformed));
        assert_eq!(signer.verify("a.b"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_secret_derivation_is_stable() {
        let a = TokenSigner::from_secret(b"operator-secret", Duration::hours(1));
        let b = TokenSigner::from_secret(b"operator-secret", Duration::hours(1));
        let user = UserId::new();

        assert!(b.verify(&a.issue(user)).is_ok());

        let c = TokenSigner::from_secret(b"other-secret", Duration::hours(1));
        assert!(c.verify(&a.issue(user)).is_err());
    }
}
