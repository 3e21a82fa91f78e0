//! Credential store: registration, login and session token issuance.
//!
//! Password hashing runs on the blocking pool and never while the database
//! lock is held.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing::{debug, info};

use todo_shared::password;
use todo_shared::protocol::AuthResponse;
use todo_shared::token::TokenSigner;
use todo_shared::UserId;
use todo_store::{Database, User};

use crate::error::ServerError;

/// The process-wide database handle.
pub type SharedDb = Arc<Mutex<Database>>;

pub fn lock_db(db: &SharedDb) -> Result<MutexGuard<'_, Database>, ServerError> {
    db.lock()
        .map_err(|e| ServerError::Internal(format!("Database lock poisoned: {e}")))
}

/// Hash of a random per-process password, checked when a login names an
/// unknown email. Computed on first use.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| password::hash_password(&UserId::new().to_string()).ok())
        .as_deref()
}

#[derive(Clone)]
pub struct CredentialStore {
    db: SharedDb,
    tokens: Arc<TokenSigner>,
}

impl CredentialStore {
    pub fn new(db: SharedDb, tokens: Arc<TokenSigner>) -> Self {
        Self { db, tokens }
    }

    /// Create an account and mint its first session token.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        raw_password: &str,
    ) -> Result<AuthResponse, ServerError> {
        if name.trim().is_empty() || email.trim().is_empty() || raw_password.is_empty() {
            return Err(ServerError::Validation(
                "Name, email, and password are required".to_string(),
            ));
        }

        let owned = raw_password.to_string();
        let hash = tokio::task::spawn_blocking(move || password::hash_password(&owned))
            .await
            .map_err(|e| ServerError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        let user = {
            let db = lock_db(&self.db)?;
            db.insert_user(name, email, &hash)?
        };

        info!(user_id = %user.id, "user registered");

        Ok(AuthResponse {
            user: user.to_public(),
            token: self.issue_token(&user),
        })
    }

    /// Check credentials and mint a fresh session token.
    pub async fn login(&self, email: &str, raw_password: &str) -> Result<AuthResponse, ServerError> {
        if email.is_empty() || raw_password.is_empty() {
            return Err(ServerError::InvalidCredentials);
        }

        let found = {
            let db = lock_db(&self.db)?;
            db.find_user_by_email(email)?
        };

        let Some(user) = found else {
            debug!("login for unknown email");
            // unknown emails cost the same argon2 work as wrong passwords
            self.verify_against_dummy(raw_password).await;
            return Err(ServerError::InvalidCredentials);
        };

        if !self.verify_password(&user, raw_password).await? {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(ServerError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");

        Ok(AuthResponse {
            user: user.to_public(),
            token: self.issue_token(&user),
        })
    }

    pub async fn verify_password(&self, user: &User, raw_password: &str) -> Result<bool, ServerError> {
        let hash = user.password_hash.clone();
        let raw = raw_password.to_string();

        tokio::task::spawn_blocking(move || password::verify_password(&raw, &hash))
            .await
            .map_err(|e| ServerError::Internal(format!("Verify task failed: {e}")))?
            .map_err(|e| ServerError::Internal(e.to_string()))
    }

    async fn verify_against_dummy(&self, raw_password: &str) {
        let raw = raw_password.to_string();
        let checked = tokio::task::spawn_blocking(move || match dummy_hash() {
            Some(hash) => password::verify_password(&raw, hash).map(|_| ()),
            None => Ok(()),
        })
        .await;

        if !matches!(checked, Ok(Ok(()))) {
            debug!("dummy password check failed");
        }
    }

    pub fn issue_token(&self, user: &User) -> String {
        self.tokens.issue(user.id)
    }

    /// Resolve a bearer token to the user it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<UserId, ServerError> {
        self.tokens
            .verify(token)
            .map(|claims| claims.sub)
            .map_err(|e| ServerError::Unauthorized(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn store() -> CredentialStore {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let tokens = Arc::new(TokenSigner::generate(Duration::hours(1)));
        CredentialStore::new(db, tokens)
    }

    #[tokio::test]
    async fn test_register_once_per_email() {
        let creds = store();

        let first = creds.register("Ann", "ann@x.com", "pw123").await.unwrap();
        assert_eq!(first.user.name, "Ann");
        assert_eq!(creds.authenticate(&first.token).unwrap(), first.user.id);

        let second = creds.register("Ann", "ann@x.com", "other").await;
        assert!(matches!(second, Err(ServerError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let creds = store();
        assert!(matches!(
            creds.register("Ann", "ann@x.com", "").await,
            Err(ServerError::Validation(_))
        ));
        assert!(matches!(
            creds.register("", "ann@x.com", "pw").await,
            Err(ServerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login() {
        let creds = store();
        let registered = creds.register("Ann", "ann@x.com", "pw123").await.unwrap();

        let session = creds.login("ann@x.com", "pw123").await.unwrap();
        assert_eq!(session.user, registered.user);
        assert_eq!(creds.authenticate(&session.token).unwrap(), registered.user.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let creds = store();
        creds.register("Ann", "ann@x.com", "pw123").await.unwrap();

        let wrong_password = creds.login("ann@x.com", "nope").await.unwrap_err();
        let unknown_email = creds.login("bob@x.com", "pw123").await.unwrap_err();

        assert!(matches!(wrong_password, ServerError::InvalidCredentials));
        assert!(matches!(unknown_email, ServerError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_password_is_not_stored_raw() {
        let creds = store();
        creds.register("Ann", "ann@x.com", "pw123").await.unwrap();

        let user = {
            let db = lock_db(&creds.db).unwrap();
            db.find_user_by_email("ann@x.com").unwrap().unwrap()
        };
        assert_ne!(user.password_hash, "pw123");
        assert!(creds.verify_password(&user, "pw123").await.unwrap());
        assert!(!creds.verify_password(&user, "pw1234").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_email_runs_a_password_check() {
        let creds = store();
        let err = creds.login("nobody@x.com", "pw123").await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidCredentials));

        let hash = dummy_hash().expect("dummy hash is computed by the failed login");
        assert!(hash.starts_with("$argon2"));
        assert!(!password::verify_password("pw123", hash).unwrap());
    }

    #[test]
    fn test_authenticate_rejects_garbage() {
        assert!(matches!(
            store().authenticate("not-a-token"),
            Err(ServerError::Unauthorized(_))
        ));
    }
}
