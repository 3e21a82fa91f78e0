//! The signed-in user on the client side.
//!
//! A [`Session`] holds at most one identity. Signup and login persist
//! `{user, token}` under the `user` and `token` storage keys before the
//! in-memory state changes, so a failed call leaves everything as it was.
//! The held token rides along on every request made through [`Session::api`].
//!
//! The stored pair only counts when both keys are present. Writes remove
//! the token first and set it last, so an interrupted write reads back as
//! signed out and never as one user's name with another user's token.

use tracing::{info, warn};

use todo_shared::constants::{STORAGE_KEY_TOKEN, STORAGE_KEY_USER};
use todo_shared::protocol::{
    AuthResponse, ContactSubmission, MessageResponse, PublicUser, Task, TaskPatch,
};
use todo_shared::TaskId;

use crate::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::storage::SessionStorage;

pub struct Session<S: SessionStorage> {
    api: ApiClient,
    storage: S,
    current: Option<AuthResponse>,
}

impl<S: SessionStorage> Session<S> {
    /// A signed-out session. Storage is not consulted.
    pub fn new(api: ApiClient, storage: S) -> Self {
        Self {
            api,
            storage,
            current: None,
        }
    }

    /// Pick up a session persisted by an earlier run.
    ///
    /// Both keys must be present. A half-written or unreadable pair is
    /// treated as signed out.
    pub fn restore(api: ApiClient, storage: S) -> Result<Self> {
        let mut session = Self::new(api, storage);

        let user = session.storage.get(STORAGE_KEY_USER)?;
        let token = session.storage.get(STORAGE_KEY_TOKEN)?;

        if let (Some(user), Some(token)) = (user, token) {
            match serde_json::from_str::<PublicUser>(&user) {
                Ok(user) => {
                    info!(user_id = %user.id, "restored session");
                    session.api.set_token(Some(token.clone()));
                    session.current = Some(AuthResponse { user, token });
                }
                Err(e) => warn!(error = %e, "ignoring unreadable stored user"),
            }
        }

        Ok(session)
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.current.as_ref().map(|auth| &auth.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|auth| auth.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> Result<&PublicUser> {
        let auth = self.api.register(name, email, password).await?;
        self.establish(auth)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<&PublicUser> {
        let auth = self.api.login(email, password).await?;
        self.establish(auth)
    }

    fn establish(&mut self, auth: AuthResponse) -> Result<&PublicUser> {
        let user_json = serde_json::to_string(&auth.user)?;

        let previous_user = self.storage.get(STORAGE_KEY_USER)?;
        let previous_token = self.storage.get(STORAGE_KEY_TOKEN)?;

        if let Err(e) = self.write_pair(&user_json, &auth.token) {
            self.put_back(previous_user, previous_token);
            return Err(e);
        }

        info!(user_id = %auth.user.id, "signed in");
        self.api.set_token(Some(auth.token.clone()));
        Ok(&self.current.insert(auth).user)
    }

    fn write_pair(&self, user_json: &str, token: &str) -> Result<()> {
        self.storage.remove(STORAGE_KEY_TOKEN)?;
        self.storage.set(STORAGE_KEY_USER, user_json)?;
        self.storage.set(STORAGE_KEY_TOKEN, token)
    }

    /// Best-effort rollback after a failed [`write_pair`](Self::write_pair).
    fn put_back(&self, user: Option<String>, token: Option<String>) {
        let restored = match (user, token) {
            (Some(user), Some(token)) => self.write_pair(&user, &token),
            _ => self
                .storage
                .remove(STORAGE_KEY_TOKEN)
                .and_then(|()| self.storage.remove(STORAGE_KEY_USER)),
        };
        if let Err(e) = restored {
            warn!(error = %e, "could not restore previous session, stored session is signed out");
        }
    }

    /// Forget the identity in memory and in storage. The session is back to
    /// the state [`Session::new`] produces.
    ///
    /// If the stored token cannot be removed nothing changes and the error is
    /// returned. Once it is gone the session is signed out, even if removing
    /// the stored user then fails.
    pub fn logout(&mut self) -> Result<()> {
        self.storage.remove(STORAGE_KEY_TOKEN)?;

        if let Some(auth) = self.current.take() {
            info!(user_id = %auth.user.id, "signed out");
        }
        self.api.set_token(None);

        self.storage.remove(STORAGE_KEY_USER)
    }

    fn require_user(&self) -> Result<&PublicUser> {
        self.user().ok_or(ClientError::NotLoggedIn)
    }

    // ─── Task operations on behalf of the signed-in user ───

    pub async fn tasks(&self) -> Result<Vec<Task>> {
        let owner = self.require_user()?.id;
        self.api.list_tasks(owner).await
    }

    pub async fn add_task(&self, title: &str, description: &str) -> Result<Task> {
        let owner = self.require_user()?.id;
        self.api.create_task(owner, title, description).await
    }

    pub async fn edit_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        self.require_user()?;
        self.api.update_task(id, patch).await
    }

    pub async fn toggle_task(&self, task: &Task) -> Result<Task> {
        self.require_user()?;
        self.api.toggle_task(task).await
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<MessageResponse> {
        self.require_user()?;
        self.api.delete_task(id).await
    }

    /// The contact form is open to visitors.
    pub async fn contact(&self, submission: &ContactSubmission) -> Result<MessageResponse> {
        self.api.submit_contact(submission).await
    }
}
