//! Typed HTTP client for the to-do API.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use todo_shared::constants::{ROUTE_CONTACT, ROUTE_LOGIN, ROUTE_REGISTER, ROUTE_TODOS};
use todo_shared::protocol::{
    AuthResponse, ContactSubmission, LoginRequest, MessageResponse, NewTask, RegisterRequest,
    Task, TaskPatch,
};
use todo_shared::{TaskId, UserId};

use crate::error::{ClientError, Result};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token attached to every subsequent request.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<MessageResponse>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        debug!(status = status.as_u16(), %message, "API request rejected");

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    // ─── Users ───

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let body = RegisterRequest::new(name, email, password);
        self.send(self.http.post(self.url(ROUTE_REGISTER)).json(&body))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let body = LoginRequest::new(email, password);
        self.send(self.http.post(self.url(ROUTE_LOGIN)).json(&body))
            .await
    }

    // ─── Todos ───

    pub async fn list_tasks(&self, owner: UserId) -> Result<Vec<Task>> {
        self.send(self.http.get(self.url(&format!("{ROUTE_TODOS}/{owner}"))))
            .await
    }

    pub async fn create_task(&self, owner: UserId, title: &str, description: &str) -> Result<Task> {
        let body = NewTask::new(owner, title, description);
        self.send(self.http.post(self.url(ROUTE_TODOS)).json(&body))
            .await
    }

    pub async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        self.send(
            self.http
                .put(self.url(&format!("{ROUTE_TODOS}/{id}")))
                .json(patch),
        )
        .await
    }

    /// Flip `completed` on the server, based on the caller's current view.
    pub async fn toggle_task(&self, task: &Task) -> Result<Task> {
        self.update_task(task.id, &TaskPatch::completed(!task.completed))
            .await
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<MessageResponse> {
        self.send(self.http.delete(self.url(&format!("{ROUTE_TODOS}/{id}"))))
            .await
    }

    // ─── Contact form ───

    pub async fn submit_contact(&self, submission: &ContactSubmission) -> Result<MessageResponse> {
        self.send(self.http.post(self.url(ROUTE_CONTACT)).json(submission))
            .await
    }
}

#[cfg(test)]
mod tests {
    use todo_shared::constants::{
        MSG_CONTACT_OK, MSG_TODO_DELETED, MSG_TODO_NOT_FOUND, MSG_USER_EXISTS,
    };

    use super::*;
    use crate::test_util::spawn_server;

    #[tokio::test]
    async fn test_task_routes() {
        let api = ApiClient::new(&spawn_server(false).await);
        let ann = api.register("Ann", "ann@x.com", "pw123").await.unwrap();
        let owner = ann.user.id;

        let task = api.create_task(owner, "Buy milk", "2%").await.unwrap();
        assert!(!task.completed);
        assert_eq!(api.list_tasks(owner).await.unwrap(), vec![task.clone()]);

        let toggled = api.toggle_task(&task).await.unwrap();
        assert!(toggled.completed);
        let toggled_back = api.toggle_task(&toggled).await.unwrap();
        assert!(!toggled_back.completed);

        let renamed = api
            .update_task(task.id, &TaskPatch::title("Buy oat milk"))
            .await
            .unwrap();
        assert_eq!(renamed.title, "Buy oat milk");
        assert_eq!(renamed.description, "2%");

        let deleted = api.delete_task(task.id).await.unwrap();
        assert_eq!(deleted.message, MSG_TODO_DELETED);
        assert!(api.list_tasks(owner).await.unwrap().is_empty());

        let err = api.delete_task(task.id).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), MSG_TODO_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_message_is_surfaced() {
        let api = ApiClient::new(&spawn_server(false).await);
        api.register("Ann", "ann@x.com", "pw").await.unwrap();

        let err = api.register("Ann", "ann@x.com", "pw").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), MSG_USER_EXISTS);
    }

    #[tokio::test]
    async fn test_contact() {
        let api = ApiClient::new(&spawn_server(false).await);
        let submission = ContactSubmission {
            name: "Ann".into(),
            email: "ann@x.com".into(),
            message: "Hello".into(),
        };
        let ack = api.submit_contact(&submission).await.unwrap();
        assert_eq!(ack.message, MSG_CONTACT_OK);
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let mut api = ApiClient::new(&spawn_server(true).await);
        let ann = api.register("Ann", "ann@x.com", "pw").await.unwrap();

        let err = api.list_tasks(ann.user.id).await.unwrap_err();
        assert_eq!(err.status(), Some(401));

        api.set_token(Some(ann.token));
        assert!(api.list_tasks(ann.user.id).await.unwrap().is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = ApiClient::new("http://localhost:5000/");
        assert_eq!(api.url(ROUTE_TODOS), "http://localhost:5000/api/todos");
    }
}
