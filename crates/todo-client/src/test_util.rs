use todo_server::api::{build_router, AppState};
use todo_server::config::ServerConfig;
use todo_store::Database;

/// Serve a fresh in-memory instance on an ephemeral port and return its base URL.
pub async fn spawn_server(require_auth: bool) -> String {
    let config = ServerConfig {
        token_secret: Some("client-tests".into()),
        require_auth,
        ..ServerConfig::default()
    };
    let state = AppState::new(Database::open_in_memory().unwrap(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    format!("http://{addr}")
}
