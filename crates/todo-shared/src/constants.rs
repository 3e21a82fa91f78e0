/// Application name
pub const APP_NAME: &str = "todo";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Default session token lifetime in hours (30 days)
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 30;

/// Key derivation context (BLAKE3) for the token signing seed
pub const KDF_CONTEXT_TOKEN_KEY: &str = "todo-session-token-key-v1";

/// Storage keys used by the client session
pub const STORAGE_KEY_USER: &str = "user";
pub const STORAGE_KEY_TOKEN: &str = "token";

/// REST routes
pub const ROUTE_REGISTER: &str = "/api/users/register";
pub const ROUTE_LOGIN: &str = "/api/users/login";
pub const ROUTE_TODOS: &str = "/api/todos";
pub const ROUTE_CONTACT: &str = "/api/form/contact";

/// Client-facing messages
pub const MSG_USER_EXISTS: &str = "User already exists";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid Email or Password";
pub const MSG_TODO_FIELDS_REQUIRED: &str = "User ID, title, and description are required";
pub const MSG_TODO_NOT_FOUND: &str = "Todo not found";
pub const MSG_TODO_DELETED: &str = "Todo deleted";
pub const MSG_SERVER_ERROR: &str = "Server Error";
pub const MSG_CONTACT_OK: &str = "Message send successful";
pub const MSG_CONTACT_FAILED: &str = "Message not send";
