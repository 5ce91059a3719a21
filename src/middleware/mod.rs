pub mod auth;
pub mod automation;
pub mod rate_limit;

pub use auth::{session_auth_middleware, AuthSession};
pub use automation::automation_auth_middleware;
pub use rate_limit::agent_rate_limit_middleware;
