pub mod auth;
pub mod ownership;
pub mod rate_limit;
pub mod response;

pub use auth::{jwt_auth_middleware, require_admin, AuthUser};
pub use ownership::ensure_todo_owner;
pub use rate_limit::{rate_limit_middleware, RateLimitGate};
pub use response::{ApiResponse, ApiResult};
