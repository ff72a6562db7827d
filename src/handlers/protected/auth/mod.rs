// handlers/protected/auth/mod.rs - Account handlers behind JWT authentication

pub mod password; // PUT /api/change-password/:id, PUT /api/reset-password/:id, GET /api/users
pub mod session; // GET /api/auth/whoami
pub mod user; // GET/PUT/DELETE /api/user/:id

pub use password::{change_password, list_users, reset_password};
pub use session::whoami;
pub use user::{delete_user, get_user, update_user};
