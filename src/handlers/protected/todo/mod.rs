// handlers/protected/todo/mod.rs - Todo handlers behind JWT authentication

pub mod collection; // POST/GET /api/todos, GET /api/todos/count, admin per-user views
pub mod record; // GET/PUT/PATCH/DELETE /api/todos/:id

pub use collection::{count, count_for_user, create, list, list_for_user};
pub use record::{delete, get, update};
