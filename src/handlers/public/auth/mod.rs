// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition and account creation; no token required.

pub mod register; // POST /api/register - create new account
pub mod session; // POST /api/login - authenticate and get JWT
pub mod utils;

pub use register::register;
pub use session::login;
