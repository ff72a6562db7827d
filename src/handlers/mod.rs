// handlers/mod.rs - HTTP handlers
//
// public/    - no token required (login, register)
// protected/ - behind jwt_auth_middleware

pub mod protected;
pub mod public;
