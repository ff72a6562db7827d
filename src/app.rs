// app.rs - Shared state and router assembly
//
// Pipeline per protected request: jwt_auth_middleware -> [rate limit] ->
// [ownership / role gate] -> handler.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth::credentials::hash_password;
use crate::auth::{
    AuthError, CredentialVerifier, OwnershipGuard, RateLimitRule, RateLimiter, TokenIssuer, TokenValidator,
};
use crate::config::{AppConfig, ConfigError};
use crate::database::{MemoryStore, Role, StoreError};
use crate::handlers::{protected, public};
use crate::middleware::{
    ensure_todo_owner, jwt_auth_middleware, rate_limit_middleware, require_admin, RateLimitGate,
};

/// Rate limit key for `POST /api/login`
pub const LOGIN_ROUTE: &str = "login";
/// Rate limit key for `POST /api/todos`
pub const TODO_CREATE_ROUTE: &str = "todos.create";

/// Everything handlers and middleware need, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: MemoryStore,
    pub verifier: Arc<CredentialVerifier>,
    pub issuer: Arc<TokenIssuer>,
    pub validator: Arc<TokenValidator>,
    pub ownership: Arc<OwnershipGuard>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wire the authorization components from `config`. Any configuration
    /// fault surfaces here, before a listener is bound.
    pub fn new(config: AppConfig, store: MemoryStore) -> Result<Self, ConfigError> {
        config.validate()?;

        let security = &config.security;
        let issuer = TokenIssuer::new(&security.jwt_secret, security.token_ttl())?;
        let validator = TokenValidator::new(&security.jwt_secret)?;
        let verifier = CredentialVerifier::new(
            Arc::new(store.clone()),
            security.store_timeout(),
            security.bcrypt_cost,
        )?;
        let ownership = OwnershipGuard::new(Arc::new(store.clone()), security.store_timeout());

        let limiter = if config.api.enable_rate_limiting {
            RateLimiter::new()
                .with_rule(
                    LOGIN_ROUTE,
                    RateLimitRule::new(
                        config.api.login_rate_limit_requests,
                        config.api.login_rate_limit_window(),
                    ),
                )
                .with_rule(
                    TODO_CREATE_ROUTE,
                    RateLimitRule::new(config.api.rate_limit_requests, config.api.rate_limit_window()),
                )
        } else {
            RateLimiter::new()
        };

        Ok(Self {
            config: Arc::new(config),
            store,
            verifier: Arc::new(verifier),
            issuer: Arc::new(issuer),
            validator: Arc::new(validator),
            ownership: Arc::new(ownership),
            limiter: Arc::new(limiter),
        })
    }

    /// Create the configured admin account if it does not exist yet.
    pub async fn bootstrap_admin(&self) -> Result<(), AuthError> {
        let security = &self.config.security;
        let (Some(email), Some(password)) = (
            security.bootstrap_admin_email.as_deref(),
            security.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        let hash = hash_password(password, security.bcrypt_cost).await?;
        match self.store.insert_account(email, "admin", Role::Admin, hash).await {
            Ok(account) => {
                info!("Bootstrap admin account ready: {}", account.id);
                Ok(())
            }
            Err(StoreError::Conflict(_)) => {
                warn!("Bootstrap admin email already registered; leaving it unchanged");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn gate(&self, route_key: &'static str) -> RateLimitGate {
        RateLimitGate {
            limiter: Arc::clone(&self.limiter),
            route_key,
            trusted_proxies: Arc::from(self.config.server.trusted_proxies.clone()),
        }
    }
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes(&state))
        // Protected
        .merge(protected_routes(&state))
        .with_state(state.clone());

    if state.config.security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn public_routes(state: &AppState) -> Router<AppState> {
    use public::auth;

    Router::new()
        .route(
            "/api/login",
            post(auth::login).route_layer(from_fn_with_state(state.gate(LOGIN_ROUTE), rate_limit_middleware)),
        )
        .route("/api/register", post(auth::register))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{auth, todo};

    let todo_collection = get(todo::list).merge(
        post(todo::create)
            .route_layer(from_fn_with_state(state.gate(TODO_CREATE_ROUTE), rate_limit_middleware)),
    );

    let todo_record = get(todo::get).merge(
        put(todo::update)
            .patch(todo::update)
            .delete(todo::delete)
            .route_layer(from_fn_with_state(state.clone(), ensure_todo_owner)),
    );

    Router::new()
        // Account management
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/change-password/:id", put(auth::change_password))
        .route(
            "/api/reset-password/:id",
            put(auth::reset_password).route_layer(from_fn(require_admin)),
        )
        .route("/api/users", get(auth::list_users).route_layer(from_fn(require_admin)))
        .route(
            "/api/user/:id",
            get(auth::get_user).put(auth::update_user).delete(auth::delete_user),
        )
        .route(
            "/api/users/:id/todos",
            get(todo::list_for_user).route_layer(from_fn(require_admin)),
        )
        .route(
            "/api/users/:id/todos/count",
            get(todo::count_for_user).route_layer(from_fn(require_admin)),
        )
        // Todos
        .route("/api/todos", todo_collection)
        .route("/api/todos/count", get(todo::count))
        .route("/api/todos/:id", todo_record)
        // Runs before every route layer above
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Todo API (Rust)",
            "version": version,
            "endpoints": {
                "public": "POST /api/login, POST /api/register",
                "auth": "/api/auth/whoami, /api/user/:id, /api/change-password/:id (protected)",
                "admin": "/api/users[/:id/todos[/count]], /api/reset-password/:id (admin role)",
                "todos": "/api/todos[/:id], /api/todos/count (protected, owner-scoped writes)",
            }
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
