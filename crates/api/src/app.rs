use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_circle_admin, require_circle_member,
    require_user_auth, security_headers_middleware, trace_id,
};
use crate::routes::{auth, calendar, circles, health, medications, tasks};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    /// Builds the shared state, parsing the JWT key pair once.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        // Keys passed through env vars often carry literal "\n" sequences
        let private_key = config.jwt.private_key.replace("\\n", "\n");
        let public_key = config.jwt.public_key.replace("\\n", "\n");

        let jwt = JwtConfig::with_leeway(
            &private_key,
            &public_key,
            config.jwt.token_expiry_secs,
            config.jwt.leeway_secs,
        )?;

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let member_gate = middleware::from_fn_with_state(state.clone(), require_circle_member);
    let admin_gate = middleware::from_fn_with_state(state.clone(), require_circle_admin);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    // Circle detail and its resources. GET on the circle itself is open to any
    // member while PUT needs an admin, so the gates sit on the method routers.
    let circle_routes = Router::new()
        .route(
            "/api/circles/:circle_id",
            get(circles::get_circle)
                .layer(member_gate.clone())
                .merge(put(circles::update_circle).layer(admin_gate.clone())),
        )
        .route(
            "/api/circles/:circle_id/code",
            post(circles::regenerate_code).layer(admin_gate),
        )
        .merge(
            Router::new()
                // Medications
                .route(
                    "/api/circles/:circle_id/medications",
                    post(medications::create_medication).get(medications::list_medications),
                )
                .route(
                    "/api/circles/:circle_id/medications/:medication_id",
                    get(medications::get_medication)
                        .put(medications::update_medication)
                        .delete(medications::delete_medication),
                )
                // Calendar
                .route(
                    "/api/circles/:circle_id/calendar",
                    post(calendar::create_event).get(calendar::list_events),
                )
                .route(
                    "/api/circles/:circle_id/calendar/month/:year/:month",
                    get(calendar::list_month),
                )
                .route(
                    "/api/circles/:circle_id/calendar/:event_id",
                    get(calendar::get_event)
                        .put(calendar::update_event)
                        .delete(calendar::delete_event),
                )
                // Tasks
                .route(
                    "/api/circles/:circle_id/tasks",
                    post(tasks::create_task).get(tasks::list_tasks),
                )
                .route(
                    "/api/circles/:circle_id/tasks/my-tasks",
                    get(tasks::list_my_tasks),
                )
                .route(
                    "/api/circles/:circle_id/tasks/:task_id",
                    get(tasks::get_task)
                        .put(tasks::update_task)
                        .delete(tasks::delete_task),
                )
                .route(
                    "/api/circles/:circle_id/tasks/:task_id/status",
                    patch(tasks::update_task_status),
                )
                .route_layer(member_gate),
        );

    // User routes (require a session token). The circle gates above read the
    // UserAuth extension, so the token check wraps them as well.
    let user_routes = Router::new()
        .route(
            "/api/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route(
            "/api/circles",
            post(circles::create_circle).get(circles::list_circles),
        )
        .route("/api/circles/join", post(circles::join_circle))
        .route(
            "/api/circles/:circle_id/leave",
            delete(circles::leave_circle),
        )
        .merge(circle_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .layer(cors_layer(&config))
        .with_state(state)
}
