//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit,
//!   security headers, metrics, optional rate limit)
//! - Bind server to listener, plain or TLS
//! - Drain in-flight requests on shutdown
//!
//! # Layer Order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → security headers
//!     → metrics → Timeout → body limit → [rate limit] → handler
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::config::ServiceConfig;
use crate::guard::{
    GuardResult, PolicyConfig, Principal, Resolver, SystemResolver, TokenIssuer, TokenVerifier,
};
use crate::http::extract::authorization;
use crate::http::handlers;
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::security::headers;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::services::commands::{CommandRunner, SystemCommandRunner};
use crate::services::comments::CommentStore;
use crate::services::fetcher::{Fetcher, ReqwestFetcher};
use crate::services::reports::{DataSource, ReportRenderer, SyntheticDataSource, TextReportRenderer};
use crate::services::tasks::TaskQueue;
use crate::services::users::{InMemoryUserStore, UserRepository};

/// Application state injected into handlers.
///
/// Every collaborator sits behind a trait object so tests can swap in
/// doubles with the `with_*` methods.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub policy: Arc<PolicyConfig>,
    pub verifier: Arc<TokenVerifier>,
    pub issuer: Arc<TokenIssuer>,
    pub users: Arc<dyn UserRepository>,
    pub resolver: Arc<dyn Resolver>,
    pub fetcher: Arc<dyn Fetcher>,
    pub commands: Arc<dyn CommandRunner>,
    pub data_source: Arc<dyn DataSource>,
    pub renderer: Arc<dyn ReportRenderer>,
    pub tasks: Arc<TaskQueue>,
    pub comments: Arc<CommentStore>,
    pub started_at: Instant,
}

impl AppState {
    /// Production collaborators.
    pub fn new(config: ServiceConfig, policy: PolicyConfig) -> Self {
        let verifier = TokenVerifier::new(&policy.signing_key, policy.token_leeway_secs);
        let issuer = TokenIssuer::new(&policy.signing_key, policy.token_ttl);
        let fetcher = ReqwestFetcher::new(
            Duration::from_secs(config.timeouts.outbound_secs),
            config.limits.max_fetch_bytes,
        );
        let tasks = TaskQueue::new(config.tasks.max_pending, config.tasks.max_finished);
        let comments = CommentStore::new(
            config.limits.max_comments_per_topic,
            config.limits.max_topics,
        );

        Self {
            config: Arc::new(config),
            policy: Arc::new(policy),
            verifier: Arc::new(verifier),
            issuer: Arc::new(issuer),
            users: Arc::new(InMemoryUserStore::new()),
            resolver: Arc::new(SystemResolver),
            fetcher: Arc::new(fetcher),
            commands: Arc::new(SystemCommandRunner),
            data_source: Arc::new(SyntheticDataSource),
            renderer: Arc::new(TextReportRenderer),
            tasks: Arc::new(tasks),
            comments: Arc::new(comments),
            started_at: Instant::now(),
        }
    }

    pub fn with_users(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.users = users;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_commands(mut self, commands: Arc<dyn CommandRunner>) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_data_source(mut self, data_source: Arc<dyn DataSource>) -> Self {
        self.data_source = data_source;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ReportRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Identity guard over the request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> GuardResult<Principal> {
        self.verifier.authenticate(authorization(headers))
    }
}

/// HTTP server for the admission-control service.
pub struct HttpServer {
    router: Router,
    config: Arc<ServiceConfig>,
}

impl HttpServer {
    /// Create a new HTTP server around prepared state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let config = state.config.clone();

        let api = Router::new()
            .route("/api/v1/auth/register", post(handlers::auth::register))
            .route("/api/v1/auth/login", post(handlers::auth::login))
            .route("/api/v1/user/profile", get(handlers::auth::profile))
            .route("/api/v1/files/download", get(handlers::files::download))
            .route("/api/v1/reports", post(handlers::reports::generate))
            .route("/api/v1/profile/picture", post(handlers::media::profile_picture))
            .route("/api/v1/diagnostics/verify", post(handlers::diagnostics::verify))
            .route("/api/v1/tasks", post(handlers::tasks::schedule))
            .route("/api/v1/tasks/{id}", get(handlers::tasks::status))
            .route(
                "/api/v1/topics/{topic_id}/comments",
                post(handlers::comments::create).get(handlers::comments::list),
            )
            .route("/api/v1/status", get(handlers::status::status))
            .route("/health", get(handlers::status::health))
            .merge(admin::setup_admin_router())
            .with_state(state);

        let api = if config.rate_limit.enabled {
            let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
            api.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        } else {
            api
        };

        let api = api
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(track_metrics));

        headers::apply(api)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        if let Some(tls) = &self.config.listener.tls {
            let rustls = load_tls_config(tls).await?;
            let handle = axum_server::Handle::new();
            let drain = handle.clone();
            tokio::spawn(async move {
                let _ = shutdown.recv().await;
                drain.graceful_shutdown(Some(Duration::from_secs(10)));
            });

            tracing::info!(address = %addr, "HTTPS server starting");
            // axum-server owns its accept loop; hand the address over.
            drop(listener);
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app)
                .await?;
        } else {
            tracing::info!(address = %addr, "HTTP server starting");
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await?;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
