mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::middleware::SessionLayerState;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth::clients::OAuthClient;
use crate::features::auth::routes as auth_routes;
use crate::features::auth::services::{AccountNotifier, AuthService, PrincipalLoader};
use crate::features::auth::session::SessionManager;
use crate::features::auth::tokens::TokenSigner;
use crate::features::categories::{routes as categories_routes, CategoryService};
use crate::features::reports::{
    routes as reports_routes, CommentService, Geocoder, HandlingService, NominatimGeocoder,
    ReportImageService, ReportService,
};
use crate::features::rewards::{routes as rewards_routes, RewardService};
use crate::features::roles::{routes as roles_routes, RoleService};
use crate::features::staff::routes as staff_routes;
use crate::features::staff::services::{HandlerProfileService, HandlerService};
use crate::features::users::routes as users_routes;
use crate::features::users::services::{UserProfileService, UserService};
use crate::modules::mail::{LogTransport, MailTransport, Mailer, SmtpTransport, TemplateRenderer};
use crate::modules::storage::LocalStorage;
use axum::extract::DefaultBodyLimit;
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Services shared by the routers, built once at startup
struct AppContext {
    auth: Arc<AuthService>,
    users: Arc<UserService>,
    user_profiles: Arc<UserProfileService>,
    handlers: Arc<HandlerService>,
    handler_profiles: Arc<HandlerProfileService>,
    roles: Arc<RoleService>,
    categories: Arc<CategoryService>,
    reports: Arc<ReportService>,
    handling: Arc<HandlingService>,
    comments: Arc<CommentService>,
    report_images: Arc<ReportImageService>,
    rewards: Arc<RewardService>,
}

impl AppContext {
    fn api_routes(self) -> Router {
        Router::new()
            .merge(auth_routes::routes(self.auth))
            .merge(users_routes::routes(self.user_profiles, self.users))
            .merge(staff_routes::routes(self.handler_profiles, self.handlers))
            .merge(roles_routes::routes(self.roles))
            .merge(categories_routes::routes(self.categories))
            .merge(reports_routes::routes(
                self.reports,
                self.handling,
                self.comments,
                self.report_images,
            ))
            .merge(rewards_routes::routes(self.rewards))
    }
}

fn main() -> anyhow::Result<()> {
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // .env must be loaded before the subscriber reads RUST_LOG
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded (tokio_worker_threads={}, pid={})",
        worker_threads,
        std::process::id()
    );

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let role_service = Arc::new(RoleService::new(pool.clone()));
    role_service
        .sync_catalog()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to synchronize roles: {}", e))?;

    // Mail: SMTP when a server is configured, log-only otherwise
    let transport: Arc<dyn MailTransport> = match config.mail.server.as_deref() {
        Some(host) => {
            tracing::info!("Mail delivery via SMTP relay {}:{}", host, config.mail.port);
            Arc::new(
                SmtpTransport::new(&config.mail, host)
                    .map_err(|e| anyhow::anyhow!("Failed to configure mail transport: {}", e))?,
            )
        }
        None => {
            tracing::warn!("MAIL_SERVER not set, outgoing mail will only be logged");
            Arc::new(LogTransport)
        }
    };
    let renderer = TemplateRenderer::new()
        .map_err(|e| anyhow::anyhow!("Failed to load email templates: {}", e))?;
    let (mailer, mail_worker) = Mailer::new(
        renderer,
        transport,
        config.mail.default_sender.clone(),
        config.mail.subject_prefix.clone(),
    );
    tokio::spawn(mail_worker.run());
    tracing::info!("Mail worker spawned");

    // Auth
    let tokens = Arc::new(TokenSigner::new(
        &config.security.secret_key,
        config.security.token_expiration_secs,
    ));
    let sessions = Arc::new(SessionManager::new(
        &config.security.secret_key,
        config.security.session_lifetime,
        config.security.session_cookie_secure,
    ));
    let notifier = Arc::new(AccountNotifier::new(
        mailer,
        Arc::clone(&tokens),
        &config.app.public_base_url,
        &config.app.organization_name,
    ));
    let oauth_client = Arc::new(
        OAuthClient::new(config.oauth.clone(), &config.app.public_base_url)
            .map_err(|e| anyhow::anyhow!("Failed to initialize OAuth client: {}", e))?,
    );

    let user_service = Arc::new(UserService::new(pool.clone()));
    let handler_service = Arc::new(HandlerService::new(pool.clone()));

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_service),
        Arc::clone(&handler_service),
        Arc::clone(&role_service),
        Arc::clone(&tokens),
        notifier,
        Arc::clone(&sessions),
        oauth_client,
        config.security.administrator_email.clone(),
    ));
    let session_state = SessionLayerState {
        sessions,
        loader: Arc::new(PrincipalLoader::new(pool.clone())),
    };
    tracing::info!("Auth services initialized");

    // Profiles
    let storage = Arc::new(LocalStorage::new(config.uploads.max_image_size));
    let user_profile_service = Arc::new(UserProfileService::new(
        Arc::clone(&user_service),
        Arc::clone(&storage),
        config.uploads.user_images_path.clone(),
    ));
    let handler_profile_service = Arc::new(HandlerProfileService::new(
        Arc::clone(&handler_service),
        Arc::clone(&storage),
        config.uploads.handler_images_path.clone(),
    ));

    // Reports
    let geocoder: Arc<dyn Geocoder> = Arc::new(
        NominatimGeocoder::new(&config.geocoding)
            .map_err(|e| anyhow::anyhow!("Failed to initialize geocoder: {}", e))?,
    );

    let context = AppContext {
        auth: auth_service,
        users: user_service,
        user_profiles: user_profile_service,
        handlers: handler_service,
        handler_profiles: handler_profile_service,
        roles: role_service,
        categories: Arc::new(CategoryService::new(pool.clone())),
        reports: Arc::new(ReportService::new(pool.clone(), geocoder)),
        handling: Arc::new(HandlingService::new(pool.clone())),
        comments: Arc::new(CommentService::new(pool.clone())),
        report_images: Arc::new(ReportImageService::new(
            pool.clone(),
            Arc::clone(&storage),
            config.uploads.report_images_path.clone(),
        )),
        rewards: Arc::new(RewardService::new(pool.clone())),
    };
    tracing::info!("Application services initialized");

    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Every API route sees the session principal; guards decide per handler
    let api_routes = context
        .api_routes()
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(axum::middleware::from_fn_with_state(
            session_state,
            middleware::session_middleware,
        ));

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(api_routes)
        .merge(health_route)
        .layer(TimeoutLayer::new(config.app.request_timeout))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
