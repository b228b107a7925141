//src/main.rs

use axum::{
    Router,
    http::{HeaderName, StatusCode, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

/// Monta o router completo. Separado do `main` para os testes usarem o mesmo.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas protegidas (exigem bearer). OPTIONS simples fica fora do guardião e responde 200.
    let per_diem_routes = Router::new().route(
        "/calculate-per-diem",
        post(handlers::per_diem::calculate_per_diem)
            .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard))
            .options(|| async { StatusCode::OK }),
    );

    let api_routes = Router::new()
        .route("/per-diem/policy", get(handlers::per_diem::get_policy))
        .route("/approvals/pending", get(handlers::approvals::list_pending))
        .route("/approvals/{approval_id}/decision", post(handlers::approvals::decide))
        .route("/approvals/{approval_id}/delegate", post(handlers::approvals::delegate))
        .route(
            "/training-requests/{request_id}/approvals",
            get(handlers::approvals::list_request_chain),
        )
        .route("/notifications", get(handlers::notifications::list_notifications))
        .route("/notifications/{id}/read", post(handlers::notifications::mark_read))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ]);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/verify-certificate", get(handlers::certificates::verify_certificate))
        .nest("/functions/v1", per_diem_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let db_pool = config.connect().await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config, db_pool)?;
    let app = build_router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao escutar o sinal de encerramento: {}", e);
    }
}
