use std::net::SocketAddr;
use std::sync::Arc;

use gateway_service::{
    config::GatewayConfig,
    services::{RuleTable, TokenCodec},
    startup::build_router,
    AppState,
};
use service_core::error::AppError;
use service_core::grpc::{
    CompanyClient, CompanyClientConfig, DebtClient, DebtClientConfig, ProductClient,
    ProductClientConfig, UserClient, UserClientConfig,
};
use service_core::observability::{init_metrics, init_tracing};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = GatewayConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )
    .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

    init_metrics().map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;

    tracing::info!(
        service = %config.service_name,
        environment = ?config.environment,
        "Starting gateway service"
    );

    // No rule set, no service
    let policy = RuleTable::load(&config.policy.file)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

    let tokens = TokenCodec::from_config(&config.jwt)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

    let downstream = &config.downstream;
    let connect_err = |e: service_core::tonic::transport::Error| {
        AppError::ConfigError(anyhow::anyhow!("invalid downstream endpoint: {}", e))
    };
    let users = UserClient::new(UserClientConfig {
        endpoint: downstream.user_service_url.clone(),
        ..Default::default()
    })
    .map_err(connect_err)?;
    let products = ProductClient::new(ProductClientConfig {
        endpoint: downstream.product_service_url.clone(),
        ..Default::default()
    })
    .map_err(connect_err)?;
    let companies = CompanyClient::new(CompanyClientConfig {
        endpoint: downstream.company_service_url.clone(),
        ..Default::default()
    })
    .map_err(connect_err)?;
    let debts = DebtClient::new(DebtClientConfig {
        endpoint: downstream.debt_service_url.clone(),
        ..Default::default()
    })
    .map_err(connect_err)?;
    tracing::info!("Downstream clients initialized");

    let state = AppState {
        config: config.clone(),
        tokens: Arc::new(tokens),
        policy: Arc::new(policy),
        users: Arc::new(users),
        products: Arc::new(products),
        companies: Arc::new(companies),
        debts: Arc::new(debts),
    };

    let app = build_router(state);

    let addr: SocketAddr = config
        .common
        .bind_address()
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("invalid bind address: {}", e)))?;

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
