//! kubehook webhook receiver.
//!
//! - Review endpoint: POST /audit (AdmissionReview, SubjectAccessReview, EventList)
//! - Ops: /healthz, /readyz, /metrics
//! - Graceful shutdown on SIGINT/SIGTERM (readiness flips to draining first)

use tracing_subscriber::{fmt, EnvFilter};

use kubehook_core::error::{KubehookError, Result};
use kubehook_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "kubehook-gateway stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = config::load()?;
    let listen = cfg.gateway.listen_addr()?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(
        %listen,
        service = %state.cfg().gateway.service_name,
        review_path = %state.cfg().gateway.review_path,
        "kubehook-gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| KubehookError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|e| KubehookError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    state.metrics().set_draining();
    tracing::info!("signal received, starting graceful shutdown");
}
