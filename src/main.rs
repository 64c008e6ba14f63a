use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use bhoj_edge::core::{BackgroundTasks, TaskKind};
use bhoj_edge::jobs::JobScheduler;
use bhoj_edge::{Config, ServerState, init_logger_with_file};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Environment and logging first; everything after this can log
    dotenv::dotenv().ok();
    let config = Config::from_env();
    if config.log_to_file {
        std::fs::create_dir_all(config.log_dir()).ok();
        init_logger_with_file(None, Some(&config.log_dir()));
    } else {
        init_logger_with_file(None, None);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Bhoj edge server starting"
    );

    let state = ServerState::new(config.clone()).await?;

    // Background tasks
    let mut tasks = BackgroundTasks::new();
    if config.enable_job_scheduler {
        let scheduler = JobScheduler::new(
            state.job_deps(),
            Duration::from_secs(config.job_tick_secs),
            tasks.shutdown_token(),
        );
        tasks.spawn("job_scheduler", TaskKind::Periodic, scheduler.run());
    } else {
        tracing::info!("Built-in job scheduler disabled; expecting external triggers");
    }

    // HTTP server
    let app = bhoj_edge::api::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop background tasks inside the shutdown budget
    let budget = Duration::from_millis(config.shutdown_timeout_ms);
    if tokio::time::timeout(budget, tasks.shutdown()).await.is_err() {
        tracing::warn!("Background tasks did not stop within the shutdown budget");
    }

    tracing::info!("Bhoj edge server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
