use crate::cli::ServeArgs;
use crate::infra::{run_blocking, AppState};
use crate::routes::router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use clubdesk::config::AppConfig;
use clubdesk::error::AppError;
use clubdesk::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let target = config.target;
    let addr = config.server.socket_addr()?;

    // The blocking HTTP client must be created off the async runtime.
    let readiness = readiness_flag.clone();
    let metrics = Arc::new(prometheus_handle);
    let app_state = run_blocking(move || AppState::build(config, readiness, metrics)).await??;

    let app = router().layer(Extension(app_state)).layer(prometheus_layer);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(store_target = target.label(), %addr, "application intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
