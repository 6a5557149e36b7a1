use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryApplicationsGateway, InMemoryDraftCache, InMemoryFileGateway};
use crate::routes::with_enrollment_routes;
use admission_desk::backend::ApiClient;
use admission_desk::config::AppConfig;
use admission_desk::error::AppError;
use admission_desk::telemetry;
use admission_desk::workflows::enrollment::WizardService;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let cache = Arc::new(InMemoryDraftCache::default());
    let routes = match config.backend.base_url.clone() {
        Some(base_url) => {
            let client = Arc::new(ApiClient::new(base_url)?);
            let service = Arc::new(WizardService::new(cache, client.clone(), client));
            with_enrollment_routes(service)
        }
        None => {
            let files = Arc::new(InMemoryFileGateway::default());
            let applications = Arc::new(InMemoryApplicationsGateway::new(files.clone()));
            let service = Arc::new(WizardService::new(cache, files, applications));
            with_enrollment_routes(service)
        }
    };

    let app = routes.layer(Extension(app_state)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "admissions intake orchestrator ready");

    axum::serve(listener, app).await?;
    Ok(())
}
