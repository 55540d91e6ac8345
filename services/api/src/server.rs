use crate::cli::ServeArgs;
use crate::infra::{build_deal_service, load_observations, AppState};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use property_finder::config::AppConfig;
use property_finder::error::AppError;
use property_finder::telemetry;
use property_finder::underwriting::UnderwritingCalculator;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let observations = load_observations(args.observations.as_deref())?;
    let seeded = !observations.is_empty();
    let deal_service = build_deal_service(&config.scoring, observations)?;

    if seeded {
        let as_of = Local::now().date_naive();
        match deal_service.run_batch(as_of, None) {
            Ok(summary) => info!(
                generation = summary.generation,
                scores = summary.total_deals_scored,
                "initial scoring run complete"
            ),
            Err(err) => warn!(%err, "initial scoring run failed"),
        }
    }

    let calculator = Arc::new(UnderwritingCalculator::default());

    let app = with_service_routes(deal_service, calculator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "deal scoring service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
