//! CreditPath Risk Service - Main Entry Point
//!
//! Loads the trained artifacts once, then answers borrower assessment
//! requests received over NATS. Requests are handled concurrently up to the
//! configured number of workers.

use anyhow::{Context, Result};
use creditpath_risk::{
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    engine::RiskEngine,
    metrics::{AssessmentMetrics, MetricsReporter},
    models::ArtifactLoader,
    producer::ResultProducer,
    service::{self, handle_payload},
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("creditpath_risk={}", logging.level).parse()?);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting CreditPath risk service");

    // Artifacts are loaded exactly once; any failure aborts startup.
    let loader = ArtifactLoader::with_threads(config.artifacts.onnx_threads)?;
    let artifacts = loader
        .load_all(&config.artifacts)
        .context("Failed to load trained artifacts")?;
    let engine = Arc::new(RiskEngine::new(artifacts).context("Trained artifacts are inconsistent")?);

    let model_info = engine.model_info();
    info!(
        model = %model_info.model_name,
        features = model_info.features_count,
        low_risk = %model_info.thresholds.low_risk,
        medium_risk = %model_info.thresholds.medium_risk,
        high_risk = %model_info.thresholds.high_risk,
        "Model ready"
    );

    let metrics = Arc::new(AssessmentMetrics::new());

    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(ResultProducer::new(client.clone(), &config.nats.result_subject));

    // Model info queries
    let mut info_subscription = client.subscribe(config.nats.info_subject.clone()).await?;
    let info_producer = producer.clone();
    let info_payload = model_info.clone();
    tokio::spawn(async move {
        while let Some(message) = info_subscription.next().await {
            if let Err(e) = info_producer.respond(message.reply, &info_payload).await {
                error!(error = %e, "Failed to answer model info request");
            }
        }
    });

    // Health checks
    let mut health_subscription = client.subscribe(config.nats.health_subject.clone()).await?;
    let health_producer = producer.clone();
    let health_engine = engine.clone();
    tokio::spawn(async move {
        while let Some(message) = health_subscription.next().await {
            if let Err(e) = health_producer.respond(message.reply, &health_engine.health()).await {
                error!(error = %e, "Failed to answer health check");
            }
        }
    });

    let reporter = MetricsReporter::new(metrics.clone(), config.service.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let num_workers = config.service.workers;
    info!(
        workers = num_workers,
        requests = %consumer.subject(),
        results = %producer.result_subject(),
        info = %config.nats.info_subject,
        health = %config.nats.health_subject,
        "Serving assessment requests"
    );

    let semaphore = Arc::new(Semaphore::new(num_workers));
    let mut subscription = consumer.subscribe().await?;
    let mut in_flight = JoinSet::new();

    while let Some(message) = subscription.next().await {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker semaphore closed")?;

        let engine = engine.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();

        in_flight.spawn(async move {
            let start = Instant::now();
            let response = handle_payload(&engine, &metrics, &message.payload);

            if let Err(e) = producer.respond(message.reply, &response).await {
                error!(error = %e, "Failed to publish assessment response");
            } else {
                debug!(
                    processing_time_us = start.elapsed().as_micros(),
                    "Assessment response published"
                );
            }

            drop(permit);
        });

        // reap finished handlers so the set stays small
        while in_flight.try_join_next().is_some() {}
    }

    info!(
        pending = in_flight.len(),
        "Request subscription closed, finishing in-flight requests"
    );
    service::drain(&mut in_flight).await;
    metrics.log_summary();

    Ok(())
}
