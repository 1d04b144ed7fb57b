//! API server entry point.

use api::config::{Config, LogFormat};
use messaging::{ConsumerSettings, PaymentStatusConsumer};
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration and tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Backends and application state
    let backends = api::Backends::from_config(&config).await?;
    let state = api::create_state(&backends, &config.order_events_queue);

    // 4. Payment status consumer
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = PaymentStatusConsumer::new(
        backends.queue.clone(),
        state.order_service.clone(),
        ConsumerSettings {
            queue_name: config.payment_queue.clone(),
            batch_size: config.queue_batch_size,
            wait: config.queue_wait,
            handler_timeout: config.request_timeout,
            ..ConsumerSettings::default()
        },
    );
    let consumer_task = tokio::spawn(consumer.run(shutdown_rx));

    // 5. Build the application and serve
    let app = api::create_app(state, metrics_handle, config.request_timeout);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 6. Let the consumer finish its in-flight message
    let _ = shutdown_tx.send(true);
    if let Err(err) = consumer_task.await {
        tracing::error!(error = %err, "payment status consumer panicked");
    }

    tracing::info!("server shut down gracefully");
    Ok(())
}
