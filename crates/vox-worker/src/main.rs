//! Text-to-speech worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vox_queue::SqsQueue;
use vox_speech::{CommandAligner, HttpSynthesizer, SubtitleGenerator};
use vox_status::{DynamoStatusStore, StatusGuard};
use vox_storage::S3BlobStore;
use vox_worker::{JobProcessor, WorkerConfig, WorkerLoop};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vox=info".parse().unwrap())
        .add_directive("aws_config=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vox-worker");

    let config = match WorkerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load worker config: {}", e);
            std::process::exit(1);
        }
    };
    info!("Worker config: {:?}", config);

    let queue = match SqsQueue::from_env().await {
        Ok(q) => Arc::new(q),
        Err(e) => {
            error!("Failed to create queue client: {}", e);
            std::process::exit(1);
        }
    };

    let store = match DynamoStatusStore::from_env().await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create status store: {}", e);
            std::process::exit(1);
        }
    };
    let guard = StatusGuard::new(store);

    let synthesizer = match HttpSynthesizer::from_env() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create synthesizer client: {}", e);
            std::process::exit(1);
        }
    };

    let blobs = Arc::new(S3BlobStore::from_env().await);
    let subtitles = SubtitleGenerator::new(Arc::new(CommandAligner::from_env()));

    let processor = JobProcessor::new(
        config.clone(),
        guard.clone(),
        blobs,
        synthesizer,
        subtitles,
    );
    let runner = WorkerLoop::new(config, queue, processor, guard);

    // Flip the shutdown flag on ctrl-c
    let shutdown = runner.shutdown_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown.send(true).ok();
    });

    if let Err(e) = runner.run().await {
        error!("Worker loop error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
