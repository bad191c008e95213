use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Parser;
use futures::future::join_all;
use gesture_pipeline::config::{DEFAULT_CONFIG_PATH, Settings};
use gesture_pipeline::error::AppError;
use gesture_pipeline::{GesturePipeline, GestureService, PipelineManager, ProcessFrameRequest};
use std::path::PathBuf;
use tower::ServiceExt;
use tracing::{Level, error, info, warn};

fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

/// Classify hand gestures in still images through the frame pipeline
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file, extension optional
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Image files, each processed as its own session
    images: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let Args {
        config: config_path,
        images,
    } = Args::parse();
    let settings = Settings::load(&config_path)?;
    init_logging(&settings.logging.level);
    info!("Loaded configuration from {}", config_path);

    let pipeline = GesturePipeline::from_settings(settings.pipeline.clone(), settings.models.clone());
    let manager = PipelineManager::new(pipeline);

    if settings.server.preload_models {
        let warm = manager.clone();
        let outcome = tokio::task::spawn_blocking(move || warm.warm_up())
            .await
            .map_err(|e| AppError::Worker(e.to_string()))?;
        if let Err(e) = outcome {
            warn!("Models unavailable at startup: {}", e);
        }
    }

    if images.is_empty() {
        warn!("No image files given, nothing to process");
    }

    let service = GestureService::new(manager.clone(), settings.server.unavailable_policy)
        .layered(&settings.server);

    let requests = images.into_iter().map(|path| {
        let service = service.clone();
        async move {
            let bytes = tokio::fs::read(&path).await?;
            let session = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let request = ProcessFrameRequest::from_frame(STANDARD.encode(bytes)).with_session(session);
            let response = service
                .oneshot(request)
                .await
                .map_err(|e| AppError::Worker(e.to_string()))?;
            Ok::<_, AppError>((path, response))
        }
    });

    for outcome in join_all(requests).await {
        match outcome {
            Ok((path, response)) => {
                println!(
                    "{} [{}] {}",
                    path.display(),
                    response.status_code,
                    response.body
                );
            }
            Err(e) => error!("Frame failed: {}", e),
        }
    }

    let page = manager.history_page();
    info!(
        "History: {} entries retained, latest {:?}",
        page.total_entries,
        page.history.last().map(|h| h.gesture.as_str())
    );
    info!(
        "Status: {}",
        serde_json::to_string(&manager.optimization_status()).unwrap_or_default()
    );
    info!(
        "Models: {}",
        serde_json::to_string(&manager.model_status()).unwrap_or_default()
    );
    info!(
        "Performance: {}",
        serde_json::to_string(&manager.performance_stats()).unwrap_or_default()
    );

    Ok(())
}
