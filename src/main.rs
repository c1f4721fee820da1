use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use yolo_detect_api::adapters::{
    fetch::reqwest_fetcher::ReqwestImageFetcher,
    http::{router, state::HttpState},
    imaging::normalizer::ExifRgbNormalizer,
    onnx::{detector::OnnxDetector, model_catalog::OnnxModelCatalog},
};
use yolo_detect_api::application::{ports::ModelCatalogPort, services::DetectionService};
use yolo_detect_api::config::AppConfig;
use yolo_detect_api::domain::model::ModelId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging (RUST_LOG, defaults to info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppConfig::parse();
    cfg.validate()?;

    tracing::info!("🔧 Initializing infrastructure adapters...");

    // 2. Validate and load the model once; shared read-only afterwards.
    let model = ModelId::from_path(&cfg.model_path);
    OnnxModelCatalog::new().validate_model(&model).await?;

    let params = cfg.yolo_params();
    let intra_threads = cfg.intra_threads;
    let detector = tokio::task::spawn_blocking(move || OnnxDetector::load(model, params, intra_threads)).await??;
    tracing::info!("✅ Model ready: {} ({})", detector.model().name, detector.model().onnx_path);

    // 3. Adapters and use case
    let fetcher = Arc::new(ReqwestImageFetcher::new(&cfg.user_agent, cfg.fetch_timeout())?);
    let normalizer = Arc::new(ExifRgbNormalizer::new());
    let detection = Arc::new(DetectionService::new(fetcher, normalizer, Arc::new(detector)));

    // 4. State and router
    let state = HttpState {
        detection,
        max_upload_bytes: cfg.max_upload_bytes,
    };
    let app = router(state);

    // 5. Serve
    tracing::info!("🚀 Detection server listening on http://{}", cfg.bind);
    tracing::info!("📮 POST /detect (multipart 'image' or JSON 'image_url')");

    let listener = tokio::net::TcpListener::bind(cfg.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
