use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use face_consensus_core::alerting::domain::alert::AlertChannel;
use face_consensus_core::alerting::domain::alert_dispatcher::AlertDispatcher;
use face_consensus_core::alerting::infrastructure::archive_alert_dispatcher::ArchiveAlertDispatcher;
use face_consensus_core::alerting::infrastructure::log_alert_dispatcher::LogAlertDispatcher;
use face_consensus_core::batch::batch_request::BatchRequest;
use face_consensus_core::detection::infrastructure::recorded_detections::RecordedDetections;
use face_consensus_core::grouping::infrastructure::cosine_verifier::CosineVerifier;
use face_consensus_core::matching::domain::reference_gallery::ReferenceGallery;
use face_consensus_core::matching::infrastructure::gallery_matcher::GalleryMatcher;
use face_consensus_core::pipeline::batch_task::TaskStatus;
use face_consensus_core::pipeline::pipeline_logger::LogPipelineLogger;
use face_consensus_core::pipeline::resolve_identity_use_case::ResolveIdentityUseCase;
use face_consensus_core::shared::engine_config::EngineConfig;

/// Resolve the identity behind a batch of camera frames.
#[derive(Parser)]
#[command(name = "face-consensus")]
struct Cli {
    /// Batch request JSON: {"images": [<base64>...], "device_id": N}.
    batch: PathBuf,

    /// Recorded detections and embeddings for the batch frames.
    #[arg(long)]
    detections: PathBuf,

    /// Reference gallery JSON with identity profiles and embeddings.
    #[arg(long)]
    gallery: PathBuf,

    /// Engine config JSON (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Archive alerts to this directory instead of only logging them.
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Alert channel: email, text or in-app.
    #[arg(long)]
    channel: Option<String>,

    /// Maximum parallel workers per phase.
    #[arg(long)]
    max_workers: Option<usize>,

    /// Minimum detector confidence for a face to count (0.0-1.0).
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Ask the verifier both ways round and log any disagreement.
    #[arg(long)]
    validate_symmetry: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let batch = BatchRequest::load(&cli.batch)?.validate()?;
    let detections = Arc::new(RecordedDetections::load(&cli.detections)?);
    let gallery = Arc::new(ReferenceGallery::load(&cli.gallery)?);
    if gallery.is_empty() {
        log::warn!("Reference gallery {} is empty", cli.gallery.display());
    }

    let dispatcher: Arc<dyn AlertDispatcher> = match &cli.archive {
        Some(root) => Arc::new(ArchiveAlertDispatcher::new(root)),
        None => Arc::new(LogAlertDispatcher),
    };

    let use_case = ResolveIdentityUseCase::new(
        detections.clone(),
        detections,
        Arc::new(CosineVerifier::new(config.verification_threshold)),
        Arc::new(GalleryMatcher::new(gallery.clone(), config.match_threshold)),
        dispatcher,
        gallery,
        config,
        Box::new(LogPipelineLogger::default()),
    );

    let (ack, task) = use_case.submit(1, batch);
    println!("{}", serde_json::to_string_pretty(&ack)?);

    match task.wait() {
        TaskStatus::Completed(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        TaskStatus::Failed(reason) => Err(format!("Batch failed: {reason}").into()),
        other => Err(format!("Batch ended in unexpected state {other:?}").into()),
    }
}

fn build_config(cli: &Cli) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::load_default()?,
    };
    if let Some(channel) = &cli.channel {
        config.alert_channel = channel.parse::<AlertChannel>()?;
    }
    if let Some(max_workers) = cli.max_workers {
        config.max_workers = max_workers;
    }
    if let Some(min_confidence) = cli.min_confidence {
        config.min_face_confidence = min_confidence;
    }
    if cli.validate_symmetry {
        config.validate_symmetry = true;
    }
    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for (label, path) in [
        ("Batch", &cli.batch),
        ("Detections", &cli.detections),
        ("Gallery", &cli.gallery),
    ] {
        if !path.exists() {
            return Err(format!("{label} file not found: {}", path.display()).into());
        }
    }
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    if let Some(path) = &cli.archive {
        if path.exists() && !path.is_dir() {
            return Err(format!("Archive path is not a directory: {}", path.display()).into());
        }
    }
    if cli.max_workers == Some(0) {
        return Err("Max workers must be at least 1".into());
    }
    if let Some(c) = cli.min_confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("Min confidence must be between 0.0 and 1.0, got {c}").into());
        }
    }
    Ok(())
}
