use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use engagement_core::decoding::infrastructure::data_url_decoder::DataUrlDecoder;
use engagement_core::detection::infrastructure::face_mesh_provider::{
    FaceMeshConfig, FaceMeshProvider,
};
use engagement_core::detection::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use engagement_core::detection::infrastructure::onnx_face_mesh_model::OnnxFaceMeshModel;
use engagement_core::metrics::domain::metrics_config::MetricsConfig;
use engagement_core::metrics::domain::metrics_engine::MetricsEngine;
use engagement_core::pipeline::pipeline_logger::LogPipelineLogger;
use engagement_core::pipeline::stream_metrics_use_case::StreamMetricsUseCase;
use engagement_core::shared::clock::SystemClock;
use engagement_core::shared::constants::{
    DEFAULT_BLINK_DEBOUNCE_MS, DEFAULT_BLINK_EAR_THRESHOLD, DEFAULT_EYE_CONTACT_GAIN,
    DEFAULT_MAX_FACES, DEFAULT_MIN_DETECTION_CONFIDENCE, DEFAULT_MIN_TRACKING_CONFIDENCE,
    DEFAULT_SPEAKING_GAIN, FACE_DETECTION_MODEL_NAME, FACE_MESH_MODEL_NAME,
};
use engagement_core::shared::model_resolver;

/// Reads `{"interviewId","frame"}` JSON lines on stdin and writes one
/// engagement metrics JSON line per frame on stdout.
#[derive(Parser, Debug)]
#[command(name = "engagement-worker")]
struct Cli {
    /// Eye aspect ratio below which the left eye counts as closed.
    #[arg(long, default_value_t = DEFAULT_BLINK_EAR_THRESHOLD)]
    blink_threshold: f64,

    /// Minimum time between two counted blinks, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_BLINK_DEBOUNCE_MS)]
    blink_debounce_ms: u64,

    /// Eye contact falloff per unit of iris/nose horizontal offset.
    #[arg(long, default_value_t = DEFAULT_EYE_CONTACT_GAIN)]
    eye_contact_gain: f64,

    /// Speaking score per unit of lip gap.
    #[arg(long, default_value_t = DEFAULT_SPEAKING_GAIN)]
    speaking_gain: f64,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MIN_DETECTION_CONFIDENCE)]
    detection_confidence: f64,

    /// Face presence threshold for keeping a tracked face (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MIN_TRACKING_CONFIDENCE)]
    tracking_confidence: f64,

    /// Maximum number of faces landmarked per frame.
    #[arg(long, default_value_t = DEFAULT_MAX_FACES)]
    max_faces: usize,

    /// Directory holding bundled ONNX models.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Base URL to download missing models from. Without it, models must be
    /// cached or present in --model-dir.
    #[arg(long)]
    model_base_url: Option<String>,

    /// Log progress every N emitted frames.
    #[arg(long, default_value_t = 100)]
    progress_every: usize,
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

    let provider = build_provider(&cli)?;
    let engine = MetricsEngine::new(metrics_config(&cli));
    let mut use_case = StreamMetricsUseCase::new(
        Box::new(DataUrlDecoder::new()),
        provider,
        engine,
        Box::new(SystemClock),
        Box::new(LogPipelineLogger::new(cli.progress_every)),
    );

    log::info!("Ready, reading frames from stdin");
    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();
    use_case.execute(stdin.lock(), &mut stdout.lock(), &mut stderr.lock());

    Ok(())
}

fn build_provider(cli: &Cli) -> Result<Box<FaceMeshProvider>, Box<dyn std::error::Error>> {
    let detector_path = resolve_model(FACE_DETECTION_MODEL_NAME, cli)?;
    let mesh_path = resolve_model(FACE_MESH_MODEL_NAME, cli)?;

    let detector = OnnxBlazefaceDetector::new(&detector_path, cli.detection_confidence)?;
    let mesh = OnnxFaceMeshModel::new(&mesh_path)?;
    let config = FaceMeshConfig {
        max_faces: cli.max_faces,
        min_detection_confidence: cli.detection_confidence,
        min_tracking_confidence: cli.tracking_confidence,
    };
    Ok(Box::new(FaceMeshProvider::new(
        Box::new(mesh),
        Box::new(detector),
        config,
    )))
}

fn resolve_model(name: &str, cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {name}");
    let url = cli
        .model_base_url
        .as_deref()
        .map(|base| model_resolver::model_url(base, name));
    let path = model_resolver::resolve(
        name,
        url.as_deref(),
        cli.model_dir.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    log::info!("Using {}", path.display());
    Ok(path)
}

fn metrics_config(cli: &Cli) -> MetricsConfig {
    MetricsConfig {
        blink_ear_threshold: cli.blink_threshold,
        blink_debounce: Duration::from_millis(cli.blink_debounce_ms),
        eye_contact_gain: cli.eye_contact_gain,
        speaking_gain: cli.speaking_gain,
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for (flag, value) in [
        ("--detection-confidence", cli.detection_confidence),
        ("--tracking-confidence", cli.tracking_confidence),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("{flag} must be between 0.0 and 1.0, got {value}").into());
        }
    }
    for (flag, value) in [
        ("--blink-threshold", cli.blink_threshold),
        ("--eye-contact-gain", cli.eye_contact_gain),
        ("--speaking-gain", cli.speaking_gain),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(format!("{flag} must be a positive number, got {value}").into());
        }
    }
    if cli.max_faces == 0 {
        return Err("--max-faces must be at least 1".into());
    }
    if let Some(dir) = &cli.model_dir {
        if !dir.is_dir() {
            return Err(format!("Model directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
