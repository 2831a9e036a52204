pub mod classifier;
pub mod config;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod perception;

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::CaptureSource;
use crate::engine::controller::ChatCycleController;
use crate::engine::run_log::{default_log_path, JsonlSink, RunLog};
use crate::engine::state::RunSummary;
use crate::errors::{ChatLoopError, ChatLoopResult};
use crate::executor::delivery::{DeliveryAdapter, EnigoDelivery};
use crate::llm::generator::LlmReplyGenerator;
use crate::llm::registry::ProviderRegistry;
use crate::perception::screen_capture::ScreenCapture;
use crate::perception::traits::CaptureAdapter;
use crate::perception::transcript::TranscriptCapture;

/// Startup switches taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub dry_run: bool,
    /// Overrides `run.max_cycles` from the config file.
    pub cycles: Option<u64>,
    /// Overrides the default JSONL run log location.
    pub run_log: Option<PathBuf>,
    /// Validate configuration and exit without starting the cycle.
    pub check_only: bool,
}

pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

/// Loads configuration, wires the adapters and runs the chat cycle until it is
/// cancelled (Ctrl-C) or a configured limit is reached. Only configuration
/// problems surface as errors; per-chat failures end up in the run log.
pub async fn run(opts: RunOptions) -> ChatLoopResult<RunSummary> {
    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let mut app_config = config::load_config(opts.config_path.as_deref())?;
    if let Some(cycles) = opts.cycles {
        app_config.run.max_cycles = Some(cycles);
    }
    let run_config = app_config.run_config(opts.dry_run)?;

    let registry = ProviderRegistry::from_config(&app_config.llm)?;
    let generator = LlmReplyGenerator::from_registry(&registry)?;

    let capture: Arc<dyn CaptureAdapter> = match app_config.capture.source {
        CaptureSource::Screen => Arc::new(ScreenCapture::new(&app_config.timing, &app_config.capture)?),
        CaptureSource::Transcript => {
            let dir = app_config.capture.transcript_dir.clone().ok_or_else(|| {
                ChatLoopError::Config("capture.transcript_dir is required for transcript capture".into())
            })?;
            Arc::new(TranscriptCapture::new(dir))
        }
    };

    // Never invoked while dry-running; the controller only logs its intent.
    let delivery: Arc<dyn DeliveryAdapter> =
        Arc::new(EnigoDelivery::new(&app_config.timing, &app_config.delivery)?);
    if opts.dry_run {
        tracing::info!("dry-run enabled: no clicks or key presses will be sent");
    }

    if opts.check_only {
        tracing::info!(slots = run_config.slots.len(), "configuration OK");
        return Ok(RunSummary::default());
    }

    let mut run_log = RunLog::new();
    let log_path = opts
        .run_log
        .clone()
        .unwrap_or_else(|| default_log_path(run_log.run_id()));
    match JsonlSink::open(&log_path) {
        Ok(sink) => {
            tracing::info!(path = %sink.path().display(), "run log opened");
            run_log = run_log.with_sink(Box::new(sink));
        }
        Err(e) => {
            tracing::warn!(path = %log_path.display(), error = %e, "run log file unavailable; logging to console only");
        }
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted; stopping at the next step boundary");
                cancel.cancel();
            }
        }
    });

    let mut controller = ChatCycleController::new(
        run_config,
        capture,
        delivery,
        Arc::new(generator),
        run_log,
        app_config.run.clone(),
    );
    Ok(controller.run(&cancel).await)
}
