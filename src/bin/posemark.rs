//! posemark - pose-landmark video annotator
//!
//! Reads a video, runs the configured landmarker on every frame, overlays the
//! 33-point skeleton, and re-encodes the result. Exit status reflects the
//! pipeline's success flag.

use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use posemark::{
    CancelToken, LandmarkerBackend, LandmarkerRegistry, Pipeline, PipelineConfig, PosemarkConfig,
    StubLandmarker,
};

#[derive(Parser, Debug)]
#[command(name = "posemark", version, about = "Annotate a video with pose landmarks")]
struct Cli {
    /// Input video path (stub://<name> for a synthetic stream).
    input: String,
    /// Output video path.
    output: String,
    /// Landmarker backend to use.
    #[arg(long, env = "POSEMARK_BACKEND")]
    backend: Option<String>,
    /// ONNX pose model path (tract backend).
    #[arg(long, env = "POSEMARK_MODEL_PATH")]
    model: Option<std::path::PathBuf>,
    /// Suppress the progress bar.
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(report) if report.success => {
            println!("done: {}", report.summary());
            ExitCode::SUCCESS
        }
        Ok(report) => {
            println!("failed: {}", report.summary());
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<posemark::ProcessingReport> {
    let mut config = PosemarkConfig::load()?;
    if let Some(backend) = &cli.backend {
        config.backend = backend.clone();
    }
    if let Some(model) = &cli.model {
        config.model_path = Some(model.clone());
    }

    let landmarker = build_landmarker(&config)?;
    log::info!(
        "processing {} -> {} ({} backend)",
        cli.input,
        cli.output,
        config.backend
    );

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            log::warn!("interrupt received, finishing current frame");
            cancel.cancel();
        })
        .context("install interrupt handler")?;
    }

    let mut pipeline = Pipeline::new(
        PipelineConfig {
            input: cli.input,
            output: cli.output,
            stub: config.stub.clone(),
            style: config.overlay_style(),
        },
        landmarker,
    )
    .with_cancel(cancel);

    if !cli.quiet {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{bar:40} {pos}/{len} frames ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        pipeline = pipeline.with_progress(Box::new(move |done, total| {
            if let Some(total) = total {
                bar.set_length(total);
            }
            bar.set_position(done);
            if total == Some(done) {
                bar.finish();
            }
        }));
    }

    pipeline.run()
}

fn build_landmarker(config: &PosemarkConfig) -> Result<Arc<Mutex<dyn LandmarkerBackend>>> {
    let mut registry = LandmarkerRegistry::new();
    registry.register(StubLandmarker::empty());

    #[cfg(feature = "backend-tract")]
    if let Some(model_path) = &config.model_path {
        let backend = posemark::TractLandmarker::new(model_path, config.model_input_size)?;
        registry.register(backend);
    }

    let backend = registry.resolve(Some(&config.backend))?;
    {
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow::anyhow!("landmarker lock poisoned"))?;
        guard.warm_up().context("landmarker warm-up")?;
    }
    Ok(backend)
}
