//! VidQuiz CLI
//!
//! Resolves a content reference, runs the pipeline once, and prints where
//! the quiz document landed. Remote analysis is used when an API key is
//! configured; otherwise the run degrades to local heuristic generation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vidquiz::core::acquire::YtDlpFetcher;
use vidquiz::core::pipeline::{Orchestrator, PipelineConfig, PipelineRunner};
use vidquiz::core::remote::{GeminiService, RemoteJobClient};
use vidquiz::core::resolver;
use vidquiz::core::transcode::FfmpegTranscoder;

#[derive(Parser, Debug)]
#[command(
    name = "vidquiz",
    version,
    about = "Turn a video reference into a quiz document"
)]
struct Cli {
    /// Content reference: a watch/short-link/embed/shorts URL carrying an
    /// 11-character content id
    reference: String,

    /// Number of questions to generate
    #[arg(short = 'n', long, default_value_t = 5)]
    questions: usize,

    /// Directory for artifacts and the quiz document
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Never contact the remote service; local generation only
    #[arg(long)]
    offline: bool,

    /// Use only the transcript; no media download or upload
    #[arg(long)]
    transcript_only: bool,

    /// Skip the video download (transcript goes to the remote service as text)
    #[arg(long)]
    no_video: bool,

    /// Preferred subtitle language
    #[arg(long, default_value = "en")]
    subtitle_lang: String,

    /// Seconds between remote state polls
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,

    /// Remote poll time budget in seconds
    #[arg(long, default_value_t = 600)]
    poll_timeout: u64,

    /// Resolution cap for video acquisition
    #[arg(long, default_value_t = 360)]
    max_height: u32,
}

fn init_tracing(output_dir: &Path) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(output_dir)?;
    let file_appender = tracing_appender::rolling::never(output_dir, "vidquiz.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Ok(guard)
}

fn api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY")
        .ok()
        .or_else(|| std::env::var("API_KEY").ok())
        .filter(|k| !k.is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(&cli.output_dir)?;

    let content = resolver::resolve(&cli.reference)?;

    let transcoder = FfmpegTranscoder::detect();
    let config = PipelineConfig {
        download_video: !cli.no_video,
        transcript_only: cli.transcript_only,
        offline_mode: cli.offline,
        question_count: cli.questions,
        transcoder_available: transcoder.is_some(),
        max_video_height: cli.max_height,
        poll_interval: Duration::from_secs(cli.poll_interval),
        poll_timeout: Duration::from_secs(cli.poll_timeout),
        subtitle_lang: cli.subtitle_lang.clone(),
        ..PipelineConfig::new(&cli.output_dir)
    }
    .normalize();
    config.validate()?;

    let mut orchestrator = Orchestrator::new(config, Arc::new(YtDlpFetcher::new()));
    if let Some(transcoder) = transcoder {
        orchestrator = orchestrator.with_transcoder(Arc::new(transcoder));
    }
    if !cli.offline {
        match api_key() {
            Some(key) => {
                let service = GeminiService::new(key)?;
                orchestrator = orchestrator.with_remote(RemoteJobClient::new(Arc::new(service)));
            }
            // Missing key is not fatal; the run degrades to local generation
            None => warn!("no GEMINI_API_KEY or API_KEY set; using local generation only"),
        }
    }

    let runner = PipelineRunner::new(orchestrator);
    let handle = runner.start(content)?;

    let cancel = handle.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    match handle.join().await {
        Ok(report) => {
            println!(
                "Wrote {} questions to {}",
                report.document.len(),
                report.output_path.display()
            );
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            eprintln!("Run cancelled; partial artifacts were kept for reuse");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
