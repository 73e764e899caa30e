//! CLI entry point for the apkfetch tool.

use anyhow::Result;
use apkfetch_core::{
    CancelToken, CommandRenderer, DownloadOrchestrator, FetchConfig, HttpDownloader,
    ListingResolver, MirrorSearchClient, OrchestratorConfig, PageFetcher, RetryPolicy,
};
use clap::Parser;
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let fetch_config = FetchConfig::default();
    let fetcher = PageFetcher::new(&fetch_config)?;
    let renderer = CommandRenderer::new(&args.renderer);
    let mirror = MirrorSearchClient::new(
        Box::new(renderer),
        args.mirror_base_url.clone(),
        std::env::temp_dir(),
    );
    let resolver = ListingResolver::new(fetcher.clone());
    let downloader = HttpDownloader::new(&fetch_config)?;

    let config = OrchestratorConfig {
        output_dir: args.output_dir.clone(),
        concurrency: usize::from(args.concurrency),
        retry_policy: RetryPolicy::with_max_attempts(u32::from(args.max_retries) + 1),
        canonical_base_url: args.canonical_base_url.clone(),
    };
    let orchestrator =
        DownloadOrchestrator::new(fetcher, mirror, resolver, Box::new(downloader), config);

    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; abandoning work at the next checkpoint");
            signal_token.cancel();
        }
    });

    let report = orchestrator.run(&args.identifier, &cancel).await?;

    info!(
        candidates = report.decisions.len(),
        downloaded = report.downloaded_count(),
        rejected = report.rejected_count(),
        failed = report.failed_count(),
        skipped = report.skipped_count(),
        "Run complete"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
