//! CLI for the splitdl download accelerator.

mod url_list;

use anyhow::{Context, Result};
use clap::Parser;
use splitdl_core::{config, run_download, Console, DownloadRequest, SplitdlConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Download one or more URLs over concurrent HTTP Range requests.
#[derive(Debug, Parser)]
#[command(name = "splitdl")]
#[command(about = "splitdl: segmented HTTP download accelerator", long_about = None)]
pub struct Cli {
    /// Resume into existing files instead of picking a fresh name.
    #[arg(short = 'c', long = "continue")]
    pub resume: bool,

    /// Read URLs from FILE, one per line (`#` starts a comment line).
    #[arg(short = 'l', long = "list", value_name = "FILE")]
    pub list: Option<PathBuf>,

    /// Concurrent segment fetchers per download (overrides the config file).
    #[arg(short = 'n', long, value_name = "N", value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Destination path; only valid with a single URL.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Direct HTTP/HTTPS URLs to download.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,
}

fn parse_workers(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        if let Some(workers) = cli.workers {
            cfg.workers = workers;
        }
        cfg.validate().context("invalid configuration")?;
        tracing::debug!("loaded config: {:?}", cfg);

        let requests = cli.requests(&cfg)?;
        run_all(requests, cfg).await
    }

    /// Turns arguments into one request per URL, list entries first.
    fn requests(&self, cfg: &SplitdlConfig) -> Result<Vec<DownloadRequest>> {
        let mut urls = match &self.list {
            Some(path) => url_list::read_url_list(path)?,
            None => Vec::new(),
        };
        urls.extend(self.urls.iter().cloned());

        if urls.is_empty() {
            anyhow::bail!("no URLs given (pass URLs or --list FILE)");
        }
        if self.output.is_some() && urls.len() > 1 {
            anyhow::bail!("--output requires exactly one URL, got {}", urls.len());
        }

        Ok(urls
            .into_iter()
            .map(|url| DownloadRequest {
                url,
                destination: self.output.clone(),
                resume: self.resume,
                workers: cfg.workers,
            })
            .collect())
    }
}

/// Runs every download concurrently, each as an independent engine.
async fn run_all(requests: Vec<DownloadRequest>, cfg: SplitdlConfig) -> Result<()> {
    let console = Console::detect();
    let cfg = Arc::new(cfg);
    let total = requests.len();

    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let cfg = Arc::clone(&cfg);
            let console = console.clone();
            let url = request.url.clone();
            let handle =
                tokio::task::spawn_blocking(move || run_download(&request, &cfg, &console));
            (url, handle)
        })
        .collect();

    let mut failed = 0usize;
    for (url, handle) in handles {
        match handle.await {
            Ok(Ok(outcome)) => {
                tracing::info!(
                    url = %url,
                    path = %outcome.path.display(),
                    bytes = outcome.bytes_fetched,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "finished"
                );
            }
            // Already reported on stderr by the engine.
            Ok(Err(failure)) => {
                tracing::debug!(url = %url, "{}", failure);
                failed += 1;
            }
            Err(join_err) => {
                tracing::error!(url = %url, "download task panicked: {}", join_err);
                console.eprint(&format!("Error downloading {}: internal error\n", url));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} download(s) failed", failed, total);
    }
    Ok(())
}
