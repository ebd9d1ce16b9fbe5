// crawlscope: crawl each seed with a headless browser, then merge and shape
// the discovered URLs into `<name>-all.txt`.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crawlscope::utils::{
    append_lines, read_url_lines, remove_if_exists, unique_urls, validate_output_name, write_lines,
};
use crawlscope::{BrowserDriver, CrawlTask, FilterMode, Request, TaskConfig, shape_urls};

#[derive(Parser, Debug)]
#[command(name = "crawlscope", version, about = "Budgeted headless-browser crawler")]
struct Cli {
    /// Seed URL; may be repeated
    #[arg(long = "url")]
    urls: Vec<String>,

    /// File with one seed URL per line
    #[arg(long)]
    url_file: Option<PathBuf>,

    /// Base name of the output files
    #[arg(long, default_value = "result")]
    result_name: String,

    /// Filter mode: simple, smart or strict
    #[arg(long)]
    mode: Option<FilterMode>,

    /// Maximum number of page sessions per seed
    #[arg(long)]
    max_crawler: Option<usize>,

    /// Number of tabs open at once
    #[arg(long)]
    max_tabs: Option<usize>,

    #[arg(long)]
    proxy: Option<String>,

    /// Comma separated keywords of links that must not be followed
    #[arg(long, value_delimiter = ',')]
    black_key: Vec<String>,

    /// Extra request headers as a JSON object
    #[arg(long)]
    headers: Option<String>,

    /// Path to the Chrome/Chromium executable
    #[arg(long)]
    chromium: Option<PathBuf>,

    /// Attach to a running browser instead of launching one
    #[arg(long)]
    ws_url: Option<String>,

    #[arg(long)]
    show_browser: bool,

    /// Percent-encode discovered query strings consistently
    #[arg(long)]
    encode_url: bool,

    /// Seed paths from robots.txt
    #[arg(long)]
    robots: bool,

    /// Seed paths from a fuzz dictionary file
    #[arg(long)]
    fuzz_dict: Option<PathBuf>,

    /// JSON task configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Other URL lists merged into the final output
    #[arg(long, num_args = 1..)]
    merge: Vec<PathBuf>,
}

impl Cli {
    fn task_config(&self) -> Result<TaskConfig> {
        let base = match &self.config {
            Some(path) => TaskConfig::from_json_file(path)?,
            None => TaskConfig::default(),
        };
        let mut builder = base.to_builder();
        if let Some(mode) = self.mode {
            builder = builder.filter_mode(mode);
        }
        if let Some(count) = self.max_crawler {
            builder = builder.max_crawl_count(count);
        }
        if let Some(count) = self.max_tabs {
            builder = builder.max_tabs_count(count);
        }
        if self.proxy.is_some() {
            builder = builder.proxy(self.proxy.clone());
        }
        if !self.black_key.is_empty() {
            builder = builder.ignore_keywords(self.black_key.iter().map(|k| k.trim()));
        }
        if let Some(headers) = &self.headers {
            builder = builder.extra_headers_json(headers.clone());
        }
        if self.chromium.is_some() {
            builder = builder.chromium_path(self.chromium.clone());
        }
        if self.ws_url.is_some() {
            builder = builder.chromium_ws_url(self.ws_url.clone());
        }
        if self.show_browser {
            builder = builder.headless(false);
        }
        if self.encode_url {
            builder = builder.encode_url_with_charset(true);
        }
        if self.robots {
            builder = builder.path_from_robots(true);
        }
        if self.fuzz_dict.is_some() {
            builder = builder.path_by_fuzz(true).fuzz_dict_path(self.fuzz_dict.clone());
        }
        builder.build()
    }

    async fn seeds(&self) -> Result<Vec<String>> {
        let mut seeds = self.urls.clone();
        if let Some(path) = &self.url_file {
            seeds.extend(read_url_lines(path).await?);
        }
        Ok(unique_urls(seeds.into_iter().map(|s| s.trim().to_string())))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    validate_output_name(&cli.result_name)?;

    let crawl_file = PathBuf::from(format!("crawler-{}.txt", cli.result_name));
    let all_file = PathBuf::from(format!("{}-all.txt", cli.result_name));
    for stale in [&crawl_file, &all_file] {
        remove_if_exists(stale).await?;
    }

    let seeds = cli.seeds().await?;
    if seeds.is_empty() {
        bail!("Either --url or --url-file must provide at least one seed");
    }
    let config = cli.task_config()?;

    for seed in &seeds {
        let request = match Request::parse_seed(seed) {
            Ok(request) => request,
            Err(e) => {
                warn!("Skipping seed {seed}: {e:#}");
                continue;
            }
        };
        crawl_seed(request, config.clone(), &crawl_file).await?;
    }

    let mut merged = read_optional(&crawl_file).await?;
    for path in &cli.merge {
        merged.extend(read_optional(path).await?);
    }
    let shaped = shape_urls(&merged);
    write_lines(&all_file, &shaped).await?;
    info!(
        "Wrote {} shaped URLs (from {} merged) to {}",
        shaped.len(),
        merged.len(),
        all_file.display()
    );
    Ok(())
}

async fn crawl_seed(seed: Request, config: TaskConfig, crawl_file: &Path) -> Result<()> {
    let url = seed.url.to_string();
    let task = match CrawlTask::new(vec![seed], config).await {
        Ok(task) => task,
        Err(e) => {
            error!("Cannot crawl {url}: {e}");
            return Ok(());
        }
    };
    let browser = task.browser();

    let output = tokio::select! {
        result = task.run() => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, closing browser");
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {e:#}");
            }
            std::process::exit(130);
        }
    };

    match output {
        Ok(output) => {
            info!(
                "{url}: {} kept, {} domains, {} subdomains",
                output.req_list.len(),
                output.all_domain_list.len(),
                output.sub_domain_list.len()
            );
            append_lines(crawl_file, &output.kept_urls())
                .await
                .context("Failed to record crawl results")?;
        }
        Err(e) => error!("Crawl of {url} failed: {e}"),
    }
    Ok(())
}

/// Lines of `path`, or nothing when the file does not exist
async fn read_optional(path: &Path) -> Result<Vec<String>> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        warn!("{} does not exist, skipping", path.display());
        return Ok(Vec::new());
    }
    read_url_lines(path).await
}
