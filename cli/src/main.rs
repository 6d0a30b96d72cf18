mod http;


use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};

use viewer::ViewerError;
use viewer::asset::ModelAsset;
use viewer::config::{DEFAULT_BUCKET, ViewerConfig};
use viewer::presenter::{DEFAULT_DESCRIPTION, format_date, format_file_size, format_size_mb};
use viewer::resolve::resolve_model;
use viewer::share::{ShareMode, ShareTarget, SharePayload, qr_download_filename};
use viewer::store::{MetadataStore, StoreError};

use crate::http::{HttpProbe, HttpStore};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Viewer(#[from] ViewerError),
    #[error("store request failed: {0}")]
    Store(#[from] StoreError),
    #[error("failed to read config file {path}: {source}")]
    ConfigFile { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Parser, Debug)]
#[command(name = "viewer-cli", about = "Inspect hosted 3D models and build AR share links")]
struct Cli {
    /// JSON config document; flags and environment override its fields.
    #[arg(long, env = "VIEWER_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "VIEWER_STORE_URL")]
    store_url: Option<String>,

    #[arg(long, env = "VIEWER_STORE_KEY", hide_env_values = true)]
    store_key: Option<String>,

    #[arg(long, env = "VIEWER_BUCKET")]
    bucket: Option<String>,

    #[arg(long, env = "VIEWER_BASE_URL")]
    base_url: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a model, verify its content is reachable and print its details.
    Show { id: String },
    /// Print the share link and QR image URL for a model (or the demo cube).
    Share {
        id: Option<String>,
        #[arg(long, value_enum, default_value_t = ModeArg::Direct)]
        mode: ModeArg,
    },
    /// List public models in the store.
    List,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ModeArg {
    Direct,
    Webpage,
}

impl From<ModeArg> for ShareMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Direct => Self::Direct,
            ModeArg::Webpage => Self::Webpage,
        }
    }
}

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("warning: failed to load .env: {err}");
        }
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let base = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|source| CliError::ConfigFile { path: path.clone(), source })?;
            serde_json::from_str(&raw)?
        }
        None => ViewerConfig::default(),
    };
    let config = merge_config(base, &cli)?;
    tracing::debug!(base_url = %config.base_url, store = %config.store.url, "config loaded");

    match cli.command {
        Command::Show { ref id } => run_show(&config, id, cli.json).await,
        Command::Share { ref id, mode } => run_share(&config, id.as_deref(), mode.into(), cli.json),
        Command::List => run_list(&config, cli.json).await,
    }
}

/// Layer flag and environment values over a config document, then validate.
fn merge_config(mut config: ViewerConfig, cli: &Cli) -> Result<ViewerConfig, CliError> {
    if let Some(url) = &cli.store_url {
        config.store.url.clone_from(url);
    }
    if let Some(key) = &cli.store_key {
        config.store.anon_key.clone_from(key);
    }
    if let Some(bucket) = &cli.bucket {
        config.store.bucket.clone_from(bucket);
    }
    if config.store.bucket.is_empty() {
        DEFAULT_BUCKET.clone_into(&mut config.store.bucket);
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url.clone_from(base_url);
    }
    if config.base_url.is_empty() {
        DEFAULT_BASE_URL.clone_into(&mut config.base_url);
    }
    Ok(config.normalized().validate()?)
}

fn http_client() -> Result<reqwest::Client, CliError> {
    Ok(reqwest::Client::builder().user_agent(concat!("viewer-cli/", env!("CARGO_PKG_VERSION"))).build()?)
}

async fn run_show(config: &ViewerConfig, id: &str, as_json: bool) -> Result<(), CliError> {
    let client = http_client()?;
    let store = HttpStore::new(client.clone(), config.store.clone());
    let probe = HttpProbe::new(client);
    let resolved = resolve_model(&store, &probe, &config.store, id).await?;
    let report = model_report(config, &resolved.asset, &resolved.content_url);

    if as_json {
        return print_json(&report);
    }
    let asset = &resolved.asset;
    println!("{}", asset.title);
    println!("  {}", asset.description.as_deref().filter(|d| !d.is_empty()).unwrap_or(DEFAULT_DESCRIPTION));
    println!("  id:       {}", asset.id);
    println!("  size:     {}", format_size_mb(asset.size_bytes));
    if let Some(date) = asset.uploaded_at() {
        println!("  uploaded: {}", format_date(date));
    }
    if !asset.tags.is_empty() {
        println!("  tags:     {}", asset.tags.join(", "));
    }
    println!("  content:  {}", resolved.content_url);
    for mode in [ShareMode::Direct, ShareMode::Webpage] {
        let target = ShareTarget::new(config, Some(&asset.id), mode);
        println!("  {:<8}  {}", mode_label(mode), target.url);
        println!("            qr: {}", target.qr_image_url);
    }
    Ok(())
}

fn run_share(config: &ViewerConfig, id: Option<&str>, mode: ShareMode, as_json: bool) -> Result<(), CliError> {
    let target = ShareTarget::new(config, id, mode);
    if as_json {
        return print_json(&json!({
            "mode": mode,
            "url": target.url,
            "qr_image_url": target.qr_image_url,
            "instructions": mode.instructions(),
        }));
    }
    println!("{}", target.url);
    println!("qr: {}", target.qr_image_url);
    println!("{}", mode.instructions());
    Ok(())
}

async fn run_list(config: &ViewerConfig, as_json: bool) -> Result<(), CliError> {
    let store = HttpStore::new(http_client()?, config.store.clone());
    let models = store.list().await?;
    tracing::info!(count = models.len(), "listed models");

    if as_json {
        return print_json(&serde_json::to_value(&models)?);
    }
    if models.is_empty() {
        println!("no public models");
        return Ok(());
    }
    for line in models.iter().map(list_line) {
        println!("{line}");
    }
    Ok(())
}

fn model_report(config: &ViewerConfig, asset: &ModelAsset, content_url: &str) -> Value {
    let share = |mode| {
        let target = ShareTarget::new(config, Some(&asset.id), mode);
        json!({ "url": target.url, "qr_image_url": target.qr_image_url })
    };
    let payload = SharePayload::new(config, Some(&asset.id), &asset.title);
    json!({
        "id": asset.id,
        "title": asset.title,
        "description": asset.description,
        "size": format_size_mb(asset.size_bytes),
        "uploaded": asset.uploaded_at().map(format_date),
        "tags": asset.tags,
        "content_url": content_url,
        "share": {
            "direct": share(ShareMode::Direct),
            "webpage": share(ShareMode::Webpage),
            "text": payload.text,
            "qr_file": qr_download_filename(&asset.title),
        },
    })
}

fn list_line(asset: &ModelAsset) -> String {
    let date = asset.uploaded_at().map(format_date).unwrap_or_default();
    format!("{:<36}  {:<32}  {:>9}  {date}", asset.id, asset.title, format_file_size(asset.size_bytes))
}

fn mode_label(mode: ShareMode) -> &'static str {
    match mode {
        ShareMode::Direct => "direct",
        ShareMode::Webpage => "webpage",
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
