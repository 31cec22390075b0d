//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use remotecontent_core::{RenderSettings, Renderer, RequestContext};
use remotecontent_fetch::{FetchOptions, HttpFetcher};
use remotecontent_rewrite::{KeepRelativePolicy, resolve_fetch_url, rewrite_markup_with_stats};
use remotecontent_shared::{
    AppConfig, RemoteContentSpec, init_config, load_config, load_config_from,
};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// RemoteContent: embed markup from a remote origin.
#[derive(Parser)]
#[command(
    name = "remotecontent",
    version,
    about = "Fetch remote page content and rewrite its URLs for embedding in another site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to read instead of ~/.remotecontent/remotecontent.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured root URL.
    #[arg(long, global = true, env = "REMOTE_CONTENT_ROOT_URL")]
    pub root_url: Option<String>,

    /// Report why a render failed instead of printing nothing.
    #[arg(long, global = true, env = "REMOTE_CONTENT_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Output format for `render`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Rewritten markup only.
    Html,
    /// The full render outcome.
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch a remote path and print the rewritten markup.
    Render {
        /// Remote path, relative to the root URL (e.g. /news/latest-news/).
        path: String,

        /// Inbound query string to pass through (e.g. "page=2&q=hpc").
        #[arg(short, long)]
        query: Option<String>,

        /// Output format.
        #[arg(short, long, default_value = "html")]
        format: OutputFormat,
    },

    /// Print the URL a remote path would be fetched from.
    Resolve {
        /// Remote path, relative to the root URL.
        path: String,

        /// Inbound query string to pass through.
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Rewrite local markup against a base URL.
    Rewrite {
        /// Base URL that relative references resolve against.
        #[arg(long)]
        base: String,

        /// Markup file to read (stdin when omitted).
        file: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so rendered
/// markup on stdout stays clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "remotecontent=warn",
        1 => "remotecontent=info",
        2 => "remotecontent=debug",
        _ => "remotecontent=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Render {
            path,
            query,
            format,
        } => cmd_render(&config, &path, query.as_deref(), format).await,
        Command::Resolve { path, query } => cmd_resolve(&config, &path, query.as_deref()),
        Command::Rewrite { base, file } => cmd_rewrite(&config, &base, file.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Load the config file and apply CLI overrides on top.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    apply_overrides(&mut config, cli.root_url.as_deref(), cli.debug);
    Ok(config)
}

fn apply_overrides(config: &mut AppConfig, root_url: Option<&str>, debug: bool) {
    if let Some(root) = root_url {
        config.source.root_url = root.to_string();
    }
    if debug {
        config.render.debug_mode = true;
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_render(
    config: &AppConfig,
    path: &str,
    query: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let spec = RemoteContentSpec::new(path)?;
    let request = query.map(RequestContext::from_query_string);

    let fetcher = HttpFetcher::new(&FetchOptions::from(&config.http))?;
    let renderer = Renderer::new(RenderSettings::from(config), fetcher);

    let spinner = fetch_spinner(&renderer.source_url(&spec, request.as_ref()));
    let outcome = renderer.render(&spec, request.as_ref()).await;
    spinner.finish_and_clear();

    info!(
        source_url = %outcome.source_url,
        success = outcome.is_success(),
        "render finished"
    );

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        OutputFormat::Html => match (outcome.markup, outcome.error_string) {
            (Some(markup), _) => {
                println!("{markup}");
                Ok(())
            }
            (None, Some(diagnostic)) => Err(eyre!(diagnostic)),
            // Non-debug failures render nothing.
            (None, None) => Ok(()),
        },
    }
}

fn cmd_resolve(config: &AppConfig, path: &str, query: Option<&str>) -> Result<()> {
    let spec = RemoteContentSpec::new(path)?;
    let request = query.map(RequestContext::from_query_string);
    let url = resolve_fetch_url(
        &config.source.root_url,
        &spec.remote_path,
        request.as_ref().map(|r| r.query.as_slice()),
    );
    println!("{url}");
    Ok(())
}

fn cmd_rewrite(config: &AppConfig, base: &str, file: Option<&Path>) -> Result<()> {
    let base_url = Url::parse(base).map_err(|e| eyre!("invalid base URL '{base}': {e}"))?;

    let html = match file {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .wrap_err("failed to read markup from stdin")?;
            buf
        }
    };

    let policy = KeepRelativePolicy::compile(&config.source.use_relative_paths);
    let (markup, stats) = rewrite_markup_with_stats(&html, &base_url, &policy)
        .ok_or_else(|| eyre!("no markup to rewrite"))?;

    info!(
        src = stats.src,
        srcset = stats.srcset,
        href = stats.href,
        kept_relative = stats.kept_relative,
        "rewrote markup"
    );
    println!("{markup}");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Spinner on stderr while the single fetch is in flight.
fn fetch_spinner(url: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    spinner.set_style(style);
    spinner.set_message(format!("Fetching {url}"));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
