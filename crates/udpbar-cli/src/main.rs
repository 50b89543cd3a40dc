#![deny(unsafe_code)]

//! udpbar CLI — run the indicator or drive one from scripts.

mod surface;

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use udpbar_config::AppConfig;
use udpbar_core::{
    Command, CommandSink, Daemon, Decoder, IconCatalog, RenderBridge, TracingRenderer,
    UdpCommandClient,
};

use crate::surface::JsonLinesRenderer;

/// How long `serve --json` waits for queued lines to reach stdout on exit.
const JSON_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// udpbar — a status indicator driven by UDP datagrams.
#[derive(Parser)]
#[command(name = "udpbar", version = udpbar_core::build_info::VERSION, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "udpbar.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the indicator until a quit command or Ctrl-C.
    Serve {
        /// Port to listen on, overriding config and environment.
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind, overriding config and environment.
        #[arg(short, long)]
        bind: Option<IpAddr>,

        /// Write state changes to stdout as JSON lines.
        #[arg(long)]
        json: bool,
    },

    /// Send one command to a running indicator.
    Send {
        /// Command text, e.g. `red`, `3` or `quit`.
        message: String,

        /// Host running the indicator (defaults to the configured bind address).
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port of the indicator (defaults to the configured port).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the color tokens and indexed images.
    Catalog,

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, found) = load_config(&cli.config).await?;
    config.apply_env().context("invalid environment override")?;

    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    // Logs go to stderr; stdout carries JSON lines and command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    if !found {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Serve { port, bind, json } => cmd_serve(config, port, bind, json).await?,
        Commands::Send {
            message,
            host,
            port,
        } => cmd_send(&config, &message, host, port)?,
        Commands::Catalog => cmd_catalog(&config),
        Commands::Config { show } => cmd_config(&cli.config, found, &config, show)?,
    }

    Ok(())
}

async fn cmd_serve(
    mut config: AppConfig,
    port: Option<u16>,
    bind: Option<IpAddr>,
    json: bool,
) -> Result<()> {
    if let Some(port) = port {
        config.listener.port = port;
    }
    if let Some(bind) = bind {
        config.listener.bind_addr = bind.to_string();
    }
    config.validate()?;

    let catalog = Arc::new(IconCatalog::from_config(&config.icon));
    let mut json_writer = None;
    let bridge: Arc<dyn RenderBridge> = if json {
        let (renderer, writer) = JsonLinesRenderer::spawn(std::io::stdout(), Arc::clone(&catalog))
            .context("cannot start JSON writer")?;
        json_writer = Some(writer);
        Arc::new(renderer)
    } else {
        Arc::new(TracingRenderer::new(Arc::clone(&catalog)))
    };

    let daemon = Daemon::with_catalog(config, catalog, bridge);
    let result = daemon.run().await;
    // The daemon has dropped the renderer; let the writer flush what is queued,
    // including a fatal error line.
    if let Some(writer) = json_writer {
        let drained = tokio::task::spawn_blocking(move || writer.wait(JSON_DRAIN_TIMEOUT))
            .await
            .is_ok_and(|out| out.is_some());
        if !drained {
            warn!("JSON output did not drain before exit");
        }
    }
    let reason = result?;
    info!(reason = ?reason, "udpbar exited");
    Ok(())
}

fn cmd_send(
    config: &AppConfig,
    message: &str,
    host: Option<IpAddr>,
    port: Option<u16>,
) -> Result<()> {
    let decoder = Decoder::from_config(&config.listener);
    let command = decoder.decode(message.as_bytes());
    if command == Command::Unknown {
        bail!("'{message}' is not a color, an image index, or the quit token");
    }

    let host = match host {
        Some(host) => host,
        None => target_host(&config.listener.bind_addr)?,
    };
    let port = port.unwrap_or(config.listener.port);

    let client = UdpCommandClient::connect((host, port))
        .with_context(|| format!("cannot open socket towards {host}:{port}"))?
        .with_quit_token(decoder.quit_token());
    client
        .submit(command)
        .with_context(|| format!("failed to send to {}", client.target()))?;
    info!(addr = %client.target(), message, "Sent");
    Ok(())
}

/// Where to send when no host is given. A wildcard bind address means the
/// indicator is reachable on loopback.
fn target_host(bind_addr: &str) -> Result<IpAddr> {
    let addr: IpAddr = bind_addr
        .parse()
        .with_context(|| format!("bind address {bind_addr:?} is not an IP address"))?;
    Ok(match addr {
        IpAddr::V4(v4) if v4.is_unspecified() => IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
        IpAddr::V6(v6) if v6.is_unspecified() => IpAddr::V6(std::net::Ipv6Addr::LOCALHOST),
        other => other,
    })
}

fn cmd_catalog(config: &AppConfig) {
    let catalog = IconCatalog::from_config(&config.icon);
    println!("Colors:");
    for color in catalog.colors() {
        println!("  {color}");
    }
    println!("Images:");
    for (index, name) in catalog.images().iter().enumerate() {
        println!("  {index:>3}  {name}");
    }
}

fn cmd_config(path: &Path, found: bool, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        let toml_str =
            toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
        println!("{toml_str}");
    } else {
        println!("{}", config_summary(path, found));
    }
    Ok(())
}

fn config_summary(path: &Path, found: bool) -> String {
    if found {
        format!("Configuration at '{}' is valid.", path.display())
    } else {
        format!(
            "No configuration file at '{}'; built-in defaults are in effect.",
            path.display()
        )
    }
}

/// Load the config file, or defaults when it does not exist. The flag tells
/// whether the file was found.
async fn load_config(path: &Path) -> Result<(AppConfig, bool)> {
    if path.exists() {
        let config = AppConfig::load(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?;
        Ok((config, true))
    } else {
        Ok((AppConfig::default(), false))
    }
}
