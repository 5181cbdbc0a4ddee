use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use dsched_core::config::read_timeout_from;
use dsched_core::{ClientConfig, Settings};
use dsched_placement::PolicyKind;
use dsched_proto::Session;
use dsched_scheduler::{RunSummary, Scheduler};

#[derive(Parser, Debug)]
#[command(
    name = "dsched",
    about = "dsched: job placement client for the ds-server simulator",
    version
)]
struct Cli {
    /// Placement algorithm: fc, cf, bf, ff, wf, ft, atl, lrr.
    /// Unrecognized codes fall back to cf.
    #[arg(short, long)]
    algorithm: Option<String>,

    /// Path to a dsched.toml configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ds-server host (default: 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// ds-server port (default: 50000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Name sent with AUTH (default: $USER)
    #[arg(short, long)]
    user: Option<String>,

    /// Socket read timeout, e.g. "30s" or "500ms"; "0" blocks forever
    #[arg(long)]
    read_timeout: Option<String>,

    /// Log every protocol line sent and received
    #[arg(short, long)]
    debug: bool,

    /// Summary printed on exit: text, json or none
    #[arg(short, long, default_value = "text")]
    summary: String,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        let config = match &self.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => ClientConfig::default(),
        };
        let mut settings = config.resolve()?;

        if let Some(algorithm) = &self.algorithm {
            settings.algorithm = algorithm.clone();
        }
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(user) = &self.user {
            settings.user = user.clone();
        }
        if let Some(timeout) = &self.read_timeout {
            settings.read_timeout = read_timeout_from(timeout)?;
        }
        Ok(settings)
    }
}

fn print_summary(summary: &RunSummary, format: &str) -> anyhow::Result<()> {
    match format {
        "json" => println!("{}", summary.to_json()?),
        "none" => {}
        _ => print!("{}", summary.format_text()),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "info,dsched_proto=debug,dsched_placement=debug,dsched_scheduler=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = cli.settings()?;
    let policy = PolicyKind::from_code_or_default(&settings.algorithm);
    info!(
        host = %settings.host,
        port = settings.port,
        user = %settings.user,
        %policy,
        "connecting to ds-server"
    );

    let session = Session::connect(
        &settings.host,
        settings.port,
        settings.connect_timeout,
        settings.read_timeout,
    )?;
    let outcome = Scheduler::new(session, policy.build()).run(&settings.user)?;

    print_summary(&outcome.summary, &cli.summary)?;
    std::process::exit(outcome.exit_status);
}
