//! cfgload - guarded configuration loads for Junos devices
//!
//! This is the main entry point for the cfgload CLI.

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cfgload::app::Workflow;
use cfgload::cli::output::OutputFormatter;
use cfgload::cli::prompt::TerminalPrompt;
use cfgload::cli::Cli;
use cfgload::config::{LogFormat, LoggingSettings, Settings};
use cfgload::connection::ssh::SshConnector;
use cfgload::credentials::FileResolver;
use cfgload::error::EXIT_FAILURE;
use cfgload::template::JinjaRenderer;
use cfgload::transaction::{AssumeYes, Confirmation};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments; usage errors exit 2
    let cli = Cli::parse_args();

    let mut settings = match Settings::load(cli.settings.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            OutputFormatter::new(!cli.no_color, cli.verbosity()).error(&format!("{:#}", e));
            std::process::exit(EXIT_FAILURE);
        }
    };

    // CLI flags win over settings and environment
    if let Some(timeout) = cli.timeout {
        settings.connection.connect_timeout = timeout;
    }
    if cli.no_color {
        settings.output.color = false;
    }

    init_logging(cli.verbosity(), &settings.logging);

    if cli.verbosity() >= 2 {
        eprintln!("cfgload v{}", cfgload::version());
    }

    let output = Arc::new(OutputFormatter::new(settings.output.color, cli.verbosity()));
    let confirmation: Arc<dyn Confirmation> = if cli.noprompt {
        Arc::new(AssumeYes)
    } else {
        Arc::new(TerminalPrompt::new())
    };

    let workflow = Workflow::new(
        Arc::new(SshConnector::default()),
        Arc::new(FileResolver::new()),
        Arc::new(JinjaRenderer::new()),
        confirmation,
        output,
        settings.connect_options(),
    );

    let exit_code = workflow.run(&cli.request()).await;

    std::process::exit(exit_code);
}

/// Initialize logging from verbosity, `RUST_LOG` and the settings file
fn init_logging(verbosity: u8, logging: &LoggingSettings) {
    let filter = match verbosity {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(verbosity >= 3)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
