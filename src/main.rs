//! vmdesk CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vmdesk::cli::{Cli, CommandDispatcher};
use vmdesk::shell::is_ci;
use vmdesk::ui::{create_ui, OutputMode};

/// Exit code for errors that stop a run before a report exists.
const EXIT_FATAL: u8 = 2;

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("vmdesk=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vmdesk=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("vmdesk starting with args: {:?}", cli);

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let mut ui = create_ui(!is_ci(), output_mode);

    let work_dir = std::env::current_dir().unwrap_or_default();
    let dispatcher = CommandDispatcher::new(work_dir);

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(u8::try_from(result.exit_code).unwrap_or(EXIT_FATAL)),
        Err(e) => {
            tracing::debug!("Fatal: {:?}", e);
            ui.error(&format!("Error: {}", e));
            ExitCode::from(EXIT_FATAL)
        }
    }
}
