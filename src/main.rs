//! version-matrix CLI - reports vendored component versions

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use version_matrix::commands::report::{self, ReportOptions};
use version_matrix::config::Settings;
use version_matrix::output::OutputFormat;
use version_matrix::utils::{display_error_and_exit, enhance_error, logger};
use version_matrix::log_warn;

#[derive(Parser)]
#[command(name = "version-matrix")]
#[command(author, version, about = "Reports where vendored component versions live", long_about = None)]
struct Cli {
    /// Verbose output (can be used multiple times: -v, -vv, -vvv)
    /// -v: INFO, -vv: DEBUG, -vvv: TRACE
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the inventory document
    #[arg(short, long, required_unless_present = "completion")]
    config: Option<PathBuf>,

    /// Print structured JSON instead of a table
    #[arg(long, conflicts_with = "table")]
    json: bool,

    /// Print a table even when the settings file asks for JSON
    #[arg(long)]
    table: bool,

    /// Repository root that inventory paths are resolved against
    #[arg(long, env = "VERSION_MATRIX_ROOT")]
    root: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, exclusive = true)]
    completion: Option<Shell>,
}

impl Cli {
    /// Output format; flags win over the settings file
    fn output_format(&self, settings: &Settings, color: bool) -> OutputFormat {
        if self.json || (settings.defaults.json && !self.table) {
            OutputFormat::Json
        } else {
            OutputFormat::Table { color }
        }
    }
}

/// Exit status for a finished report: 0 when every occurrence resolved
fn exit_code(all_resolved: bool) -> ExitCode {
    if all_resolved {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "version-matrix", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    let (settings, settings_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(err) => (Settings::default(), Some(err)),
    };

    let color = !cli.no_color && settings.colors.enabled;
    if !color {
        colored::control::set_override(false);
    }
    logger::init(cli.verbose, color);

    if let Some(err) = settings_error {
        log_warn!("Ignoring settings file: {:#}", err);
    }

    let format = cli.output_format(&settings, color);
    let root = cli.root.unwrap_or_else(|| settings.root());

    let Some(config) = cli.config else {
        // clap enforces --config unless --completion is given
        return ExitCode::FAILURE;
    };

    let options = ReportOptions { config, root, format };

    match report::run(options) {
        Ok(all_resolved) => exit_code(all_resolved),
        Err(err) => display_error_and_exit(enhance_error(err)),
    }
}
