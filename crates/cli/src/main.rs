// ragdesk CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;
mod prompt;

use exit_code::ExitCode;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "ragdesk", about = "Chat with your documents from the terminal")]
struct Cli {
    /// Force JSON output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::detect(cli.json);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            output::print_error(format, "RUNTIME", &format!("failed to start runtime: {e}"));
            return ExitCode::Error.into();
        }
    };

    match runtime.block_on(commands::run(cli.command, format)) {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => {
            output::print_anyhow_error(format, &e);
            ExitCode::from_error(&e).into()
        }
    }
}
