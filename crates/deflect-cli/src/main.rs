//! deflect demo: run the hello endpoint or the scheduled job once, through the
//! shared computation pool.

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use deflect_core::adapters::timer::TimerInfo;
use deflect_core::config::LoggingConfig;
use deflect_core::impls::{RuntimeContext, TracingSink};
use deflect_core::logging::init_logging;
use deflect_core::ports::LogSink;

mod hello;
mod timer;

#[derive(Debug, Parser)]
#[command(name = "deflect", about = "Run deflect handlers from the command line", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Call the hello endpoint and print the JSON response.
    Hello {
        /// Request body. The endpoint only answers "Hello?".
        #[arg(long, value_name = "text")]
        body: Option<String>,
    },
    /// Fire the scheduled job once.
    Timer {
        /// Trigger payload as the host would send it.
        #[arg(long, value_name = "json", default_value = timer::DEFAULT_TRIGGER)]
        info: String,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_logging(&LoggingConfig::from_env()?)?;
    let ctx = RuntimeContext::computation_pool()?;
    let sink: Arc<dyn LogSink> = Arc::new(TracingSink::new("deflect-cli"));

    match cli.command {
        Command::Hello { body } => {
            let request = hello::request(body);
            let response = hello::respond(&ctx, &request, sink)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Timer { info } => {
            let info = TimerInfo::parse(&info)?;
            timer::trigger(&ctx, info, sink)?;
        }
    }
    Ok(())
}
