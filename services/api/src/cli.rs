use crate::commands::{run_score, run_underwrite, ScoreArgs, UnderwriteArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use property_finder::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Property Finder",
    about = "Score ZIP-level investment deals and underwrite individual properties",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score an observation export and print the ranked deals
    Score(ScoreArgs),
    /// Run the underwriting calculator for a single property
    Underwrite(UnderwriteArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Observation CSV used to seed the store and run an initial scoring batch
    #[arg(long)]
    pub(crate) observations: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Underwrite(args) => run_underwrite(args),
    }
}
