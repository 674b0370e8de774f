mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, record::RecordArgs, row::RowCommandArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "growthlog",
    about = "Record the daily growth metrics row: query, leads, replies, revenue and top pain points",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from growthlog.yaml or .git/)
    #[arg(long, global = true, env = "GROWTHLOG_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default growthlog.yaml in the project root
    Init,

    /// Build today's metrics row and append it to a sink
    Record(RecordArgs),

    /// Print today's metrics row without recording it
    Row(RowCommandArgs),

    /// Show the search query scheduled for today
    Query,

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Record(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Record(args) => cmd::record::run(&root, args, cli.json),
        Commands::Row(args) => cmd::row::run(&root, args, cli.json),
        Commands::Query => cmd::query::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
