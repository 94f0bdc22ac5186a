mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, counter::CounterSubcommand, handler::HandlerSubcommand};
use std::path::PathBuf;
use uncookie_core::config::Config;

#[derive(Parser)]
#[command(
    name = "uncookie",
    about = "Run JSON action schemas that strip cookie banners and reset cookies",
    version,
    propagate_version = true
)]
struct Cli {
    /// Root holding .uncookie/ (default: auto-detect from cwd)
    #[arg(long, global = true, env = "UNCOOKIE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Force debug logging on, regardless of the configured debug mode
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger every configured handler against a page snapshot
    Run {
        /// Page snapshot (YAML)
        #[arg(long)]
        page: PathBuf,

        /// Print the page snapshot after the run
        #[arg(long)]
        dump: bool,
    },

    /// Parse a schema and report its shape (inline JSON or @file)
    Check { schema: String },

    /// Resolve a remote schema and print it
    Fetch { url: String },

    /// Manage the ordered handler list
    Handler {
        #[command(subcommand)]
        subcommand: HandlerSubcommand,
    },

    /// Inspect and modify the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Show or reset the running badge counter
    Counter {
        #[command(subcommand)]
        subcommand: CounterSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let root = root::resolve_root(cli.root.as_deref());

    // An unreadable config still gets a chance to report itself below.
    let debug = cli.debug || Config::load(&root).map(|c| c.debug).unwrap_or(false);
    let default_directive = if debug { "debug" } else { "off" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run { page, dump } => cmd::run::run(&root, &page, dump, cli.json),
        Commands::Check { schema } => cmd::check::run(&schema, cli.json),
        Commands::Fetch { url } => cmd::fetch::run(&root, &url, cli.json),
        Commands::Handler { subcommand } => cmd::handler::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Counter { subcommand } => cmd::counter::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
