mod commands;
mod output;

use aquawatch_core::rules::builtin::DEFAULT_PRESET;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "aquawatch",
    version,
    about = "Water-quality status for pond monitoring devices"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify exported readings (JSON rows or structured readings) offline
    Classify {
        /// Path to a readings JSON file
        input_file: PathBuf,

        #[command(flatten)]
        rules: RuleArgs,

        /// Restrict the tracked metrics (repeatable); default: ph, do, temp, turbidity
        #[arg(short, long = "metric", value_name = "KEY")]
        metric: Vec<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Show every metric, not just the ones out of range
        #[arg(long)]
        show_all: bool,
    },
    /// Inspect and validate rule tables
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
    /// List devices known to the dashboard API
    Devices {
        #[command(flatten)]
        api: ApiArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Poll a device and print its status after every poll (Ctrl-C to stop)
    Watch {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        rules: RuleArgs,

        /// Device to watch (default: last watched device, else the first listed)
        #[arg(short, long)]
        device: Option<String>,

        /// Session config JSON (poll interval, timeout, tracked metrics)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// File remembering the last watched device
        #[arg(long, value_name = "FILE", default_value = ".aquawatch-state.json")]
        state_file: PathBuf,

        /// Output format: table (default) or json (one event per line)
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Also print the last N readings with their status after each poll
        #[arg(long, value_name = "N", default_value_t = 0)]
        history: usize,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// List predefined rule tables
    List,
    /// Show the ranges of a rule table in plain language
    Explain {
        /// Preset name (e.g., "standard")
        preset: String,
    },
    /// Validate a custom rule file
    Validate {
        /// Path to JSON rule file
        file: PathBuf,
    },
}

/// Which rule table to evaluate against.
#[derive(Args)]
pub struct RuleArgs {
    /// Predefined rule table: standard, pond
    #[arg(short, long, default_value = DEFAULT_PRESET)]
    pub preset: String,

    /// Custom JSON rule file (overrides --preset)
    #[arg(short, long = "rules", value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

/// Connection to the dashboard API.
#[derive(Args)]
pub struct ApiArgs {
    /// API base URL, e.g. https://dashboard.example.com/api
    #[arg(long, env = "AQUAWATCH_BASE_URL")]
    pub base_url: String,

    /// Bearer token for the API
    #[arg(long, env = "AQUAWATCH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 8)]
    pub timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aquawatch=info,aquawatch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Classify {
            input_file,
            rules,
            metric,
            output,
            show_all,
        } => commands::classify::run(&input_file, &rules, metric, &output, show_all),
        Commands::Rules { action } => match action {
            RulesAction::List => commands::rules::list(),
            RulesAction::Explain { preset } => commands::rules::explain(&preset),
            RulesAction::Validate { file } => commands::rules::validate(&file),
        },
        Commands::Devices { api, output } => commands::devices::run(&api, &output).await,
        Commands::Watch {
            api,
            rules,
            device,
            config,
            state_file,
            output,
            history,
        } => {
            let options = commands::watch::WatchOptions {
                device,
                config,
                state_file,
                output,
                history,
            };
            commands::watch::run(&api, &rules, options).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
