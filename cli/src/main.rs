//! PollCheck command line: entry point for operators at a polling booth.

mod commands;
mod interactive;
mod prompt;
mod render;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use pollcheck_client::{ClientConfig, FileTokenStore, HttpRegistry};
use pollcheck_types::{Gender, VoteFilter};
use pollcheck_utils::LogFormat;

#[derive(Parser)]
#[command(name = "pollcheck", about = "Voter roll search and vote marking")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "POLLCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the Registry.
    #[arg(long, env = "POLLCHECK_API_URL")]
    api_url: Option<String>,

    /// File holding the session token between runs.
    #[arg(long, env = "POLLCHECK_TOKEN_PATH")]
    token_path: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "POLLCHECK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "POLLCHECK_LOG_FORMAT")]
    log_format: Option<String>,

    /// Whole-request timeout in seconds.
    #[arg(long, env = "POLLCHECK_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Log in and store the session token.
    Login {
        #[arg(long, env = "POLLCHECK_USERNAME")]
        username: String,
        /// Prompted for when omitted.
        #[arg(long, env = "POLLCHECK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an operator account (needs the shared security code).
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: String,
        #[arg(long, env = "POLLCHECK_SECURITY_CODE", hide_env_values = true)]
        security_code: String,
        /// Prompted for when omitted.
        #[arg(long, env = "POLLCHECK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the session.
    Logout {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Show the logged-in operator.
    Whoami,

    /// List or search voters, one page at a time.
    Voters {
        /// Free text; fewer than two characters lists instead of searching.
        #[arg(long, default_value = "")]
        search: String,
        /// all, voted or not_voted.
        #[arg(long, default_value = "all")]
        filter: VoteFilter,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Listing only: Male, Female, Other.
        #[arg(long, value_parser = parse_gender)]
        gender: Option<Gender>,
        /// Listing only.
        #[arg(long)]
        min_age: Option<u32>,
        /// Listing only.
        #[arg(long)]
        max_age: Option<u32>,
    },

    /// Show one voter by voter ID.
    Lookup { voter_id: String },

    /// Flip a voter's voted flag. Un-marking asks for confirmation.
    Toggle {
        voter_id: String,
        /// Skip the un-vote confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Show turnout statistics.
    Stats,

    /// Validate spreadsheet rows (JSON array) and write them as NDJSON.
    Import {
        file: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },

    /// Interactive session: search, page, mark votes, watch stats.
    Shell,
}

fn parse_gender(s: &str) -> Result<Gender, String> {
    match Gender::from_label(s) {
        Gender::Unreadable => Err(format!("unknown gender: {s}")),
        g => Ok(g),
    }
}

/// File settings as the base, flags and env vars on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(path) = &cli.token_path {
        config.token_path = path.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            // No usable log settings yet: report with the defaults.
            pollcheck_utils::init_tracing();
            tracing::error!("invalid configuration: {e:#}");
            return Err(e);
        }
    };

    let format: LogFormat = config.log_format.parse()?;
    pollcheck_utils::init_logging(format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::debug!("loaded config from {}", path.display());
    }

    // Import is offline; everything else talks to the Registry.
    if let Command::Import { file, out } = &cli.command {
        return commands::import(file, out);
    }

    let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let registry = HttpRegistry::new(&config, tokens)?;
    tracing::debug!(api_url = %registry.base_url(), "registry client ready");

    match cli.command {
        Command::Login { username, password } => {
            commands::login(&registry, username, password, &config).await
        }
        Command::Register {
            username,
            name,
            security_code,
            password,
        } => {
            commands::register(&registry, username, name, security_code, password, &config).await
        }
        Command::Logout { yes } => commands::logout(&registry, yes).await,
        Command::Whoami => commands::whoami(&registry).await,
        Command::Voters {
            search,
            filter,
            page,
            gender,
            min_age,
            max_age,
        } => {
            let refine = commands::ListRefinements {
                gender,
                min_age,
                max_age,
            };
            commands::voters(&registry, &search, filter, page, refine, &config).await
        }
        Command::Lookup { voter_id } => commands::lookup(&registry, &voter_id).await,
        Command::Toggle { voter_id, yes } => {
            commands::toggle(&registry, &voter_id, yes, &config).await
        }
        Command::Stats => commands::stats(&registry, &config).await,
        Command::Shell => interactive::run(&registry, &config).await,
        Command::Import { .. } => Ok(()),
    }
}
