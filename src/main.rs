use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

mod domain;
mod application;
mod infrastructure;

use application::errors::{BotError, ConfigError};
use application::messaging::CommandDispatcher;
use application::services::ReplyFormatter;
use domain::traits::CiProvider;
use infrastructure::adapters::slack::{RtmEvent, RtmListener, SlackClient};
use infrastructure::config::Config;
use infrastructure::travis::TravisClient;

#[derive(Parser)]
#[command(name = "travis-bot")]
#[command(about = "Slack bot that reports and restarts Travis CI builds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: String,

    /// github.com repository name
    #[arg(long, global = true)]
    repo: Option<String>,

    /// github.com user name
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default)
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        None | Some(Commands::Run) => run_bot(&cli),
        Some(Commands::Version) => {
            println!("travis-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::InitConfig) => init_config(&cli.config).map_err(BotError::from),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// `(owner, repo)` from the command line flags
fn repo_target<'a>(user: Option<&'a str>, repo: Option<&'a str>) -> Result<(&'a str, &'a str), ConfigError> {
    match (user.filter(|u| !u.is_empty()), repo.filter(|r| !r.is_empty())) {
        (Some(user), Some(repo)) => Ok((user, repo)),
        (None, _) => Err(ConfigError::MissingField("--user".to_string())),
        (_, None) => Err(ConfigError::MissingField("--repo".to_string())),
    }
}

fn load_config(config_path: &str) -> Config {
    if Path::new(config_path).exists() {
        match Config::load(config_path) {
            Ok(mut config) => {
                config.apply_env();
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Config::load_env()
            }
        }
    } else {
        Config::load_env()
    }
}

fn run_bot(cli: &Cli) -> Result<(), BotError> {
    let (user, repo) = repo_target(cli.user.as_deref(), cli.repo.as_deref())?;
    let config = load_config(&cli.config);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;
    rt.block_on(serve(config, user, repo))
}

async fn serve(config: Config, user: &str, repo: &str) -> Result<(), BotError> {
    let timezone = config.timezone()?;
    let slack_token = config.slack_token()?.to_string();

    let travis = TravisClient::new(&config.travis.api_base, &config.travis.web_base);
    let session = travis
        .authenticate(config.travis_token())
        .await
        .ok_or_else(|| BotError::Auth("can't connect travis api".to_string()))?;

    match travis.list_states(&session, user).await {
        Ok(states) if states.is_empty() => tracing::info!("No built repositories for {}", user),
        Ok(states) => {
            for state in states.iter() {
                tracing::debug!("{}: {} (finished {:?})", state.name, state.state, state.last_finished);
            }
            if let Some(latest) = states.latest() {
                tracing::info!(
                    "{} built repositories for {}, latest: {} ({})",
                    states.len(),
                    user,
                    latest.name,
                    latest.state
                );
            }
        }
        Err(e) => tracing::warn!("Failed to list repositories of {}: {}", user, e),
    }

    let slug = format!("{}/{}", user, repo);
    tracing::info!("Starting {} for {}", config.bot.name, slug);
    let dispatcher = CommandDispatcher::new(travis, session, slug, ReplyFormatter::new(timezone));

    let slack = Arc::new(
        SlackClient::new(slack_token, &config.slack.api_base)
            .with_identity(&config.bot.name, &config.bot.icon_emoji),
    );
    let (mut events, _connection) = RtmListener::new(Arc::clone(&slack))
        .with_ping_interval(Duration::from_secs(config.slack.ping_interval_secs))
        .with_reconnect_delay(Duration::from_millis(config.slack.reconnect_delay_ms))
        .spawn();

    while let Some(event) = events.recv().await {
        match event {
            RtmEvent::Hello => tracing::info!("Connected!"),
            RtmEvent::Message { channel, text } => {
                dispatcher.handle_message(slack.as_ref(), &channel, &text).await?;
            }
            RtmEvent::InvalidAuth => {
                return Err(BotError::Auth("Invalid credentials".to_string()));
            }
            RtmEvent::ConnectionLost(reason) => {
                return Err(BotError::Connection(reason));
            }
        }
    }

    Err(BotError::Connection("event stream closed".to_string()))
}

fn init_config(path: &str) -> Result<(), ConfigError> {
    if Path::new(path).exists() {
        return Err(ConfigError::InvalidValue(format!("{} already exists", path)));
    }
    std::fs::write(path, Config::default().to_yaml()?)?;
    println!("Wrote default config to {}", path);
    Ok(())
}
