use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mahachi_bot::application::errors::BotError;
use mahachi_bot::application::messaging::CommandDispatcher;
use mahachi_bot::application::services::ConnectionSupervisor;
use mahachi_bot::domain::traits::{Connection, SettingsStore};
use mahachi_bot::infrastructure::adapters::ConsoleAdapter;
use mahachi_bot::infrastructure::config::Config;
use mahachi_bot::infrastructure::plugins::{reload_on_change, PluginRegistry, PluginWatcher};
use mahachi_bot::infrastructure::storage::JsonSettingsStore;
use mahachi_bot::plugins::builtin::{self, AiSettings, BuiltinOptions};

#[derive(Parser)]
#[command(name = "mahachi-bot")]
#[command(about = "A plugin-driven WhatsApp command bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// Load the plugin directory and list the commands it provides
    Plugins,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("mahachi-bot v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => init_config(),
        Commands::Plugins => {
            let config = load_config(&cli.config);
            init_logging(&config);
            exit_code(list_plugins(&config))
        }
        Commands::Run => {
            let config = load_config(&cli.config);
            init_logging(&config);

            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Failed to start async runtime: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            exit_code(rt.block_on(run_bot(config)))
        }
    }
}

fn exit_code(result: Result<(), BotError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the configured level
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

fn load_config(path: &str) -> Config {
    if !Path::new(path).exists() {
        return Config::load_env();
    }

    match Config::load(path) {
        Ok(mut config) => {
            config.apply_env();
            config
        }
        Err(e) => {
            eprintln!("Failed to load config {}: {}, using defaults", path, e);
            Config::load_env()
        }
    }
}

fn init_config() -> ExitCode {
    match Config::default().to_yaml() {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to render default config: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_registry(config: &Config) -> Result<Arc<PluginRegistry>, BotError> {
    let options = BuiltinOptions {
        bot_name: config.bot.name.clone(),
        ai: AiSettings::from_env(),
    };
    if options.ai.is_none() {
        tracing::info!("AI_API_KEY not set, AI commands will answer with a notice");
    }

    let catalog = builtin::catalog(&options)?;
    let registry = PluginRegistry::new(&config.plugins.directory, Arc::new(catalog))
        .with_default_cooldown(config.plugins.default_cooldown);

    let report = registry.load()?;
    for failure in &report.failures {
        tracing::warn!("Skipped plugin {}: {}", failure.path.display(), failure.reason);
    }
    tracing::info!(
        "Loaded {} plugins ({} commands, {} failed) from {}",
        report.loaded,
        report.commands,
        report.failed,
        config.plugins.directory.display()
    );

    Ok(Arc::new(registry))
}

fn list_plugins(config: &Config) -> Result<(), BotError> {
    let registry = build_registry(config)?;

    let mut descriptors = registry.descriptors();
    descriptors.sort_by(|a, b| (&a.category, a.primary_name()).cmp(&(&b.category, b.primary_name())));

    for descriptor in descriptors {
        let mut line = format!(
            "[{}] {}{}",
            descriptor.category, config.bot.prefix, descriptor.primary_name()
        );
        if !descriptor.aliases().is_empty() {
            line.push_str(&format!(" (aliases: {})", descriptor.aliases().join(", ")));
        }
        line.push_str(&format!(" -> {}", descriptor.handler_id));
        if descriptor.flags.owner_only {
            line.push_str(" [owner]");
        }
        if descriptor.flags.admin_only {
            line.push_str(" [admin]");
        }
        if descriptor.flags.group_only {
            line.push_str(" [group]");
        }
        if descriptor.flags.private_only {
            line.push_str(" [private]");
        }
        println!("{}", line);
    }
    Ok(())
}

async fn run_bot(config: Config) -> Result<(), BotError> {
    config.validate()?;
    tracing::info!("Starting mahachi-bot: {}", config.bot.name);

    let store = JsonSettingsStore::load_with_defaults(&config.storage.directory, config.initial_settings()).await?;
    let settings: Arc<dyn SettingsStore> = Arc::new(store);

    let registry = build_registry(&config)?;

    let console = config
        .adapters
        .console
        .as_ref()
        .filter(|c| c.enabled)
        .ok_or_else(|| BotError::Connection("no connection adapter is enabled".to_string()))?;
    let connection: Arc<dyn Connection> = Arc::new(ConsoleAdapter::stdin(
        console,
        &config.bot.name,
        config.bot.number.as_deref(),
    ));

    let mut dispatcher = CommandDispatcher::new(Arc::clone(&connection), Arc::clone(&registry), settings);
    for observer in builtin::observers() {
        dispatcher = dispatcher.with_observer(observer);
    }
    for observer in builtin::participant_observers() {
        dispatcher = dispatcher.with_participant_observer(observer);
    }

    // keep the watcher alive for the lifetime of the bot
    let _watcher = if config.plugins.watch {
        match PluginWatcher::start(registry.root()) {
            Ok((watcher, changes)) => {
                tokio::spawn(reload_on_change(Arc::clone(&registry), changes));
                Some(watcher)
            }
            Err(e) => {
                tracing::warn!("Plugin hot reload disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let supervisor = ConnectionSupervisor::new(connection, Arc::new(dispatcher))
        .with_policy(config.reconnect_policy());

    tokio::select! {
        result = supervisor.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}
