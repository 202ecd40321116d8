mod check_commands;
mod console;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Context, bail},
    clap::{Parser, Subcommand},
    faceswap_channels::PluginRegistry,
    faceswap_common::types::{ImagePayload, InboundMessage, Reply},
    faceswap_config::DEFAULT_CONFIG_FILE,
    faceswap_plugins::{FaceSwapPlugin, replies},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "faceswap", about = "faceswap: BeArt face-swap chat plugin")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Plugin config file (JSON, TOML or YAML).
    #[arg(long, global = true, env = "FACESWAP_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the plugin on stdin/stdout (default when no subcommand is provided).
    Chat,
    /// Swap a face in one go and print the result URL.
    Swap {
        /// Image with the face to transplant (path or URL).
        #[arg(long)]
        source: String,
        /// Image to put the face on (path or URL).
        #[arg(long)]
        target: String,
    },
    /// Validate the config file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

/// Initialise tracing. Logs go to stderr so stdout only carries replies.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn load_registry(
    config: &std::path::Path,
) -> anyhow::Result<(PluginRegistry, Arc<FaceSwapPlugin>)> {
    let plugin = Arc::new(
        FaceSwapPlugin::from_config_file(config)
            .with_context(|| format!("failed to initialize plugin from {}", config.display()))?,
    );
    let mut registry = PluginRegistry::new();
    registry.register(plugin.clone()).await?;
    Ok((registry, plugin))
}

/// Drive trigger, source and target through the registry as one user.
async fn swap_once(
    registry: &PluginRegistry,
    trigger: &str,
    source: String,
    target: String,
) -> anyhow::Result<String> {
    const USER: &str = "cli";

    let steps = [
        (InboundMessage::text(USER, trigger), replies::SOURCE_PROMPT),
        (
            InboundMessage::image(USER, ImagePayload::Reference(source)),
            replies::TARGET_PROMPT,
        ),
    ];
    for (msg, expected) in steps {
        match registry.dispatch(&msg).await.map(|d| d.reply) {
            Some(Reply::Text(text)) if text == expected => {},
            Some(other) => bail!("{other}"),
            None => bail!("no plugin handled the message"),
        }
    }

    let msg = InboundMessage::image(USER, ImagePayload::Reference(target));
    match registry.dispatch(&msg).await.map(|d| d.reply) {
        Some(Reply::ImageUrl(url)) => Ok(url),
        Some(Reply::Text(text)) => bail!("{text}"),
        None => bail!("no plugin handled the message"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "faceswap starting");

    match cli.command {
        None | Some(Commands::Chat) => {
            let (registry, plugin) = load_registry(&cli.config).await?;
            eprintln!(
                "Send \"{}\" to start. /image <path|url> sends an image, /as <user> [group] switches sender, /quit exits.",
                plugin.trigger()
            );
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            let result = console::run(&registry, stdin, &mut stdout).await;
            registry.shutdown().await;
            result
        },
        Some(Commands::Swap { source, target }) => {
            let (registry, plugin) = load_registry(&cli.config).await?;
            let result = swap_once(&registry, plugin.trigger(), source, target).await;
            registry.shutdown().await;
            println!("{}", result?);
            Ok(())
        },
        Some(Commands::Check { verbose }) => {
            let errors = check_commands::check(&cli.config, verbose)?;
            if errors > 0 {
                std::process::exit(1);
            }
            Ok(())
        },
    }
}
