use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wareply")]
#[command(about = "WaReply — WhatsApp webhook auto-reply service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: WAREPLY_CONFIG_PATH or ~/.wareply/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook listener (subscribe handshake + signed event intake).
    Serve {
        /// Config file path (default: WAREPLY_CONFIG_PATH or ~/.wareply/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Listener port (default from config or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send a one-off text message through the Cloud API (for operational checks).
    Send {
        /// Config file path (default: WAREPLY_CONFIG_PATH or ~/.wareply/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Recipient wa_id (the `from` of an inbound webhook message)
        #[arg(long)]
        to: String,

        /// Message text
        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("wareply {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            to,
            message,
        }) => {
            if let Err(e) = run_send(config, to, message).await {
                log::error!("send failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let written = lib::config::init_config_file(&path)?;
    println!("initialized configuration at {}", written.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.webhook.port = p;
    }
    log::info!(
        "starting webhook listener on {}:{}",
        config.webhook.bind,
        config.webhook.port
    );
    lib::server::run_server(config).await
}

async fn run_send(
    config_path: Option<std::path::PathBuf>,
    to: String,
    message: String,
) -> anyhow::Result<()> {
    let config = lib::config::load_config(config_path)?;
    let client = lib::sender::WhatsAppClient::new(
        lib::config::resolve_api_token(&config),
        lib::config::resolve_phone_number_id(&config),
        lib::config::resolve_api_base(&config),
    );
    client
        .send_text_message(&to, &message)
        .await
        .map_err(anyhow::Error::msg)?;
    println!("message sent to {}", to);
    Ok(())
}
