use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::mpsc;
use url::Url;

use rust_room_chat::config;
use rust_room_chat::network::{ChatClient, ClientOptions, HttpApi, WsConnector, socket_endpoint};
use rust_room_chat::ui::TerminalApp;

#[derive(Parser)]
#[command(
    name = "rust_room_chat",
    version,
    about = "Terminal client for room-based chat"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Base URL of the chat service
    #[arg(long, env = "CHAT_SERVER_URL", value_name = "URL")]
    server: Option<String>,
    /// Display name used by `/join` when none is given
    #[arg(long, env = "CHAT_USER", value_name = "NAME")]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config).with_overrides(cli.server, cli.user);

    let server_url = Url::parse(&app_config.server_url)?;
    let api = HttpApi::new(&server_url);
    let connector = WsConnector::new(socket_endpoint(&server_url)?);
    log::info!("Using chat service at {server_url}");

    let capacity = app_config.channel_capacity.max(1);
    // UI -> dispatch loop
    let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
    // dispatch loop -> UI
    let (event_tx, event_rx) = mpsc::channel(capacity);

    let options = ClientOptions {
        page_size: app_config.page_size,
        echo_policy: app_config.echo_policy,
    };
    let client = ChatClient::new(api.clone(), connector, options, event_tx, cmd_rx);
    let dispatch = tokio::spawn(client.run());

    let app = TerminalApp::new(app_config.username, api, cmd_tx, event_rx);
    let result = app.run().await;

    // The app owned the only command sender, so the loop winds down now.
    if let Err(err) = dispatch.await {
        log::error!("Dispatch loop terminated abnormally: {err}");
    }

    result.map_err(Into::into)
}
