//! Chat client entry point
//!
//! Connects to a chat server and runs the interactive terminal client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tcp_chat_client
//! cargo run --bin tcp_chat_client -- --username Alice
//! ```

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tcp_chat_client")]
#[command(about = "Terminal client for the multi-user TCP chat", long_about = None)]
struct Args {
    /// Host address of the server to connect to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number of the server to connect to
    #[arg(short = 'p', long, default_value = "8083")]
    port: u16,

    /// Username; prompted for interactively when omitted
    #[arg(short = 'u', long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() {
    // Keep the terminal quiet unless RUST_LOG asks for more
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tcp_chat=warn")),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    if let Err(e) = tcp_chat::client::run(addr, args.username).await {
        error!("Client error: {}", e);
        std::process::exit(1);
    }
}
