//! Chat server entry point
//!
//! Binds the TCP listener and accepts connections forever.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tcp_chat_server
//! cargo run --bin tcp_chat_server -- --host 0.0.0.0 --port 9000
//! ```

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tcp_chat::ChatServer;

#[derive(Parser, Debug)]
#[command(name = "tcp_chat_server")]
#[command(about = "Multi-user TCP chat server with private sessions", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8083")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG to control log level, e.g. RUST_LOG=tcp_chat=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tcp_chat=info")),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let listener = TcpListener::bind(&addr).await?;
    info!("Chat server listening on {}", addr);

    ChatServer::new().run(listener).await;
    Ok(())
}
