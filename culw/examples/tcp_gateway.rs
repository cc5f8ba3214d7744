//! Print the events of a network-bridged transceiver (CUNO, ser2net)

use culw::{ChannelPublisher, Config, Gateway};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> culw::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let host = std::env::var("CUL_HOST").unwrap_or_else(|_| "192.168.1.50".to_string());
    let port = std::env::var("CUL_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(2323);

    let (publisher, mut events) = ChannelPublisher::channel(64);
    let mut gateway = Gateway::tcp(host, port, publisher, Config::default())?;

    gateway.connect().await?;
    println!("Connected, waiting for frames...");

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{}", event);
        }
    });

    let (_commands_tx, mut commands) = tokio::sync::mpsc::channel(16);
    gateway.run(&mut commands).await?;

    println!("Transceiver closed the connection");
    Ok(())
}
