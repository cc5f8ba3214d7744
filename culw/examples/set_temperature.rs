//! Send a manual temperature to an FHT thermostat

use std::time::Duration;

use culw::{BusMessage, ChannelPublisher, Config, Gateway, CONTROL_BASIC};

#[tokio::main]
async fn main() -> culw::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let host = std::env::var("CUL_HOST").unwrap_or_else(|_| "192.168.1.50".to_string());
    let house_code = std::env::var("FHT_HOUSE_CODE").unwrap_or_else(|_| "0101".to_string());
    let temperature = std::env::args().nth(1).unwrap_or_else(|| "21".to_string());

    let (publisher, _events) = ChannelPublisher::channel(16);
    let mut gateway = Gateway::tcp(host, 2323, publisher, Config::default())?;
    gateway.connect().await?;

    let message = BusMessage::new(CONTROL_BASIC)
        .with_field("device", format!("fht {}", house_code))
        .with_field("command", "manualTemp")
        .with_field("current", temperature);

    gateway.handle_bus_message(&message).await?;
    println!("Command sent");

    // FHT commands are queued by the transceiver, give it a moment
    tokio::time::sleep(Duration::from_secs(1)).await;
    gateway.disconnect().await
}
