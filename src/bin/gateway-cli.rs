use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Diagnostic CLI for the chat gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the gateway with a plain HTTP request
    Health {
        #[arg(short, long, default_value = "http://localhost:8000")]
        url: String,
    },
    /// Send one prompt over WebSocket and print the reply
    Chat {
        #[arg(short, long, default_value = "ws://localhost:8000")]
        url: String,

        #[arg(short, long)]
        device_id: Option<String>,

        #[arg(short, long)]
        request_id: Option<String>,

        /// Prompt text
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Health { url } => {
            let res = reqwest::Client::new().get(&url).send().await?;
            println!("{}", res.status());
            print!("{}", res.text().await?);
        }
        Commands::Chat {
            url,
            device_id,
            request_id,
            text,
        } => {
            let reply = chat(&url, device_id.as_deref(), request_id.as_deref(), &text).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
    }

    Ok(())
}

async fn chat(
    url: &str,
    device_id: Option<&str>,
    request_id: Option<&str>,
    text: &str,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = url.into_client_request()?;
    if let Some(id) = device_id {
        request.headers_mut().insert("device-id", HeaderValue::from_str(id)?);
    }

    let (mut ws, _) = tokio_tungstenite::connect_async(request).await?;

    let mut payload = json!({ "text": text });
    if let Some(id) = request_id {
        payload["request_id"] = json!(id);
    }
    ws.send(Message::text(payload.to_string())).await?;

    while let Some(message) = ws.next().await {
        if let Message::Text(reply) = message? {
            let _ = ws.close(None).await;
            return Ok(serde_json::from_str(reply.as_str())?);
        }
    }

    Err("connection closed without a reply".into())
}
