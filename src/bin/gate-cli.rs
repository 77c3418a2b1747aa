use std::io::Read;

use clap::{Parser, Subcommand};
use flate2::read::GzDecoder;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Management CLI for the card access gate", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Sent as x-user-id and recorded in the audit trail
    #[arg(long, default_value = "gate-cli")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List card holders
    Cardholders,
    /// Add a card holder
    AddCardholder {
        card: u64,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Show system settings
    System,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert("x-user-id", HeaderValue::from_str(&cli.user)?);

    let res = match cli.command {
        Commands::Cardholders => {
            client
                .get(format!("{}/cardholders", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::AddCardholder { card, name } => {
            let mut body = json!({ "card": card });
            if let Some(name) = name {
                body["name"] = Value::String(name);
            }
            client
                .post(format!("{}/cardholders", cli.url))
                .headers(headers)
                .json(&body)
                .send()
                .await?
        }
        Commands::System => {
            client
                .get(format!("{}/system", cli.url))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let gzipped = res
        .headers()
        .get(CONTENT_ENCODING)
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"gzip"));

    let bytes = res.bytes().await?;
    let body = if gzipped {
        let mut text = String::new();
        GzDecoder::new(&bytes[..]).read_to_string(&mut text)?;
        text
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    if !status.is_success() {
        eprintln!("Error: gate returned status {}", status);
        eprintln!("Response: {}", body);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&body)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
