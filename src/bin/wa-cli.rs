use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "wa-cli")]
#[command(about = "Command-line client for the WhatsApp checker API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness and readiness summary
    Health,
    /// Readiness details
    Status,
    /// Check whether one number is registered
    Check { number: String },
    /// Check several numbers in one request
    CheckBatch {
        #[arg(required = true)]
        numbers: Vec<String>,
    },
    /// Send an image (fetched by the server from a URL) to a number
    SendImage {
        number: String,
        image_url: String,
        /// Caption to attach
        #[arg(short, long)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{base}/health")).send().await?,
        Commands::Status => client.get(format!("{base}/status")).send().await?,
        Commands::Check { number } => {
            client
                .post(format!("{base}/check-number"))
                .json(&json!({ "number": number }))
                .send()
                .await?
        }
        Commands::CheckBatch { numbers } => {
            client
                .post(format!("{base}/check-numbers"))
                .json(&json!({ "numbers": numbers }))
                .send()
                .await?
        }
        Commands::SendImage {
            number,
            image_url,
            message,
        } => {
            let mut body = json!({ "number": number, "imageUrl": image_url });
            if let Some(message) = message {
                body["message"] = Value::String(message);
            }
            client
                .post(format!("{base}/send-image"))
                .json(&body)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
