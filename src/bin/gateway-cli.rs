use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the gateway", long_about = None)]
struct Cli {
    #[arg(long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a user (requires the registration key)
    Register {
        /// Shared static registration key
        #[arg(long)]
        key: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Stable user id; generated when omitted
        #[arg(long)]
        user_id: Option<String>,
        /// Metadata entries as key=value pairs
        #[arg(long)]
        meta: Vec<String>,
    },
    /// Authenticate and print a freshly issued API key
    Authenticate {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Register {
            key,
            username,
            password,
            user_id,
            meta,
        } => {
            let mut metadata = serde_json::Map::new();
            for pair in &meta {
                match pair.split_once('=') {
                    Some((k, v)) => {
                        metadata.insert(k.to_string(), Value::String(v.to_string()));
                    }
                    None => {
                        eprintln!("Ignoring malformed --meta entry (expected key=value): {pair}");
                    }
                }
            }

            let mut body = json!({ "username": username, "password": password });
            if let Some(id) = user_id {
                body["userId"] = json!(id);
            }
            if !metadata.is_empty() {
                body["metadata"] = Value::Object(metadata);
            }

            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&key)?);

            let res = client
                .post(format!("{}/register", cli.url))
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Authenticate { username, password } => {
            let res = client
                .post(format!("{}/authenticate", cli.url))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }
    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
