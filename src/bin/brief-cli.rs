use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{json, Value};

use brief_gateway::brief::parse_brief;

#[derive(Parser)]
#[command(name = "brief-cli")]
#[command(about = "Client for the decision brief gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Shared secret sent in the token header.
    #[arg(short, long, default_value = "")]
    token: String,

    #[arg(long, default_value = "x-app-token")]
    token_header: String,

    /// Origin header to present, normally the configured app URL.
    #[arg(long)]
    origin: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a brief from notes (file, or stdin when omitted)
    Brief {
        file: Option<PathBuf>,
        #[arg(short, long, default_value = "Product")]
        lens: String,
    },
    /// Ask a follow-up question about a brief
    Ask {
        /// Original notes
        #[arg(long)]
        notes: PathBuf,
        /// Previously generated brief
        #[arg(long)]
        summary: PathBuf,
        question: String,
    },
    /// Parse a brief locally and print its sections
    Parse { file: Option<PathBuf> },
    /// Check gateway health
    Health,
}

fn read_input(file: Option<&PathBuf>) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_bytes(cli.token_header.as_bytes())?,
        HeaderValue::from_str(&cli.token)?,
    );
    if let Some(origin) = &cli.origin {
        headers.insert(reqwest::header::ORIGIN, HeaderValue::from_str(origin)?);
    }

    match cli.command {
        Commands::Brief { file, lens } => {
            let content = read_input(file.as_ref())?;
            let res = client
                .post(format!("{}/api/brief", cli.url))
                .headers(headers)
                .json(&json!({ "content": content, "lens": lens }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Ask {
            notes,
            summary,
            question,
        } => {
            let body = json!({
                "notes": std::fs::read_to_string(notes)?,
                "summary": std::fs::read_to_string(summary)?,
                "question": question,
            });
            let res = client
                .post(format!("{}/api/followup", cli.url))
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Parse { file } => {
            let sections = parse_brief(&read_input(file.as_ref())?);
            if sections.is_empty() {
                eprintln!("No sections found");
            }
            println!("{}", serde_json::to_string_pretty(&sections)?);
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(remaining) = res.headers().get("x-ratelimit-remaining") {
        eprintln!("Remaining quota: {}", remaining.to_str().unwrap_or("?"));
    }
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
