use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, RANGE};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for a running relay", long_about = None)]
struct Cli {
    /// Relay base URL including the API prefix
    #[arg(short, long, default_value = "http://localhost:8000/api")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay liveness
    Health,
    /// Search podcasts by term
    Search {
        /// Search term
        q: String,
    },
    /// Fetch a media URL through the relay and report status, headers, and size
    Fetch {
        /// Origin URL to relay
        url: String,
        /// Optional byte range, e.g. `bytes=0-1023`
        #[arg(short, long)]
        range: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Search { q } => {
            let res = client
                .get(format!("{}/podcasts/search", base))
                .query(&[("q", q)])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Fetch { url, range } => {
            let mut headers = HeaderMap::new();
            if let Some(range) = range {
                headers.insert(RANGE, HeaderValue::from_str(&range)?);
            }
            let res = client
                .get(format!("{}/proxy/audio", base))
                .query(&[("url", url)])
                .headers(headers)
                .send()
                .await?;

            println!("Status: {}", res.status());
            for (name, value) in res.headers() {
                println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
            let mut body = res.bytes_stream();
            let mut received = 0u64;
            while let Some(chunk) = body.next().await {
                received += chunk?.len() as u64;
            }
            println!("Received {} bytes", received);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
