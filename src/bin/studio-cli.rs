use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use serde_json::{json, Value};

const SESSION_COOKIE: &str = "admin_session";

#[derive(Parser)]
#[command(name = "studio-cli")]
#[command(about = "Management CLI for the studio server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[arg(long, env = "STUDIO_ADMIN_USERNAME", default_value = "admin")]
    username: String,

    #[arg(long, env = "STUDIO_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,
    /// List uploaded media
    Media,
    /// Show server status (requires login)
    Status,
    /// Security metrics, anomalies and recent events (requires login)
    Security {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Media => {
            let res = client.get(format!("{}/api/media", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Status => {
            let headers = login(&client, &cli).await?;
            let res = client
                .get(format!("{}/api/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Security { limit } => {
            let headers = login(&client, &cli).await?;
            let res = client
                .get(format!("{}/api/admin/security", cli.url))
                .query(&[("limit", limit)])
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

/// Log in and return headers carrying the session cookie.
async fn login(client: &reqwest::Client, cli: &Cli) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let password = cli
        .password
        .as_deref()
        .ok_or("password required: pass --password or set STUDIO_ADMIN_PASSWORD")?;

    let res = client
        .post(format!("{}/api/auth/login", cli.url))
        .json(&json!({ "username": cli.username, "password": password }))
        .send()
        .await?;

    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(format!("login failed with status {status}: {body}").into());
    }

    let session = res
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE}=")))
        .ok_or("login response did not set a session cookie")?
        .to_string();

    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_str(&session)?);
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
