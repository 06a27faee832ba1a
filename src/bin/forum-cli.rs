use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use live_forum::broadcast::strip_highlighting;
use live_forum::resilience::ReconnectBackoff;

#[derive(Parser)]
#[command(name = "forum-cli")]
#[command(about = "Command-line client for the live forum API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:7777")]
    url: String,

    /// WebSocket endpoint path used by `watch`.
    #[arg(long, default_value = "/ws")]
    ws_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List topics (without posts)
    Topics,
    /// Show one topic with its posts
    Topic { id: u64 },
    /// List the posts of a topic with author names
    Posts { id: u64 },
    /// List users
    Users,
    /// Show one user
    User { username: String },
    /// List topics started by a user
    UserTopics { username: String },
    /// Start a new topic
    CreateTopic {
        #[arg(long)]
        user: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        text: String,
    },
    /// Reply to a topic
    Reply {
        id: u64,
        #[arg(long)]
        user: String,
        #[arg(long)]
        text: String,
    },
    /// Delete a topic (only its creator can)
    DeleteTopic {
        id: u64,
        #[arg(long)]
        user: String,
    },
    /// Print every live dataset snapshot, reconnecting when the server goes away
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    let request = match cli.command {
        Commands::Topics => client.get(format!("{base}/api/topics")),
        Commands::Topic { id } => client.get(format!("{base}/api/topics/{id}")),
        Commands::Posts { id } => client.get(format!("{base}/api/topics/{id}/posts")),
        Commands::Users => client.get(format!("{base}/api/users")),
        Commands::User { username } => client.get(format!("{base}/api/users/{username}")),
        Commands::UserTopics { username } => {
            client.get(format!("{base}/api/users/{username}/topics"))
        }
        Commands::CreateTopic { user, title, text } => client
            .post(format!("{base}/api/topics"))
            .json(&json!({ "user": user, "title": title, "text": text })),
        Commands::Reply { id, user, text } => client
            .post(format!("{base}/api/topics/{id}/posts"))
            .json(&json!({ "user": user, "text": text })),
        Commands::DeleteTopic { id, user } => client
            .delete(format!("{base}/api/topics/{id}"))
            .json(&json!({ "user": user })),
        Commands::Watch => {
            let ws_url = format!("{}{}", base.replacen("http", "ws", 1), cli.ws_path);
            watch(&ws_url).await;
            return Ok(());
        }
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
    }
    if text.is_empty() {
        if status.is_success() {
            println!("{}", status);
        }
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}

/// Follow the live snapshot stream forever.
async fn watch(ws_url: &str) {
    let mut backoff = ReconnectBackoff::default();

    loop {
        let mut failed = false;

        match connect_async(ws_url).await {
            Ok((mut stream, _)) => {
                backoff.reset();
                eprintln!("Connected to {}", ws_url);

                while let Some(frame) = stream.next().await {
                    match frame {
                        Ok(Message::Text(snapshot)) => println!("{}\n", strip_highlighting(&snapshot)),
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            eprintln!("Connection error: {}", e);
                            failed = true;
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("Connect failed: {}", e);
                failed = true;
            }
        }

        let delay: Duration = backoff.current();
        if failed {
            backoff.on_error();
        }
        eprintln!("Reconnecting in {:.1}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }
}
