//! Lookback CLI
//!
//! Operator interface against a running Lookback daemon:
//! - Check daemon status
//! - List recent segments
//! - Trigger keep promotions
//! - Generate a config template

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lookback-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Control a running Lookback retention engine")]
#[command(
    long_about = "Lookback keeps a rolling buffer of captured media segments and\npermanently retains windows around interesting moments. This CLI talks to\nthe daemon's HTTP API."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Daemon API URL
    #[arg(long, default_value = "http://127.0.0.1:8350", global = true)]
    pub url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show daemon status
    Status,

    /// List recent segments
    Segments {
        /// Maximum number of segments to show
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Keep the segments around an event instant
    Keep {
        /// Event instant in epoch milliseconds (default: now)
        #[arg(short, long)]
        timestamp: Option<i64>,
        /// Why the surrounding footage matters
        #[arg(short, long)]
        reason: Option<String>,
        /// Window reach before the event (ms, default: daemon setting)
        #[arg(long)]
        before: Option<i64>,
        /// Window reach after the event (ms, default: daemon setting)
        #[arg(long)]
        after: Option<i64>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let response = client
                .get(format!("{}/api/v1/status", cli.url))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let status: serde_json::Value = resp.json().await?;

                    if cli.format == "json" {
                        println!("{}", serde_json::to_string_pretty(&status)?);
                        return Ok(());
                    }

                    println!(
                        "Lookback v{} ({})",
                        status["version"].as_str().unwrap_or("unknown"),
                        status["status"].as_str().unwrap_or("unknown")
                    );
                    if let Some(uptime) = status["uptime_seconds"].as_u64() {
                        println!("Uptime: {}", format_duration(uptime));
                    }

                    if let Some(store) = status.get("store") {
                        println!();
                        println!("Store:");
                        println!(
                            "  Segments: {} ({} kept)",
                            store["total_segments"].as_u64().unwrap_or(0),
                            store["kept_segments"].as_u64().unwrap_or(0)
                        );
                        if let Some(oldest) = store["oldest_timestamp"].as_i64() {
                            println!("  Oldest: {}", format_instant(oldest));
                        }
                        if let Some(newest) = store["newest_timestamp"].as_i64() {
                            println!("  Newest: {}", format_instant(newest));
                        }
                    }

                    if let Some(retention) = status.get("retention") {
                        println!();
                        println!("Retention:");
                        println!(
                            "  Horizon: {}",
                            format_duration(retention["horizon_ms"].as_u64().unwrap_or(0) / 1000)
                        );
                        println!(
                            "  Sweep every: {}",
                            format_duration(
                                retention["sweep_interval_ms"].as_u64().unwrap_or(0) / 1000
                            )
                        );
                        println!(
                            "  Keep buffers: -{}ms / +{}ms",
                            retention["buffer_before_ms"].as_i64().unwrap_or(0),
                            retention["buffer_after_ms"].as_i64().unwrap_or(0)
                        );
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Lookback at {}", cli.url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the daemon is running:");
                    eprintln!("  cargo run --bin lookback");
                    std::process::exit(1);
                }
            }
        }

        Commands::Segments { limit } => {
            let mut url = format!("{}/api/v1/segments", cli.url);
            if let Some(limit) = limit {
                url.push_str(&format!("?limit={}", limit));
            }

            let response = client.get(&url).send().await?;

            if !response.status().is_success() {
                eprintln!("Failed to fetch segments: {}", response.status());
                std::process::exit(1);
            }

            let listing: serde_json::Value = response.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&listing)?);
                return Ok(());
            }

            let segments = listing["segments"].as_array().cloned().unwrap_or_default();
            if segments.is_empty() {
                println!("No segments tracked yet.");
                return Ok(());
            }

            println!(
                "{:<28} {:<7} {:<20} {:<5} {}",
                "Filename", "Type", "Captured", "Keep", "Reason"
            );
            println!("{}", "-".repeat(80));

            for segment in segments {
                let captured = segment["timestamp"]
                    .as_i64()
                    .map(format_instant)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<28} {:<7} {:<20} {:<5} {}",
                    segment["filename"].as_str().unwrap_or("-"),
                    segment["media_type"].as_str().unwrap_or("-"),
                    captured,
                    if segment["keep"].as_bool().unwrap_or(false) {
                        "yes"
                    } else {
                        "no"
                    },
                    segment["reason"].as_str().unwrap_or("")
                );
            }
        }

        Commands::Keep {
            timestamp,
            reason,
            before,
            after,
        } => {
            let mut body = serde_json::Map::new();
            if let Some(ts) = timestamp {
                body.insert("timestamp".into(), ts.into());
            }
            if let Some(reason) = &reason {
                body.insert("reason".into(), reason.clone().into());
            }
            if let Some(before) = before {
                body.insert("buffer_before_ms".into(), before.into());
            }
            if let Some(after) = after {
                body.insert("buffer_after_ms".into(), after.into());
            }

            let response = client
                .post(format!("{}/api/v1/keep", cli.url))
                .json(&serde_json::Value::Object(body))
                .send()
                .await?;

            if response.status().is_success() {
                let result: serde_json::Value = response.json().await?;
                println!(
                    "Kept {} segments in [{} .. {}]",
                    result["promoted"].as_u64().unwrap_or(0),
                    result["window_start"]
                        .as_i64()
                        .map(format_instant)
                        .unwrap_or_default(),
                    result["window_end"]
                        .as_i64()
                        .map(format_instant)
                        .unwrap_or_default()
                );
                if let Some(reason) = result["reason"].as_str() {
                    println!("Reason: {}", reason);
                }
            } else {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                eprintln!("Keep failed ({}): {}", status, text);
                std::process::exit(1);
            }
        }

        Commands::Config { output } => {
            let config = lookback::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn format_instant(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| millis.to_string())
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
