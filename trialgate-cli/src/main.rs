//! trialgate-cli — operator CLI for the Trialgate demo session service
//!
//! Talks to the HTTP API of a running trialgate-server.
//!
//! # Subcommands
//! - `status`            — show server health
//! - `sessions`          — list active demo sessions
//! - `sweep`             — run an expiry sweep now
//! - `end <user-id>`     — end one user's demo session

use clap::{Parser, Subcommand};
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8750";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "trialgate-cli",
    version,
    about = "Trialgate demo session service — operator CLI"
)]
struct Cli {
    /// Trialgate HTTP server URL (overrides TRIALGATE_HTTP_URL env var)
    #[arg(long, env = "TRIALGATE_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show Trialgate server status
    Status,

    /// List active demo sessions
    Sessions,

    /// Run an expiry sweep immediately
    Sweep,

    /// End a user's demo session
    End {
        /// The ephemeral user's id
        user_id: Uuid,
    },
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionRow {
    pub session_id: String,
    pub user_id: String,
    pub expires_at: String,
    pub remaining_minutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct SessionsResponse {
    pub count: usize,
    pub sessions: Vec<SessionRow>,
}

// ============================================================================
// Output formatting
// ============================================================================

/// Render the session table as printed by `sessions`.
pub fn render_sessions(resp: &SessionsResponse) -> String {
    if resp.sessions.is_empty() {
        return "No active demo sessions.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("{} active demo session(s):\n", resp.count));
    for s in &resp.sessions {
        out.push_str(&format!(
            "  user {}  session {}  {} min left  (expires {})\n",
            s.user_id, s.session_id, s.remaining_minutes, s.expires_at
        ));
    }
    out
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?)
}

fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let resp = client()?.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Trialgate server:  {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:           {}", body["version"].as_str().unwrap_or("?"));
            println!("PostgreSQL:        {}", body["postgresql"].as_str().unwrap_or("?"));
            println!("Active sessions:   {}", body["active_sessions"]);
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("trialgate-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("trialgate-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn do_sessions(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/admin/sessions", server);
    let resp = client()?.get(&url).send()?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("trialgate-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    let sessions: SessionsResponse = resp.json()?;
    print!("{}", render_sessions(&sessions));
    Ok(())
}

fn do_sweep(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/admin/sweep", server);
    let resp = client()?.post(&url).send()?;

    if !resp.status().is_success() {
        let status = resp.status();
        eprintln!("trialgate-cli: sweep failed (HTTP {})", status);
        std::process::exit(1);
    }

    let body: serde_json::Value = resp.json()?;
    println!(
        "Sweep complete: {} scanned, {} expired, {} removed, {} failed ({}ms)",
        body["scanned"], body["expired"], body["removed"], body["failed"], body["elapsed_ms"]
    );
    Ok(())
}

fn do_end(server: &str, user_id: Uuid) -> anyhow::Result<()> {
    // Admin surface has no per-user token, so this goes through the IPC
    // mirror endpoint exposed over HTTP by the admin router.
    let url = format!("{}/admin/sessions/{}", server, user_id);
    let resp = client()?.delete(&url).send()?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("trialgate-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    let body: serde_json::Value = resp.json()?;
    if body["ended"].as_bool().unwrap_or(false) {
        println!("Ended demo session for user {}", user_id);
    } else {
        println!("No demo session found for user {}", user_id);
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Status => do_status(&server),
        Commands::Sessions => do_sessions(&server),
        Commands::Sweep => do_sweep(&server),
        Commands::End { user_id } => do_end(&server, user_id),
    };

    if let Err(e) = result {
        eprintln!("trialgate-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
