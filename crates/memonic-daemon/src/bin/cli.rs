//! memonic CLI: a thin JSON-RPC client over the daemon's Unix socket (§6).
//! Exit codes: 0 ok, 1 misuse, 2 store error, 3 network error.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};

#[path = "../socket.rs"]
mod socket;

/// memonic - memory daemon CLI
#[derive(Parser)]
#[command(name = "memonic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the memonic long-running memory daemon")]
struct Cli {
    /// Store path (defaults to STORE_PATH / platform default)
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Explicit socket path, overriding the derived one
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon in the foreground (thin wrapper; prefer the
    /// `memonic-daemon` binary directly for real deployments)
    Daemon {
        #[arg(long)]
        interval: Option<u64>,
        #[arg(long = "pid-file")]
        pid_file: Option<PathBuf>,
    },
    /// Ask a running daemon to shut down gracefully
    Shutdown,
    /// Print store statistics
    Stats {
        #[arg(long)]
        json: bool,
        #[arg(long)]
        fast: bool,
    },
    /// Print health score and status
    Health,
    /// Hybrid/dense/sparse retrieval
    Recall {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0.0)]
        threshold: f32,
        #[arg(long, default_value = "hybrid")]
        mode: String,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Creation shorthand: remembers an Episode tagged `observed`
    Observe { text: String },
    /// Alias for `observe`
    Grow { text: String },
    /// Create a typed edge between two nodes
    Connect {
        source: String,
        target: String,
        #[arg(long = "type", default_value = "related")]
        edge_type: String,
        #[arg(long, default_value_t = 0.5)]
        weight: f32,
    },
    /// Update a node's text (re-embeds if an embedder is configured)
    Update { id: String, text: String },
    /// Delete a node, optionally cascading to its neighbors
    Forget {
        id: String,
        #[arg(long)]
        cascade: bool,
        #[arg(long)]
        rewire: bool,
    },
    /// Add a tag to a node
    Tag { id: String, tag: String },
    /// Save, load, or list named ledger entries
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },
    /// Record retrieval feedback on a node
    Feedback {
        id: String,
        kind: String,
        #[arg(long, default_value_t = 1.0)]
        magnitude: f32,
    },
    /// Migrate an older store layout forward
    Upgrade,
}

#[derive(Subcommand)]
enum LedgerAction {
    Save { name: String, summary: String },
    Load { name: String },
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = memonic_core::Config::from_env();
    let store_path = cli.path.clone().unwrap_or(config.store_path.clone());
    let socket_path = cli
        .socket
        .clone()
        .or(config.daemon_socket.clone())
        .unwrap_or_else(|| socket::derive_socket_path(&store_path));

    if let Commands::Daemon { .. } = &cli.command {
        eprintln!("{}", "use the memonic-daemon binary to run the daemon".yellow());
        return ExitCode::from(1);
    }

    let request = match build_request(&cli.command) {
        Ok(r) => r,
        Err(msg) => {
            eprintln!("{} {msg}", "error:".red().bold());
            return ExitCode::from(1);
        }
    };

    match call(&socket_path, request) {
        Ok(response) => print_response(&response),
        Err(e) => {
            eprintln!("{} {e}", "connection error:".red().bold());
            ExitCode::from(3)
        }
    }
}

fn build_request(command: &Commands) -> Result<Value, String> {
    let (method, params): (&str, Value) = match command {
        Commands::Daemon { .. } => unreachable!(),
        Commands::Shutdown => ("shutdown", Value::Null),
        Commands::Stats { .. } => tool("stats", json!({})),
        Commands::Health => tool("health", json!({})),
        Commands::Recall { query, limit, threshold, mode, tag } => tool(
            "recall",
            json!({"query": query, "limit": limit, "threshold": threshold, "mode": mode, "tag": tag}),
        ),
        Commands::Observe { text } | Commands::Grow { text } => {
            tool("observe", json!({"text": text, "tags": []}))
        }
        Commands::Connect { source, target, edge_type, weight } => tool(
            "connect",
            json!({"source": source, "target": target, "edge_type": edge_type, "weight": weight}),
        ),
        Commands::Update { id, text } => tool("update", json!({"id": id, "text": text})),
        Commands::Forget { id, cascade, rewire } => {
            tool("forget", json!({"id": id, "cascade": cascade, "rewire": rewire}))
        }
        Commands::Tag { id, tag } => tool("add_tag", json!({"id": id, "tag": tag})),
        Commands::Ledger { action } => match action {
            LedgerAction::Save { name, summary } => {
                tool("ledger_save", json!({"name": name, "summary": summary}))
            }
            LedgerAction::Load { name } => tool("ledger_load", json!({"name": name})),
            LedgerAction::List => tool("ledger_list", json!({})),
        },
        Commands::Feedback { id, kind, magnitude } => {
            tool("feedback", json!({"id": id, "kind": kind, "magnitude": magnitude}))
        }
        Commands::Upgrade => return Err("upgrade is not yet wired to the running daemon".to_string()),
    };
    Ok(json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params}))
}

fn tool(name: &str, arguments: Value) -> (&str, Value) {
    ("tools/call", json!({"name": name, "arguments": arguments}))
}

fn call(socket_path: &PathBuf, request: Value) -> std::io::Result<Value> {
    let mut stream = UnixStream::connect(socket_path)?;
    let mut line = serde_json::to_string(&request).expect("request always serializes");
    line.push('\n');
    stream.write_all(line.as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;
    serde_json::from_str(response_line.trim())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn print_response(response: &Value) -> ExitCode {
    if let Some(error) = response.get("error") {
        eprintln!("{} {}", "error:".red().bold(), error.get("message").and_then(Value::as_str).unwrap_or("unknown error"));
        return ExitCode::from(2);
    }
    let result = response.get("result").cloned().unwrap_or(Value::Null);
    match serde_json::to_string_pretty(&result) {
        Ok(pretty) => println!("{pretty}"),
        Err(_) => println!("{result}"),
    }
    ExitCode::SUCCESS
}
