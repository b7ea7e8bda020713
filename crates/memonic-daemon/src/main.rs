//! memonic-daemon: the Unix-socket daemon exposing the memory engine over
//! newline-delimited JSON-RPC (§4.10). One process per store path; a second
//! invocation against the same store refuses to start.

mod dispatcher;
mod lockfile;
mod protocol;
mod server;
mod socket;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use memonic_core::{Config, MemoryEngine};

use crate::dispatcher::Dispatcher;
use crate::lockfile::InstanceLock;
use crate::server::Server;

/// Default embedding dimension when no embedder is wired in. A real
/// deployment sets this from the configured model; the daemon itself has no
/// opinion beyond "must match whatever the store was created with".
const DEFAULT_EMBEDDING_DIM: usize = 384;

struct Args {
    store_path: Option<PathBuf>,
    socket_path: Option<PathBuf>,
    interval_ms: Option<u64>,
    pid_file: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args {
        store_path: None,
        socket_path: None,
        interval_ms: None,
        pid_file: None,
    };
    let mut i = 0;
    while i < raw.len() {
        match raw[i].as_str() {
            "--path" => {
                i += 1;
                args.store_path = Some(PathBuf::from(raw.get(i).ok_or("--path requires a value")?));
            }
            "--socket" => {
                i += 1;
                args.socket_path = Some(PathBuf::from(raw.get(i).ok_or("--socket requires a value")?));
            }
            "--interval" => {
                i += 1;
                let v = raw.get(i).ok_or("--interval requires a value")?;
                args.interval_ms = Some(v.parse().map_err(|_| format!("invalid --interval value: {v}"))?);
            }
            "--pid-file" => {
                i += 1;
                args.pid_file = Some(PathBuf::from(raw.get(i).ok_or("--pid-file requires a value")?));
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("memonic-daemon {}", memonic_core::VERSION);
                std::process::exit(0);
            }
            other => return Err(format!("unrecognized argument: {other}")),
        }
        i += 1;
    }
    Ok(args)
}

fn print_help() {
    println!("memonic-daemon {}", memonic_core::VERSION);
    println!();
    println!("USAGE:");
    println!("    memonic-daemon [--path <P>] [--socket <path>] [--interval <ms>] [--pid-file <f>]");
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    let mut config = Config::from_env();
    if let Some(path) = args.store_path {
        config.store_path = path;
    }
    if let Some(interval) = args.interval_ms {
        config.decay_interval_ms = interval;
    }

    let _instance_lock = match InstanceLock::acquire(&config.store_path) {
        Ok(lock) => lock,
        Err(e) => {
            error!(error = %e, "failed to acquire daemon instance lock");
            return ExitCode::from(2);
        }
    };

    if let Some(pid_file) = &args.pid_file {
        if let Err(e) = std::fs::write(pid_file, std::process::id().to_string()) {
            warn!(error = %e, path = %pid_file.display(), "failed to write pid file");
        }
    }

    let engine = match MemoryEngine::open_without_embeddings(config.clone(), DEFAULT_EMBEDDING_DIM) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            error!(error = %e, "failed to open store");
            return ExitCode::from(2);
        }
    };

    let socket_path = args
        .socket_path
        .or_else(|| config.daemon_socket.clone())
        .unwrap_or_else(|| socket::derive_socket_path(&config.store_path));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let dynamics_engine = engine.clone();
    let dynamics_interval = config.decay_interval_ms.max(1);
    let checkpoint_interval = config.checkpoint_interval_ms.max(1);
    let mut dynamics_shutdown = shutdown_rx.clone();
    let dynamics_handle = tokio::spawn(async move {
        let mut elapsed_since_checkpoint = 0u64;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_millis(dynamics_interval)) => {}
                _ = dynamics_shutdown.changed() => break,
            }
            elapsed_since_checkpoint += dynamics_interval;
            let do_checkpoint = elapsed_since_checkpoint >= checkpoint_interval;
            if do_checkpoint {
                elapsed_since_checkpoint = 0;
            }
            let engine = dynamics_engine.clone();
            let result = tokio::task::spawn_blocking(move || engine.run_cycle(do_checkpoint)).await;
            match result {
                Ok(Ok(report)) => info!(?report, "dynamics cycle complete"),
                Ok(Err(e)) => warn!(error = %e, "dynamics cycle failed"),
                Err(e) => warn!(error = %e, "dynamics cycle task panicked"),
            }
        }
    });

    let dispatcher = Arc::new(Dispatcher::new(engine.clone()));
    let server = match Server::bind(&socket_path, dispatcher) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, socket = %socket_path.display(), "failed to bind socket");
            return ExitCode::from(3);
        }
    };

    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = ctrl_c_shutdown.send(true);
    });

    let run_result = server.run(shutdown_rx).await;
    let _ = shutdown_tx.send(true);
    let _ = dynamics_handle.await;

    if let Err(e) = engine.checkpoint() {
        warn!(error = %e, "final checkpoint failed");
    }

    if let Some(pid_file) = &args.pid_file {
        let _ = std::fs::remove_file(pid_file);
    }

    match run_result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server loop error");
            ExitCode::from(3)
        }
    }
}
