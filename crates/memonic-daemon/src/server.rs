//! The daemon's connection-accept loop: binds the Unix-domain socket and
//! spawns one task per client, each running the newline-delimited
//! JSON-RPC framing over the shared [`Dispatcher`] (§4.10).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::protocol::framing::{FrameReader, FrameWriter};
use crate::protocol::types::JsonRpcResponse;

pub struct Server {
    listener: UnixListener,
    socket_path: PathBuf,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// Binds the socket at `socket_path`, removing a stale file left behind
    /// by a crashed prior daemon (the lock in `lockfile` is what actually
    /// prevents two live daemons; a leftover socket file alone is harmless
    /// to unlink since `bind` on a live one would fail anyway).
    pub fn bind(socket_path: &Path, dispatcher: Arc<Dispatcher>) -> std::io::Result<Self> {
        if socket_path.exists() {
            let _ = std::fs::remove_file(socket_path);
        }
        let listener = UnixListener::bind(socket_path)?;
        set_socket_mode(socket_path);
        Ok(Server {
            listener,
            socket_path: socket_path.to_path_buf(),
            dispatcher,
        })
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) -> std::io::Result<()> {
        info!(socket = %self.socket_path.display(), "daemon listening");
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, _addr) = accepted?;
                    let dispatcher = self.dispatcher.clone();
                    let mut conn_shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = handle_connection(stream, dispatcher) => {}
                            _ = conn_shutdown.changed() => {}
                        }
                    });
                }
                _ = shutdown.changed() => {
                    info!("daemon shutting down");
                    break;
                }
            }
        }
        let _ = std::fs::remove_file(&self.socket_path);
        Ok(())
    }
}

async fn handle_connection(stream: tokio::net::UnixStream, dispatcher: Arc<Dispatcher>) {
    let (read_half, write_half) = stream.into_split();
    let mut reader = FrameReader::new(read_half);
    let mut writer = FrameWriter::new(write_half);

    loop {
        let frame = match reader.next_request().await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "connection read error");
                break;
            }
        };
        let response = match frame {
            Ok(request) => {
                let id = request.id.clone();
                if request.method == "shutdown" {
                    let resp = dispatcher.handle(request);
                    let _ = writer.write_response(&resp).await;
                    break;
                }
                let _ = id;
                dispatcher.handle(request)
            }
            Err(err) => JsonRpcResponse::error(None, err),
        };
        if writer.write_response(&response).await.is_err() {
            break;
        }
    }
}

#[cfg(unix)]
fn set_socket_mode(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = std::fs::metadata(path) {
        let mut perms = metadata.permissions();
        perms.set_mode(0o600);
        let _ = std::fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn set_socket_mode(_path: &Path) {}
