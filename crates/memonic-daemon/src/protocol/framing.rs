//! Newline-delimited JSON-RPC framing over a connected `UnixStream`: one
//! request per line in, one response per line out (§4.10).

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

use super::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

pub struct FrameReader {
    lines: tokio::io::Lines<BufReader<OwnedReadHalf>>,
}

impl FrameReader {
    pub fn new(read_half: OwnedReadHalf) -> Self {
        FrameReader {
            lines: BufReader::new(read_half).lines(),
        }
    }

    /// Reads the next frame. `Ok(None)` means the peer closed the connection
    /// cleanly. A malformed line is reported as a parse-error response rather
    /// than closing the connection, so one bad frame doesn't kill the
    /// session.
    pub async fn next_request(&mut self) -> std::io::Result<Option<Result<JsonRpcRequest, JsonRpcError>>> {
        match self.lines.next_line().await? {
            None => Ok(None),
            Some(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return Ok(Some(Err(JsonRpcError::parse_error())));
                }
                match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                    Ok(req) => Ok(Some(Ok(req))),
                    Err(_) => Ok(Some(Err(JsonRpcError::parse_error()))),
                }
            }
        }
    }
}

pub struct FrameWriter {
    write_half: OwnedWriteHalf,
}

impl FrameWriter {
    pub fn new(write_half: OwnedWriteHalf) -> Self {
        FrameWriter { write_half }
    }

    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> std::io::Result<()> {
        let mut body = serde_json::to_string(response)
            .unwrap_or_else(|_| r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"serialize error"}}"#.to_string());
        body.push('\n');
        self.write_half.write_all(body.as_bytes()).await?;
        self.write_half.flush().await
    }
}
