//! Wire protocol: JSON-RPC 2.0 request/response types and the
//! newline-delimited framing used over the daemon's Unix-domain socket
//! (§4.10, §6).

pub mod framing;
pub mod types;
