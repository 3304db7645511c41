//! Remote invocation module
//!
//! Exposes the verb set as named operations instead of the text line
//! grammar, with equivalent semantics. Calls travel as line-delimited JSON
//! frames over a dedicated endpoint; each operation is independently
//! synchronized against the shared store.

mod client;
mod service;

pub use client::RemoteClient;
pub use service::RemoteService;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One remotely invokable operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum RemoteRequest {
    Put { key: String, value: String },
    Get { key: String },
    Del { key: String },
    Store,
    Test,
    GetLen,
    Test2,
    Shutdown,
}

/// Result frame sent back for every operation except `shutdown`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResponse {
    pub result: String,
}

/// Transport-layer failure
///
/// Kept distinct from store-level outcomes such as `NOT FOUND`, which are
/// ordinary result strings: a caller seeing `RemoteError` knows the remote
/// endpoint itself misbehaved or vanished.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote communication failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote endpoint sent an invalid frame: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("remote endpoint closed the connection")]
    Disconnected,
}
