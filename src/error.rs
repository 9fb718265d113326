//! Error types for loading and wiring a simulated network.
//!
//! The routing engines themselves never fail; only the harness does.

use std::path::PathBuf;

use thiserror::Error;

use crate::net::Addr;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid network description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("address {0} is declared more than once")]
    DuplicateAddr(Addr),
    #[error("link {a} <-> {b} references unknown node {missing}")]
    UnknownEndpoint { a: Addr, b: Addr, missing: Addr },
    #[error("link on {0} connects the node to itself")]
    SelfLoop(Addr),
    #[error("change at t={at} brings {a} <-> {b} up without a cost")]
    MissingCost { at: u64, a: Addr, b: Addr },
}

#[derive(Debug, Error)]
#[error("unknown routing protocol `{0}` (expected dv, ls or mirror)")]
pub struct UnknownProtocol(pub String);
