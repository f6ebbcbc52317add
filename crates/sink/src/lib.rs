//! Client for the remote log-ingestion endpoint.
//!
//! # Design
//!
//! - **Serialized writes**: concurrent callers share one connection behind
//!   an async mutex; payloads are never interleaved.
//! - **No internal retry**: a failed write is reported to the caller, who
//!   decides what to do with the payload (the driver spools it).
//! - **Background reconnection**: the first failed write flips the client
//!   into a reconnecting state and wakes a single task that re-establishes
//!   the connection on a fixed cadence. `reconnecting()` exposes that
//!   state so the spool can gate its rotation on recovery.

mod client;
mod endpoint;
mod error;

pub use client::{SinkClient, RECONNECT_INTERVAL};
pub use endpoint::{Endpoint, Scheme};
pub use error::SinkError;
