//! Container log-forwarding driver.
//!
//! The host hands the driver a named pipe carrying length-prefixed log
//! records plus a description of the container producing them. The
//! driver ships every record to the configured ingestion endpoint as one
//! JSON envelope per line, and spills to an on-disk spool whenever the
//! endpoint is unreachable, replaying the spool once it recovers.
//!
//! # Pipeline
//!
//! ```text
//! fifo -> FrameReader -> Envelope JSON -> SinkClient
//!                                    \-> Spool (on sink failure) -> replay
//! ```
//!
//! One worker task per registered pipe; all workers in a process share a
//! single sink client, created with the first stream and closed with the
//! last. Delivery is at-least-once: records that overflow into the spool
//! are replayed concurrently with live traffic and may interleave with
//! records produced after the endpoint recovered.

mod driver;
mod encode;
mod error;
mod info;
mod options;
mod worker;

pub use driver::{Driver, DEFAULT_SPOOL_ROOT};
pub use encode::{encode_entry, Envelope};
pub use error::DriverError;
pub use info::ContainerInfo;
pub use options::{SinkOptions, OPT_TIMEOUT, OPT_URL};

#[cfg(test)]
mod encode_test;
