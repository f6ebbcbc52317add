use thiserror::Error;

use crate::reader::MAX_FRAME_LEN;

/// Errors from decoding the FIFO frame stream.
///
/// Every variant is recoverable: the offending frame has been consumed
/// and the reader is aligned on the next length prefix.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Frame advertises a payload larger than [`MAX_FRAME_LEN`].
    #[error("frame of {len} bytes exceeds the {} byte limit", MAX_FRAME_LEN)]
    Oversized { len: usize },

    /// Payload was not a valid log entry.
    #[error("malformed log entry: {0}")]
    Decode(#[from] prost::DecodeError),

    /// I/O failure on the underlying stream.
    #[error("fifo read failed: {0}")]
    Io(#[from] std::io::Error),
}
