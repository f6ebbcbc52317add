use std::io::ErrorKind;

use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{FrameError, LogEntry};

/// Largest accepted frame payload (1 MiB), matching the runtime's limit.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Length prefix size (4 bytes, big-endian u32).
const LENGTH_PREFIX_SIZE: usize = 4;

/// Scratch size used when discarding an oversized payload.
const SKIP_CHUNK: usize = 8 * 1024;

/// Decoder for the length-prefixed log entry stream read from a FIFO.
pub struct FrameReader<R> {
    stream: R,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap a byte stream carrying length-prefixed log entries.
    pub fn new(stream: R) -> Self {
        Self { stream }
    }

    /// Decode the next record.
    ///
    /// Returns `Ok(None)` once the writer side has closed, including when
    /// the stream ends in the middle of a frame. Errors are recoverable:
    /// the frame's bytes are consumed before returning, so the following
    /// call starts at the next length prefix.
    pub async fn next_entry(&mut self) -> Result<Option<LogEntry>, FrameError> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        match self.stream.read_exact(&mut prefix).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_be_bytes(prefix) as usize;

        if len > MAX_FRAME_LEN {
            self.skip(len).await?;
            return Err(FrameError::Oversized { len });
        }

        let mut payload = vec![0u8; len];
        match self.stream.read_exact(&mut payload).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let entry = LogEntry::decode(payload.as_slice())?;
        Ok(Some(entry))
    }

    /// Discard `len` payload bytes so the stream stays frame-aligned.
    async fn skip(&mut self, len: usize) -> Result<(), FrameError> {
        let mut chunk = [0u8; SKIP_CHUNK];
        let mut remaining = len;
        while remaining > 0 {
            let want = remaining.min(SKIP_CHUNK);
            let n = self.stream.read(&mut chunk[..want]).await?;
            if n == 0 {
                // Writer closed mid-frame; the next call reports EOF.
                break;
            }
            remaining -= n;
        }
        Ok(())
    }
}

/// Frame one entry the way the runtime does: length prefix plus protobuf
/// payload. Host shims and tests use this to feed a [`FrameReader`].
pub fn encode_frame(entry: &LogEntry) -> Vec<u8> {
    let payload = entry.encode_to_vec();
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    frame
}
