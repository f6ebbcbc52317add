use std::sync::Arc;

use logship_protocol::FrameReader;
use logship_sink::SinkClient;
use logship_spool::Spool;
use tokio::fs::File;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::driver::{self, State};
use crate::encode::encode_entry;
use crate::ContainerInfo;

/// Everything one pipeline worker owns for the life of its stream.
pub(crate) struct Stream {
    pub pipe: String,
    pub reader: FrameReader<File>,
    pub info: ContainerInfo,
    pub sink: SinkClient,
    pub spool: Spool,
    pub cancel: CancellationToken,
}

/// Per-stream pipeline: read a frame, shape its envelope, ship it, and
/// spill to the spool when the sink is down.
///
/// Frame errors only cost the record in question; the reader is already
/// aligned on the next frame. A record refused by the sink goes to the
/// spool and is never retried against the sink directly, the replay
/// picks it up instead.
pub(crate) async fn run(mut stream: Stream, state: Arc<Mutex<State>>) {
    loop {
        let entry = tokio::select! {
            _ = stream.cancel.cancelled() => break,
            next = stream.reader.next_entry() => match next {
                Ok(Some(entry)) => entry,
                Ok(None) => {
                    tracing::debug!(
                        container = %stream.info.id,
                        pipe = %stream.pipe,
                        "log fifo closed, shutting down stream"
                    );
                    break;
                }
                Err(e) => {
                    tracing::error!(
                        container = %stream.info.id,
                        error = %e,
                        "dropping bad frame"
                    );
                    continue;
                }
            },
        };

        let payload = match encode_entry(&entry, &stream.info) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    container = %stream.info.id,
                    error = %e,
                    "failed to encode log record"
                );
                continue;
            }
        };

        if let Err(e) = stream.sink.write(&payload).await {
            tracing::error!(
                container = %stream.info.id,
                error = %e,
                "failed to ship log record, spooling"
            );
            if let Err(append_err) = stream.spool.append(&payload).await {
                tracing::error!(
                    container = %stream.info.id,
                    error = %append_err,
                    "failed to spool log record, dropping it"
                );
            }
            stream.spool.rotate_and_drain(&stream.sink);
        }
    }

    driver::deregister(&state, &stream.pipe).await;
}
